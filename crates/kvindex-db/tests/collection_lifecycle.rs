use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use kvindex_db::{Database, DatabaseConfig, DbError, FieldIndexer, Index, Path, QueryContext, Scalar};
use kvindex_query::{Predicate, Query};
use kvindex_store::MemoryStore;

fn widget(name: &str, part: &str) -> Vec<u8> {
    format!(r#"{{"name":"{name}","path":{{"part":"{part}"}}}}"#).into_bytes()
}

#[test]
fn scenario_simple_equality_returns_both_documents() {
    // spec §8 scenario 1.
    let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
    let widgets = db.collection_json("widgets");
    let mut txn = db.begin(false).unwrap();
    txn.add_index(&widgets, Index::new("by_part", vec![FieldIndexer::new(Path::Json("path.part".into()))]))
        .unwrap();

    let a = widget("a", "value");
    let b = widget("b", "value");
    txn.add(&widgets, &[a.clone(), b.clone()]).unwrap();

    let query = Query::new(Predicate::eq(Path::Json("path.part".into()), Scalar::Str("value".into())));
    let mut found = txn.find(&widgets, &QueryContext::none(), &query).unwrap();
    found.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn compound_index_explores_every_branch_through_the_database_layer() {
    // spec §8 scenario 2, exercised end to end rather than against `Index` directly.
    let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
    let widgets = db.collection_json("widgets");
    let mut txn = db.begin(false).unwrap();
    txn.add_index(
        &widgets,
        Index::new(
            "compound",
            vec![
                FieldIndexer::new(Path::Json("path.part".into())),
                FieldIndexer::new(Path::Json("path.parts.#".into())),
            ],
        ),
    )
    .unwrap();

    let d1 = br#"{"path":{"part":"value","parts":["value1","value3"]}}"#.to_vec();
    let d2 = br#"{"path":{"part":"value","parts":["value2"]}}"#.to_vec();
    txn.add(&widgets, &[d1.clone(), d2]).unwrap();

    let query = Query::new(Predicate::eq(Path::Json("path.part".into()), Scalar::Str("value".into())))
        .and(Predicate::eq(Path::Json("path.parts.#".into()), Scalar::Str("value1".into())));
    let found = txn.find(&widgets, &QueryContext::none(), &query).unwrap();
    assert_eq!(found, vec![d1]);
}

#[test]
fn drop_index_then_find_falls_back_to_full_table_scan() {
    let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
    let widgets = db.collection_json("widgets");
    let mut txn = db.begin(false).unwrap();
    txn.add_index(&widgets, Index::new("by_name", vec![FieldIndexer::new(Path::Json("name".into()))]))
        .unwrap();

    let doc = widget("bolt", "value");
    txn.add(&widgets, &[doc.clone()]).unwrap();
    txn.drop_index(&widgets, "by_name").unwrap();

    let query = Query::new(Predicate::eq(Path::Json("name".into()), Scalar::Str("bolt".into())));
    let found = txn.find(&widgets, &QueryContext::none(), &query).unwrap();
    assert_eq!(found, vec![doc]);
}

#[test]
fn index_iterate_rejects_a_query_no_index_covers_exactly() {
    let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
    let widgets = db.collection_json("widgets");
    let mut txn = db.begin(false).unwrap();
    txn.add_index(&widgets, Index::new("by_name", vec![FieldIndexer::new(Path::Json("name".into()))]))
        .unwrap();

    let query = Query::new(Predicate::eq(Path::Json("name".into()), Scalar::Str("bolt".into())))
        .and(Predicate::not_nil(Path::Json("path.part".into())));
    let err = txn.index_iterate(&widgets, &QueryContext::none(), &query, |_, _| Ok(()));
    assert!(matches!(err, Err(DbError::NoIndex)));
}

#[test]
fn cancelled_context_aborts_iteration() {
    // spec §8 scenario 7.
    let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
    let widgets = db.collection_json("widgets");
    let mut txn = db.begin(false).unwrap();
    txn.add_index(&widgets, Index::new("by_name", vec![FieldIndexer::new(Path::Json("name".into()))]))
        .unwrap();

    for n in 0..5 {
        txn.add(&widgets, &[widget(&format!("w{n}"), "value")]).unwrap();
    }

    let cancelled = Arc::new(AtomicBool::new(true));
    let ctx = QueryContext::with_cancel_flag(cancelled);
    let query = Query::new(Predicate::not_nil(Path::Json("name".into())));
    let result = txn.find(&widgets, &ctx, &query);
    assert!(matches!(result, Err(DbError::Cancelled)));
}

#[test]
fn walker_error_aborts_and_is_surfaced_verbatim() {
    let db = Database::new(MemoryStore::new(), DatabaseConfig::default());
    let widgets = db.collection_json("widgets");
    let mut txn = db.begin(false).unwrap();
    txn.add(&widgets, &[widget("bolt", "value"), widget("nut", "value")]).unwrap();

    let query = Query::new(Predicate::not_nil(Path::Json("name".into())));
    let mut seen = 0;
    let result = txn.iterate(&widgets, &QueryContext::none(), &query, |_doc| {
        seen += 1;
        Err(DbError::NoIndex)
    });
    assert!(matches!(result, Err(DbError::NoIndex)));
    assert_eq!(seen, 1);
}
