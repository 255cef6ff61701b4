use super::*;
use crate::storage::memory::MemoryStore;

#[tokio::test]
async fn create_show_drop_lifecycle() {
    let store: SharedStore = MemoryStore::new();
    run(&store, "CREATE GRAPH ?family, ?work;").await.expect("create");

    let shown = run(&store, "SHOW GRAPHS;").await.expect("show");
    assert_eq!(shown.bindings(), &["?graph"]);
    assert_eq!(column_texts(&shown, "?graph"), vec!["?family", "?work"]);

    run(&store, "DROP GRAPH ?work;").await.expect("drop");
    let shown = run(&store, "SHOW GRAPHS;").await.expect("show");
    assert_eq!(column_texts(&shown, "?graph"), vec!["?family"]);
}

#[tokio::test]
async fn duplicate_create_and_missing_drop_surface_store_errors() {
    let store: SharedStore = MemoryStore::new();
    run(&store, "CREATE GRAPH ?g;").await.expect("create");
    let err = run(&store, "CREATE GRAPH ?g;").await.expect_err("duplicate");
    assert_eq!(err.kind(), "store");
    assert!(err.to_string().contains("new_graph"), "{}", err);

    let err = run(&store, "DROP GRAPH ?missing;").await.expect_err("missing");
    assert_eq!(err.kind(), "store");
}

#[tokio::test]
async fn insert_select_delete_round_trip() {
    let store: SharedStore = MemoryStore::new();
    run(&store, "CREATE GRAPH ?g;").await.expect("create");
    run(
        &store,
        "INSERT DATA INTO ?g { /u<paul> \"knows\"@[] /u<peter> . \
         /u<paul> \"email\"@[] \"p@x\"^^type:text };",
    )
    .await
    .expect("insert");

    let table = run(&store, "SELECT ?o FROM ?g WHERE { /u<paul> \"knows\"@[] ?o };")
        .await
        .expect("select");
    assert_eq!(column_texts(&table, "?o"), vec!["/u<peter>"]);

    run(&store, "DELETE DATA FROM ?g { /u<paul> \"knows\"@[] /u<peter> };")
        .await
        .expect("delete");
    let table = run(&store, "SELECT ?o FROM ?g WHERE { /u<paul> \"knows\"@[] ?o };")
        .await
        .expect("select");
    assert_eq!(table.num_rows(), 0);
}

#[tokio::test]
async fn insert_into_missing_graph_fails() {
    let store: SharedStore = MemoryStore::new();
    let err = run(&store, "INSERT DATA INTO ?nope { /u<a> \"p\"@[] /u<b> };")
        .await
        .expect_err("missing graph");
    assert_eq!(err.kind(), "store");
}

#[tokio::test]
async fn bulked_insert_lands_every_triple() {
    let store: SharedStore = MemoryStore::new();
    run(&store, "CREATE GRAPH ?g;").await.expect("create");
    let mut data = String::new();
    for i in 0..7 {
        if !data.is_empty() {
            data.push_str(" . ");
        }
        data.push_str(&format!("/u<n{}> \"knows\"@[] /u<m>", i));
    }
    let text = format!("INSERT DATA INTO ?g {{ {} }};", data);
    let config = ExecConfig { chan_size: 2, bulk_size: 3 };
    execute_query(&Context::background(), &store, &text, &config).await.expect("insert");

    let table = execute_query(
        &Context::background(),
        &store,
        "SELECT ?s FROM ?g WHERE { ?s \"knows\"@[] /u<m> };",
        &config,
    )
    .await
    .expect("select");
    assert_eq!(table.num_rows(), 7);
}

#[tokio::test]
async fn insert_into_multiple_graphs() {
    let store: SharedStore = MemoryStore::new();
    run(&store, "CREATE GRAPH ?a, ?b;").await.expect("create");
    run(&store, "INSERT DATA INTO ?a, ?b { /u<x> \"knows\"@[] /u<y> };")
        .await
        .expect("insert");
    for graph in ["?a", "?b"] {
        let text = format!("SELECT ?s FROM {} WHERE {{ ?s \"knows\"@[] ?o }};", graph);
        let table = run(&store, &text).await.expect("select");
        assert_eq!(table.num_rows(), 1, "graph {}", graph);
    }
}
