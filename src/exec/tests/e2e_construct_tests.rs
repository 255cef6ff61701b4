use super::*;
use crate::storage::memory::MemoryStore;

async fn knows_store() -> SharedStore {
    let store: SharedStore = MemoryStore::new();
    seed_graph(
        &store,
        "?in",
        &[
            "/u<paul>\t\"knows\"@[]\t/u<peter>",
            "/u<peter>\t\"knows\"@[]\t/u<mary>",
        ],
    )
    .await;
    store.new_graph("?out").await.expect("out graph");
    store
}

#[tokio::test]
async fn construct_rewrites_edges_into_the_output_graph() {
    let store = knows_store().await;
    run(
        &store,
        "CONSTRUCT { ?o \"known_by\"@[] ?s } INTO ?out FROM ?in \
         WHERE { ?s \"knows\"@[] ?o };",
    )
    .await
    .expect("construct");

    let table = run(&store, "SELECT ?s, ?o FROM ?out WHERE { ?s \"known_by\"@[] ?o } ORDER BY ?s;")
        .await
        .expect("select");
    assert_eq!(column_texts(&table, "?s"), vec!["/u<mary>", "/u<peter>"]);
    assert_eq!(column_texts(&table, "?o"), vec!["/u<peter>", "/u<paul>"]);
}

#[tokio::test]
async fn construct_reification_pairs_hang_off_a_blank_node() {
    let store = knows_store().await;
    run(
        &store,
        "CONSTRUCT { ?s \"met\"@[] ?o ; \"where\"@[] /place<berlin> } INTO ?out FROM ?in \
         WHERE { ?s \"knows\"@[] ?o };",
    )
    .await
    .expect("construct");

    // Two rows, each: one main triple + three reification links + one extra pair.
    let main = run(&store, "SELECT ?s FROM ?out WHERE { ?s \"met\"@[] ?o };").await.expect("main");
    assert_eq!(main.num_rows(), 2);

    let reified = run(
        &store,
        "SELECT ?b, ?s FROM ?out WHERE { ?b \"_subject\"@[] ?s . ?b \"where\"@[] /place<berlin> };",
    )
    .await
    .expect("reified");
    assert_eq!(reified.num_rows(), 2);
    for text in column_texts(&reified, "?b") {
        assert!(text.starts_with("/_<"), "reifier must be a blank node, got {}", text);
    }
}

#[tokio::test]
async fn construct_blank_subject_mints_one_node_per_row() {
    let store = knows_store().await;
    run(
        &store,
        "CONSTRUCT { _:v \"observed\"@[] ?s } INTO ?out FROM ?in \
         WHERE { ?s \"knows\"@[] ?o };",
    )
    .await
    .expect("construct");

    let table = run(&store, "SELECT ?b, ?s FROM ?out WHERE { ?b \"observed\"@[] ?s };")
        .await
        .expect("select");
    assert_eq!(table.num_rows(), 2);
    let blanks = column_texts(&table, "?b");
    assert_ne!(blanks[0], blanks[1], "each row mints its own blank node");
}

#[tokio::test]
async fn construct_skips_rows_with_unbound_template_bindings() {
    let store: SharedStore = MemoryStore::new();
    seed_graph(
        &store,
        "?in",
        &[
            "/u<a>\t\"type\"@[]\t/kind<u>",
            "/u<b>\t\"type\"@[]\t/kind<u>",
            "/u<a>\t\"email\"@[]\t\"a@x\"^^type:text",
        ],
    )
    .await;
    store.new_graph("?out").await.expect("out graph");
    run(
        &store,
        "CONSTRUCT { ?s \"contact\"@[] ?e } INTO ?out FROM ?in \
         WHERE { ?s \"type\"@[] /kind<u> . OPTIONAL { ?s \"email\"@[] ?e } };",
    )
    .await
    .expect("construct");

    let table = run(&store, "SELECT ?s FROM ?out WHERE { ?s \"contact\"@[] ?e };")
        .await
        .expect("select");
    assert_eq!(column_texts(&table, "?s"), vec!["/u<a>"], "the unbound row is skipped");
}

#[tokio::test]
async fn deconstruct_removes_instantiated_triples() {
    let store = knows_store().await;
    run(
        &store,
        "CONSTRUCT { ?s \"met\"@[] ?o } INTO ?out FROM ?in WHERE { ?s \"knows\"@[] ?o };",
    )
    .await
    .expect("construct");
    assert_eq!(
        run(&store, "SELECT ?s FROM ?out WHERE { ?s \"met\"@[] ?o };")
            .await
            .expect("select")
            .num_rows(),
        2
    );

    run(
        &store,
        "DECONSTRUCT { ?s \"met\"@[] ?o } IN ?out FROM ?in WHERE { ?s \"knows\"@[] ?o };",
    )
    .await
    .expect("deconstruct");
    assert_eq!(
        run(&store, "SELECT ?s FROM ?out WHERE { ?s \"met\"@[] ?o };")
            .await
            .expect("select")
            .num_rows(),
        0
    );
}

#[tokio::test]
async fn construct_into_missing_output_graph_fails() {
    let store: SharedStore = MemoryStore::new();
    seed_graph(&store, "?in", &["/u<a>\t\"knows\"@[]\t/u<b>"]).await;
    let err = run(
        &store,
        "CONSTRUCT { ?s \"met\"@[] ?o } INTO ?nope FROM ?in WHERE { ?s \"knows\"@[] ?o };",
    )
    .await
    .expect_err("missing output graph");
    assert_eq!(err.kind(), "store");
}
