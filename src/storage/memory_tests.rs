use super::*;
use crate::graph::default_literal_builder;
use crate::storage::Lookup;

fn triple(text: &str) -> Triple {
    Triple::parse(text, default_literal_builder()).expect(text)
}

async fn collect(graph: &Arc<dyn Graph>, lookup: Lookup) -> Vec<Triple> {
    let (tx, mut rx) = mpsc::channel(4);
    let g = graph.clone();
    let feeder = tokio::spawn(async move { g.triples(lookup, tx).await });
    let mut out = Vec::new();
    while let Some(t) = rx.recv().await {
        out.push(t);
    }
    feeder.await.expect("join").expect("stream");
    out
}

#[tokio::test]
async fn graph_lifecycle() {
    let store = MemoryStore::new();
    assert_eq!(store.name(), "memory");
    assert!(!store.version().is_empty());

    assert!(store.graph("?g").await.is_err(), "missing graph must error");
    store.new_graph("?g").await.expect("create");
    assert!(store.new_graph("?g").await.is_err(), "duplicate graph must error");
    store.graph("?g").await.expect("fetch");

    store.new_graph("?a").await.expect("create");
    assert_eq!(store.graph_names().await.expect("names"), vec!["?a", "?g"]);

    store.delete_graph("?a").await.expect("delete");
    assert!(store.delete_graph("?a").await.is_err(), "double delete must error");
    assert_eq!(store.graph_names().await.expect("names"), vec!["?g"]);
}

#[tokio::test]
async fn add_remove_and_stream() {
    let store = MemoryStore::new();
    let graph = store.new_graph("?g").await.expect("create");
    let t1 = triple("/u<paul>\t\"knows\"@[]\t/u<peter>");
    let t2 = triple("/u<peter>\t\"knows\"@[]\t/u<mary>");
    graph.add_triples(&[t1.clone(), t2.clone()]).await.expect("add");

    let all = collect(&graph, Lookup::default()).await;
    assert_eq!(all.len(), 2);

    // Re-adding the same triple is idempotent.
    graph.add_triples(&[t1.clone()]).await.expect("re-add");
    assert_eq!(collect(&graph, Lookup::default()).await.len(), 2);

    graph.remove_triples(&[t1.clone()]).await.expect("remove");
    let rest = collect(&graph, Lookup::default()).await;
    assert_eq!(rest, vec![t2.clone()]);

    // Removing an absent triple stays silent.
    graph.remove_triples(&[t1]).await.expect("remove absent");
}

#[tokio::test]
async fn stream_order_is_deterministic() {
    let store = MemoryStore::new();
    let graph = store.new_graph("?g").await.expect("create");
    let triples = vec![
        triple("/u<c>\t\"knows\"@[]\t/u<d>"),
        triple("/u<a>\t\"knows\"@[]\t/u<b>"),
        triple("/u<b>\t\"knows\"@[]\t/u<c>"),
    ];
    graph.add_triples(&triples).await.expect("add");
    let first = collect(&graph, Lookup::default()).await;
    let second = collect(&graph, Lookup::default()).await;
    assert_eq!(first, second, "same state must stream in the same order");
    let mut texts: Vec<String> = first.iter().map(|t| t.to_string()).collect();
    let sorted = {
        let mut s = texts.clone();
        s.sort();
        s
    };
    assert_eq!(texts, sorted, "memory streams in canonical text order");
    texts.dedup();
    assert_eq!(texts.len(), 3);
}

#[tokio::test]
async fn lookup_filters_apply() {
    let store = MemoryStore::new();
    let graph = store.new_graph("?g").await.expect("create");
    graph
        .add_triples(&[
            triple("/u<a>\t\"saw\"@[2020-01-01T00:00:00Z]\t/u<b>"),
            triple("/u<a>\t\"saw\"@[2021-01-01T00:00:00Z]\t/u<b>"),
            triple("/u<a>\t\"knows\"@[]\t/u<b>"),
        ])
        .await
        .expect("add");

    let mut lookup = Lookup::default();
    lookup.predicate_id = Some("saw".to_string());
    assert_eq!(collect(&graph, lookup).await.len(), 2);

    let mut lookup = Lookup::default();
    lookup.upper_anchor =
        Some(crate::graph::predicate::parse_time("2020-06-01T00:00:00Z").expect("time"));
    let within = collect(&graph, lookup).await;
    // The immutable triple passes; only the later temporal one is cut.
    assert_eq!(within.len(), 2);

    let mut lookup = Lookup::default();
    lookup.max_elements = Some(1);
    assert_eq!(collect(&graph, lookup).await.len(), 1);
}

#[tokio::test]
async fn dropped_receiver_stops_the_stream_without_error() {
    let store = MemoryStore::new();
    let graph = store.new_graph("?g").await.expect("create");
    let mut triples = Vec::new();
    for i in 0..64 {
        triples.push(triple(&format!("/u<n{:02}>\t\"knows\"@[]\t/u<m>", i)));
    }
    graph.add_triples(&triples).await.expect("add");

    let (tx, mut rx) = mpsc::channel(2);
    let g = graph.clone();
    let feeder = tokio::spawn(async move { g.triples(Lookup::default(), tx).await });
    let first = rx.recv().await.expect("one triple");
    assert_eq!(first.predicate().id(), "knows");
    drop(rx);
    feeder.await.expect("join").expect("producer exits cleanly");
}
