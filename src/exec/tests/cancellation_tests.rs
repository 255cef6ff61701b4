use super::*;
use tokio::time::Duration;

#[tokio::test]
async fn cancelled_context_aborts_before_work() {
    let store = store_with("?g", &["/u<a>\t\"knows\"@[]\t/u<b>"]).await;
    let ctx = Context::background();
    ctx.cancel();
    let err = execute_query(&ctx, &store, "SELECT ?s FROM ?g WHERE { ?s ?p ?o };", &ExecConfig::default())
        .await
        .expect_err("cancelled");
    assert_eq!(err.kind(), "cancelled");
}

#[tokio::test]
async fn expired_deadline_yields_timeout() {
    let store = store_with("?g", &["/u<a>\t\"knows\"@[]\t/u<b>"]).await;
    let ctx = Context::with_timeout(Duration::from_millis(0));
    tokio::time::sleep(Duration::from_millis(5)).await;
    let err = execute_query(&ctx, &store, "SELECT ?s FROM ?g WHERE { ?s ?p ?o };", &ExecConfig::default())
        .await
        .expect_err("timed out");
    assert_eq!(err.kind(), "timeout");
}

#[tokio::test]
async fn cancellation_covers_mutations_too() {
    let store = store_with("?g", &[]).await;
    let ctx = Context::background();
    ctx.cancel();
    for text in [
        "INSERT DATA INTO ?g { /u<a> \"p\"@[] /u<b> };",
        "SHOW GRAPHS;",
        "CREATE GRAPH ?new;",
    ] {
        let err = execute_query(&ctx, &store, text, &ExecConfig::default())
            .await
            .expect_err(text);
        assert_eq!(err.kind(), "cancelled", "statement: {}", text);
    }
}

#[tokio::test]
async fn cancellation_mid_stream_discards_partial_results() {
    // Seed enough triples that the solver must take multiple channel reads,
    // then cancel while the stream is live.
    let mut seeds = Vec::new();
    for i in 0..256 {
        seeds.push(format!("/u<n{:03}>\t\"knows\"@[]\t/u<m>", i));
    }
    let seed_refs: Vec<&str> = seeds.iter().map(String::as_str).collect();
    let store = store_with("?g", &seed_refs).await;

    let ctx = Context::background();
    let cancel_ctx = ctx.clone();
    let store_clone = store.clone();
    let query = tokio::spawn(async move {
        execute_query(
            &cancel_ctx,
            &store_clone,
            "SELECT ?s FROM ?g WHERE { ?s \"knows\"@[] /u<m> };",
            &ExecConfig { chan_size: 2, bulk_size: 1000 },
        )
        .await
    });
    ctx.cancel();
    let result = query.await.expect("join");
    // Either the query finished before the flag landed or it was cancelled;
    // a cancelled run must not return a partial table.
    if let Err(e) = result {
        assert_eq!(e.kind(), "cancelled");
    }
}
