mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use httpmock::Method::GET;
use nse_filings_rs::{AcquisitionEngine, AcquisitionRequest, ErrorKind};

use common::{
    ScriptedAcquirer, TimingOutAcquirer, api_url, broadcast_days_ago, engine_over, fast_retry,
    setup_server, wire_row,
};

#[tokio::test]
async fn happy_path_assembles_result() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/corporate-announcements")
            .query_param("symbol", "RELIANCE");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!([wire_row(
                "RELIANCE",
                "a.pdf",
                &broadcast_days_ago(1)
            )]));
    });

    let acquirer = ScriptedAcquirer::new(&["fresh"]);
    let engine = engine_over(&server, acquirer.clone());

    let result = engine
        .run(AcquisitionRequest::new("reliance"))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(result.symbol, "RELIANCE");
    assert_eq!(result.count, 1);
    assert_eq!(result.announcements[0].attachment_url, "a.pdf");
    assert_eq!(result.session.cookie_count, 1);
    assert!(!result.session.from_cache);
    assert_eq!(acquirer.launches(), 1);
}

#[tokio::test]
async fn access_denied_invalidates_session_before_retry() {
    let server = setup_server();
    // The stale session's cookies are rejected; the fresh session's accepted.
    let denied = server.mock(|when, then| {
        when.method(GET)
            .path("/api/corporate-announcements")
            .header("cookie", "nsit=stale");
        then.status(403);
    });
    let granted = server.mock(|when, then| {
        when.method(GET)
            .path("/api/corporate-announcements")
            .header("cookie", "nsit=fresh");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!([]));
    });

    let acquirer = ScriptedAcquirer::new(&["stale", "fresh"]);
    let engine = engine_over(&server, acquirer.clone());

    let result = engine.run(AcquisitionRequest::new("TCS")).await.unwrap();

    denied.assert();
    granted.assert();
    // The retry must have gone through a second acquisition, not the cache.
    assert_eq!(acquirer.launches(), 2);
    assert_eq!(result.count, 0);
}

#[tokio::test]
async fn http_404_yields_success_with_zero_announcements() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/api/corporate-announcements");
        then.status(404);
    });

    let engine = engine_over(&server, ScriptedAcquirer::new(&["ok"]));
    let result = engine
        .run(AcquisitionRequest::new("OBSCURE"))
        .await
        .unwrap();
    assert_eq!(result.count, 0);
    assert!(result.announcements.is_empty());
}

#[tokio::test]
async fn consecutive_runs_within_cache_interval_fetch_once() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/corporate-announcements");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!([wire_row(
                "RELIANCE",
                "a.pdf",
                &broadcast_days_ago(2)
            )]));
    });

    let acquirer = ScriptedAcquirer::new(&["ok"]);
    let engine = engine_over(&server, acquirer.clone());

    engine
        .run(AcquisitionRequest::new("RELIANCE"))
        .await
        .unwrap();
    let second = engine
        .run(AcquisitionRequest::new("RELIANCE"))
        .await
        .unwrap();

    mock.assert_hits(1);
    assert_eq!(acquirer.launches(), 1);
    assert!(second.session.from_cache);
}

#[tokio::test]
async fn force_refresh_discards_session_and_response_cache() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/corporate-announcements");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!([]));
    });

    let acquirer = ScriptedAcquirer::new(&["ok"]);
    let engine = engine_over(&server, acquirer.clone());

    engine
        .run(AcquisitionRequest::new("RELIANCE"))
        .await
        .unwrap();
    engine
        .run(AcquisitionRequest::new("RELIANCE").force_refresh(true))
        .await
        .unwrap();

    mock.assert_hits(2);
    assert_eq!(acquirer.launches(), 2);
}

#[tokio::test]
async fn unresolvable_input_never_reaches_the_network() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/corporate-announcements");
        then.status(200).json_body(serde_json::json!([]));
    });

    let engine = engine_over(&server, ScriptedAcquirer::new(&["ok"]));
    let err = engine
        .run(AcquisitionRequest::new("Reliance Industries Limited"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SymbolNotResolved);
    mock.assert_hits(0);
}

#[tokio::test]
async fn acquirer_timeout_surfaces_as_timeout_kind() {
    let server = setup_server();
    let acquirer = Arc::new(TimingOutAcquirer {
        launches: AtomicUsize::new(0),
    });
    let engine = AcquisitionEngine::builder()
        .acquirer(acquirer)
        .exact_resolution_only()
        .api_url(api_url(&server))
        .session_retry(fast_retry(2))
        .fetch_retry(fast_retry(2))
        .build()
        .unwrap();

    let err = engine
        .run(AcquisitionRequest::new("RELIANCE"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn concurrent_cold_runs_share_one_session_acquisition() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/api/corporate-announcements");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!([]));
    });

    let acquirer = ScriptedAcquirer::new(&["ok"]);
    let engine = Arc::new(engine_over(&server, acquirer.clone()));

    let mut tasks = Vec::new();
    for i in 0..6 {
        let engine = Arc::clone(&engine);
        // Distinct symbols so the response cache cannot mask session reuse.
        tasks.push(tokio::spawn(async move {
            engine.run(AcquisitionRequest::new(format!("SYM{i}"))).await
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(acquirer.launches(), 1);
}
