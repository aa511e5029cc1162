//! End-to-end session state machine tests against a scripted engine

mod common;

use common::*;
use memscan::{MatchKind, ScanError, ScanPhase, ScanScope, TypeTag};
use pretty_assertions::assert_eq;

const MATCH_PAGE: &str = concat!(
    r#"[{"match_id":0,"addr":"7f001000","off":"1000","region_type":"heap","value":100,"types":"I32s I16s"},"#,
    r#"{"match_id":1,"addr":"7f002000","off":"2000","region_type":"stack","value":100,"types":"I32s"}]"#
);

#[tokio::test]
async fn test_attach_scan_results_flow() {
    let mut info_calls = 0u32;
    let (session, transcript) = mock_session(move |req| {
        if req.starts_with("info") {
            info_calls += 1;
            if info_calls == 1 {
                r#"[{"found":0,"scan_progress":0.25,"is_process_dead":0}]"#.to_string()
            } else {
                r#"[{"found":2,"scan_progress":1.0,"is_process_dead":0}]"#.to_string()
            }
        } else if req.starts_with("list") {
            MATCH_PAGE.to_string()
        } else if req.starts_with("next") {
            "[]".to_string()
        } else {
            default_respond(req)
        }
    });

    assert_eq!(session.phase(), ScanPhase::Idle);

    session.attach(1234).await.unwrap();
    let state = session.state_snapshot();
    assert_eq!(state.phase, ScanPhase::Attached);
    assert_eq!(state.pid, 1234);
    assert_eq!(state.region_count, 58);
    assert_eq!(state.exe_link.as_deref(), Some("/usr/bin/game"));
    assert!(state.first_scan);

    session
        .configure_and_scan("100", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    let state = session.state_snapshot();
    assert_eq!(state.phase, ScanPhase::Scanning);
    assert!(!state.first_scan);
    assert_eq!(state.match_kind, Some(MatchKind::Exact));
    // tickers swapped for the scan
    assert!(session.progress_ticker_active());
    assert!(!session.watch_ticker_active());

    // mid-scan poll stays in Scanning
    let progress = session.poll_progress().await.unwrap();
    assert_eq!(progress, Some(0.25));
    assert_eq!(session.phase(), ScanPhase::Scanning);

    // completion fetches the count and the match set
    let progress = session.poll_progress().await.unwrap();
    assert_eq!(progress, Some(1.0));
    assert_eq!(session.phase(), ScanPhase::Results);
    assert_eq!(session.match_count(), 2);
    assert_eq!(session.match_rows().len(), 2);
    assert!(!session.progress_ticker_active());
    assert!(session.watch_ticker_active());

    let log = requests(&transcript);
    assert_eq!(
        log,
        vec![
            "reset 1234",
            "option scan_data_type int32",
            "option region_scan_level 2",
            "reset",
            "find 100",
            "info 1234",
            "info 1234",
            "info 1234",
            "list 32",
            "next 32",
        ]
    );
}

#[tokio::test]
async fn test_refine_skips_configuration() {
    let (session, transcript) = mock_session(default_respond);
    session.attach(1234).await.unwrap();
    session
        .configure_and_scan("100", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    transcript.lock().unwrap().clear();

    // second scan goes straight to find
    session
        .configure_and_scan("+ 5", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    assert_eq!(requests(&transcript), vec!["find + 5"]);
    assert_eq!(
        session.state_snapshot().match_kind,
        Some(MatchKind::IncreasedBy)
    );
}

#[tokio::test]
async fn test_rejected_command_never_reaches_engine() {
    let (session, transcript) = mock_session(default_respond);
    session.attach(1234).await.unwrap();
    transcript.lock().unwrap().clear();

    let err = session
        .configure_and_scan("+5", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Validation(_)));
    assert!(requests(&transcript).is_empty());
    // session untouched
    assert!(session.state_snapshot().first_scan);
    assert_eq!(session.phase(), ScanPhase::Attached);

    let err = session
        .configure_and_scan("40000..50000", TypeTag::Int16, ScanScope::Normal)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("40000"));
    assert!(requests(&transcript).is_empty());
}

#[tokio::test]
async fn test_scan_without_process_rejected() {
    let (session, transcript) = mock_session(default_respond);
    let err = session
        .configure_and_scan("100", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::NoProcess));
    assert!(requests(&transcript).is_empty());
}

#[tokio::test]
async fn test_failed_attach_leaves_session_untouched() {
    let (session, _transcript) = mock_session(|req| {
        if req.starts_with("reset") {
            r#"[{"error":"error parsing pid"}]"#.to_string()
        } else {
            default_respond(req)
        }
    });

    let err = session.attach(4321).await.unwrap_err();
    match err {
        ScanError::Engine(msg) => assert_eq!(msg, "error parsing pid"),
        other => panic!("wrong kind: {other:?}"),
    }
    let state = session.state_snapshot();
    assert_eq!(state.phase, ScanPhase::Idle);
    assert_eq!(state.pid, 0);
    assert_eq!(state.region_count, 0);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let (session, _transcript) = mock_session(default_respond);
    session.attach(1234).await.unwrap();
    session
        .configure_and_scan("100", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    session.poll_progress().await.unwrap();

    for _ in 0..2 {
        session.reset().await.unwrap();
        let state = session.state_snapshot();
        assert_eq!(state.phase, ScanPhase::Attached);
        assert!(state.first_scan);
        assert_eq!(state.match_count, 0);
        assert!(session.match_rows().is_empty());
    }
}

#[tokio::test]
async fn test_stop_lands_in_results_with_partial_count() {
    let (session, transcript) = mock_session(|req| {
        if req.starts_with("info") {
            r#"[{"found":7,"scan_progress":0.6,"is_process_dead":0}]"#.to_string()
        } else if req.starts_with("list") {
            r#"[{"match_id":0,"addr":"7f001000","off":"0","region_type":"heap","value":1,"types":"I32s"}]"#
                .to_string()
        } else if req.starts_with("next") {
            "[]".to_string()
        } else {
            default_respond(req)
        }
    });

    session.attach(1234).await.unwrap();
    session
        .configure_and_scan("1", TypeTag::Int32, ScanScope::Full)
        .await
        .unwrap();
    assert_eq!(session.phase(), ScanPhase::Scanning);

    session.stop().await.unwrap();
    assert_eq!(session.phase(), ScanPhase::Results);
    assert_eq!(session.match_count(), 7);
    assert!(requests(&transcript).iter().any(|r| r == "stop"));
}

#[tokio::test]
async fn test_match_paging_accumulates_and_filters_unknown() {
    let mut next_calls = 0u32;
    let (session, _transcript) = mock_session(move |req| {
        if req.starts_with("info") {
            r#"[{"found":5,"scan_progress":1.0,"is_process_dead":0}]"#.to_string()
        } else if req.starts_with("list") {
            concat!(
                r#"[{"match_id":0,"addr":"100","off":"0","region_type":"heap","value":1,"types":"I32s"},"#,
                r#"{"match_id":1,"addr":"104","off":"4","region_type":"heap","value":2,"types":"unknown"},"#,
                r#"{"match_id":2,"addr":"108","off":"8","region_type":"heap","value":3,"types":"I32s"}]"#
            )
            .to_string()
        } else if req.starts_with("next") {
            next_calls += 1;
            if next_calls == 1 {
                concat!(
                    r#"[{"match_id":3,"addr":"10c","off":"c","region_type":"heap","value":4,"types":"I32s"},"#,
                    r#"{"match_id":4,"addr":"110","off":"10","region_type":"misc","value":5,"types":"I32s"}]"#
                )
                .to_string()
            } else {
                "[]".to_string()
            }
        } else {
            default_respond(req)
        }
    });

    session.attach(1234).await.unwrap();
    session
        .configure_and_scan("?", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    session.poll_progress().await.unwrap();

    let rows = session.match_rows();
    // the unknown-typed row is dropped, ids accumulate across pages
    let ids: Vec<u64> = rows.iter().map(|r| r.match_id).collect();
    assert_eq!(ids, vec![0, 2, 3, 4]);
    assert!(rows.iter().all(|r| r.valid));
}

#[tokio::test]
async fn test_oversized_result_set_leaves_table_empty() {
    let (session, transcript) = mock_session(|req| {
        if req.starts_with("info") {
            r#"[{"found":50000,"scan_progress":1.0,"is_process_dead":0}]"#.to_string()
        } else {
            default_respond(req)
        }
    });

    session.attach(1234).await.unwrap();
    session
        .configure_and_scan("0", TypeTag::Int8, ScanScope::Full)
        .await
        .unwrap();
    session.poll_progress().await.unwrap();

    assert_eq!(session.phase(), ScanPhase::Results);
    assert_eq!(session.match_count(), 50_000);
    assert!(session.match_rows().is_empty());
    // no list was ever issued
    assert!(!requests(&transcript).iter().any(|r| r.starts_with("list")));
}

#[tokio::test]
async fn test_snapshot_predicate_depends_on_first_scan() {
    let (session, transcript) = mock_session(default_respond);
    session.attach(1234).await.unwrap();

    session
        .configure_and_scan("?", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    assert!(requests(&transcript).iter().any(|r| r == "find snapshot"));

    session
        .configure_and_scan("?", TypeTag::Int32, ScanScope::Normal)
        .await
        .unwrap();
    assert!(requests(&transcript).iter().any(|r| r == "find update"));
}

#[tokio::test]
async fn test_shutdown_reaches_exiting() {
    let (session, transcript) = mock_session(default_respond);
    session.attach(1234).await.unwrap();
    session.shutdown().await.unwrap();
    assert_eq!(session.phase(), ScanPhase::Exiting);
    assert!(!session.watch_ticker_active());
    assert!(!session.progress_ticker_active());
    assert!(requests(&transcript).iter().any(|r| r == "exit"));
}
