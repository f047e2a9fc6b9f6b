//! Integration test: batch verification and refresh against a local server.
//!
//! The server stands in for both the storage host and the minting endpoint,
//! so the storage domain is 127.0.0.1 throughout.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use common::link_server::{self, LinkServer, Route};
use linkcap_core::config::{ProbeConfig, RefreshConfig};
use linkcap_core::exchange::QueryParams;
use linkcap_core::extract::{LinkRecord, LinkStatus};
use linkcap_core::verify::{verify_links, VerifySummary};

const DOMAIN: &str = "127.0.0.1";

fn link(server: &LinkServer, path: &str, fid: &str) -> LinkRecord {
    LinkRecord::new(
        Utc::now(),
        "https://api.example.com/api.php",
        server.url(path),
        QueryParams::from([("fid".to_string(), vec![fid.to_string()])]),
        None,
    )
}

fn probe_cfg(workers: usize) -> ProbeConfig {
    ProbeConfig {
        timeout_secs: 2,
        connect_timeout_secs: 1,
        workers,
        ..ProbeConfig::default()
    }
}

fn refresh_cfg(server: &LinkServer, path: &str) -> RefreshConfig {
    RefreshConfig {
        endpoint: server.url(path),
        timeout_secs: 2,
        user_agent: "linkcap-test".into(),
    }
}

#[tokio::test]
async fn expired_link_is_refreshed_and_reprobed_once() {
    // Minted links live on a second host so the mint body can name it.
    let storage = link_server::start(vec![(
        "/fresh",
        Route::status(200).header("Content-Length", "10"),
    )]);
    let fresh = storage.url("/fresh");
    let server = link_server::start(vec![
        ("/live", Route::status(200)),
        ("/stale", Route::status(403)),
        ("/missing", Route::status(404)),
        (
            "/mint",
            Route::json(&format!(r#"{{"url":"{fresh}","expire":600}}"#)),
        ),
    ]);

    let links = vec![
        link(&server, "/live", "a"),
        link(&server, "/stale", "b"),
        link(&server, "/missing", "c"),
    ];
    let refresh = refresh_cfg(&server, "/mint");
    let out = verify_links(
        links,
        &probe_cfg(4),
        Some(&refresh),
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;

    let statuses: Vec<_> = out.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![
            LinkStatus::Valid,
            LinkStatus::Expired,
            LinkStatus::Valid,
            LinkStatus::NotFound
        ]
    );
    assert!(out[0].download_url.ends_with("/live"));
    assert!(out[1].download_url.ends_with("/stale"));
    assert_eq!(out[1].superseded_by.as_deref(), Some(out[2].download_url.as_str()));
    assert!(out[2].download_url.ends_with("/fresh"));
    assert_eq!(out[2].content_length, Some(10));
    assert_eq!(out[2].originating_query_params["fid"], vec!["b"]);
    assert_eq!(out[2].file_metadata.as_ref().unwrap()["expire"], 600);
    assert!(out[3].download_url.ends_with("/missing"));

    // Refresh only for the expired link, with its query replayed.
    assert_eq!(server.hits("/mint"), 1);
    assert!(server.requests().contains(&"GET /mint?fid=b".to_string()));
    assert_eq!(storage.requests(), vec!["HEAD /fresh".to_string()]);

    let summary = VerifySummary::from_links(&out);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.valid, 2);
    assert_eq!(summary.refreshed, 1);
    assert_eq!(summary.needs_recapture, 0);
}

#[tokio::test]
async fn mint_without_url_leaves_link_expired() {
    let server = link_server::start(vec![
        ("/stale", Route::status(403)),
        ("/mint", Route::json(r#"{"error":"session expired"}"#)),
    ]);
    let refresh = refresh_cfg(&server, "/mint");
    let out = verify_links(
        vec![link(&server, "/stale", "a")],
        &probe_cfg(2),
        Some(&refresh),
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].status, LinkStatus::Expired);
    assert!(out[0].superseded_by.is_none());
    assert_eq!(VerifySummary::from_links(&out).needs_recapture, 1);
}

#[tokio::test]
async fn minted_url_must_pass_host_gate() {
    let server = link_server::start(vec![
        ("/stale", Route::status(403)),
        ("/mint", Route::json(r#"{"url":"https://unrelated.example.com/file"}"#)),
    ]);
    let refresh = refresh_cfg(&server, "/mint");
    let out = verify_links(
        vec![link(&server, "/stale", "a")],
        &probe_cfg(2),
        Some(&refresh),
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;
    assert_eq!(out.len(), 1);
    assert!(out[0].superseded_by.is_none());
}

#[tokio::test]
async fn mint_error_status_yields_nothing() {
    let server = link_server::start(vec![
        ("/stale", Route::status(403)),
        ("/mint", Route::status(500)),
    ]);
    let refresh = refresh_cfg(&server, "/mint");
    let out = verify_links(
        vec![link(&server, "/stale", "a")],
        &probe_cfg(1),
        Some(&refresh),
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].status, LinkStatus::Expired);
    assert_eq!(server.hits("/mint"), 1);
}

#[tokio::test]
async fn no_refresh_config_means_no_mint_call() {
    let server = link_server::start(vec![("/stale", Route::status(403))]);
    let out = verify_links(
        vec![link(&server, "/stale", "a")],
        &probe_cfg(1),
        None,
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;
    assert_eq!(out[0].status, LinkStatus::Expired);
    assert_eq!(server.requests(), vec!["HEAD /stale".to_string()]);
}

#[tokio::test]
async fn superseded_link_is_reprobed_but_not_reminted() {
    let server = link_server::start(vec![
        ("/stale", Route::status(403)),
        ("/fresh", Route::status(200)),
        ("/mint", Route::json(r#"{"url":"http://127.0.0.1/never"}"#)),
    ]);
    let mut old = link(&server, "/stale", "a");
    old.superseded_by = Some(server.url("/fresh"));
    let links = vec![old, link(&server, "/fresh", "a")];

    let refresh = refresh_cfg(&server, "/mint");
    let out = verify_links(
        links,
        &probe_cfg(2),
        Some(&refresh),
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].status, LinkStatus::Expired);
    assert_eq!(out[0].superseded_by.as_deref(), Some(server.url("/fresh").as_str()));
    assert_eq!(out[1].status, LinkStatus::Valid);
    assert_eq!(server.hits("/stale"), 1);
    assert_eq!(server.hits("/mint"), 0);
}

#[tokio::test]
async fn order_is_kept_with_one_worker_and_many_links() {
    let server = link_server::start(vec![
        ("/ok", Route::status(200)),
        ("/gone", Route::status(404)),
    ]);
    let links: Vec<_> = (0..12)
        .map(|i| {
            let path = if i % 3 == 0 { "/gone" } else { "/ok" };
            link(&server, &format!("{path}?n={i}"), &i.to_string())
        })
        .collect();
    let expected: Vec<_> = links.iter().map(|l| l.download_url.clone()).collect();

    let out = verify_links(
        links,
        &probe_cfg(1),
        None,
        DOMAIN,
        Arc::new(AtomicBool::new(false)),
    )
    .await;
    let urls: Vec<_> = out.iter().map(|l| l.download_url.clone()).collect();
    assert_eq!(urls, expected);
    for (i, l) in out.iter().enumerate() {
        let want = if i % 3 == 0 { LinkStatus::NotFound } else { LinkStatus::Valid };
        assert_eq!(l.status, want, "link {i}");
        assert!(l.checked_at.is_some());
    }
}

#[tokio::test]
async fn cancelled_batch_issues_no_probes() {
    let server = link_server::start(vec![("/ok", Route::status(200))]);
    let out = verify_links(
        vec![link(&server, "/ok", "a"), link(&server, "/ok?2", "b")],
        &probe_cfg(2),
        None,
        DOMAIN,
        Arc::new(AtomicBool::new(true)),
    )
    .await;
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|l| l.status == LinkStatus::Unchecked));
    assert!(server.requests().is_empty());
}
