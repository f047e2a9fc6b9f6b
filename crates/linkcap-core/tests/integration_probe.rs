//! Integration test: probe classification against a local scripted server.

mod common;

use std::time::Duration;

use common::link_server::{self, Route};
use linkcap_core::config::ProbeConfig;
use linkcap_core::extract::LinkStatus;
use linkcap_core::probe::probe_url;

fn fast_probe() -> ProbeConfig {
    ProbeConfig {
        timeout_secs: 1,
        connect_timeout_secs: 1,
        ..ProbeConfig::default()
    }
}

#[test]
fn ok_response_is_valid_with_metadata() {
    let server = link_server::start(vec![(
        "/ok",
        Route::status(200)
            .header("Content-Length", "1234")
            .header("Content-Type", "video/mp4")
            .header(
                "Content-Disposition",
                "attachment; filename*=UTF-8''S02E01.AAC%281%29.mp4",
            ),
    )]);
    let out = probe_url(&server.url("/ok"), &fast_probe());
    assert_eq!(out.status, LinkStatus::Valid);
    assert_eq!(out.http_status, Some(200));
    assert_eq!(out.content_length, Some(1234));
    assert_eq!(out.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(out.filename.as_deref(), Some("S02E01.AAC(1).mp4"));
    assert!(out.failure.is_none());
    assert_eq!(server.requests(), vec!["HEAD /ok".to_string()]);
}

#[test]
fn filename_falls_back_to_url_disposition() {
    let server = link_server::start(vec![("/plain", Route::status(200))]);
    let url = server.url(
        "/plain?response-content-disposition=attachment%3B%20filename%3D%22clip.mp4%22",
    );
    let out = probe_url(&url, &fast_probe());
    assert_eq!(out.status, LinkStatus::Valid);
    assert_eq!(out.filename.as_deref(), Some("clip.mp4"));
}

#[test]
fn status_codes_classify() {
    let server = link_server::start(vec![
        ("/expired", Route::status(403)),
        ("/gone", Route::status(404)),
        ("/broken", Route::status(500)),
    ]);
    let cfg = fast_probe();

    let expired = probe_url(&server.url("/expired"), &cfg);
    assert_eq!(expired.status, LinkStatus::Expired);
    assert_eq!(expired.http_status, Some(403));
    assert!(expired.failure.is_none());

    let gone = probe_url(&server.url("/gone"), &cfg);
    assert_eq!(gone.status, LinkStatus::NotFound);

    let broken = probe_url(&server.url("/broken"), &cfg);
    assert_eq!(broken.status, LinkStatus::Indeterminate);
    assert_eq!(broken.http_status, Some(500));
    assert_eq!(broken.failure.as_deref(), Some("HTTP 500"));
}

#[test]
fn timeout_is_indeterminate() {
    let server = link_server::start(vec![(
        "/slow",
        Route::status(200).delayed(Duration::from_secs(3)),
    )]);
    let out = probe_url(&server.url("/slow"), &fast_probe());
    assert_eq!(out.status, LinkStatus::Indeterminate);
    assert_eq!(out.http_status, None);
    assert!(out.failure.unwrap().starts_with("timed out"));
}

#[test]
fn refused_connection_is_indeterminate() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let out = probe_url(&format!("http://127.0.0.1:{port}/x"), &fast_probe());
    assert_eq!(out.status, LinkStatus::Indeterminate);
    assert!(out.failure.is_some());
}
