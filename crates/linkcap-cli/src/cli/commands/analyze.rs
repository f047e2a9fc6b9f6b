//! `linkcap analyze <url>`: print a signed URL's decomposition.

use anyhow::Result;
use linkcap_core::config::LinkcapConfig;
use linkcap_core::signed_url::{decompose_for_domain, DecodedPayload};

pub fn run_analyze(cfg: &LinkcapConfig, url: &str, json: bool) -> Result<()> {
    let d = decompose_for_domain(url, &cfg.storage_domain);
    if json {
        println!("{}", serde_json::to_string_pretty(&d)?);
        return Ok(());
    }

    println!("host:       {}", d.host.as_deref().unwrap_or("-"));
    println!("region:     {}", d.region.as_deref().unwrap_or("-"));
    println!("recognized: {}", d.recognized());
    println!("bucket:     {}", d.layout.bucket.as_deref().unwrap_or("-"));
    println!("owner:      {}", d.layout.owner.as_deref().unwrap_or("-"));
    println!("object:     {}", d.layout.object.as_deref().unwrap_or("-"));
    for extra in &d.layout.extra {
        println!("extra:      {extra}");
    }

    let p = &d.params;
    if let Some(expiry) = &p.expires {
        match (expiry.at, d.is_expired()) {
            (Some(at), Some(expired)) => {
                let state = if expired { "expired" } else { "live" };
                println!("expires:    {} ({state})", at.to_rfc3339());
            }
            _ => println!("expires:    {} (unparsable)", expiry.raw),
        }
    }
    if let Some(key) = &p.access_key_id {
        println!("access key: {key}");
    }
    if let Some(token) = &p.security_token {
        println!("sts token:  {} chars", token.length);
    }
    if let Some(sig) = &p.signature {
        println!("signature:  {sig}");
    }
    if let Some(name) = &p.filename {
        println!("filename:   {name}");
    }
    for (label, payload) in [
        ("pds-params", &p.pds_params),
        ("callback", &p.callback),
        ("callback-var", &p.callback_var),
    ] {
        match payload {
            Some(DecodedPayload::Json(v)) => {
                println!("{label}:");
                println!("{}", serde_json::to_string_pretty(v)?);
            }
            Some(DecodedPayload::Text(t)) => println!("{label}: {t}"),
            Some(DecodedPayload::Undecodable(raw)) => println!("{label}: <undecodable> {raw}"),
            None => {}
        }
    }
    for (k, v) in &d.passthrough {
        println!("param {k} = {v}");
    }
    for a in &d.anomalies {
        println!("note: {a}");
    }
    Ok(())
}
