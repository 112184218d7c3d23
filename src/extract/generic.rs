//! File-literal and last-resort extraction
//!
//! Bigwarp-style hosts park the player behind a scripted
//! `window.location.href` hop, then expose the media URL as a `file:` or
//! `src:` literal that may be scheme-relative. Hosts outside every known
//! family get a single-fetch scan for absolute `file:`/`src:` literals.

use regex::Regex;
use url::Url;

use crate::errors::AppResult;
use crate::fetch::{FetchOptions, PageFetch};
use crate::models::ResolvedStream;

use super::fix_scheme_relative;
use super::hosts::host_label;

/// Bigwarp family: follow at most one scripted redirect, then read the
/// first `file:` (or `src:`) literal
pub(crate) async fn extract_bigwarp(
    fetcher: &dyn PageFetch,
    url: &str,
) -> AppResult<Vec<ResolvedStream>> {
    let first = fetcher.fetch(url, FetchOptions::default()).await?;

    let html = match scripted_redirect(&first) {
        Some(target) => fetcher.fetch(&target, FetchOptions::default()).await?,
        None => first,
    };

    let label = host_label(url);
    let mut streams = Vec::new();

    if let Some(file) = literal(&html, r#"file:\s*["']((?:https?://|//)[^"']+)["']"#) {
        streams.push(ResolvedStream::direct(label.clone(), fix_scheme_relative(&file)));
    }

    if streams.is_empty() {
        if let Some(src) = literal(&html, r#"src:\s*["']((?:https?://|//)[^"']+)["']"#) {
            streams.push(ResolvedStream::direct(label, fix_scheme_relative(&src)));
        }
    }

    Ok(streams)
}

/// Last resort for unrecognized hosts: absolute `file:` then `src:` literals
pub(crate) async fn extract(fetcher: &dyn PageFetch, url: &str) -> AppResult<Vec<ResolvedStream>> {
    let html = fetcher.fetch(url, FetchOptions::default()).await?;
    let name = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| "Unknown".to_string());

    if let Some(file) = literal(&html, r#"file\s*:\s*["'](https?://[^"']+)["']"#) {
        return Ok(vec![ResolvedStream::direct(name, file).with_referer(url)]);
    }

    if let Some(src) = literal(&html, r#"src:\s*["'](https?://[^"']+)["']"#) {
        return Ok(vec![ResolvedStream::direct(name, src).with_referer(url)]);
    }

    Ok(Vec::new())
}

fn scripted_redirect(html: &str) -> Option<String> {
    let re = Regex::new(r#"window\.location\.href\s*=\s*["']([^"']+)["']"#).ok()?;
    Some(re.captures(html)?.get(1)?.as_str().to_string())
}

fn literal(html: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    Some(re.captures(html)?.get(1)?.as_str().to_string())
}
