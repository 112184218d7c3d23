//! Packed-script embed hosts
//!
//! The player config only exists inside an eval-packed script. After
//! unpacking, three shapes are tried: a `var links={...}` map of quality
//! labels to (possibly relative) URLs, bare m3u8 URLs, then a `file:`
//! literal. Pages where unpacking fails fall back to a `file:` literal in
//! the raw HTML.

use regex::Regex;
use url::Url;

use crate::errors::AppResult;
use crate::fetch::{FetchOptions, PageFetch};
use crate::models::ResolvedStream;

use super::hosts::host_label;
use super::packed;

pub(crate) async fn extract(fetcher: &dyn PageFetch, url: &str) -> AppResult<Vec<ResolvedStream>> {
    let html = fetcher.fetch(url, FetchOptions::default()).await?;
    let label = host_label(url);

    let mut streams = Vec::new();

    if let Some(unpacked) = packed::find_eval_block(&html).and_then(packed::unpack) {
        streams.extend(links_map_streams(&unpacked, url));

        if streams.is_empty() {
            for hls in hls_urls(&unpacked) {
                streams.push(ResolvedStream::direct(label.clone(), hls).with_referer(url));
            }
        }

        if streams.is_empty() {
            if let Some(file) = file_literal(&unpacked, false) {
                streams.push(ResolvedStream::direct(label.clone(), file).with_referer(url));
            }
        }
    }

    if streams.is_empty() {
        if let Some(file) = file_literal(&html, true) {
            streams.push(ResolvedStream::direct(label, file).with_referer(url));
        }
    }

    Ok(streams)
}

/// Quality-keyed link map, kept in source order so the page's own quality
/// ordering survives into the stream list
fn links_map_streams(unpacked: &str, embed_url: &str) -> Vec<ResolvedStream> {
    let Ok(map_re) = Regex::new(r"var links=\{(.+?)\}") else {
        return Vec::new();
    };
    let Some(captures) = map_re.captures(unpacked) else {
        return Vec::new();
    };
    let body = captures.get(1).map_or("", |m| m.as_str()).replace('\'', "\"");

    let Ok(pair_re) = Regex::new(r#""([^"]+)"\s*:\s*"([^"]+)""#) else {
        return Vec::new();
    };

    let label = host_label(embed_url);
    pair_re
        .captures_iter(&body)
        .filter_map(|c| {
            let quality = c.get(1)?.as_str();
            let target = c.get(2)?.as_str();
            Some(
                ResolvedStream::direct(label.clone(), absolutize(target, embed_url))
                    .with_quality(quality),
            )
        })
        .collect()
}

/// Page-relative link targets are joined onto the embed page's origin
fn absolutize(target: &str, embed_url: &str) -> String {
    if target.starts_with("http") {
        return target.to_string();
    }
    match Url::parse(embed_url) {
        Ok(parsed) => {
            let origin = parsed.origin().ascii_serialization();
            let separator = if target.starts_with('/') { "" } else { "/" };
            format!("{origin}{separator}{target}")
        }
        Err(_) => target.to_string(),
    }
}

fn hls_urls(unpacked: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r#"https?://[^\s"'\\}]+\.m3u8[^\s"'\\}]*"#) else {
        return Vec::new();
    };
    re.find_iter(unpacked).map(|m| m.as_str().to_string()).collect()
}

fn file_literal(text: &str, require_absolute: bool) -> Option<String> {
    let pattern = if require_absolute {
        r#"file\s*:\s*["'](https?://[^"']+)["']"#
    } else {
        r#"file\s*:\s*["']([^"']+)["']"#
    };
    let re = Regex::new(pattern).ok()?;
    Some(re.captures(text)?.get(1)?.as_str().to_string())
}
