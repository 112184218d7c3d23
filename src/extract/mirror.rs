//! Mirror-list pages
//!
//! A listmirror page is not a player. It carries alternates in one of
//! three shapes, tried in order: a dropdown of `data-url` entries, a
//! `sources` array in script, or a nested iframe. Every candidate goes
//! back through the engine with the chain's depth and ancestor set, so
//! mutually-referencing mirror pages cannot loop. Sources-array entries
//! that fail to resolve degrade to browser-open fallbacks rather than
//! disappearing.

use std::collections::HashSet;

use futures::future::join_all;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::errors::AppResult;
use crate::fetch::FetchOptions;
use crate::models::ResolvedStream;

use super::hosts::host_label;
use super::{fix_scheme_relative, EmbedResolver};

pub(crate) async fn extract(
    resolver: &EmbedResolver,
    url: &str,
    referer: &str,
    depth: usize,
    visited: &HashSet<String>,
) -> AppResult<Vec<ResolvedStream>> {
    let html = resolver
        .fetcher
        .fetch(url, FetchOptions::with_referer(referer))
        .await?;

    let mut streams = Vec::new();

    let dropdown = dropdown_urls(&html);
    if !dropdown.is_empty() {
        let resolutions = join_all(dropdown.iter().map(|mirror_url| {
            resolver.resolve_chain(
                mirror_url.clone(),
                referer.to_string(),
                depth + 1,
                visited.clone(),
            )
        }))
        .await;
        for (mirror_url, outcome) in dropdown.iter().zip(resolutions) {
            match outcome {
                Ok(resolved) => streams.extend(resolved),
                Err(err) => {
                    debug!(mirror = %mirror_url, error = %err, "dropdown mirror failed")
                }
            }
        }
    }

    if streams.is_empty() {
        if let Some(raw) = sources_array(&html) {
            for entry in source_entries(&raw) {
                let outcome = resolver
                    .resolve_chain(
                        entry.clone(),
                        referer.to_string(),
                        depth + 1,
                        visited.clone(),
                    )
                    .await;
                match outcome {
                    Ok(resolved) if !resolved.is_empty() => streams.extend(resolved),
                    _ => streams.push(ResolvedStream::external(
                        format!("{} (Browser)", host_label(&entry)),
                        entry,
                    )),
                }
            }
        }
    }

    if streams.is_empty() {
        if let Some(iframe_url) = nested_iframe(&html, url) {
            if let Ok(resolved) = resolver
                .resolve_chain(iframe_url, referer.to_string(), depth + 1, visited.clone())
                .await
            {
                streams.extend(resolved);
            }
        }
    }

    Ok(streams)
}

fn dropdown_urls(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a.mirror-opt, .dropdown-item.mirror-opt") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("data-url"))
        .filter(|data_url| *data_url != "#" && !data_url.trim().is_empty())
        .map(fix_scheme_relative)
        .filter(|mirror_url| seen.insert(mirror_url.clone()))
        .collect()
}

/// The script-defined `sources` array, captured raw
fn sources_array(html: &str) -> Option<String> {
    let re = Regex::new(r"(?:const\s+)?sources\s*=\s*(\[[\s\S]*?\])").ok()?;
    Some(re.captures(html)?.get(1)?.as_str().to_string())
}

/// Embed URLs out of a `sources` array. The array is JS, not JSON: quotes
/// and bare keys are repaired before parsing, and a plain `"url"` scan
/// covers arrays the repair cannot fix.
fn source_entries(raw: &str) -> Vec<String> {
    let quoted = raw.replace('\'', "\"");
    let repaired = match Regex::new(r"(\w+)\s*:") {
        Ok(key_re) => key_re.replace_all(&quoted, "\"$1\":").into_owned(),
        Err(_) => quoted.clone(),
    };

    if let Ok(serde_json::Value::Array(entries)) =
        serde_json::from_str::<serde_json::Value>(&repaired)
    {
        return entries
            .iter()
            .filter_map(|entry| {
                entry
                    .get("url")
                    .or_else(|| entry.get("file"))
                    .or_else(|| entry.get("src"))
                    .and_then(|v| v.as_str())
            })
            .map(fix_scheme_relative)
            .collect();
    }

    let Ok(url_re) = Regex::new(r#""url"\s*:\s*"([^"]+)""#) else {
        return Vec::new();
    };
    url_re
        .captures_iter(&quoted)
        .filter_map(|c| c.get(1).map(|m| fix_scheme_relative(m.as_str())))
        .collect()
}

fn nested_iframe(html: &str, page_url: &str) -> Option<String> {
    let selector = Selector::parse("iframe.mirror-iframe, iframe").ok()?;
    let document = Html::parse_document(html);
    let src = document
        .select(&selector)
        .find_map(|element| element.value().attr("src"))?;
    if src == page_url {
        return None;
    }
    Some(fix_scheme_relative(src))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;
    use crate::models::StreamKind;
    use std::sync::Arc;

    fn resolver_with(fetcher: Arc<FakeFetcher>) -> EmbedResolver {
        EmbedResolver::new(fetcher)
    }

    #[tokio::test]
    async fn test_dropdown_mirrors_resolve_in_parallel() {
        let list_page = r##"<ul id="mirrorMenu">
            <li><a class="mirror-opt" data-url="#">choose</a></li>
            <li><a class="mirror-opt" data-url="//voe.sx/e/m1">Voe</a></li>
            <li><a class="mirror-opt" data-url="https://down.example/e/m2">Down</a></li>
        </ul>"##;
        let voe_page =
            r#"<script>const sources = {"hls": "https://edge.example/m1.m3u8"};</script>"#;
        let fetcher = Arc::new(
            FakeFetcher::new()
                .page("https://listmirror.com/v/77", list_page)
                .page("https://voe.sx/e/m1", voe_page),
        );
        let resolver = resolver_with(fetcher.clone());

        let streams = resolver
            .resolve_embed("https://listmirror.com/v/77", "https://site.example/watch/7")
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].dedup_url(), "https://edge.example/m1.m3u8");
        assert!(fetcher
            .requested_urls()
            .contains(&"https://down.example/e/m2".to_string()));
    }

    #[tokio::test]
    async fn test_sources_array_entries_degrade_to_browser_fallbacks() {
        let list_page = r#"<script>
            var sources = [{url: '//dead.example/e/a'}, {file: '//gone.example/e/b'}];
        </script>"#;
        let fetcher = Arc::new(FakeFetcher::new().page("https://listmirror.com/v/9", list_page));
        let resolver = resolver_with(fetcher);

        let streams = resolver
            .resolve_embed("https://listmirror.com/v/9", "https://site.example/watch/9")
            .await
            .unwrap();

        assert_eq!(streams.len(), 2);
        for stream in &streams {
            assert!(matches!(stream.kind, StreamKind::External { .. }));
            assert!(stream.name.ends_with("(Browser)"));
        }
        assert_eq!(streams[0].dedup_url(), "https://dead.example/e/a");
        assert_eq!(streams[1].dedup_url(), "https://gone.example/e/b");
    }

    #[tokio::test]
    async fn test_nested_iframe_fallback() {
        let list_page = r#"<iframe class="mirror-iframe" src="//bgwp.cc/e/n3"></iframe>"#;
        let player = r#"<script>setup({file: "https://bw.example/n3.mp4"});</script>"#;
        let fetcher = Arc::new(
            FakeFetcher::new()
                .page("https://listmirror.com/v/n3", list_page)
                .page("https://bgwp.cc/e/n3", player),
        );
        let resolver = resolver_with(fetcher);

        let streams = resolver
            .resolve_embed("https://listmirror.com/v/n3", "https://site.example/watch/3")
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "BigWarp");
        assert_eq!(streams[0].dedup_url(), "https://bw.example/n3.mp4");
    }

    #[test]
    fn test_source_entries_repairs_bare_keys_and_quotes() {
        let entries = source_entries(r#"[{url: '//a.example/1'}, {file: '/local/2'}, {}]"#);
        assert_eq!(entries, vec!["https://a.example/1".to_string(), "/local/2".to_string()]);
    }

    #[test]
    fn test_source_entries_json_scan_fallback() {
        // absolute URLs defeat the key repair, the "url" scan still finds
        // double-quoted entries
        let entries = source_entries(r#"[{"url": "https://b.example/x", "label": "HD",}]"#);
        assert_eq!(entries, vec!["https://b.example/x".to_string()]);
    }

    #[test]
    fn test_dropdown_skips_placeholder_and_duplicates() {
        let html = r##"
            <a class="mirror-opt" data-url="#"></a>
            <a class="mirror-opt" data-url="https://m.example/1"></a>
            <a class="dropdown-item mirror-opt" data-url="https://m.example/1"></a>
            <a class="mirror-opt" data-url="  "></a>
        "##;
        assert_eq!(dropdown_urls(html), vec!["https://m.example/1".to_string()]);
    }
}
