//! Direct-JSON embed hosts
//!
//! Covers the voe-style players (and their rotating alias domains) plus
//! vidoza, which both embed the media URL directly in page script. The
//! stages run in order and stop at the first hit: inline `sources` object,
//! vidoza's `sourcesCode` array, literal `<source>` tags, then bare
//! m3u8/mp4 URL scans as a last resort.

use regex::Regex;

use crate::errors::AppResult;
use crate::fetch::{FetchOptions, PageFetch};
use crate::models::ResolvedStream;

use super::hosts::host_label;

pub(crate) async fn extract(
    fetcher: &dyn PageFetch,
    url: &str,
    referer: Option<&str>,
) -> AppResult<Vec<ResolvedStream>> {
    let options = FetchOptions::with_referer(referer.unwrap_or(url));
    let html = fetcher.fetch(url, options).await?;
    let label = host_label(url);

    let mut streams = Vec::new();

    if let Some(hls) = sources_object_hls(&html) {
        streams.push(ResolvedStream::direct(label.clone(), hls).with_referer(url));
    }

    if streams.is_empty() {
        for src in sources_code_entries(&html) {
            streams.push(ResolvedStream::direct(label.clone(), src).with_referer(url));
        }
    }

    if streams.is_empty() {
        for src in source_tag_urls(&html) {
            streams.push(ResolvedStream::direct(label.clone(), src).with_referer(url));
        }
    }

    if streams.is_empty() {
        if let Some(file) = first_capture(
            &html,
            r#"file\s*:\s*["'](https?://[^"']+\.(?:mp4|m3u8)[^"']*)["']"#,
        ) {
            streams.push(ResolvedStream::direct(label.clone(), file).with_referer(url));
        }
    }

    if streams.is_empty() {
        if let Some(hls) = first_capture(&html, r#"https?://[^\s"']+\.m3u8[^\s"']*"#) {
            streams.push(ResolvedStream::direct(label.clone(), hls).with_referer(url));
        }
    }

    if streams.is_empty() {
        if let Some(mp4) = first_capture(&html, r#"https?://[^\s"'<>]+\.mp4[^\s"'<>]*"#) {
            streams.push(ResolvedStream::direct(label, mp4).with_referer(url));
        }
    }

    Ok(streams)
}

/// The `const sources = {...}` block with an `"hls"` entry
fn sources_object_hls(html: &str) -> Option<String> {
    let block_re = Regex::new(r"const\s+sources\s*=\s*(\{[^}]+\})").ok()?;
    let captures = block_re.captures(html)?;
    let block = captures.get(1)?.as_str();
    let hls_re = Regex::new(r#""hls"\s*:\s*"([^"]+)""#).ok()?;
    Some(hls_re.captures(block)?.get(1)?.as_str().to_string())
}

/// All `src:` entries inside a `sourcesCode = [...]` array
fn sources_code_entries(html: &str) -> Vec<String> {
    let Ok(block_re) = Regex::new(r"sourcesCode\s*=\s*(\[[\s\S]*?\])\s*;") else {
        return Vec::new();
    };
    let Some(captures) = block_re.captures(html) else {
        return Vec::new();
    };
    let block = captures.get(1).map_or("", |m| m.as_str());
    let Ok(src_re) = Regex::new(r#"src:\s*["']([^"']+)["']"#) else {
        return Vec::new();
    };
    src_re
        .captures_iter(block)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Media URLs from literal `<source src=...>` tags
fn source_tag_urls(html: &str) -> Vec<String> {
    let Ok(tag_re) = Regex::new(r#"(?i)<source\s+src=["']([^"']+)["'][^>]*>"#) else {
        return Vec::new();
    };
    tag_re
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .filter(|src| src.contains(".mp4") || src.contains(".m3u8"))
        .collect()
}

fn first_capture(html: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let captures = re.captures(html)?;
    let matched = captures.get(1).or_else(|| captures.get(0))?;
    Some(matched.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;
    use crate::models::StreamKind;

    #[tokio::test]
    async fn test_sources_object_wins_over_later_stages() {
        let body = r#"<html><script>
            const sources = {"hls": "https://delivery.example/hls/master.m3u8", "video_height": 720};
        </script>
        https://decoy.example/other.m3u8
        </html>"#;
        let fetcher = FakeFetcher::new().page("https://voe.sx/e/abc", body);

        let streams = extract(&fetcher, "https://voe.sx/e/abc", Some("https://site.example/watch/1"))
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "VOE");
        assert_eq!(
            streams[0].kind,
            StreamKind::Direct {
                url: "https://delivery.example/hls/master.m3u8".to_string()
            }
        );
        assert_eq!(streams[0].referer.as_deref(), Some("https://voe.sx/e/abc"));
        assert_eq!(
            fetcher.referer_for("https://voe.sx/e/abc").as_deref(),
            Some("https://site.example/watch/1")
        );
    }

    #[tokio::test]
    async fn test_vidoza_sources_code_array_yields_every_entry() {
        let body = r#"<script>
        var sourcesCode = [
            { src: "https://str42.vidoza.net/v/low.mp4", res: "480" },
            { src: "https://str42.vidoza.net/v/high.mp4", res: "1080" }
        ] ;
        </script>"#;
        let fetcher = FakeFetcher::new().page("https://vidoza.net/embed-q.html", body);

        let streams = extract(&fetcher, "https://vidoza.net/embed-q.html", None)
            .await
            .unwrap();

        assert_eq!(streams.len(), 2);
        assert!(streams.iter().all(|s| s.name == "Vidoza"));
        assert_eq!(
            streams[0].kind,
            StreamKind::Direct {
                url: "https://str42.vidoza.net/v/low.mp4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_source_tags_filtered_to_media_extensions() {
        let body = r#"<video>
            <source src="https://cdn.example/clip.mp4" type="video/mp4">
            <source src="https://cdn.example/thumb.jpg">
        </video>"#;
        let fetcher = FakeFetcher::new().page("https://vidoza.net/embed-r.html", body);

        let streams = extract(&fetcher, "https://vidoza.net/embed-r.html", None)
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].dedup_url(), "https://cdn.example/clip.mp4");
    }

    #[tokio::test]
    async fn test_bare_m3u8_scan_as_fallback() {
        let body = "player.load('https://edge7.voe-network.net/engine/hls2/01/master.m3u8?t=sig');";
        let fetcher = FakeFetcher::new().page("https://jilliandescribecompany.com/e/xyz", body);

        let streams = extract(&fetcher, "https://jilliandescribecompany.com/e/xyz", None)
            .await
            .unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "VOE");
        assert_eq!(
            streams[0].dedup_url(),
            "https://edge7.voe-network.net/engine/hls2/01/master.m3u8?t=sig"
        );
    }

    #[tokio::test]
    async fn test_no_pattern_yields_empty() {
        let fetcher = FakeFetcher::new().page("https://voe.sx/e/gone", "<html>deleted</html>");
        let streams = extract(&fetcher, "https://voe.sx/e/gone", None).await.unwrap();
        assert!(streams.is_empty());
    }
}
