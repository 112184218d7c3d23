//! Dood-network token exchange
//!
//! These hosts do not embed a media URL at all. The embed page carries a
//! `/pass_md5/...` path; fetching that path (with the embed page as
//! referer) returns the base of the real video URL, which the player then
//! completes with a random 10-character suffix and `token`/`expiry` query
//! parameters. The suffix content is irrelevant upstream, only its shape
//! matters.

use chrono::Utc;
use regex::Regex;
use url::Url;

use crate::errors::{AppResult, ExtractError};
use crate::fetch::{FetchOptions, PageFetch};
use crate::models::ResolvedStream;

const SUFFIX_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 10;

pub(crate) async fn extract(
    fetcher: &dyn PageFetch,
    url: &str,
    referer: Option<&str>,
) -> AppResult<Vec<ResolvedStream>> {
    let parsed = Url::parse(url)
        .map_err(|_| ExtractError::pattern_mismatch("dood", format!("unparsable url {url}")))?;
    let origin = parsed.origin().ascii_serialization();
    let video_id = last_path_segment(parsed.path());

    let embed_url = if url.contains("/e/") {
        url.to_string()
    } else {
        format!("{origin}/e/{video_id}")
    };

    let html = fetcher
        .fetch(
            &embed_url,
            FetchOptions::with_referer(referer.unwrap_or(url)),
        )
        .await?;

    let Some(pass_path) = pass_md5_path(&html) else {
        return Err(ExtractError::pattern_mismatch("dood", "pass_md5 path not present").into());
    };
    let token = pass_path.rsplit('/').next().unwrap_or("").to_string();

    let md5_url = format!("{origin}{pass_path}");
    let payload_base = fetcher
        .fetch(&md5_url, FetchOptions::with_referer(embed_url.clone()))
        .await?;

    let final_url = format!(
        "{payload_base}{suffix}?token={token}&expiry={expiry}",
        suffix = random_suffix(),
        expiry = Utc::now().timestamp_millis()
    );

    let mut stream = ResolvedStream::direct("DoodStream", final_url).with_referer(origin);
    if let Some(quality) = title_quality(&html) {
        stream = stream.with_quality(quality);
    }

    Ok(vec![stream])
}

/// Last path segment, falling back to the one before a trailing slash
fn last_path_segment(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    parts
        .iter()
        .rev()
        .find(|part| !part.is_empty())
        .copied()
        .unwrap_or("")
        .to_string()
}

fn pass_md5_path(html: &str) -> Option<String> {
    let re = Regex::new(r#"/pass_md5/[^'"]*"#).ok()?;
    Some(re.find(html)?.as_str().to_string())
}

fn random_suffix() -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[fastrand::usize(..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Quality hint from the page title, e.g. "clip 1080P HD" yields "1080p"
fn title_quality(html: &str) -> Option<String> {
    let re = Regex::new(r"<title>.*?(\d{3,4})[pP].*?</title>").ok()?;
    let captures = re.captures(html)?;
    Some(format!("{}p", &captures[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;
    use crate::models::StreamKind;

    const EMBED_BODY: &str = r#"<html><head><title>my clip 1080P - DoodStream</title></head>
        <script>
        $.get('/pass_md5/81126-152-371/pYneqEFTPkWcjwRs3BYLkA', function(data) {});
        </script></html>"#;

    #[tokio::test]
    async fn test_token_exchange_builds_expected_url_shape() {
        let fetcher = FakeFetcher::new()
            .page("https://dood.wf/e/h2a9z", EMBED_BODY)
            .page(
                "https://dood.wf/pass_md5/81126-152-371/pYneqEFTPkWcjwRs3BYLkA",
                "https://c4.dood.video/abc123~/",
            );

        let before = Utc::now().timestamp_millis();
        let streams = extract(&fetcher, "https://dood.wf/e/h2a9z", None).await.unwrap();
        let after = Utc::now().timestamp_millis();

        assert_eq!(streams.len(), 1);
        let stream = &streams[0];
        assert_eq!(stream.name, "DoodStream");
        assert_eq!(stream.quality.as_deref(), Some("1080p"));
        assert_eq!(stream.referer.as_deref(), Some("https://dood.wf"));

        let StreamKind::Direct { url } = &stream.kind else {
            panic!("token exchange must produce a direct stream");
        };
        let shape = Regex::new(
            r"^https://c4\.dood\.video/abc123~/([A-Za-z0-9]{10})\?token=pYneqEFTPkWcjwRs3BYLkA&expiry=(\d+)$",
        )
        .unwrap();
        let captures = shape.captures(url).expect("final url shape");
        let expiry: i64 = captures[2].parse().unwrap();
        assert!(expiry >= before && expiry <= after);
    }

    #[tokio::test]
    async fn test_md5_fetch_carries_embed_referer() {
        let fetcher = FakeFetcher::new()
            .page("https://d0o0d.com/e/h2a9z", EMBED_BODY)
            .page(
                "https://d0o0d.com/pass_md5/81126-152-371/pYneqEFTPkWcjwRs3BYLkA",
                "https://c4.dood.video/abc123~/",
            );

        extract(&fetcher, "https://d0o0d.com/e/h2a9z", Some("https://site.example/watch/9"))
            .await
            .unwrap();

        assert_eq!(
            fetcher
                .referer_for("https://d0o0d.com/pass_md5/81126-152-371/pYneqEFTPkWcjwRs3BYLkA")
                .as_deref(),
            Some("https://d0o0d.com/e/h2a9z")
        );
        assert_eq!(
            fetcher.referer_for("https://d0o0d.com/e/h2a9z").as_deref(),
            Some("https://site.example/watch/9")
        );
    }

    #[tokio::test]
    async fn test_download_style_url_normalized_to_embed_path() {
        let fetcher = FakeFetcher::new()
            .page("https://dood.wf/e/h2a9z", EMBED_BODY)
            .page(
                "https://dood.wf/pass_md5/81126-152-371/pYneqEFTPkWcjwRs3BYLkA",
                "https://c4.dood.video/abc123~/",
            );

        let streams = extract(&fetcher, "https://dood.wf/d/h2a9z/", None).await.unwrap();

        assert_eq!(streams.len(), 1);
        assert_eq!(
            fetcher.requested_urls()[0],
            "https://dood.wf/e/h2a9z",
            "non-embed paths are rewritten to /e/<id>"
        );
    }

    #[tokio::test]
    async fn test_missing_pass_md5_is_a_pattern_mismatch() {
        let fetcher =
            FakeFetcher::new().page("https://dood.wf/e/h2a9z", "<html>file removed</html>");
        let err = extract(&fetcher, "https://dood.wf/e/h2a9z", None).await.unwrap_err();
        assert!(err.to_string().contains("pass_md5"));
    }

    #[test]
    fn test_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_last_path_segment_handles_trailing_slash() {
        assert_eq!(last_path_segment("/d/h2a9z"), "h2a9z");
        assert_eq!(last_path_segment("/d/h2a9z/"), "h2a9z");
        assert_eq!(last_path_segment("/"), "");
    }
}
