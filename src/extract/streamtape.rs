//! Streamtape-style inline script assembly
//!
//! The page builds its download link in script by assigning a scheme-less
//! base into a DOM node and concatenating a token expression, with the
//! trailing piece of the token hidden in a second concatenation further
//! down the page. Both the current `robotlink` node id and the older
//! `ideoooolink` one are recognized.

use regex::Regex;

use crate::errors::AppResult;
use crate::fetch::{FetchOptions, PageFetch};
use crate::models::ResolvedStream;

pub(crate) async fn extract(fetcher: &dyn PageFetch, url: &str) -> AppResult<Vec<ResolvedStream>> {
    let html = fetcher.fetch(url, FetchOptions::default()).await?;

    if let Some(full_url) = assemble_link(&html) {
        return Ok(vec![
            ResolvedStream::direct("StreamTape", full_url).with_referer(url)
        ]);
    }

    if let Some(partial) = loose_link(&html) {
        return Ok(vec![
            ResolvedStream::direct("StreamTape", partial).with_referer(url)
        ]);
    }

    Ok(Vec::new())
}

/// Primary form: `...innerHTML = '//host/get_video?...' + ('token')` with an
/// optional `+ 'tail'` continuation after the token
fn assemble_link(html: &str) -> Option<String> {
    let re = Regex::new(
        r#"document\.getElementById\('(?:robotlink|ideoooolink)'\)\.innerHTML\s*=\s*["'](//[^"']+)["']\s*\+\s*\('([^']+)'\)"#,
    )
    .ok()?;
    let captures = re.captures(html)?;
    let base = format!("https:{}", &captures[1]);
    let token = captures.get(2)?.as_str();

    let tail_re = Regex::new(&format!(
        r"'{}'\)\s*\+\s*'([^']*)'",
        regex::escape(token)
    ))
    .ok()?;
    let tail = tail_re
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str());

    Some(format!("{base}{token}{tail}"))
}

/// Fallback for assignments whose first operand is not a plain literal; only
/// accepted when the captured piece is scheme-relative
fn loose_link(html: &str) -> Option<String> {
    let re = Regex::new(
        r#"document\.getElementById\('(?:robotlink|ideoooolink)'\)\.innerHTML\s*=\s*[^+]+\+\s*['"]([^'"]+)['"]"#,
    )
    .ok()?;
    let partial = re.captures(html)?.get(1)?.as_str();
    if partial.starts_with("//") {
        Some(format!("https:{partial}"))
    } else {
        None
    }
}
