//! Embed resolution engine
//!
//! Turns a site's watch page into playable streams. Discovery finds embed
//! candidates in the page (player iframes, tab buttons, mirror dropdowns,
//! bare anchors to known hosts), then every candidate is resolved
//! concurrently through the host-family dispatch. A candidate that cannot
//! be resolved, for any reason, still surfaces as a browser-open fallback
//! entry so the user never loses a mirror the page offered.

pub mod hosts;
pub mod packed;

mod doodstream;
mod filemoon;
mod generic;
mod mirror;
mod streamtape;
mod voe;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::errors::AppResult;
use crate::fetch::{FetchOptions, PageFetch};
use crate::models::ResolvedStream;

pub use hosts::{classify, host_label, is_known_embed_host, HostFamily};

/// How many mirror hops a resolution chain may take
const MAX_MIRROR_DEPTH: usize = 2;

/// Site-tunable rules for locating embed candidates on a watch page
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRules {
    /// Selectors whose matching iframes carry embed URLs
    pub iframe_selectors: &'static [&'static str],
    /// Selector for player-switch buttons whose onclick holds the embed URL;
    /// iframes are only consulted when the buttons yield nothing
    pub button_onclick_selector: Option<&'static str>,
    /// Selectors for mirror dropdown entries carrying `data-url`
    pub mirror_menu_selectors: &'static [&'static str],
    /// Selectors for content areas whose anchors may point at embed hosts
    pub anchor_scan_selectors: &'static [&'static str],
    /// Selector for a direct download anchor on the watch page
    pub download_selector: Option<&'static str>,
}

/// Everything discovery pulled out of one watch page
#[derive(Debug, Default, PartialEq)]
struct Discovery {
    embed_urls: Vec<String>,
    download_url: Option<String>,
}

#[derive(Clone)]
pub struct EmbedResolver {
    fetcher: Arc<dyn PageFetch>,
}

impl EmbedResolver {
    pub fn new(fetcher: Arc<dyn PageFetch>) -> Self {
        Self { fetcher }
    }

    /// Resolve a watch page into its full stream list
    pub async fn resolve_watch_page(
        &self,
        page_url: &str,
        site_referer: Option<&str>,
        rules: &DiscoveryRules,
    ) -> AppResult<Vec<ResolvedStream>> {
        let options = match site_referer {
            Some(referer) => FetchOptions::with_referer(referer),
            None => FetchOptions::default(),
        };
        let html = self.fetcher.fetch(page_url, options).await?;

        let discovery = discover(&html, rules);
        debug!(
            page = %page_url,
            candidates = discovery.embed_urls.len(),
            "discovered embed candidates"
        );

        let mut streams = Vec::new();
        if let Some(download_url) = &discovery.download_url {
            streams.push(
                ResolvedStream::direct("Download", download_url.clone()).with_referer(page_url),
            );
        }

        let resolutions = join_all(
            discovery
                .embed_urls
                .iter()
                .map(|embed_url| self.resolve_embed(embed_url, page_url)),
        )
        .await;

        for (embed_url, outcome) in discovery.embed_urls.iter().zip(resolutions) {
            match outcome {
                Ok(resolved) if !resolved.is_empty() => streams.extend(resolved),
                Ok(_) => {
                    debug!(embed = %embed_url, "embed resolved empty, adding browser fallback");
                    streams.push(browser_fallback(embed_url));
                }
                Err(err) => {
                    warn!(embed = %embed_url, error = %err, "embed resolution failed");
                    streams.push(browser_fallback(embed_url));
                }
            }
        }

        Ok(dedup(streams))
    }

    /// Resolve a single embed URL into direct streams
    pub async fn resolve_embed(
        &self,
        embed_url: &str,
        referer: &str,
    ) -> AppResult<Vec<ResolvedStream>> {
        self.resolve_chain(
            embed_url.to_string(),
            referer.to_string(),
            0,
            HashSet::new(),
        )
        .await
    }

    /// Depth-capped, cycle-guarded dispatch on the host family. Mirror
    /// pages feed their candidates back through here with the ancestor set
    /// of the chain, which is what terminates mutual-reference loops.
    fn resolve_chain(
        &self,
        url: String,
        referer: String,
        depth: usize,
        mut visited: HashSet<String>,
    ) -> BoxFuture<'_, AppResult<Vec<ResolvedStream>>> {
        Box::pin(async move {
            let url = fix_scheme_relative(&url);
            if depth > MAX_MIRROR_DEPTH || !visited.insert(url.clone()) {
                debug!(url = %url, depth, "mirror chain cut");
                return Ok(Vec::new());
            }

            let fetcher = self.fetcher.as_ref();
            match hosts::classify(&url) {
                HostFamily::DirectJson => voe::extract(fetcher, &url, Some(&referer)).await,
                HostFamily::TokenExchange => {
                    doodstream::extract(fetcher, &url, Some(&referer)).await
                }
                HostFamily::InlineJs => streamtape::extract(fetcher, &url).await,
                HostFamily::PackedJs => filemoon::extract(fetcher, &url).await,
                HostFamily::FileLiteral => generic::extract_bigwarp(fetcher, &url).await,
                HostFamily::MirrorList => {
                    mirror::extract(self, &url, &referer, depth, &visited).await
                }
                HostFamily::Generic => generic::extract(fetcher, &url).await,
            }
        })
    }
}

/// Scheme-relative URLs from page markup become https
pub(crate) fn fix_scheme_relative(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

fn browser_fallback(embed_url: &str) -> ResolvedStream {
    ResolvedStream::external(
        format!("{} (Browser)", host_label(embed_url)),
        embed_url,
    )
}

/// Keep-first dedup on the playable URL
fn dedup(streams: Vec<ResolvedStream>) -> Vec<ResolvedStream> {
    let mut seen = HashSet::new();
    streams
        .into_iter()
        .filter(|stream| seen.insert(stream.dedup_url().to_string()))
        .collect()
}

/// Run every discovery rule over the page and collect candidates in rule
/// order, first occurrence winning on duplicates
fn discover(html: &str, rules: &DiscoveryRules) -> Discovery {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut embed_urls = Vec::new();

    if let Some(selector_str) = rules.button_onclick_selector {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let onclick = element.value().attr("onclick").unwrap_or("");
                if let Some(src) = onclick_src(onclick) {
                    push_unique(&mut embed_urls, &mut seen, src);
                }
            }
        }
    }

    let buttons_found = !embed_urls.is_empty();
    if !buttons_found {
        for selector_str in rules.iframe_selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                for element in document.select(&selector) {
                    if let Some(src) = element.value().attr("src") {
                        push_unique(&mut embed_urls, &mut seen, fix_scheme_relative(src));
                    }
                }
            }
        }
    }

    for selector_str in rules.mirror_menu_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                if let Some(data_url) = element.value().attr("data-url") {
                    if data_url != "#" && !data_url.trim().is_empty() {
                        push_unique(&mut embed_urls, &mut seen, fix_scheme_relative(data_url));
                    }
                }
            }
        }
    }

    for selector_str in rules.anchor_scan_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                if let Some(href) = element.value().attr("href") {
                    if is_known_embed_host(href) {
                        push_unique(&mut embed_urls, &mut seen, href.to_string());
                    }
                }
            }
        }
    }

    let download_url = rules.download_selector.and_then(|selector_str| {
        let selector = Selector::parse(selector_str).ok()?;
        let href = document
            .select(&selector)
            .find_map(|element| element.value().attr("href"))?;
        Some(fix_scheme_relative(href))
    });

    Discovery {
        embed_urls,
        download_url,
    }
}

/// Embed URL out of a player-switch button's onclick attribute
fn onclick_src(onclick: &str) -> Option<String> {
    let re = Regex::new(r#"src=(?:&quot;|"|')(.*?)(?:&quot;|"|')"#).ok()?;
    let captured = re.captures(onclick)?.get(1)?.as_str();
    if captured.is_empty() {
        return None;
    }
    Some(fix_scheme_relative(captured))
}

fn push_unique(urls: &mut Vec<String>, seen: &mut HashSet<String>, url: String) {
    if seen.insert(url.clone()) {
        urls.push(url);
    }
}
