//! Site providers
//!
//! One facade serves catalog listings, search, detail metadata and stream
//! lists for every built-in site. Which site handles a call is decided from
//! the catalog or content identifier; scraping behaviour comes from the
//! site's [`SiteDefinition`] record. Every operation degrades to an empty
//! result on upstream failure so one dead site never breaks the addon.

pub mod sites;

use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::cache::{CacheNamespace, CacheService};
use crate::extract::EmbedResolver;
use crate::fetch::{FetchOptions, PageFetch};
use crate::ids;
use crate::models::{CatalogItem, DetailMetadata, Stream, MEDIA_TYPE};

pub use sites::{build_manifest, SearchStyle, SiteDefinition, TitleSource, SITES};

pub struct ProviderFacade {
    fetcher: Arc<dyn PageFetch>,
    resolver: EmbedResolver,
    cache: CacheService,
}

impl ProviderFacade {
    pub fn new(fetcher: Arc<dyn PageFetch>, cache: CacheService) -> Self {
        Self {
            resolver: EmbedResolver::new(fetcher.clone()),
            fetcher,
            cache,
        }
    }

    /// One page of a browse catalog. `skip` is an item offset and is
    /// translated to the site's page number.
    pub async fn list_catalog(&self, catalog_id: &str, skip: usize) -> Vec<CatalogItem> {
        let cache_key = format!("catalog:{catalog_id}:{skip}");
        if let Some(items) = self.cache.get_typed(CacheNamespace::Catalog, &cache_key) {
            return items;
        }

        let Some(site) = sites::site_for_catalog(catalog_id) else {
            debug!(catalog = %catalog_id, "catalog id matches no site");
            return Vec::new();
        };
        let Some(catalog) = site.catalogs.iter().find(|c| c.id == catalog_id) else {
            debug!(catalog = %catalog_id, site = site.id, "unknown catalog for site");
            return Vec::new();
        };

        let page = skip / site.items_per_page + 1;
        let url = catalog_page_url(site, catalog.path, page);
        debug!(catalog = %catalog_id, page, url = %url, "fetching catalog page");

        match self.fetcher.fetch(&url, site_options(site)).await {
            Ok(html) => {
                let items = parse_listing(&html, site);
                self.cache.set_typed(CacheNamespace::Catalog, &cache_key, &items);
                items
            }
            Err(err) => {
                warn!(catalog = %catalog_id, url = %url, error = %err, "catalog fetch failed");
                Vec::new()
            }
        }
    }

    /// Search on the site owning `catalog_id`, scanning up to the site's
    /// page window and stopping early once a page contributes nothing new.
    pub async fn search(&self, catalog_id: &str, query: &str, skip: usize) -> Vec<CatalogItem> {
        let cache_key = format!("search:{catalog_id}:{query}:{skip}");
        if let Some(items) = self.cache.get_typed(CacheNamespace::Catalog, &cache_key) {
            return items;
        }

        let Some(site) = sites::site_for_catalog(catalog_id) else {
            debug!(catalog = %catalog_id, "search catalog matches no site");
            return Vec::new();
        };

        let start_page = skip / site.items_per_page + 1;
        let mut found: Vec<CatalogItem> = Vec::new();
        let mut seen = HashSet::new();

        for page in start_page..start_page + site.search_window {
            let url = search_page_url(site, query, page);
            debug!(site = site.id, page, url = %url, "fetching search page");
            let html = match self.fetcher.fetch(&url, site_options(site)).await {
                Ok(html) => html,
                Err(err) => {
                    warn!(site = site.id, page, error = %err, "search page fetch failed");
                    break;
                }
            };

            let before = found.len();
            for item in parse_listing(&html, site) {
                if seen.insert(item.id.clone()) {
                    found.push(item);
                }
            }
            if found.len() == before {
                break;
            }
        }

        self.cache.set_typed(CacheNamespace::Catalog, &cache_key, &found);
        found
    }

    /// Detail metadata for one content identifier, or `None` when the id is
    /// unknown, undecodable, or its page cannot be fetched.
    pub async fn get_detail(&self, id: &str) -> Option<DetailMetadata> {
        let cache_key = format!("meta:{id}");
        if let Some(meta) = self.cache.get_typed(CacheNamespace::Meta, &cache_key) {
            return Some(meta);
        }

        let site = sites::site_for_content(id)?;
        let url = ids::decode(site.id, id)?;

        match self.fetcher.fetch(&url, site_options(site)).await {
            Ok(html) => {
                let meta = parse_detail(&html, site, id);
                self.cache.set_typed(CacheNamespace::Meta, &cache_key, &meta);
                Some(meta)
            }
            Err(err) => {
                warn!(id = %id, url = %url, error = %err, "detail fetch failed");
                None
            }
        }
    }

    /// Wire-ready stream list for one content identifier. Empty results are
    /// not cached so a transiently dead page gets retried on the next call.
    pub async fn get_streams(&self, id: &str, proxy_base: Option<&str>) -> Vec<Stream> {
        let cache_key = format!("stream:{id}");
        if let Some(streams) = self.cache.get_typed(CacheNamespace::Stream, &cache_key) {
            return streams;
        }

        let Some(site) = sites::site_for_content(id) else {
            debug!(id = %id, "content id matches no site");
            return Vec::new();
        };
        let Some(url) = ids::decode(site.id, id) else {
            warn!(id = %id, "content id does not decode");
            return Vec::new();
        };

        let site_referer = site.send_base_referer.then_some(site.base_url);
        let resolved = match self
            .resolver
            .resolve_watch_page(&url, site_referer, &site.discovery)
            .await
        {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(id = %id, url = %url, error = %err, "stream resolution failed");
                return Vec::new();
            }
        };

        let streams: Vec<Stream> = resolved
            .iter()
            .map(|stream| Stream::from_resolved(stream, proxy_base))
            .collect();
        if !streams.is_empty() {
            self.cache.set_typed(CacheNamespace::Stream, &cache_key, &streams);
        }
        streams
    }
}

fn site_options(site: &SiteDefinition) -> FetchOptions {
    if site.send_base_referer {
        FetchOptions::with_referer(site.base_url)
    } else {
        FetchOptions::default()
    }
}

/// Page URL for a catalog path. Query-style paths take a `/page/N` prefix,
/// directory paths a `page/N/` suffix, bare paths a `/page/N` suffix.
pub fn catalog_page_url(site: &SiteDefinition, path: &str, page: usize) -> String {
    if page <= 1 {
        return format!("{}{}", site.base_url, path);
    }
    if let Some(query) = path.strip_prefix("/?") {
        format!("{}/page/{}/?{}", site.base_url, page, query)
    } else if path.ends_with('/') {
        format!("{}{}page/{}/", site.base_url, path, page)
    } else {
        format!("{}{}/page/{}", site.base_url, path, page)
    }
}

pub fn search_page_url(site: &SiteDefinition, query: &str, page: usize) -> String {
    let query = urlencoding::encode(query);
    match site.search_style {
        SearchStyle::PathPaged if page <= 1 => format!("{}/?s={}", site.base_url, query),
        SearchStyle::PathPaged => format!("{}/page/{}/?s={}", site.base_url, page, query),
        SearchStyle::QueryPaged => format!("{}/?s={}&page={}", site.base_url, query, page),
    }
}

/// Absolutize a scraped URL against the site base
fn fix_url(base: &str, url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else if url.starts_with("//") {
        format!("https:{url}")
    } else if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        format!("{base}/{url}")
    }
}

/// Items out of a listing or search results page. Rows without a link or a
/// title are dropped.
fn parse_listing(html: &str, site: &SiteDefinition) -> Vec<CatalogItem> {
    let document = Html::parse_document(html);
    let rules = &site.listing;
    let (Ok(item_selector), Ok(link_selector), Ok(poster_selector)) = (
        Selector::parse(rules.item),
        Selector::parse(rules.link),
        Selector::parse(rules.poster),
    ) else {
        return Vec::new();
    };
    let title_selector = match rules.title {
        TitleSource::Text(selector_str) => match Selector::parse(selector_str) {
            Ok(selector) => Some(selector),
            Err(_) => return Vec::new(),
        },
        TitleSource::ImgAttr => None,
    };

    let mut items = Vec::new();
    for element in document.select(&item_selector) {
        let Some(href) = element
            .select(&link_selector)
            .find_map(|link| link.value().attr("href"))
        else {
            continue;
        };

        let title = match &title_selector {
            Some(selector) => element
                .select(selector)
                .next()
                .map(|node| node.text().collect::<String>().trim().to_string()),
            None => element
                .select(&poster_selector)
                .find_map(|img| img.value().attr("title").or_else(|| img.value().attr("alt")))
                .map(|title| title.trim().to_string()),
        };
        let Some(title) = title.filter(|title| !title.is_empty()) else {
            continue;
        };

        let poster = element
            .select(&poster_selector)
            .find_map(|img| {
                img.value()
                    .attr("data-src")
                    .or_else(|| img.value().attr("src"))
            })
            .map(|src| fix_url(site.base_url, src));

        let page_url = fix_url(site.base_url, href);
        items.push(CatalogItem {
            id: ids::encode(site.id, &page_url),
            media_type: MEDIA_TYPE.to_string(),
            name: title,
            poster,
        });
    }
    items
}

/// Detail metadata out of a watch page. Schema.org itemprops win over
/// OpenGraph tags, which win over the site's fallback selectors.
fn parse_detail(html: &str, site: &SiteDefinition, id: &str) -> DetailMetadata {
    let document = Html::parse_document(html);

    let itemprop = |name: &str| {
        if !site.detail.itemprop {
            return None;
        }
        attr_content(
            &document,
            &format!(
                "article[itemtype=\"http://schema.org/VideoObject\"] meta[itemprop=\"{name}\"]"
            ),
        )
    };
    let og = |name: &str| attr_content(&document, &format!("meta[property=\"og:{name}\"]"));

    let name = itemprop("name")
        .or_else(|| og("title"))
        .or_else(|| {
            site.detail
                .title_fallback
                .and_then(|selector| text_of(&document, selector))
        })
        .or_else(|| text_of(&document, "title"))
        .unwrap_or_else(|| "Unknown".to_string());

    let poster = itemprop("thumbnailUrl")
        .or_else(|| og("image"))
        .map(|url| fix_url(site.base_url, &url));
    let description = itemprop("description").or_else(|| og("description")).or_else(|| {
        site.detail
            .description_fallback
            .and_then(|selector| text_of(&document, selector))
    });

    let cast = site.detail.cast.and_then(|selector_str| {
        let selector = Selector::parse(selector_str).ok()?;
        let names: Vec<String> = document
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        (!names.is_empty()).then_some(names)
    });

    DetailMetadata {
        id: id.to_string(),
        media_type: MEDIA_TYPE.to_string(),
        name,
        poster: poster.clone(),
        poster_shape: Some(site.poster_shape.to_string()),
        background: poster,
        description,
        cast,
    }
}

fn attr_content(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

fn text_of(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let text = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::testing::FakeFetcher;

    fn facade(fetcher: Arc<FakeFetcher>) -> ProviderFacade {
        ProviderFacade::new(fetcher, CacheService::new(&Config::default().cache))
    }

    fn tape_item(slug: &str, title: &str) -> String {
        format!(
            "<article class=\"loop-video\"><a href=\"/watch/{slug}/\">\
             <header class=\"entry-header\"><span>{title}</span></header>\
             <img src=\"/t/{slug}.jpg\"></a></article>"
        )
    }

    #[test]
    fn test_catalog_page_url_shapes() {
        let gxtube = sites::site("gxtube").unwrap();
        assert_eq!(
            catalog_page_url(gxtube, "/?filter=date", 1),
            "https://gxtube.to/?filter=date"
        );
        assert_eq!(
            catalog_page_url(gxtube, "/?filter=date", 3),
            "https://gxtube.to/page/3/?filter=date"
        );

        let vidtapes = sites::site("vidtapes").unwrap();
        assert_eq!(
            catalog_page_url(vidtapes, "/amateur/", 2),
            "https://vidtapes.cc/amateur/page/2/"
        );

        let streamvid = sites::site("streamvid").unwrap();
        assert_eq!(
            catalog_page_url(streamvid, "/video/category/4k", 2),
            "https://streamvid.pw/video/category/4k/page/2"
        );
        assert_eq!(catalog_page_url(streamvid, "/", 2), "https://streamvid.pw/page/2/");
    }

    #[test]
    fn test_search_page_url_styles() {
        let gxtube = sites::site("gxtube").unwrap();
        assert_eq!(
            search_page_url(gxtube, "night run", 1),
            "https://gxtube.to/?s=night%20run"
        );
        assert_eq!(
            search_page_url(gxtube, "night run", 2),
            "https://gxtube.to/page/2/?s=night%20run"
        );

        let streamvid = sites::site("streamvid").unwrap();
        assert_eq!(
            search_page_url(streamvid, "clip", 1),
            "https://streamvid.pw/?s=clip&page=1"
        );
        assert_eq!(
            search_page_url(streamvid, "clip", 4),
            "https://streamvid.pw/?s=clip&page=4"
        );
    }

    #[test]
    fn test_fix_url_variants() {
        let base = "https://gxtube.to";
        assert_eq!(fix_url(base, "https://cdn.other/x.jpg"), "https://cdn.other/x.jpg");
        assert_eq!(fix_url(base, "//cdn.other/x.jpg"), "https://cdn.other/x.jpg");
        assert_eq!(fix_url(base, "/videos/a/"), "https://gxtube.to/videos/a/");
        assert_eq!(fix_url(base, "videos/a/"), "https://gxtube.to/videos/a/");
    }

    #[tokio::test]
    async fn test_list_catalog_parses_image_attribute_listing() {
        let listing = r#"<ul class="listing-tube">
            <li><a href="/videos/first-ride/"><img title="First Ride" data-src="/thumbs/first.jpg"></a></li>
            <li><a href="https://gxtube.to/videos/second/"><img alt="Second Clip" src="//cdn.gxtube.to/thumbs/second.jpg"></a></li>
            <li><a href="/videos/broken/"></a></li>
        </ul>"#;
        let fetcher = Arc::new(FakeFetcher::new().page("https://gxtube.to/?filter=date", listing));
        let facade = facade(fetcher.clone());

        let items = facade.list_catalog("gxtube-latest", 0).await;

        assert_eq!(items.len(), 2, "row without a title is dropped");
        assert_eq!(items[0].name, "First Ride");
        assert_eq!(items[0].media_type, "movie");
        assert_eq!(
            items[0].poster.as_deref(),
            Some("https://gxtube.to/thumbs/first.jpg")
        );
        assert_eq!(
            ids::decode("gxtube", &items[0].id).as_deref(),
            Some("https://gxtube.to/videos/first-ride/")
        );
        assert_eq!(items[1].name, "Second Clip");
        assert_eq!(
            items[1].poster.as_deref(),
            Some("https://cdn.gxtube.to/thumbs/second.jpg")
        );

        // second call is served from cache
        let again = facade.list_catalog("gxtube-latest", 0).await;
        assert_eq!(again, items);
        assert_eq!(fetcher.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_list_catalog_translates_skip_to_page() {
        let fetcher = Arc::new(
            FakeFetcher::new()
                .page("https://gxtube.to/page/2/?filter=date", r#"<ul class="listing-tube"><li><a href="/videos/p2/"><img title="Page Two"></a></li></ul>"#),
        );
        let facade = facade(fetcher.clone());

        let items = facade.list_catalog("gxtube-latest", 20).await;

        assert_eq!(fetcher.requested_urls(), vec!["https://gxtube.to/page/2/?filter=date"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Page Two");
        assert!(items[0].poster.is_none());
    }

    #[tokio::test]
    async fn test_list_catalog_unknown_id_fetches_nothing() {
        let fetcher = Arc::new(FakeFetcher::new());
        let facade = facade(fetcher.clone());

        assert!(facade.list_catalog("othersite-latest", 0).await.is_empty());
        assert!(facade.list_catalog("gxtube-nonexistent", 0).await.is_empty());
        assert!(fetcher.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_list_catalog_fetch_failure_degrades_to_empty() {
        let fetcher = Arc::new(FakeFetcher::new());
        let facade = facade(fetcher.clone());

        let items = facade.list_catalog("vidtapes-amateur", 0).await;

        assert!(items.is_empty());
        assert_eq!(fetcher.requested_urls(), vec!["https://vidtapes.cc/amateur/"]);
    }

    #[tokio::test]
    async fn test_search_dedups_across_pages_and_stops_on_stale_page() {
        let page1 = format!("{}{}", tape_item("alpha", "Alpha"), tape_item("beta", "Beta"));
        let page2 = format!("{}{}", tape_item("beta", "Beta"), tape_item("gamma", "Gamma"));
        let page3 = tape_item("gamma", "Gamma");
        let page4 = tape_item("delta", "Delta");
        let fetcher = Arc::new(
            FakeFetcher::new()
                .page("https://vidtapes.cc/?s=retro", page1)
                .page("https://vidtapes.cc/page/2/?s=retro", page2)
                .page("https://vidtapes.cc/page/3/?s=retro", page3)
                .page("https://vidtapes.cc/page/4/?s=retro", page4),
        );
        let facade = facade(fetcher.clone());

        let items = facade.search("vidtapes-search", "retro", 0).await;

        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
        // page 3 repeats page 2's tail, so page 4 is never requested
        assert_eq!(fetcher.requested_urls().len(), 3);
        assert!(!fetcher
            .requested_urls()
            .contains(&"https://vidtapes.cc/page/4/?s=retro".to_string()));
    }

    #[tokio::test]
    async fn test_search_skip_starts_at_later_page() {
        let fetcher = Arc::new(
            FakeFetcher::new()
                .page("https://vidtapes.cc/page/2/?s=retro", tape_item("late", "Late Find"))
                .page("https://vidtapes.cc/page/3/?s=retro", ""),
        );
        let facade = facade(fetcher.clone());

        let items = facade.search("vidtapes-search", "retro", 24).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Late Find");
        assert_eq!(
            fetcher.requested_urls()[0],
            "https://vidtapes.cc/page/2/?s=retro"
        );
    }

    #[tokio::test]
    async fn test_search_result_is_cached_even_when_empty() {
        let fetcher = Arc::new(FakeFetcher::new().page("https://gxtube.to/?s=nothing", ""));
        let facade = facade(fetcher.clone());

        assert!(facade.search("gxtube-search", "nothing", 0).await.is_empty());
        assert!(facade.search("gxtube-search", "nothing", 0).await.is_empty());
        assert_eq!(fetcher.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_detail_prefers_itemprops_and_collects_cast() {
        let page = r#"<html><head>
            <meta property="og:title" content="OG Title">
            </head><body>
            <article itemscope itemtype="http://schema.org/VideoObject">
              <meta itemprop="name" content="Retro Tape 12">
              <meta itemprop="thumbnailUrl" content="/t/12.jpg">
              <meta itemprop="description" content="A vintage capture.">
            </article>
            <h1 class="entry-title">Fallback Title</h1>
            <div id="video-actors"><a>Sam Blaze</a><a>Lee Storm</a></div>
            </body></html>"#;
        let url = "https://vidtapes.cc/watch/retro-tape-12/";
        let id = ids::encode("vidtapes", url);
        let fetcher = Arc::new(FakeFetcher::new().page(url, page));
        let facade = facade(fetcher.clone());

        let meta = facade.get_detail(&id).await.expect("metadata");

        assert_eq!(meta.id, id);
        assert_eq!(meta.media_type, "movie");
        assert_eq!(meta.name, "Retro Tape 12");
        assert_eq!(meta.poster.as_deref(), Some("https://vidtapes.cc/t/12.jpg"));
        assert_eq!(meta.background, meta.poster);
        assert_eq!(meta.poster_shape.as_deref(), Some("poster"));
        assert_eq!(meta.description.as_deref(), Some("A vintage capture."));
        assert_eq!(
            meta.cast,
            Some(vec!["Sam Blaze".to_string(), "Lee Storm".to_string()])
        );

        // second call is served from cache
        facade.get_detail(&id).await.expect("cached metadata");
        assert_eq!(fetcher.requested_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_detail_falls_back_to_opengraph() {
        let page = r#"<html><head>
            <meta property="og:title" content="Ride Along">
            <meta property="og:image" content="https://gxtube.to/p/ride.jpg">
            <meta property="og:description" content="Full movie.">
            </head><body></body></html>"#;
        let url = "https://gxtube.to/videos/ride-along/";
        let id = ids::encode("gxtube", url);
        let facade = facade(Arc::new(FakeFetcher::new().page(url, page)));

        let meta = facade.get_detail(&id).await.expect("metadata");

        assert_eq!(meta.name, "Ride Along");
        assert_eq!(meta.poster.as_deref(), Some("https://gxtube.to/p/ride.jpg"));
        assert_eq!(meta.poster_shape.as_deref(), Some("landscape"));
        assert_eq!(meta.description.as_deref(), Some("Full movie."));
        assert!(meta.cast.is_none());
    }

    #[tokio::test]
    async fn test_get_detail_rejects_undecodable_id() {
        let fetcher = Arc::new(FakeFetcher::new());
        let facade = facade(fetcher.clone());

        assert!(facade.get_detail("vidtapes:%%%").await.is_none());
        assert!(facade.get_detail("unknown:abc").await.is_none());
        assert!(fetcher.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_get_streams_resolves_and_sends_site_referer() {
        let watch_url = "https://streamvid.pw/v/clip-9";
        let watch_page = r#"<div class="tabs-wrap">
            <button onclick="document.getElementById('ifr').src='https://voe.sx/e/k9q2w';">VOE</button>
            </div>
            <a class="video-download" href="https://streamvid.pw/get/clip-9.mp4">Download</a>"#;
        let voe_page =
            r#"<script>const sources = {"hls": "https://edge.example/clip9.m3u8"};</script>"#;
        let id = ids::encode("streamvid", watch_url);
        let fetcher = Arc::new(
            FakeFetcher::new()
                .page(watch_url, watch_page)
                .page("https://voe.sx/e/k9q2w", voe_page),
        );
        let facade = facade(fetcher.clone());

        let streams = facade.get_streams(&id, None).await;

        assert_eq!(
            fetcher.referer_for(watch_url).as_deref(),
            Some("https://streamvid.pw")
        );
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].name, "Download");
        assert_eq!(
            streams[0].url.as_deref(),
            Some("https://streamvid.pw/get/clip-9.mp4")
        );
        assert_eq!(streams[1].name, "VOE");
        assert_eq!(
            streams[1].url.as_deref(),
            Some("https://edge.example/clip9.m3u8")
        );
        let hints = streams[1].behavior_hints.as_ref().expect("hints");
        assert!(hints.not_web_ready);
        let headers = hints.proxy_headers.as_ref().expect("proxy headers");
        assert_eq!(
            headers.request.get("Referer").map(String::as_str),
            Some("https://voe.sx/e/k9q2w")
        );

        // resolved streams are cached
        facade.get_streams(&id, None).await;
        assert_eq!(fetcher.requested_urls().len(), 2);
    }

    #[tokio::test]
    async fn test_get_streams_rewrites_through_relay_when_base_configured() {
        let watch_url = "https://streamvid.pw/v/clip-9";
        let watch_page = r#"<div class="tabs-wrap">
            <button onclick="document.getElementById('ifr').src='https://voe.sx/e/k9q2w';">VOE</button>
            </div>"#;
        let voe_page =
            r#"<script>const sources = {"hls": "https://edge.example/clip9.m3u8"};</script>"#;
        let id = ids::encode("streamvid", watch_url);
        let facade = facade(Arc::new(
            FakeFetcher::new()
                .page(watch_url, watch_page)
                .page("https://voe.sx/e/k9q2w", voe_page),
        ));

        let streams = facade.get_streams(&id, Some("http://addon.example:7700/")).await;

        assert_eq!(streams.len(), 1);
        assert_eq!(
            streams[0].url.as_deref(),
            Some(
                "http://addon.example:7700/proxy/stream?url=https%3A%2F%2Fedge.example%2Fclip9.m3u8&referer=https%3A%2F%2Fvoe.sx%2Fe%2Fk9q2w"
            )
        );
        let hints = streams[0].behavior_hints.as_ref().expect("hints");
        assert!(!hints.not_web_ready);
        assert!(hints.proxy_headers.is_none());
    }

    #[tokio::test]
    async fn test_get_streams_empty_result_is_not_cached() {
        let watch_url = "https://gxtube.to/videos/dead/";
        let id = ids::encode("gxtube", watch_url);
        let fetcher = Arc::new(FakeFetcher::new());
        let facade = facade(fetcher.clone());

        assert!(facade.get_streams(&id, None).await.is_empty());
        assert!(facade.get_streams(&id, None).await.is_empty());
        // the dead page is retried on every call
        assert_eq!(fetcher.requested_urls().len(), 2);
    }
}
