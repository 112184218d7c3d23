//! Built-in site definitions
//!
//! Each scraped site is described by one static record: catalog table,
//! listing/detail selectors, paging parameters, and the discovery rules its
//! watch pages need. The facade in the parent module is driven entirely by
//! these records, so supporting a new site is a data change here rather than
//! a new provider module.

use crate::extract::DiscoveryRules;
use crate::models::{
    ExtraProp, Manifest, ManifestBehaviorHints, ManifestCatalog, MEDIA_TYPE,
};

/// One browsable catalog on a site
#[derive(Debug, Clone, Copy)]
pub struct CatalogDef {
    pub id: &'static str,
    pub name: &'static str,
    /// Path under the site base; `/?key=value` paths paginate via a
    /// `/page/N` prefix, directory paths via a `page/N/` suffix
    pub path: &'static str,
}

/// Where a listing item's title comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TitleSource {
    /// `title=` (or `alt=`) attribute on the poster image
    ImgAttr,
    /// Text content of a child element
    Text(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ListingRules {
    /// Per-item container on listing and search pages
    pub item: &'static str,
    pub link: &'static str,
    pub poster: &'static str,
    pub title: TitleSource,
}

#[derive(Debug, Clone, Copy)]
pub struct DetailRules {
    /// Site marks up detail pages with schema.org VideoObject itemprops,
    /// which take precedence over OpenGraph tags
    pub itemprop: bool,
    pub title_fallback: Option<&'static str>,
    pub description_fallback: Option<&'static str>,
    pub cast: Option<&'static str>,
}

/// How a site's search results paginate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchStyle {
    /// `/?s=q` then `/page/N/?s=q`
    PathPaged,
    /// `/?s=q&page=N` for every page
    QueryPaged,
}

#[derive(Debug)]
pub struct SiteDefinition {
    /// Provider namespace, also the content-id prefix
    pub id: &'static str,
    pub label: &'static str,
    pub base_url: &'static str,
    pub items_per_page: usize,
    /// Pages scanned per search call before giving up
    pub search_window: usize,
    pub search_style: SearchStyle,
    pub poster_shape: &'static str,
    /// Site refuses requests without its own base URL as referer
    pub send_base_referer: bool,
    pub catalogs: &'static [CatalogDef],
    pub listing: ListingRules,
    pub detail: DetailRules,
    pub discovery: DiscoveryRules,
}

pub static SITES: &[SiteDefinition] = &[
    SiteDefinition {
        id: "gxtube",
        label: "GXtube",
        base_url: "https://gxtube.to",
        items_per_page: 20,
        search_window: 3,
        search_style: SearchStyle::PathPaged,
        poster_shape: "landscape",
        send_base_referer: false,
        catalogs: &[
            CatalogDef {
                id: "gxtube-latest",
                name: "Latest",
                path: "/?filter=date",
            },
            CatalogDef {
                id: "gxtube-full-movies",
                name: "Full Movies",
                path: "/category/full-movies/",
            },
            CatalogDef {
                id: "gxtube-trending",
                name: "Trending",
                path: "/category/trending/",
            },
            CatalogDef {
                id: "gxtube-studios",
                name: "Studios",
                path: "/category/studios/",
            },
        ],
        listing: ListingRules {
            item: "ul.listing-tube li",
            link: "a",
            poster: "img",
            title: TitleSource::ImgAttr,
        },
        detail: DetailRules {
            itemprop: false,
            title_fallback: None,
            description_fallback: None,
            cast: None,
        },
        discovery: DiscoveryRules {
            iframe_selectors: &["#video-code iframe"],
            button_onclick_selector: None,
            mirror_menu_selectors: &[],
            anchor_scan_selectors: &[],
            download_selector: None,
        },
    },
    SiteDefinition {
        id: "vidtapes",
        label: "VidTapes",
        base_url: "https://vidtapes.cc",
        items_per_page: 24,
        search_window: 7,
        search_style: SearchStyle::PathPaged,
        poster_shape: "poster",
        send_base_referer: false,
        catalogs: &[
            CatalogDef {
                id: "vidtapes-latest",
                name: "Latest",
                path: "/?filter=latest",
            },
            CatalogDef {
                id: "vidtapes-most-viewed",
                name: "Most Viewed",
                path: "/?filter=most-viewed",
            },
            CatalogDef {
                id: "vidtapes-amateur",
                name: "Amateur",
                path: "/amateur/",
            },
            CatalogDef {
                id: "vidtapes-compilation",
                name: "Compilation",
                path: "/compilation/",
            },
            CatalogDef {
                id: "vidtapes-vintage",
                name: "Vintage",
                path: "/vintage/",
            },
        ],
        listing: ListingRules {
            item: "article.loop-video",
            link: "a",
            poster: "img",
            title: TitleSource::Text("header.entry-header span"),
        },
        detail: DetailRules {
            itemprop: true,
            title_fallback: Some("h1.entry-title"),
            description_fallback: Some(".video-description .desc"),
            cast: Some("#video-actors a"),
        },
        discovery: DiscoveryRules {
            iframe_selectors: &[".video-player iframe", ".responsive-player iframe"],
            button_onclick_selector: None,
            mirror_menu_selectors: &["ul#mirrorMenu a.mirror-opt", "a.dropdown-item.mirror-opt"],
            anchor_scan_selectors: &[".notranslate a[href]", ".entry-content a[href]"],
            download_selector: None,
        },
    },
    SiteDefinition {
        id: "streamvid",
        label: "StreamVid",
        base_url: "https://streamvid.pw",
        items_per_page: 24,
        search_window: 3,
        search_style: SearchStyle::QueryPaged,
        poster_shape: "poster",
        send_base_referer: true,
        catalogs: &[
            CatalogDef {
                id: "streamvid-latest",
                name: "Latest",
                path: "/",
            },
            CatalogDef {
                id: "streamvid-4k",
                name: "4K",
                path: "/video/category/4k",
            },
            CatalogDef {
                id: "streamvid-homemade",
                name: "Homemade",
                path: "/video/category/homemade",
            },
            CatalogDef {
                id: "streamvid-popular",
                name: "Popular",
                path: "/video/category/popular",
            },
        ],
        listing: ListingRules {
            item: "div.grid-item",
            link: "a.item-wrap",
            poster: "img.item-img",
            title: TitleSource::Text("h3.item-title"),
        },
        detail: DetailRules {
            itemprop: false,
            title_fallback: None,
            description_fallback: None,
            cast: None,
        },
        discovery: DiscoveryRules {
            iframe_selectors: &["iframe#ifr"],
            button_onclick_selector: Some("div.tabs-wrap button[onclick]"),
            mirror_menu_selectors: &[],
            anchor_scan_selectors: &[],
            download_selector: Some("a.video-download"),
        },
    },
];

pub fn site(id: &str) -> Option<&'static SiteDefinition> {
    SITES.iter().find(|site| site.id == id)
}

/// Site owning a catalog id of the form `<site>-<catalog>`
pub fn site_for_catalog(catalog_id: &str) -> Option<&'static SiteDefinition> {
    SITES.iter().find(|site| {
        catalog_id
            .strip_prefix(site.id)
            .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// Site owning a content identifier of the form `<site>:<encoded url>`
pub fn site_for_content(content_id: &str) -> Option<&'static SiteDefinition> {
    site(crate::ids::provider_of(content_id)?)
}

/// Addon manifest covering every site. Each site contributes its search
/// catalog first, then its browse catalogs, all under the one movie type.
pub fn build_manifest() -> Manifest {
    let mut catalogs = Vec::new();
    for site in SITES {
        catalogs.push(ManifestCatalog {
            media_type: MEDIA_TYPE.to_string(),
            id: format!("{}-search", site.id),
            name: format!("{} Search", site.label),
            extra: vec![ExtraProp::required("search"), ExtraProp::optional("skip")],
        });
        for catalog in site.catalogs {
            catalogs.push(ManifestCatalog {
                media_type: MEDIA_TYPE.to_string(),
                id: catalog.id.to_string(),
                name: format!("{} {}", site.label, catalog.name),
                extra: vec![ExtraProp::optional("skip")],
            });
        }
    }

    Manifest {
        id: "community.vidbridge".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: "VidBridge".to_string(),
        description: "Bridges scraped video sites into catalog, metadata and stream endpoints"
            .to_string(),
        resources: vec![
            "catalog".to_string(),
            "meta".to_string(),
            "stream".to_string(),
        ],
        types: vec![MEDIA_TYPE.to_string()],
        catalogs,
        id_prefixes: SITES.iter().map(|site| format!("{}:", site.id)).collect(),
        behavior_hints: ManifestBehaviorHints {
            adult: false,
            configurable: false,
        },
    }
}
