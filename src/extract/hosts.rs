//! Embed-host classification
//!
//! Hostnames map to resolution strategies by substring match so subdomain
//! and CDN variants of the same backend land in one family. The table is
//! evaluated in order; first match wins and unmatched hosts fall through to
//! the generic strategy. Adding a new mirror of a known backend is a data
//! change here, not new control flow.

use url::Url;

/// One resolution strategy per family of embed hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    /// Inline `sources` JSON block with direct media URLs (voe-style)
    DirectJson,
    /// pass_md5 token exchange assembling a short-lived URL (dood-style)
    TokenExchange,
    /// Script assigning the link into a DOM node in two parts (streamtape-style)
    InlineJs,
    /// eval-packed player script (filemoon-style)
    PackedJs,
    /// Interstitial redirect then `file:`/`src:` literals (bigwarp-style)
    FileLiteral,
    /// Page is itself a list of further mirrors to resolve recursively
    MirrorList,
    /// No recognized family; last-resort literal patterns only
    Generic,
}

/// Ordered (hostname substrings, family) table; first match wins
const FAMILY_TABLE: &[(&[&str], HostFamily)] = &[
    (
        &[
            "voe",
            "jilliandescribecompany",
            "markstylecompany",
            "primaryclassaliede",
            "vinovo",
            "vidoza",
        ],
        HostFamily::DirectJson,
    ),
    (
        &[
            "doodstream",
            "ds2video",
            "ds2play",
            "d0o0d",
            "d-s.io",
            "vide0.net",
            "dood.",
            "myvidplay",
        ],
        HostFamily::TokenExchange,
    ),
    (&["streamtape", "tapepops"], HostFamily::InlineJs),
    (&["filemoon"], HostFamily::PackedJs),
    (&["bigwarp", "bgwp"], HostFamily::FileLiteral),
    (&["listmirror"], HostFamily::MirrorList),
];

/// Hosts recognized when scanning bare anchor tags on a watch page.
/// Broader than the family table: it also admits hosts that resolve via the
/// generic strategy but are known to carry playable embeds.
const EMBED_HOST_ALLOWLIST: &[&str] = &[
    "voe.sx",
    "voe.to",
    "jilliandescribecompany.com",
    "markstylecompany.com",
    "primaryclassaliede.com",
    "doodstream.com",
    "ds2video.com",
    "d0o0d.com",
    "d-s.io",
    "vide0.net",
    "myvidplay.com",
    "dood.",
    "streamtape.com",
    "tapepops.com",
    "filemoon.to",
    "filemoon.sx",
    "bigwarp.io",
    "bigwarp.cc",
    "bgwp.cc",
    "listmirror.com",
    "mixdrop.co",
    "mixdrop.to",
    "vinovo.si",
    "vinovo.to",
    "vidoza.net",
];

fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}

/// Classify an embed URL into its resolution family
pub fn classify(url: &str) -> HostFamily {
    let Some(hostname) = hostname_of(url) else {
        return HostFamily::Generic;
    };
    for (needles, family) in FAMILY_TABLE {
        if needles.iter().any(|needle| hostname.contains(needle)) {
            return *family;
        }
    }
    HostFamily::Generic
}

/// Whether an anchor href points at a known embed host
pub fn is_known_embed_host(url: &str) -> bool {
    match hostname_of(url) {
        Some(hostname) => EMBED_HOST_ALLOWLIST
            .iter()
            .any(|needle| hostname.contains(needle)),
        None => false,
    }
}

/// Human-facing label for an embed host, used for stream names and the
/// browser-open fallback entries
pub fn host_label(url: &str) -> String {
    let Some(hostname) = hostname_of(url) else {
        return "Unknown".to_string();
    };
    let labels: &[(&[&str], &str)] = &[
        (&["vinovo"], "Vinovo"),
        (&["vidoza"], "Vidoza"),
        (
            &[
                "voe",
                "jilliandescribecompany",
                "markstylecompany",
                "primaryclassaliede",
            ],
            "VOE",
        ),
        (
            &[
                "dood",
                "ds2video",
                "ds2play",
                "d0o0d",
                "d-s.io",
                "vide0.net",
                "myvidplay",
            ],
            "DoodStream",
        ),
        (&["streamtape", "tapepops"], "StreamTape"),
        (&["filemoon"], "FileMoon"),
        (&["bigwarp", "bgwp"], "BigWarp"),
        (&["mixdrop"], "MixDrop"),
        (&["listmirror"], "Mirror"),
    ];
    for (needles, label) in labels {
        if needles.iter().any(|needle| hostname.contains(needle)) {
            return label.to_string();
        }
    }
    hostname
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_absorbs_subdomains() {
        assert_eq!(
            classify("https://www.filemoon.sx/e/abcdef"),
            HostFamily::PackedJs
        );
        assert_eq!(
            classify("https://cdn44.doodstream.com/e/xyz"),
            HostFamily::TokenExchange
        );
        assert_eq!(
            classify("https://d0o0d.com/d/xyz"),
            HostFamily::TokenExchange
        );
        assert_eq!(
            classify("https://voe.sx/e/abc"),
            HostFamily::DirectJson
        );
        assert_eq!(
            classify("https://streamtape.com/v/abc/x.mp4"),
            HostFamily::InlineJs
        );
        assert_eq!(
            classify("https://listmirror.com/v/abc"),
            HostFamily::MirrorList
        );
    }

    #[test]
    fn test_table_order_decides_overlapping_needles() {
        // "vide0.net" must classify as token exchange, not fall to generic
        assert_eq!(
            classify("https://vide0.net/e/deadbeef"),
            HostFamily::TokenExchange
        );
    }

    #[test]
    fn test_unknown_and_invalid_hosts_are_generic() {
        assert_eq!(classify("https://example.com/watch"), HostFamily::Generic);
        assert_eq!(classify("not a url"), HostFamily::Generic);
    }

    #[test]
    fn test_anchor_allowlist() {
        assert!(is_known_embed_host("https://mixdrop.co/e/abc"));
        assert!(is_known_embed_host("https://vidoza.net/embed-x.html"));
        assert!(!is_known_embed_host("https://example.com/page"));
        assert!(!is_known_embed_host("#"));
    }

    #[test]
    fn test_host_labels() {
        assert_eq!(host_label("https://voe.sx/e/a"), "VOE");
        assert_eq!(host_label("https://vinovo.to/e/a"), "Vinovo");
        assert_eq!(host_label("https://dood.wf/e/a"), "DoodStream");
        assert_eq!(host_label("https://unknown.example/e/a"), "unknown.example");
        assert_eq!(host_label("::"), "Unknown");
    }
}
