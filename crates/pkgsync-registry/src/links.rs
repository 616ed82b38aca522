//! Anchor extraction from simple index pages.

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<a\s[^>]*?href\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s>]+))[^>]*>(?P<text>.*?)</a\s*>"#,
    )
    .expect("unable to compile anchor regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("unable to compile tag regex"));

/// An `<a href>` found on an index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// Replaces the handful of entities index servers put in hrefs and link text.
pub fn unescape(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Extracts every anchor with an `href`, in document order.
pub fn extract_links(html: &str) -> Vec<Link> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))?
                .as_str();
            let text = TAG_RE.replace_all(&caps["text"], "");
            Some(Link {
                href: unescape(href.trim()),
                text: unescape(text.trim()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKGSYNC_PAGE: &str = r#"<html><head><title>Links for pkgsync</title></head>
        <body><h1>Links for pkgsync</h1>
        <a href="../../packages/source/p/pkgsync/pkgsync-0.0.1.tar.gz#md5=9f8d067fdb2373a64b4c3e420f31f4cc">pkgsync-0.0.1.tar.gz</a><br/>
        <a href='../../packages/2.7/p/pkgsync/pkgsync-0.0.1-py2.7.egg' data-requires-python="&gt;=2.7">pkgsync-0.0.1-py2.7.egg</a><br/>
        <A HREF=pkgsync-0.0.0.tar.gz>pkgsync-0.0.0.tar.gz</A><br/>
        <a rel="homepage" href="https://github.com/example/pkgsync?a=1&amp;b=2"><b>0.0.1</b> home_page</a><br/>
        <a name="no-href">ignored</a>
        </body></html>"#;

    #[test]
    fn test_extract_links() {
        let links = extract_links(PKGSYNC_PAGE);
        assert_eq!(links.len(), 4);

        assert_eq!(
            links[0].href,
            "../../packages/source/p/pkgsync/pkgsync-0.0.1.tar.gz#md5=9f8d067fdb2373a64b4c3e420f31f4cc"
        );
        assert_eq!(links[0].text, "pkgsync-0.0.1.tar.gz");
        assert_eq!(links[1].href, "../../packages/2.7/p/pkgsync/pkgsync-0.0.1-py2.7.egg");
        assert_eq!(links[2].href, "pkgsync-0.0.0.tar.gz");
        assert_eq!(links[3].href, "https://github.com/example/pkgsync?a=1&b=2");
        assert_eq!(links[3].text, "0.0.1 home_page");
    }

    #[test]
    fn test_extract_links_empty_page() {
        assert!(extract_links("").is_empty());
        assert!(extract_links("<html><body>nothing here</body></html>").is_empty());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &amp;lt; b"), "a &lt; b");
        assert_eq!(unescape("&quot;x&quot; &#39;y&#39;"), "\"x\" 'y'");
        assert_eq!(unescape("plain"), "plain");
    }
}
