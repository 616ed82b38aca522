use percent_encoding::percent_decode_str;
use url::Url;

/// Splits `href` into the part before `#` and the fragment, if any.
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment).filter(|f| !f.is_empty())),
        None => (href, None),
    }
}

/// Percent-decoded last path segment of a link, ignoring query and fragment.
pub fn basename_from_href(href: &str) -> String {
    let (without_fragment, _) = split_fragment(href);
    let path = without_fragment
        .split_once('?')
        .map_or(without_fragment, |(path, _)| path);
    let segment = path.rsplit('/').next().unwrap_or(path);

    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Resolves `href` against the page it was found on.
pub fn join_url(base: &str, href: &str) -> Option<String> {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .ok()
        .map(String::from)
}
