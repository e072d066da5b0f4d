//! Short-link canonicalization
//!
//! Rewrites known short-link forms into the long form the extractor resolves
//! most reliably. Anything that is not a recognised short link passes through
//! untouched.

use url::Url;

/// A short-link host and the long-form template its trailing segment maps to
struct ShortLinkRule {
    hosts: &'static [&'static str],
    template: &'static str,
}

const SHORT_LINK_RULES: &[ShortLinkRule] = &[ShortLinkRule {
    hosts: &["youtu.be", "www.youtu.be"],
    template: "https://www.youtube.com/watch?v={id}",
}];

/// Canonicalize a source URL
///
/// If the URL's host is a known short-link host, the trailing path segment
/// (up to any `?` or `#`) is substituted into the host's long-form template.
/// Otherwise the input is returned unchanged. Never fails.
///
/// # Examples
///
/// ```
/// use media_dl::canonical_url::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://youtu.be/abc123?t=5"),
///     "https://www.youtube.com/watch?v=abc123"
/// );
/// assert_eq!(
///     normalize_url("https://vimeo.com/76979871"),
///     "https://vimeo.com/76979871"
/// );
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();

    let parsed = match Url::parse(trimmed) {
        Ok(url) => Some(url),
        // "youtu.be/abc" has no scheme; retry as https
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", trimmed)).ok()
        }
        Err(_) => None,
    };

    let Some(url) = parsed else {
        return raw.to_string();
    };

    let Some(host) = url.host_str() else {
        return raw.to_string();
    };
    let host = host.to_ascii_lowercase();

    let Some(rule) = SHORT_LINK_RULES
        .iter()
        .find(|rule| rule.hosts.contains(&host.as_str()))
    else {
        return raw.to_string();
    };

    match url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
    {
        Some(id) => rule.template.replace("{id}", id),
        None => raw.to_string(),
    }
}
