//! URL helpers used by the comparator: scheme normalisation and host keys.

use url::Url;

/// Turn a raw table cell into a schemed URL.
///
/// Blank, whitespace-only and absent values yield `None`. Values without an
/// `http://` or `https://` prefix (checked case-insensitively) get `http://`.
pub fn normalize_url(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("http://{trimmed}"))
    }
}

/// Comparable host identity: lower-cased network location with one leading
/// `www.` label removed. Userinfo is dropped, an explicit port is kept.
pub fn host_key(url: &str) -> String {
    let netloc = match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            None => raw_netloc(url),
        },
        Err(_) => raw_netloc(url),
    };
    let netloc = netloc.to_ascii_lowercase();
    match netloc.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => netloc,
    }
}

fn raw_netloc(url: &str) -> String {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let authority = &after_scheme[..end];
    authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host)
        .to_string()
}
