//! Hostname derivation from tab URLs.

use url::Url;

/// Derive the lowercased hostname of a tab URL.
///
/// Only `http`/`https` URLs resolve to a domain; internal browser pages
/// (`chrome://…`, `about:…`) and unparseable strings yield `None` so they
/// are excluded from domain clustering and history enrichment without
/// failing the batch.
pub fn derive_domain(url_str: &str) -> Option<String> {
    let parsed = Url::parse(url_str.trim()).ok()?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return None;
    }
    parsed.host_str().map(str::to_ascii_lowercase)
}

/// The path component of a URL, when it parses and has one beyond `/`.
pub fn url_path(url_str: &str) -> Option<String> {
    let parsed = Url::parse(url_str.trim()).ok()?;
    let path = parsed.path();
    if path.is_empty() || path == "/" {
        None
    } else {
        Some(path.to_string())
    }
}
