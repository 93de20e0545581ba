//! Domain canonicalization.
//!
//! Turns a referring page URL (or a bare host string) into the comparable key
//! used everywhere a referring domain is grouped, counted or looked up:
//! - `normalize_domain()` - best-effort canonical host, never fails
//! - `extract_referring_domain()` - same, but `None` when nothing usable remains

const WWW_PREFIX: &str = "www.";
const SCHEME_SEPARATOR: &str = "://";

/// Canonicalizes a URL or host string to a lower-case host without `www.`.
///
/// Inputs containing a scheme separator are parsed as URLs and reduced to
/// their host component. Anything else is treated as a host followed by an
/// optional path, so only the portion before the first `/` is kept.
///
/// If URL parsing fails, the trimmed, lower-cased input is returned as is.
/// The function is idempotent: `normalize_domain(&normalize_domain(x))`
/// always equals `normalize_domain(x)`.
///
/// # Examples
///
/// ```
/// use backlink_intel::normalize_domain;
///
/// assert_eq!(normalize_domain("https://Blog.Example.com/post"), "blog.example.com");
/// assert_eq!(normalize_domain("www.example.com/path"), "example.com");
/// ```
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();

    if trimmed.contains(SCHEME_SEPARATOR) {
        return match url::Url::parse(trimmed) {
            Ok(parsed) => strip_www(&parsed.host_str().unwrap_or_default().to_lowercase()),
            Err(e) => {
                log::trace!("Falling back to raw host for unparseable URL '{trimmed}': {e}");
                trimmed.to_lowercase()
            }
        };
    }

    let host = trimmed.split('/').next().unwrap_or_default();
    strip_www(&host.to_lowercase())
}

/// Extracts the referring domain from a page URL.
///
/// Returns `None` when the canonical form is empty, which is how malformed
/// export rows are recognised and dropped.
pub fn extract_referring_domain(page_url: &str) -> Option<String> {
    let domain = normalize_domain(page_url);
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

// Repeated prefixes (`www.www.`) and any whitespace they expose are stripped
// entirely so that the result is a fixed point of `normalize_domain`.
fn strip_www(host: &str) -> String {
    let mut rest = host.trim();
    while let Some(stripped) = rest.strip_prefix(WWW_PREFIX) {
        rest = stripped.trim_start();
    }
    rest.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
