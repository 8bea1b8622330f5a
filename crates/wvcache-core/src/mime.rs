//! Content type inference from a resource path suffix.

/// Fallback for paths with no known suffix.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Suffix table, checked in order; first match wins.
const SUFFIXES: &[(&str, &str)] = &[
    (".js", "application/javascript"),
    (".css", "text/css"),
    (".html", "text/html"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".mjs", "application/javascript"),
    (".htm", "text/html"),
    (".json", "application/json"),
    (".svg", "image/svg+xml"),
    (".gif", "image/gif"),
    (".webp", "image/webp"),
    (".ico", "image/x-icon"),
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    (".txt", "text/plain"),
];

/// Maps a path or URL string to a MIME type by its suffix.
///
/// Matching is case-sensitive and looks only at the end of the string, so a
/// query string (`app.js?v=2`) falls through to `application/octet-stream`.
/// No content sniffing.
pub fn resolve(path: &str) -> &'static str {
    SUFFIXES
        .iter()
        .find(|(suffix, _)| path.ends_with(suffix))
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}
