//! Manifest document: a JSON array of `{ "url": "..." }` objects.

use serde::Deserialize;
use serde_json::Value;

use super::ManifestError;
use crate::url_model;

/// One resource to prefetch. Other fields in the manifest object are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
}

/// Parse manifest bytes.
///
/// The document must be a JSON array. Elements that are not objects, lack a
/// string `url`, or whose `url` is not an absolute URL are skipped. URLs are
/// returned in canonical form.
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<ManifestEntry>, ManifestError> {
    let doc: Value = serde_json::from_slice(bytes)?;
    let items = doc.as_array().ok_or(ManifestError::NotArray)?;

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let entry = match ManifestEntry::deserialize(item) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(index, "manifest entry skipped: {}", e);
                continue;
            }
        };
        let Some(url) = url_model::canonical_url(&entry.url) else {
            tracing::debug!(index, url = %entry.url, "manifest entry with invalid url skipped");
            continue;
        };
        entries.push(ManifestEntry { url });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_entries() {
        let json = br#"[{"url":"http://h/a.js"},{"url":"http://h/b.css"}]"#;
        let entries = parse_manifest(json).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    url: "http://h/a.js".to_string()
                },
                ManifestEntry {
                    url: "http://h/b.css".to_string()
                },
            ]
        );
    }

    #[test]
    fn extra_fields_ignored() {
        let json = br#"[{"url":"http://h/a.js","size":12,"hash":"abc"}]"#;
        let entries = parse_manifest(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "http://h/a.js");
    }

    #[test]
    fn non_conforming_objects_skipped() {
        let json = br#"[
            {"url":"http://h/a.js"},
            {"href":"http://h/b.js"},
            {"url":42},
            "http://h/c.js",
            null,
            {"url":"not a url"},
            {"url":"http://h/d.png"}
        ]"#;
        let urls: Vec<String> = parse_manifest(json)
            .unwrap()
            .into_iter()
            .map(|e| e.url)
            .collect();
        assert_eq!(urls, vec!["http://h/a.js", "http://h/d.png"]);
    }

    #[test]
    fn urls_are_canonicalized() {
        let entries = parse_manifest(br#"[{"url":"HTTP://H"}]"#).unwrap();
        assert_eq!(entries[0].url, "http://h/");
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            parse_manifest(b"[{\"url\":"),
            Err(ManifestError::Json(_))
        ));
    }

    #[test]
    fn object_root_is_error() {
        assert!(matches!(
            parse_manifest(br#"{"url":"http://h/a.js"}"#),
            Err(ManifestError::NotArray)
        ));
    }

    #[test]
    fn empty_array() {
        assert!(parse_manifest(b"[]").unwrap().is_empty());
    }
}
