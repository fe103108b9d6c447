use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::request::FrameRequest;
use crate::error::{Result, ViewerError};

/// One entry of the proxy's `/imagery?hoursBack=N` listing
#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    timestamp: DateTime<Utc>,
    url: String,
}

/// Parse a catalog listing into chronologically sorted requests.
///
/// Relative URLs are resolved against `base`. Repeated timestamps keep the
/// first entry.
pub fn parse_catalog(json: &str, base: &str) -> Result<Vec<FrameRequest>> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)
        .map_err(|e| ViewerError::network(format!("malformed catalog: {e}")))?;

    let mut requests: Vec<FrameRequest> = entries
        .into_iter()
        .map(|entry| FrameRequest::new(entry.timestamp, resolve(base, &entry.url)))
        .collect();

    requests.sort_by_key(|r| r.timestamp);
    requests.dedup_by_key(|r| r.timestamp);
    Ok(requests)
}

fn resolve(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_entries() {
        let json = r#"[
            {"timestamp": "2024-06-01T02:00:00Z", "url": "/goes-proxy?t=2024-06-01-0200"},
            {"timestamp": "2024-06-01T01:00:00Z", "url": "https://cdn.example/a.jpg"}
        ]"#;

        let requests = parse_catalog(json, "http://localhost:8000/").unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].source_url, "https://cdn.example/a.jpg");
        assert_eq!(
            requests[1].source_url,
            "http://localhost:8000/goes-proxy?t=2024-06-01-0200"
        );
        assert!(requests[0].timestamp < requests[1].timestamp);
    }

    #[test]
    fn duplicate_timestamps_collapse() {
        let json = r#"[
            {"timestamp": "2024-06-01T01:00:00Z", "url": "a.jpg"},
            {"timestamp": "2024-06-01T01:00:00Z", "url": "b.jpg"}
        ]"#;
        let requests = parse_catalog(json, "http://proxy").unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].source_url, "http://proxy/a.jpg");
    }

    #[test]
    fn malformed_catalog_is_network_error() {
        let err = parse_catalog("{not json", "http://proxy").unwrap_err();
        assert!(matches!(err, ViewerError::Network(_)));
    }
}
