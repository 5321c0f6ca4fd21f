//! Header extraction helpers
//!
//! Small, allocation-light accessors over [`HeaderMap`] used by the
//! authentication middleware and the response negotiator.

use http::HeaderMap;
use http::header::{self, HeaderName};

/// First non-empty value of a header, trimmed
///
/// Values that are not visible ASCII are treated as absent.
fn first_value<'a>(headers: &'a HeaderMap, name: impl AsRef<str>) -> Option<&'a str> {
    headers
        .get_all(name.as_ref())
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// All values of a header joined with `, `
///
/// Repeated `Accept` headers are equivalent to a single comma separated
/// one, so negotiation reads them through here.
pub fn joined_values(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// The `Accept` header, joined across repeated occurrences
pub fn accept(headers: &HeaderMap) -> Option<String> {
    joined_values(headers, &header::ACCEPT)
}

/// Incoming transaction id from `header_name`
///
/// Proxies may append to the header (`upstream, proxy`); the first entry is
/// the one the caller originated.
pub fn transaction_id<'a>(headers: &'a HeaderMap, header_name: &str) -> Option<&'a str> {
    first_value(headers, header_name)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_first_value_skips_empty() {
        let mut headers = HeaderMap::new();
        headers.append("x-api-key", HeaderValue::from_static("  "));
        headers.append("x-api-key", HeaderValue::from_static(" secret "));

        assert_eq!(first_value(&headers, "x-api-key"), Some("secret"));
        assert_eq!(first_value(&headers, "x-missing"), None);
    }

    #[test]
    fn test_accept_joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, HeaderValue::from_static("text/xml"));
        headers.append(header::ACCEPT, HeaderValue::from_static("application/json;q=0.5"));

        assert_eq!(
            accept(&headers).as_deref(),
            Some("text/xml, application/json;q=0.5")
        );
    }

    #[test]
    fn test_accept_missing() {
        assert_eq!(accept(&HeaderMap::new()), None);
    }

    #[test]
    fn test_transaction_id_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-transaction-id",
            HeaderValue::from_static("abc-123, proxy-456"),
        );

        assert_eq!(transaction_id(&headers, "x-transaction-id"), Some("abc-123"));
        assert_eq!(transaction_id(&headers, "x-other"), None);
    }
}
