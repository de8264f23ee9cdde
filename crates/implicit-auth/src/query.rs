//! Query string building and callback fragment parsing
//!
//! Encoding follows URI-component rules: everything outside the unreserved
//! set (`A-Z a-z 0-9 - _ . ~`) is percent-encoded, so a space becomes `%20`
//! rather than `+`.

use std::collections::HashMap;

use tracing::debug;

/// Percent-encode a single URI component.
pub fn encode_component(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Append `params` to `base_url` as a query string, in the order given.
///
/// An empty parameter list returns `base_url` unchanged.
pub fn build_query(base_url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return base_url.to_owned();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{base_url}?{query}")
}

/// Parse an `&`/`=` delimited fragment (without its leading `#`) into a map.
///
/// Entries that do not split into exactly one key and one value are dropped,
/// as are entries that fail to percent-decode. On duplicate keys the last
/// one wins.
pub fn parse_fragment_pairs(fragment: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for entry in fragment.split('&') {
        let parts: Vec<&str> = entry.split('=').collect();
        // Entries may carry token material; only ever log the key.
        let [key, value] = parts.as_slice() else {
            if !entry.is_empty() {
                debug!(key = parts[0], "dropping fragment entry without a single '='");
            }
            continue;
        };
        match (urlencoding::decode(key), urlencoding::decode(value)) {
            (Ok(key), Ok(value)) => {
                pairs.insert(key.into_owned(), value.into_owned());
            }
            _ => debug!(key, "dropping fragment entry that is not valid UTF-8"),
        }
    }
    pairs
}
