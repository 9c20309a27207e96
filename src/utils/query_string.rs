use std::collections::BTreeMap;

use urlencoding::encode;

/// Serializes `params` onto `base` as `base?k=v&...`, percent-encoding both
/// keys and values. Pairs come out in the map's own iteration order, which
/// carries no meaning.
pub fn format_query_url(base: &str, params: &BTreeMap<&str, String>) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base, query)
}
