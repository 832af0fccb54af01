//! `${name}` placeholder substitution for deployed HTML

use std::collections::BTreeMap;

/// Replaces every `${key}` token with its configured value.
///
/// Keys are applied in sorted order. Tokens without a configured key stay
/// untouched.
pub fn substitute(content: &str, variables: &BTreeMap<String, String>) -> String {
    let mut result = content.to_string();
    for (key, value) in variables {
        let token = format!("${{{key}}}");
        if result.contains(&token) {
            result = result.replace(&token, value);
        }
    }
    result
}
