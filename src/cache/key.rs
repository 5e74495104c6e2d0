//! Cache key derivation.

use serde_json::Value;
use std::collections::BTreeMap;

/// Build the cache key for a GET request.
///
/// Parameters are sorted by name before serialization, so the same set of
/// parameters given in a different order maps to the same key. A repeated
/// name keeps its last value. The key stays human-readable
/// (`/contact_{"page":1}`) because invalidation matches substrings of it.
pub fn generate_key<'a, I>(path: &str, params: I) -> String
where
  I: IntoIterator<Item = (&'a str, &'a Value)>,
{
  let sorted: BTreeMap<&str, &Value> = params.into_iter().collect();
  // Serializing a map of strings to JSON values cannot fail
  let params = serde_json::to_string(&sorted).unwrap_or_else(|_| "{}".to_string());
  format!("{}_{}", path, params)
}
