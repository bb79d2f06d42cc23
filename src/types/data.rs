//! Helpers over a node's free-form `data` mapping.
//!
//! Node data is kept as an ordered JSON object so that field order survives
//! save/load and shows up unchanged in the compiled document.

use serde_json::{Map, Value};

/// Kind-specific fields of a node, keyed by field name.
pub type NodeData = Map<String, Value>;

/// Reserved field marking which input ports are fed by an edge.
pub const LINKED_INPUTS: &str = "linkedInputs";

/// Reserved field holding a container's port list while a reverse proxy owns its ingress.
pub const ORIGINAL_PORTS: &str = "_originalPorts";

/// Reserved field holding a custom container's icon.
pub const ICON: &str = "_icon";

/// Returns the field as a string slice if it is a non-empty string.
pub fn text<'a>(data: &'a NodeData, key: &str) -> Option<&'a str> {
  data
    .get(key)
    .and_then(Value::as_str)
    .filter(|s| !s.is_empty())
}

/// Returns the field's array items, or an empty slice when absent or not an array.
pub fn items<'a>(data: &'a NodeData, key: &str) -> &'a [Value] {
  data
    .get(key)
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

/// Returns the string items of an array field, skipping anything that is not a string.
pub fn string_items(data: &NodeData, key: &str) -> Vec<String> {
  items(data, key)
    .iter()
    .filter_map(Value::as_str)
    .map(str::to_string)
    .collect()
}

/// Replaces every item equal to `old` with `new` in an existing array field.
///
/// An absent field stays absent.
pub fn replace_in_list(data: &mut NodeData, key: &str, old: &Value, new: &Value) {
  if let Some(Value::Array(list)) = data.get_mut(key) {
    for item in list.iter_mut() {
      if item == old {
        *item = new.clone();
      }
    }
  }
}

/// Appends `value` to an array field, creating it if needed.
pub fn push_item(data: &mut NodeData, key: &str, value: Value) {
  match data.get_mut(key) {
    Some(Value::Array(list)) => list.push(value),
    _ => {
      data.insert(key.to_string(), Value::Array(vec![value]));
    }
  }
}

/// Removes the first item equal to `value`; returns whether one was removed.
pub fn remove_first(data: &mut NodeData, key: &str, value: &Value) -> bool {
  if let Some(Value::Array(list)) = data.get_mut(key) {
    if let Some(pos) = list.iter().position(|v| v == value) {
      list.remove(pos);
      return true;
    }
  }
  false
}

/// Keeps only the array items for which `keep` returns true.
pub fn retain_items(data: &mut NodeData, key: &str, keep: impl Fn(&Value) -> bool) {
  if let Some(Value::Array(list)) = data.get_mut(key) {
    list.retain(|v| keep(v));
  }
}

/// Returns the `connectionId` of an object item, if any.
pub fn connection_id(item: &Value) -> Option<&str> {
  item.get("connectionId").and_then(Value::as_str)
}

/// Splits a `host:container` port binding into `(host, container)`.
///
/// A single-part binding has an empty host half. Extra leading parts (an IP
/// prefix such as `127.0.0.1:8080:80`) are dropped from the host half.
pub fn split_port(binding: &str) -> (&str, &str) {
  let mut parts = binding.rsplitn(3, ':');
  let container = parts.next().unwrap_or("");
  match parts.next() {
    Some(host) => (host, container),
    None => ("", container),
  }
}

/// Splits a `source:target[:mode]` volume binding into `(source, target)`.
///
/// A binding without a `:` has no target.
pub fn split_volume(binding: &str) -> (&str, &str) {
  let mut parts = binding.split(':');
  let source = parts.next().unwrap_or("");
  (source, parts.next().unwrap_or(""))
}

/// Parses the leading decimal digits of `s`, if any.
pub fn leading_number(s: &str) -> Option<u64> {
  let digits: String = s
    .trim()
    .chars()
    .take_while(|c| c.is_ascii_digit())
    .collect();
  digits.parse().ok()
}

/// Renders a resolved value the way it appears inside text bindings.
pub fn display(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}
