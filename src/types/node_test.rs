//! Tests for `Node`.

use serde_json::json;

use super::{Node, NodeData};

fn node(kind: &str, data: serde_json::Value) -> Node {
  let data: NodeData = data.as_object().cloned().unwrap();
  Node::new("n1", kind, data)
}

#[test]
fn identifier_prefers_container_name() {
  let n = node("nginx", json!({"container_name": "web"}));
  assert_eq!(n.display_name(), Some("web"));
  assert_eq!(n.identifier(), "web");
}

#[test]
fn identifier_falls_back_to_kind() {
  let n = node("nginx", json!({"container_name": ""}));
  assert_eq!(n.display_name(), None);
  assert_eq!(n.identifier(), "nginx");
}

#[test]
fn linked_input_flag() {
  let n = node("nginx", json!({"linkedInputs": {"prop:user": true, "depends_on": false}}));
  assert!(n.is_input_linked("prop:user"));
  assert!(!n.is_input_linked("depends_on"));
  assert!(!n.is_input_linked("labels_in"));
}

#[test]
fn serializes_with_position_rect() {
  let n = node("Network", json!({"name": "proxy"}));
  let v = serde_json::to_value(&n).unwrap();
  assert_eq!(v["kind"], "Network");
  assert_eq!(v["position"]["x2"], 0.0);
  assert_eq!(v["data"]["name"], "proxy");
}
