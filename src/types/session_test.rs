//! Tests for `Session` lookups and its JSON shape.

use super::{Edge, Endpoint, Node, NodeData, Session};

fn edge(id: &str, from: &str, to: &str, port: &str) -> Edge {
  Edge {
    id: id.to_string(),
    from: Endpoint::new(from, "service"),
    to: Endpoint::new(to, port),
    kind: "service".to_string(),
    color: String::new(),
    appended: false,
  }
}

fn session() -> Session {
  Session {
    nodes: vec![
      Node::new("a", "Container", NodeData::new()),
      Node::new("b", "Container", NodeData::new()),
      Node::new("c", "Container", NodeData::new()),
    ],
    edges: vec![
      edge("e1", "a", "b", "depends_on"),
      edge("e2", "c", "b", "depends_on"),
      edge("e3", "b", "c", "depends_on"),
    ],
    ..Session::default()
  }
}

#[test]
fn incoming_filters_by_port() {
  let s = session();
  let ids: Vec<_> = s.incoming("b", "depends_on").map(|e| e.id.as_str()).collect();
  assert_eq!(ids, vec!["e1", "e2"]);
  assert_eq!(s.incoming("b", "labels_in").count(), 0);
}

#[test]
fn incident_covers_both_ends() {
  let s = session();
  let ids: Vec<_> = s.incident("c").map(|e| e.id.as_str()).collect();
  assert_eq!(ids, vec!["e2", "e3"]);
}

#[test]
fn json_uses_camel_case_keys() {
  let s = session();
  let v = serde_json::to_value(&s).unwrap();
  assert_eq!(v["viewTransform"]["scale"], 1.0);
  assert_eq!(v["edges"][0]["from"]["nodeId"], "a");
  assert_eq!(v["edges"][0]["to"]["portId"], "depends_on");
}

#[test]
fn empty_session() {
  assert!(Session::default().is_empty());
  assert!(!session().is_empty());
}
