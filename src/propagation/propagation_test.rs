//! Tests for the propagation engine.

use proptest::prelude::*;
use serde_json::{Value, json};

use super::propagate;
use crate::catalog::Catalog;
use crate::types::{Edge, Endpoint, Node, NodeData};

fn container(id: &str, name: &str, extra: Value) -> Node {
  let mut data: NodeData = extra.as_object().cloned().unwrap_or_default();
  data.insert("container_name".into(), json!(name));
  Node::new(id, "Container", data)
}

fn edge(id: &str, kind: &str, from: (&str, &str), to: (&str, &str)) -> Edge {
  Edge {
    id: id.to_string(),
    from: Endpoint::new(from.0, from.1),
    to: Endpoint::new(to.0, to.1),
    kind: kind.to_string(),
    color: String::new(),
    appended: false,
  }
}

fn depends(id: &str, from: &str, to: &str) -> Edge {
  edge(id, "service", (from, "service"), (to, "depends_on"))
}

fn rename(nodes: &[Node], id: &str, name: &str) -> Vec<Node> {
  let mut next = nodes.to_vec();
  for n in next.iter_mut().filter(|n| n.id == id) {
    n.data.insert("container_name".into(), json!(name));
  }
  next
}

#[test]
fn rename_updates_dependency_and_nothing_else() {
  let catalog = Catalog::builtin();
  let original = vec![
    container("a", "web", json!({})),
    container("b", "app", json!({"depends_on": ["db", "web"], "restart": "always"})),
  ];
  let edges = vec![depends("e1", "a", "b")];
  let out = propagate(&catalog, &["a"], rename(&original, "a", "web2"), &edges, &original);
  let mut expected = original[1].clone();
  expected.data.insert("depends_on".into(), json!(["db", "web2"]));
  assert_eq!(out.nodes[1], expected);
  assert_eq!(out.visits, 2);
}

#[test]
fn chain_propagates_transitively() {
  let catalog = Catalog::builtin();
  let original = vec![
    Node::new("p", "ParentPath", json!({"path": "/mnt/user"}).as_object().cloned().unwrap()),
    Node::new("m", "MountPath", json!({"path": "media", "parentPath": "/mnt/user"}).as_object().cloned().unwrap()),
    container("c", "plex", json!({"volumes": ["changeme:/media"]})),
  ];
  let edges = vec![
    edge("e1", "mntpath", ("p", "mntpath"), ("m", "parentpath")),
    edge("e2", "mntpath", ("m", "mntpath"), ("c", "volume:/media")),
  ];
  let mut working = original.clone();
  working[0].data.insert("path".into(), json!("/srv"));
  let out = propagate(&catalog, &["p"], working, &edges, &original);
  assert_eq!(out.nodes[1].data["parentPath"], "/srv");
  assert_eq!(out.nodes[2].data["volumes"], json!(["/srv/media:/media"]));
  assert_eq!(out.visits, 3);
}

#[test]
fn unchanged_destination_is_not_enqueued() {
  let catalog = Catalog::builtin();
  let original = vec![
    Node::new("u", "UserOverride", json!({"value": "1000"}).as_object().cloned().unwrap()),
    container("c", "app", json!({"user": "1000"})),
    container("d", "other", json!({"depends_on": ["app"]})),
  ];
  let edges = vec![
    edge("e1", "env_value", ("u", "user_out"), ("c", "prop:user")),
    depends("e2", "c", "d"),
  ];
  let out = propagate(&catalog, &["u"], original.clone(), &edges, &original);
  assert_eq!(out.nodes, original);
  assert_eq!(out.visits, 1);
}

#[test]
fn cycle_terminates() {
  let catalog = Catalog::builtin();
  let original = vec![
    container("a", "web", json!({"depends_on": ["api"]})),
    container("b", "api", json!({"depends_on": ["web"]})),
  ];
  let edges = vec![depends("e1", "a", "b"), depends("e2", "b", "a")];
  let out = propagate(&catalog, &["a"], rename(&original, "a", "web2"), &edges, &original);
  assert_eq!(out.nodes[1].data["depends_on"], json!(["web2"]));
  assert_eq!(out.nodes[0].data["depends_on"], json!(["api"]));
  assert!(out.visits <= 2);
}

#[test]
fn diamond_visits_each_node_once() {
  let catalog = Catalog::builtin();
  let original = vec![
    Node::new("n", "Network", json!({"name": "lan"}).as_object().cloned().unwrap()),
    container("a", "a", json!({"networks": ["lan"], "linkedNetworks": ["lan"]})),
    container("b", "b", json!({"networks": ["lan"], "linkedNetworks": ["lan"]})),
    container("c", "c", json!({"depends_on": ["a", "b"]})),
  ];
  let edges = vec![
    edge("e1", "network", ("n", "network_out"), ("a", "networks_in")),
    edge("e2", "network", ("n", "network_out"), ("b", "networks_in")),
    depends("e3", "a", "c"),
    depends("e4", "b", "c"),
  ];
  let mut working = original.clone();
  working[0].data.insert("name".into(), json!("wan"));
  let out = propagate(&catalog, &["n"], working, &edges, &original);
  assert_eq!(out.nodes[1].data["networks"], json!(["wan"]));
  assert_eq!(out.nodes[2].data["linkedNetworks"], json!(["wan"]));
  assert_eq!(out.visits, 3);
}

#[test]
fn unknown_kind_is_skipped() {
  let catalog = Catalog::builtin();
  let original = vec![Node::new("x", "Nope", NodeData::new()), container("c", "c", json!({}))];
  let edges = vec![depends("e1", "x", "c")];
  let out = propagate(&catalog, &["x"], original.clone(), &edges, &original);
  assert_eq!(out.nodes, original);
}

#[test]
fn multiple_seeds_are_processed_once() {
  let catalog = Catalog::builtin();
  let original = vec![container("a", "a", json!({})), container("b", "b", json!({"depends_on": ["a"]}))];
  let edges = vec![depends("e1", "a", "b")];
  let out = propagate(&catalog, &["a", "b"], rename(&original, "a", "a2"), &edges, &original);
  assert_eq!(out.nodes[1].data["depends_on"], json!(["a2"]));
  assert_eq!(out.visits, 2);
}

proptest! {
  #[test]
  fn terminates_within_edge_bound(
    n in 2usize..8,
    pairs in proptest::collection::vec((0usize..8, 0usize..8), 0..24),
    start in 0usize..8,
  ) {
    let catalog = Catalog::builtin();
    let names: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
    let original: Vec<Node> = (0..n)
      .map(|i| container(&format!("n{i}"), &names[i], json!({"depends_on": names})))
      .collect();
    let edges: Vec<Edge> = pairs
      .iter()
      .filter(|(a, b)| a % n != b % n)
      .enumerate()
      .map(|(k, (a, b))| depends(&format!("e{k}"), &format!("n{}", a % n), &format!("n{}", b % n)))
      .collect();
    let seed = format!("n{}", start % n);
    let working = rename(&original, &seed, "renamed");
    let out = propagate(&catalog, &[seed.as_str()], working, &edges, &original);
    prop_assert!(out.visits <= edges.len() + 1);
    prop_assert!(out.visits <= n);
    prop_assert_eq!(out.nodes.len(), n);
  }
}
