//! Tests for output value resolution.

use serde_json::{Value, json};

use crate::catalog::Catalog;
use crate::resolver::{join_path, resolve};
use crate::types::{Node, NodeData};

fn resolve_kind(kind: &str, data: Value) -> Option<Value> {
  let catalog = Catalog::builtin();
  let data: NodeData = data.as_object().cloned().unwrap();
  let node = Node::new("n", kind, data);
  resolve(&node, catalog.lookup(kind).unwrap())
}

#[test]
fn scalar_providers_default_to_empty_string() {
  for kind in ["EnvVarOverride", "UserOverride", "ShmSizeOverride", "RestartPolicyOverride", "SecurityOpt", "Device"] {
    assert_eq!(resolve_kind(kind, json!({})), Some(json!("")), "{kind}");
  }
  assert_eq!(resolve_kind("UserOverride", json!({"value": "1000:1000"})), Some(json!("1000:1000")));
}

#[test]
fn parent_path_default() {
  assert_eq!(resolve_kind("ParentPath", json!({})), Some(json!("/mnt/user")));
  assert_eq!(resolve_kind("ParentPath", json!({"path": "/srv"})), Some(json!("/srv")));
}

#[test]
fn mount_path_joins_and_collapses_slashes() {
  assert_eq!(resolve_kind("MountPath", json!({})), Some(json!("/path")));
  assert_eq!(
    resolve_kind("MountPath", json!({"parentPath": "/mnt/user/", "path": "/media"})),
    Some(json!("/mnt/user/media"))
  );
  assert_eq!(join_path("a//b", "c"), "a/b/c");
}

#[test]
fn named_resources_require_a_name() {
  assert_eq!(resolve_kind("Network", json!({"name": "proxy"})), Some(json!("proxy")));
  assert_eq!(resolve_kind("Network", json!({"name": ""})), None);
  assert_eq!(resolve_kind("Secret", json!({"secretKey": "db_pass"})), Some(json!("db_pass")));
  assert_eq!(resolve_kind("TopLevelVolume", json!({"volumeKey": "media"})), Some(json!("media")));
  assert_eq!(resolve_kind("TopLevelConfig", json!({})), None);
  assert_eq!(resolve_kind("TopLevelNetwork", json!({"networkName": "lan"})), Some(json!("lan")));
}

#[test]
fn structured_values() {
  assert_eq!(
    resolve_kind("Label", json!({"key": "traefik.enable"})),
    Some(json!({"key": "traefik.enable", "value": ""}))
  );
  assert_eq!(
    resolve_kind("SwagAuthBasic", json!({"user": "admin"})),
    Some(json!({"name": "basic", "user": "admin", "pass": "changeme"}))
  );
}

#[test]
fn service_like_nodes_resolve_to_identifier() {
  assert_eq!(resolve_kind("Container", json!({"container_name": "web"})), Some(json!("web")));
  assert_eq!(resolve_kind("Container", json!({})), Some(json!("Container")));
}

#[test]
fn non_providers_resolve_to_none() {
  assert_eq!(resolve_kind("Defaultbridge", json!({})), None);
  assert_eq!(resolve_kind("DuckdnsSwag", json!({})), None);
  assert_eq!(resolve_kind("ColorBox", json!({})), None);
}

#[test]
fn resolve_does_not_mutate() {
  let catalog = Catalog::builtin();
  let data: NodeData = json!({"parentPath": "/a", "path": "b"}).as_object().cloned().unwrap();
  let node = Node::new("n", "MountPath", data);
  let before = node.clone();
  let schema = catalog.lookup("MountPath").unwrap();
  assert_eq!(resolve(&node, schema), resolve(&node, schema));
  assert_eq!(node, before);
}
