//! Output value of a node: what every one of its output ports carries.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

use crate::types::{BuiltinKind, Node, Schema, data};

static SLASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+").expect("static slash pattern"));

/// Default parent directory of a path builder.
pub const DEFAULT_PARENT_PATH: &str = "/mnt/user";
/// Default local segment of a mount path.
pub const DEFAULT_MOUNT_PATH: &str = "/path";

/// Joins `parent` and `own` with a `/`, collapsing runs of slashes.
pub fn join_path(parent: &str, own: &str) -> String {
  SLASH_RUNS
    .replace_all(&format!("{parent}/{own}"), "/")
    .into_owned()
}

fn string_or(node: &Node, key: &str, default: &str) -> Value {
  match node.data.get(key) {
    Some(v) if !v.is_null() => v.clone(),
    _ => json!(default),
  }
}

fn named(node: &Node, key: &str) -> Option<Value> {
  data::text(&node.data, key).map(|s| json!(s))
}

/// Computes the value exposed by `node`, given its effective schema.
///
/// Returns `None` when a required field is empty or the kind exposes nothing.
pub fn resolve(node: &Node, schema: &Schema) -> Option<Value> {
  use BuiltinKind as K;
  match BuiltinKind::parse(&node.kind) {
    Some(
      K::EnvVarOverride
      | K::UserOverride
      | K::ShmSizeOverride
      | K::RestartPolicyOverride
      | K::SecurityOpt
      | K::Device,
    ) => Some(string_or(node, "value", "")),
    Some(K::ParentPath) => Some(string_or(node, "path", DEFAULT_PARENT_PATH)),
    Some(K::MountPath) => {
      let parent = data::text(&node.data, "parentPath").unwrap_or("");
      let own = match node.data.get("path") {
        Some(Value::Null) | None => DEFAULT_MOUNT_PATH.to_string(),
        Some(v) => data::display(v),
      };
      Some(json!(join_path(parent, &own)))
    }
    Some(K::Network | K::Volume | K::SecretOverride | K::Config) => named(node, "name"),
    Some(K::Secret) => named(node, "secretKey"),
    Some(K::TopLevelVolume) => named(node, "volumeKey"),
    Some(K::TopLevelConfig) => named(node, "configKey"),
    Some(K::TopLevelNetwork) => named(node, "networkName"),
    Some(K::Label) => Some(json!({
      "key": data::text(&node.data, "key").unwrap_or(""),
      "value": data::text(&node.data, "value").unwrap_or(""),
    })),
    Some(K::SwagAuthBasic) => Some(json!({
      "name": "basic",
      "user": data::text(&node.data, "user").unwrap_or("username"),
      "pass": data::text(&node.data, "pass").unwrap_or("changeme"),
    })),
    _ if schema.exposes_service() => Some(json!(node.identifier())),
    _ => None,
  }
}
