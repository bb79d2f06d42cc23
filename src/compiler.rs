//! Compiles a session graph into a compose document.
//!
//! Pass 1: top-level network, volume, secret and config declarations.
//! Pass 2: one service per container-like node, plus the reverse proxy with
//! its synthesized environment.
//!
//! Key-value lists become maps and empty values are pruned recursively; a
//! collection left empty is omitted from the output.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;
use crate::types::data::{self, ICON, LINKED_INPUTS, NodeData, ORIGINAL_PORTS};
use crate::types::port::linked_fields;
use crate::types::{BuiltinKind, Edge, Node};

static SERVICE_NAME_STRIP: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_.-]").expect("static service name pattern"));
static PROXY_KEY_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z0-9]").expect("static proxy key pattern"));
static NULL_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m): null$").expect("static null pattern"));

/// Fields that only exist for the editor and never reach the output.
const EXTRA_INTERNAL_KEYS: [&str; 3] = ["linkedDependsOn", ORIGINAL_PORTS, ICON];

/// Flags dropped when `false`.
const FALSE_DEFAULTS: [&str; 6] = ["init", "stdin_open", "tty", "privileged", "read_only", "oom_kill_disable"];

/// Service fields stored as `[{key, value}]` and emitted as maps.
const KEY_VALUE_FIELDS: [&str; 5] = ["environment", "labels", "annotations", "extra_hosts", "sysctls"];

/// Name used for the reverse proxy service when it has none.
const DEFAULT_PROXY_NAME: &str = "swag";

/// The compiled document. Sections keep node order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComposeDocument {
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub services: Map<String, Value>,
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub networks: Map<String, Value>,
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub volumes: Map<String, Value>,
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub secrets: Map<String, Value>,
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub configs: Map<String, Value>,
}

impl ComposeDocument {
  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
      && self.networks.is_empty()
      && self.volumes.is_empty()
      && self.secrets.is_empty()
      && self.configs.is_empty()
  }

  /// Renders the document as YAML. Null values render as a bare `key:`.
  pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(self)?;
    Ok(NULL_VALUE.replace_all(&yaml, ":").into_owned())
  }
}

/// Lowercases `name` and strips characters outside `[a-zA-Z0-9_.-]`.
pub fn sanitize_service_name(name: &str) -> String {
  SERVICE_NAME_STRIP.replace_all(&name.to_lowercase(), "").into_owned()
}

/// Environment key carrying a proxied service's settings.
pub fn proxy_config_key(service_name: &str) -> String {
  format!(
    "PROXY_CONFIG_{}",
    PROXY_KEY_STRIP.replace_all(&service_name.to_uppercase(), "_")
  )
}

/// Loose truthiness for flags that may arrive as strings or numbers.
fn truthy(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => false,
    Some(Value::Bool(b)) => *b,
    Some(Value::String(s)) => !s.is_empty(),
    Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
    Some(_) => true,
  }
}

/// Converts `[{key_name: k, value_name: v}, ...]` into `{k: v, ...}`.
///
/// Entries with an empty key are dropped; non-array values pass through.
pub fn kv_map(value: &Value, key_name: &str, value_name: &str) -> Value {
  let Value::Array(items) = value else {
    return value.clone();
  };
  let mut map = Map::new();
  for item in items {
    if !truthy(item.get(key_name)) {
      continue;
    }
    let key = item.get(key_name).map(data::display).unwrap_or_default();
    map.insert(key, item.get(value_name).cloned().unwrap_or(Value::Null));
  }
  Value::Object(map)
}

fn convert_field(map: &mut Map<String, Value>, field: &str, key_name: &str, value_name: &str) {
  if let Some(v) = map.get_mut(field) {
    *v = kv_map(v, key_name, value_name);
  }
}

/// Recursively removes nulls, empty strings and empty containers.
///
/// Returns `None` when nothing is left.
pub fn prune(value: &Value) -> Option<Value> {
  match value {
    Value::Null => None,
    Value::Array(items) => {
      let kept: Vec<Value> = items.iter().filter_map(prune).collect();
      (!kept.is_empty()).then_some(Value::Array(kept))
    }
    Value::Object(map) => {
      let kept: Map<String, Value> = map
        .iter()
        .filter(|(_, v)| !matches!(v, Value::String(s) if s.is_empty()))
        .filter_map(|(k, v)| prune(v).map(|v| (k.clone(), v)))
        .collect();
      (!kept.is_empty()).then_some(Value::Object(kept))
    }
    other => Some(other.clone()),
  }
}

/// `{external: true, name?}` for declarations that live outside the project.
fn external_declaration(data: &NodeData) -> Value {
  let mut out = Map::new();
  out.insert("external".into(), json!(true));
  if truthy(data.get("name")) {
    out.insert("name".into(), data["name"].clone());
  }
  Value::Object(out)
}

fn network_declaration(data: &NodeData) -> Value {
  if truthy(data.get("external")) {
    return external_declaration(data);
  }
  let mut config = data.clone();
  config.shift_remove("networkName");
  config.shift_remove("external");
  config.shift_remove(LINKED_INPUTS);
  convert_field(&mut config, "driver_opts", "key", "value");
  convert_field(&mut config, "labels", "key", "value");
  if let Some(Value::Object(ipam)) = config.get_mut("ipam") {
    if let Some(Value::Array(pools)) = ipam.get_mut("config") {
      for pool in pools.iter_mut().filter_map(Value::as_object_mut) {
        convert_field(pool, "aux_addresses", "hostname", "ip");
      }
    }
    convert_field(ipam, "options", "key", "value");
  }
  prune(&Value::Object(config)).unwrap_or(Value::Null)
}

fn volume_declaration(data: &NodeData) -> Value {
  if truthy(data.get("external")) {
    return external_declaration(data);
  }
  let field = |k: &str| data.get(k).cloned().unwrap_or(Value::Null);
  let config = json!({
    "driver": field("driver"),
    "name": field("name"),
    "driver_opts": kv_map(&field("driver_opts"), "key", "value"),
    "labels": kv_map(&field("labels"), "key", "value"),
  });
  prune(&config).unwrap_or(Value::Null)
}

/// Secrets and configs: `name` plus the field selected by `source`.
fn sourced_declaration(data: &NodeData, sources: &[&str]) -> Value {
  if truthy(data.get("external")) {
    return external_declaration(data);
  }
  let mut config = Map::new();
  config.insert("name".into(), data.get("name").cloned().unwrap_or(Value::Null));
  if let Some(source) = data::text(data, "source").filter(|s| sources.contains(s)) {
    if truthy(data.get(source)) {
      config.insert(source.to_string(), data[source].clone());
    }
  }
  prune(&Value::Object(config)).unwrap_or(Value::Null)
}

fn declare(section: &mut Map<String, Value>, node: &Node, key_field: &str, value: impl FnOnce(&NodeData) -> Value) {
  match data::text(&node.data, key_field) {
    Some(key) => {
      section.insert(key.to_string(), value(&node.data));
    }
    None => debug!(node = %node.id, kind = %node.kind, "declaration without a key skipped"),
  }
}

fn proxy_service(node: &Node, edges: &[Edge]) -> (String, Option<Value>) {
  let d = &node.data;
  let name = data::text(d, "container_name").unwrap_or(DEFAULT_PROXY_NAME).to_string();
  let field = |k: &str| d.get(k).cloned().unwrap_or(Value::Null);

  let mut env = match kv_map(&field("environment"), "key", "value") {
    Value::Object(map) => map,
    _ => Map::new(),
  };
  env.insert("VALIDATION".into(), json!("duckdns"));
  env.insert("SUBDOMAINS".into(), json!("wildcard"));
  let basic = data::items(d, "connectedAuth")
    .into_iter()
    .find(|a| a.get("name").and_then(Value::as_str) == Some("basic"));
  if let Some(auth) = basic {
    env.insert("PROXY_AUTH_BASIC_USER".into(), auth.get("user").cloned().unwrap_or(Value::Null));
    env.insert("PROXY_AUTH_BASIC_PASS".into(), auth.get("pass").cloned().unwrap_or(Value::Null));
  }

  let live: HashSet<&str> = edges.iter().map(|e| e.id.as_str()).collect();
  for service in data::items(d, "connectedServices") {
    if !data::connection_id(service).is_some_and(|id| live.contains(id)) {
      continue;
    }
    let Some(service_name) = service.get("serviceName").and_then(Value::as_str) else {
      continue;
    };
    let mut settings = match service.get("config") {
      Some(Value::Object(map)) => map.clone(),
      _ => Map::new(),
    };
    settings.shift_remove("name");
    settings.insert("port".into(), service.get("port").cloned().unwrap_or(Value::Null));
    if let Some(auth) = service.get("authProvider").and_then(Value::as_str).filter(|a| *a != "none") {
      settings.insert("auth".into(), json!(auth));
    }
    env.insert(proxy_config_key(service_name), json!(Value::Object(settings).to_string()));
  }

  let config = json!({
    "image": field("image"),
    "container_name": name,
    "cap_add": field("cap_add"),
    "restart": field("restart"),
    "volumes": field("volumes"),
    "ports": field("ports"),
    "networks": field("networks"),
    "secrets": field("secrets"),
    "environment": env,
  });
  (name, prune(&config))
}

fn container_service(node: &Node) -> Option<(String, Value)> {
  let name = match node.display_name() {
    Some(n) => sanitize_service_name(n),
    None => sanitize_service_name(&node.kind),
  };
  if name.is_empty() {
    return None;
  }
  let mut config = node.data.clone();
  config.shift_remove(LINKED_INPUTS);
  for key in linked_fields().chain(EXTRA_INTERNAL_KEYS) {
    config.shift_remove(key);
  }
  for flag in FALSE_DEFAULTS {
    if config.get(flag) == Some(&Value::Bool(false)) {
      config.shift_remove(flag);
    }
  }
  if data::text(&config, "pull_policy") == Some("missing") {
    config.shift_remove("pull_policy");
  }
  if data::text(&config, "restart") == Some("no") {
    config.shift_remove("restart");
  }
  for field in KEY_VALUE_FIELDS {
    convert_field(&mut config, field, "key", "value");
  }
  prune(&Value::Object(config)).map(|v| (name, v))
}

/// Compiles `nodes` and `edges` into a compose document.
///
/// Nodes whose kind is not in `catalog` are skipped.
#[instrument(level = "trace", skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
pub fn compile(catalog: &Catalog, nodes: &[Node], edges: &[Edge]) -> ComposeDocument {
  use BuiltinKind as K;
  let mut doc = ComposeDocument::default();

  for node in nodes {
    match BuiltinKind::parse(&node.kind) {
      Some(K::TopLevelNetwork) => declare(&mut doc.networks, node, "networkName", network_declaration),
      Some(K::TopLevelVolume) => declare(&mut doc.volumes, node, "volumeKey", volume_declaration),
      Some(K::Secret) => declare(&mut doc.secrets, node, "secretKey", |d| {
        sourced_declaration(d, &["file", "environment"])
      }),
      Some(K::TopLevelConfig) => declare(&mut doc.configs, node, "configKey", |d| {
        sourced_declaration(d, &["file", "environment", "content"])
      }),
      Some(K::Volume) => {
        if let Some(name) = data::text(&node.data, "name") {
          if !doc.volumes.contains_key(name) {
            doc.volumes.insert(name.to_string(), Value::Null);
          }
        }
      }
      _ => {}
    }
  }

  for node in nodes {
    let Some(schema) = catalog.lookup(&node.kind) else {
      warn!(node = %node.id, kind = %node.kind, "unknown kind; not compiled");
      continue;
    };
    if BuiltinKind::parse(&node.kind) == Some(K::DuckdnsSwag) {
      let (name, config) = proxy_service(node, edges);
      doc.services.insert(name, config.unwrap_or(Value::Null));
      continue;
    }
    if !schema.exposes_service() {
      continue;
    }
    if let Some((name, config)) = container_service(node) {
      doc.services.insert(name, config);
    }
  }

  debug!(
    services = doc.services.len(),
    networks = doc.networks.len(),
    volumes = doc.volumes.len(),
    "compiled"
  );
  doc
}
