//! The closed set of merge rules applied to an edge's destination during propagation.
//!
//! A rule is selected from the edge's kind and its destination (and for
//! environment overrides, source) port id. Rules mutate a copy of the
//! destination's data; the engine decides whether anything changed.

use serde_json::{Map, Value, json};

use crate::types::data::{self, NodeData};
use crate::types::port::{IdentifierListPort, identifier_list, port_id, port_kind};
use crate::types::{Edge, Node};

/// Everything a rule may read while merging one edge.
pub struct MergeInput<'a> {
  pub edge: &'a Edge,
  pub source: &'a Node,
  /// Source's current output value, `Null` when it resolves to nothing.
  pub new_value: &'a Value,
  /// Source's output value before the change.
  pub old_value: &'a Value,
  pub edges: &'a [Edge],
  pub nodes: &'a [Node],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRule {
  /// Recompute the destination's port list from every edge feeding `ports`.
  PortMapAggregation,
  /// Track the source's identifier in the matching registered-service entry.
  ServiceRegistration,
  /// Merge credentials into the matching registered-auth entry.
  AuthProviderBinding,
  /// `prop:<field>`: replace the field outright.
  ScalarOverride { field: String },
  /// Rename the old value in `depends_on`.
  DependencyRename,
  /// Rename the old value in a list and its linked shadow list.
  IdentifierList(&'static IdentifierListPort),
  /// Replace the label entry owned by this edge.
  LabeledList,
  /// `volume:<target>`: rewrite the source half of the matching volume.
  VolumeSource { target: String },
  /// `env:<key>`: set the matching environment entry's value.
  EnvOverride { key: String },
  /// Set a path builder's `parentPath`.
  PathComposition,
  NoOp,
}

impl MergeRule {
  /// Picks the rule for `edge`.
  pub fn select(edge: &Edge) -> Self {
    let kind = edge.kind.as_str();
    let port = edge.to.port_id.as_str();
    match (kind, port) {
      (port_kind::PORTMAP, port_id::PORTS) => return Self::PortMapAggregation,
      (port_kind::SERVICE, port_id::SERVICES_IN) => return Self::ServiceRegistration,
      (port_kind::SWAG_AUTH, port_id::AUTH_IN) => return Self::AuthProviderBinding,
      _ => {}
    }
    if let Some(field) = port.strip_prefix(port_id::PROP_PREFIX) {
      return Self::ScalarOverride {
        field: field.to_string(),
      };
    }
    if port == port_id::DEPENDS_ON {
      return Self::DependencyRename;
    }
    if let Some(list) = identifier_list(port) {
      return Self::IdentifierList(list);
    }
    if port == port_id::LABELS_IN {
      return Self::LabeledList;
    }
    if let Some(target) = port.strip_prefix(port_id::VOLUME_PREFIX) {
      return Self::VolumeSource {
        target: target.to_string(),
      };
    }
    if let Some(key) = port.strip_prefix(port_id::ENV_PREFIX) {
      let from_key = edge.from.port_id.strip_prefix(port_id::ENV_OUT_PREFIX);
      return match from_key {
        Some(k) if k == key => Self::EnvOverride {
          key: key.to_string(),
        },
        _ => Self::NoOp,
      };
    }
    if kind == port_kind::MNTPATH && port == port_id::PARENT_PATH {
      return Self::PathComposition;
    }
    Self::NoOp
  }

  /// Applies the rule to `dest`, a copy of the destination node's data.
  pub fn apply(&self, input: &MergeInput<'_>, dest: &mut NodeData) {
    match self {
      Self::PortMapAggregation => {
        let ports = aggregate_ports(&input.edge.to.node_id, input.edges, input.nodes);
        dest.insert("ports".into(), Value::Array(ports));
      }
      Self::ServiceRegistration => {
        let name = json!(input.source.identifier());
        for_each_owned(dest, "connectedServices", &input.edge.id, |entry| {
          entry.insert("serviceName".into(), name.clone());
        });
      }
      Self::AuthProviderBinding => {
        if let Value::Object(creds) = input.new_value {
          for_each_owned(dest, "connectedAuth", &input.edge.id, |entry| {
            entry.extend(creds.clone());
          });
        }
      }
      Self::ScalarOverride { field } => {
        dest.insert(field.clone(), input.new_value.clone());
      }
      Self::DependencyRename => {
        data::replace_in_list(dest, port_id::DEPENDS_ON, input.old_value, input.new_value);
      }
      Self::IdentifierList(list) => {
        data::replace_in_list(dest, list.field, input.old_value, input.new_value);
        data::replace_in_list(dest, list.linked_field, input.old_value, input.new_value);
      }
      Self::LabeledList => {
        let key = input.new_value.get("key").cloned().unwrap_or(json!(""));
        let value = input.new_value.get("value").cloned().unwrap_or(json!(""));
        for_each_owned(dest, "labels", &input.edge.id, |entry| {
          entry.insert("key".into(), key.clone());
          entry.insert("value".into(), value.clone());
          entry.insert("isLinked".into(), json!(true));
        });
      }
      Self::VolumeSource { target } => {
        let source = data::display(input.new_value);
        if let Some(Value::Array(volumes)) = dest.get_mut("volumes") {
          for v in volumes.iter_mut() {
            if let Some(rebound) = v.as_str().and_then(|s| rebind_volume(s, target, &source)) {
              *v = json!(rebound);
            }
          }
        }
      }
      Self::EnvOverride { key } => {
        if let Some(Value::Array(env)) = dest.get_mut("environment") {
          for entry in env.iter_mut().filter_map(Value::as_object_mut) {
            if entry.get("key").and_then(Value::as_str) == Some(key.as_str()) {
              entry.insert("value".into(), input.new_value.clone());
            }
          }
        }
      }
      Self::PathComposition => {
        dest.insert("parentPath".into(), input.new_value.clone());
      }
      Self::NoOp => {}
    }
  }
}

/// Runs `f` on every object entry of `key` whose `connectionId` is `edge_id`.
fn for_each_owned(dest: &mut NodeData, key: &str, edge_id: &str, mut f: impl FnMut(&mut Map<String, Value>)) {
  if let Some(Value::Array(list)) = dest.get_mut(key) {
    for entry in list.iter_mut() {
      if data::connection_id(entry) == Some(edge_id) {
        if let Some(obj) = entry.as_object_mut() {
          f(obj);
        }
      }
    }
  }
}

/// Returns `source:target[:mode]` if `binding` targets `target` with a different source.
fn rebind_volume(binding: &str, target: &str, source: &str) -> Option<String> {
  let (current_source, current_target) = data::split_volume(binding);
  let current_target = if current_target.is_empty() { binding } else { current_target };
  if current_target != target || current_source == source {
    return None;
  }
  let mode: Vec<&str> = binding.split(':').skip(2).collect();
  let mut rebound = format!("{source}:{target}");
  for part in mode {
    rebound.push(':');
    rebound.push_str(part);
  }
  Some(rebound)
}

/// Port-map entry for one source port binding.
pub fn port_entry(edge_id: &str, source: &Node, binding: &str) -> Value {
  let (host, container) = data::split_port(binding);
  let mapped = if host.is_empty() {
    json!("")
  } else {
    data::leading_number(host).map_or(Value::Null, |n| json!(n))
  };
  json!({
    "connectionId": edge_id,
    "name": format!("{}:{}", source.identifier(), container),
    "mappedPort": mapped,
  })
}

/// Full recompute of a bridge's port list across every edge feeding its `ports` input.
pub fn aggregate_ports(bridge_id: &str, edges: &[Edge], nodes: &[Node]) -> Vec<Value> {
  edges
    .iter()
    .filter(|e| e.feeds(bridge_id, port_id::PORTS))
    .flat_map(|e| {
      nodes
        .iter()
        .find(|n| n.id == e.from.node_id)
        .map(|source| {
          data::items(&source.data, "ports")
            .iter()
            .filter_map(Value::as_str)
            .map(|p| port_entry(&e.id, source, p))
            .collect::<Vec<_>>()
        })
        .unwrap_or_default()
    })
    .collect()
}
