//! Effective schema of a node: its kind's ports adjusted for the node's current data.
//!
//! Never cached. Port identity depends on data, so callers derive again after
//! every change.

use std::borrow::Cow;
use std::collections::HashSet;

use serde_json::Value;

use crate::catalog::builtin;
use crate::types::port::{port_id, port_kind};
use crate::types::{BindingAllowList, BuiltinKind, InputPort, Node, OutputPort, Schema, data};

const VOLUME_COLOR: &str = "#ecc94b";
const ENV_COLOR: &str = "#f6ad55";
const PLACEHOLDER_COLOR: &str = "#a0aec0";

fn volume_input(target: &str) -> InputPort {
  let chars: Vec<char> = target.chars().collect();
  let label = if chars.len() > 12 {
    format!("...{}", chars[chars.len() - 9..].iter().collect::<String>())
  } else {
    target.to_string()
  };
  InputPort::new(
    format!("{}{}", port_id::VOLUME_PREFIX, target),
    format!("vol: {label}"),
    &[port_kind::MNTPATH, port_kind::VOLUME],
    false,
    VOLUME_COLOR,
  )
}

fn env_input(key: &str) -> InputPort {
  InputPort::new(
    format!("{}{}", port_id::ENV_PREFIX, key),
    key,
    &[port_kind::MNTPATH, port_kind::ENV_VALUE],
    false,
    ENV_COLOR,
  )
}

/// One input per volume target and per environment key, filtered by `allow`.
fn binding_inputs(node: &Node, allow: Option<&BindingAllowList>) -> Vec<InputPort> {
  let volumes = data::items(&node.data, "volumes")
    .iter()
    .filter_map(Value::as_str)
    .map(|v| data::split_volume(v).1)
    .filter(|t| !t.is_empty() && allow.is_none_or(|a| a.allows_volume(t)))
    .map(volume_input);
  let env = data::items(&node.data, "environment")
    .iter()
    .filter_map(|e| e.get("key").and_then(Value::as_str))
    .filter(|k| !k.is_empty() && allow.is_none_or(|a| a.allows_env(k)))
    .map(env_input);
  volumes.chain(env).collect()
}

/// Appends `extra` to `inputs`, skipping ids already present.
fn merge_inputs(inputs: &mut Vec<InputPort>, extra: Vec<InputPort>) {
  let mut seen: HashSet<String> = inputs.iter().map(|p| p.id.clone()).collect();
  for port in extra {
    if seen.insert(port.id.clone()) {
      inputs.push(port);
    }
  }
}

fn env_provider(node: &Node, schema: &Schema) -> Schema {
  let output = match data::text(&node.data, "key") {
    Some(key) => OutputPort::new(
      format!("{}{}", port_id::ENV_OUT_PREFIX, key),
      key,
      port_kind::ENV_VALUE,
      ENV_COLOR,
    ),
    None => OutputPort {
      multiple: false,
      ..OutputPort::new(
        port_id::ENV_OUT_PLACEHOLDER,
        "Set Key",
        port_kind::ENV_VALUE,
        PLACEHOLDER_COLOR,
      )
    },
  };
  Schema {
    outputs: vec![output],
    ..schema.clone()
  }
}

/// Matches a toggle against a port's id or display name.
fn toggled(toggles: &[String], id: &str, name: &str) -> bool {
  toggles.iter().any(|t| t == id || t == name)
}

fn override_group(node: &Node, schema: &Schema) -> Schema {
  let enabled_inputs = data::string_items(&node.data, "enabledInputs");
  let enabled_outputs = data::string_items(&node.data, "enabledOutputs");

  let mut inputs: Vec<InputPort> = builtin::container_inputs()
    .into_iter()
    .filter(|p| toggled(&enabled_inputs, &p.id, &p.name))
    .collect();
  let volumes = data::string_items(&node.data, "volumes");
  let env = data::string_items(&node.data, "envVars");
  let dynamic = volumes
    .iter()
    .map(|v| v.trim())
    .filter(|v| !v.is_empty())
    .map(volume_input)
    .chain(env.iter().map(|k| k.trim()).filter(|k| !k.is_empty()).map(env_input))
    .collect();
  merge_inputs(&mut inputs, dynamic);

  let outputs = builtin::container_outputs()
    .into_iter()
    .filter(|p| toggled(&enabled_outputs, &p.id, &p.name))
    .collect();

  Schema {
    inputs,
    outputs,
    ..schema.clone()
  }
}

/// Computes the effective schema of `node` from its kind's static schema.
pub fn effective_schema<'a>(node: &Node, schema: &'a Schema) -> Cow<'a, Schema> {
  match BuiltinKind::parse(&node.kind) {
    Some(BuiltinKind::EnvVarOverride) => return Cow::Owned(env_provider(node, schema)),
    Some(BuiltinKind::OverrideGroup) => return Cow::Owned(override_group(node, schema)),
    _ => {}
  }

  let mut effective = Cow::Borrowed(schema);
  if schema.has_dependency_input() || schema.bindings.is_some() {
    let dynamic = binding_inputs(node, schema.bindings.as_ref());
    if !dynamic.is_empty() {
      merge_inputs(&mut effective.to_mut().inputs, dynamic);
    }
  }

  if data::text(&node.data, "network_mode") == Some("host") && schema.output(port_id::PORTMAP).is_some() {
    for output in effective.to_mut().outputs.iter_mut() {
      if output.id == port_id::PORTMAP {
        output.name = "Host".to_string();
        output.disabled = true;
      }
    }
  }
  effective
}
