//! Port declarations: typed connection points on a node.

use serde::{Deserialize, Serialize};

/// Value kinds carried by output ports and accepted by input ports.
pub mod port_kind {
  pub const SERVICE: &str = "service";
  pub const PORTMAP: &str = "portmap";
  pub const LABEL: &str = "label";
  pub const NETWORK: &str = "network";
  pub const SECRET: &str = "secret";
  pub const CONFIG: &str = "config";
  pub const VOLUME: &str = "volume";
  pub const MNTPATH: &str = "mntpath";
  pub const ENV_VALUE: &str = "env_value";
  pub const STRING_VALUE: &str = "string_value";
  pub const SWAG_AUTH: &str = "swag_auth";
}

/// Well-known port ids and id prefixes.
pub mod port_id {
  pub const DEPENDS_ON: &str = "depends_on";
  pub const LABELS_IN: &str = "labels_in";
  pub const NETWORKS_IN: &str = "networks_in";
  pub const SECRETS_IN: &str = "secrets_in";
  pub const CONFIGS_IN: &str = "configs_in";
  pub const DEVICES_IN: &str = "devices_in";
  pub const SECURITY_OPT_IN: &str = "security_opt_in";
  pub const SERVICES_IN: &str = "services_in";
  pub const AUTH_IN: &str = "auth_in";
  pub const PORTS: &str = "ports";
  pub const PARENT_PATH: &str = "parentpath";
  pub const SERVICE: &str = "service";
  pub const PORTMAP: &str = "portmap";
  pub const ENV_OUT_PLACEHOLDER: &str = "env_out_placeholder";

  /// Scalar property override input, `prop:<field>`.
  pub const PROP_PREFIX: &str = "prop:";
  /// Dynamic environment input, `env:<key>`.
  pub const ENV_PREFIX: &str = "env:";
  /// Dynamic volume input, `volume:<target>`.
  pub const VOLUME_PREFIX: &str = "volume:";
  /// Environment-variable provider output, `env_out:<key>`.
  pub const ENV_OUT_PREFIX: &str = "env_out:";
}

/// An input port declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPort {
  pub id: String,
  pub name: String,
  pub compatible_kinds: Vec<String>,
  pub multiple: bool,
  pub color: String,
}

impl InputPort {
  pub fn new(id: impl Into<String>, name: impl Into<String>, kinds: &[&str], multiple: bool, color: &str) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      compatible_kinds: kinds.iter().map(|k| k.to_string()).collect(),
      multiple,
      color: color.to_string(),
    }
  }

  /// Returns true if an output of `kind` may connect here.
  pub fn accepts(&self, kind: &str) -> bool {
    self.compatible_kinds.iter().any(|k| k == kind)
  }
}

/// An output port declaration. Each output exposes the node's single resolved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPort {
  pub id: String,
  pub name: String,
  pub kind: String,
  pub multiple: bool,
  pub color: String,
  /// Present but not connectable.
  #[serde(default)]
  pub disabled: bool,
}

impl OutputPort {
  pub fn new(id: impl Into<String>, name: impl Into<String>, kind: &str, color: &str) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      kind: kind.to_string(),
      multiple: true,
      color: color.to_string(),
      disabled: false,
    }
  }
}

/// An input port whose values land in a string list plus a "linked" shadow list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierListPort {
  pub port_id: &'static str,
  pub field: &'static str,
  pub linked_field: &'static str,
}

const IDENTIFIER_LIST_PORTS: &[IdentifierListPort] = &[
  IdentifierListPort {
    port_id: port_id::NETWORKS_IN,
    field: "networks",
    linked_field: "linkedNetworks",
  },
  IdentifierListPort {
    port_id: port_id::SECRETS_IN,
    field: "secrets",
    linked_field: "linkedSecrets",
  },
  IdentifierListPort {
    port_id: port_id::CONFIGS_IN,
    field: "configs",
    linked_field: "linkedConfigs",
  },
  IdentifierListPort {
    port_id: port_id::DEVICES_IN,
    field: "devices",
    linked_field: "linkedDevices",
  },
  IdentifierListPort {
    port_id: port_id::SECURITY_OPT_IN,
    field: "security_opt",
    linked_field: "linkedSecurityOpt",
  },
];

/// Looks up the identifier-list binding for an input port id.
pub fn identifier_list(port: &str) -> Option<&'static IdentifierListPort> {
  IDENTIFIER_LIST_PORTS.iter().find(|p| p.port_id == port)
}

/// All shadow-list field names, for stripping before serialization.
pub fn linked_fields() -> impl Iterator<Item = &'static str> {
  IDENTIFIER_LIST_PORTS.iter().map(|p| p.linked_field)
}
