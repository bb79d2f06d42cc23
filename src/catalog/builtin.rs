//! Built-in node kinds and the container template shared by every service kind.

use serde_json::{Value, json};

use crate::types::port::{port_id, port_kind};
use crate::types::{BindingAllowList, BuiltinKind, InputPort, NodeData, OutputPort, Schema, Size};

const BLUE: &str = "#4299e1";
const SERVICE_BLUE: &str = "#63b3ed";
const GREEN: &str = "#48bb78";
const PINK: &str = "#ed64a6";
const OCHRE: &str = "#d69e2e";
const INDIGO: &str = "#667eea";
const SLATE: &str = "#718096";
const GRAY: &str = "#a0aec0";
const RED: &str = "#f56565";
const ORANGE: &str = "#f6ad55";
const YELLOW: &str = "#f6e05e";
const AMBER: &str = "#ecc94b";
const PURPLE: &str = "#9f7aea";
const TEAL: &str = "#38b2ac";

/// Footprint of container nodes.
pub const CONTAINER_SIZE: Size = Size::new(24, 20);

/// Display name, kind and color of each scalar property override port.
const PROPERTY_PORTS: [(&str, &str, &str); 3] = [
  ("restart", "Restart", BLUE),
  ("user", "User", PURPLE),
  ("shm_size", "SHM Size", TEAL),
];

fn object(v: Value) -> NodeData {
  match v {
    Value::Object(map) => map,
    _ => NodeData::new(),
  }
}

fn prop_input(field: &str, name: &str, color: &str) -> InputPort {
  InputPort::new(
    format!("{}{}", port_id::PROP_PREFIX, field),
    name,
    &[port_kind::ENV_VALUE],
    false,
    color,
  )
}

/// Static inputs of every container kind.
pub fn container_inputs() -> Vec<InputPort> {
  let mut inputs = vec![
    InputPort::new(port_id::DEPENDS_ON, "Depends On", &[port_kind::SERVICE], true, SERVICE_BLUE),
    InputPort::new(port_id::LABELS_IN, "Labels", &[port_kind::LABEL], true, GRAY),
    InputPort::new(port_id::NETWORKS_IN, "Networks", &[port_kind::NETWORK], true, GREEN),
    InputPort::new(port_id::SECRETS_IN, "Secrets", &[port_kind::SECRET], true, PINK),
    InputPort::new(port_id::CONFIGS_IN, "Configs", &[port_kind::CONFIG], true, OCHRE),
    InputPort::new(port_id::DEVICES_IN, "Devices", &[port_kind::MNTPATH], true, INDIGO),
    InputPort::new(port_id::SECURITY_OPT_IN, "Security Opts", &[port_kind::STRING_VALUE], true, SLATE),
  ];
  inputs.extend(PROPERTY_PORTS.iter().map(|(f, n, c)| prop_input(f, n, c)));
  inputs
}

/// Static outputs of every container kind.
pub fn container_outputs() -> Vec<OutputPort> {
  vec![
    OutputPort::new(port_id::SERVICE, "Service", port_kind::SERVICE, SERVICE_BLUE),
    OutputPort::new(port_id::PORTMAP, "Ports", port_kind::PORTMAP, RED),
  ]
}

/// A container-kind schema with the given name and default data.
pub fn container_template(name: &str, icon: Option<String>, default_data: NodeData) -> Schema {
  Schema {
    icon,
    default_data,
    inputs: container_inputs(),
    outputs: container_outputs(),
    ..Schema::new(name, CONTAINER_SIZE)
  }
}

/// Default data of a user-authored container.
pub fn custom_container_data() -> NodeData {
  object(json!({
    "image": "",
    "restart": "unless-stopped",
    "environment": [],
    "labels": [],
    "ports": [],
    "volumes": [],
    "networks": [],
    "devices": [],
    "security_opt": [],
    "secrets": [],
    "configs": [],
  }))
}

/// Initial value of an image default field.
#[derive(Debug, Clone, Copy)]
enum Initial {
  Text(&'static str),
  Flag(bool),
  List,
  Table,
}

impl Initial {
  fn value(self) -> Value {
    match self {
      Initial::Text(s) => Value::String(s.to_string()),
      Initial::Flag(b) => Value::Bool(b),
      Initial::List => Value::Array(Vec::new()),
      Initial::Table => Value::Object(NodeData::new()),
    }
  }
}

/// Fields every catalog image starts with, in emitted order.
const IMAGE_BASE_FIELDS: &[(&str, Initial)] = {
  use Initial::{Flag, List, Table, Text};
  &[
    ("restart", Text("unless-stopped")),
    ("healthcheck", Table),
    ("command", Text("")),
    ("entrypoint", Text("")),
    ("working_dir", Text("")),
    ("stop_signal", Text("")),
    ("stop_grace_period", Text("")),
    ("init", Flag(false)),
    ("stdin_open", Flag(false)),
    ("tty", Flag(false)),
    ("network_mode", Text("")),
    ("hostname", Text("")),
    ("domainname", Text("")),
    ("mac_address", Text("")),
    ("dns", List),
    ("dns_search", List),
    ("dns_opt", List),
    ("extra_hosts", List),
    ("expose", List),
    ("links", List),
    ("volumes", List),
    ("volumes_from", List),
    ("tmpfs", List),
    ("environment", List),
    ("env_file", List),
    ("labels", List),
    ("annotations", List),
    ("depends_on", List),
    ("secrets", List),
    ("configs", List),
    ("security_opt", List),
    ("cap_add", List),
    ("cap_drop", List),
    ("group_add", List),
    ("privileged", Flag(false)),
    ("read_only", Flag(false)),
    ("user", Text("")),
    ("cpus", Text("")),
    ("cpu_shares", Text("")),
    ("mem_limit", Text("")),
    ("mem_reservation", Text("")),
    ("pids_limit", Text("")),
    ("shm_size", Text("")),
    ("devices", List),
    ("sysctls", List),
    ("pid", Text("")),
    ("uts", Text("")),
    ("userns_mode", Text("")),
    ("oom_score_adj", Text("")),
    ("oom_kill_disable", Flag(false)),
    ("pull_policy", Text("missing")),
    ("platform", Text("")),
    ("scale", Text("")),
    ("profiles", List),
  ]
};

/// Default data of a catalog image before its record-specific fields are applied.
pub fn image_base_data() -> NodeData {
  IMAGE_BASE_FIELDS
    .iter()
    .map(|(key, initial)| (key.to_string(), initial.value()))
    .collect()
}

fn provider(name: &str, size: Size, out_id: &str, out_name: &str, kind: &str, color: &str) -> Schema {
  Schema {
    outputs: vec![OutputPort::new(out_id, out_name, kind, color)],
    ..Schema::new(name, size)
  }
}

fn reverse_proxy() -> Schema {
  Schema {
    icon: Some("https://github.com/linuxserver/docker-templates/raw/master/linuxserver.io/img/swag.gif".to_string()),
    default_data: object(json!({
      "image": "lsiodev/swag:5.0.0-env-templating",
      "container_name": "swag",
      "cap_add": ["NET_ADMIN"],
      "restart": "unless-stopped",
      "environment": [
        {"key": "PUID", "value": "1000"},
        {"key": "PGID", "value": "1000"},
        {"key": "TZ", "value": "Etc/UTC"},
        {"key": "URL", "value": "yourdomain.duckdns.org"},
        {"key": "DUCKDNSTOKEN", "value": "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"},
      ],
      "volumes": ["changeme:/config"],
      "ports": ["443:443", "80:80"],
      "connectedServices": [],
      "connectedAuth": [],
      "networks": [],
      "secrets": [],
    })),
    inputs: vec![
      InputPort::new(port_id::SERVICES_IN, "Services", &[port_kind::SERVICE], true, SERVICE_BLUE),
      InputPort::new(port_id::AUTH_IN, "Auth Providers", &[port_kind::SWAG_AUTH], true, BLUE),
      InputPort::new(port_id::NETWORKS_IN, "Networks", &[port_kind::NETWORK], true, GREEN),
      InputPort::new(port_id::SECRETS_IN, "Secrets", &[port_kind::SECRET], true, PINK),
      prop_input("restart", "Restart", BLUE),
    ],
    outputs: vec![OutputPort::new(port_id::PORTMAP, "Ports", port_kind::PORTMAP, RED)],
    bindings: Some(BindingAllowList {
      env: vec!["PUID".into(), "PGID".into(), "TZ".into()],
      volumes: vec!["/config".into()],
    }),
    ..Schema::new("DuckDNS SWAG", Size::new(20, 24))
  }
}

/// Schema of a built-in kind.
pub fn schema(kind: BuiltinKind) -> Schema {
  use BuiltinKind as K;
  let small = Size::new(14, 8);
  match kind {
    K::Container => container_template("Container", None, custom_container_data()),
    K::DuckdnsSwag => reverse_proxy(),
    K::Defaultbridge => Schema {
      default_data: object(json!({"ports": []})),
      inputs: vec![InputPort::new(port_id::PORTS, "Ports", &[port_kind::PORTMAP], true, RED)],
      ..Schema::new("Default Bridge", Size::new(16, 12))
    },
    K::EnvVarOverride => Schema {
      default_data: object(json!({"key": "", "value": ""})),
      ..provider("Env Var", Size::new(14, 10), "env_out", "Value", port_kind::ENV_VALUE, ORANGE)
    },
    K::UserOverride => provider("User", small, "user_out", "User", port_kind::ENV_VALUE, PURPLE),
    K::ShmSizeOverride => provider("SHM Size", small, "shm_size_out", "Size", port_kind::ENV_VALUE, TEAL),
    K::RestartPolicyOverride => provider("Restart Policy", small, "restart_policy_out", "Policy", port_kind::ENV_VALUE, BLUE),
    K::SecurityOpt => provider("Security Option", Size::new(16, 8), "security_opt_out", "Option", port_kind::STRING_VALUE, SLATE),
    K::Device => provider("Device", Size::new(16, 8), "device_out", "Device", port_kind::MNTPATH, INDIGO),
    K::ParentPath => provider("Parent Path", Size::new(12, 8), "mntpath", "Path", port_kind::MNTPATH, YELLOW),
    K::MountPath => Schema {
      inputs: vec![InputPort::new(port_id::PARENT_PATH, "Parent Path", &[port_kind::MNTPATH], false, YELLOW)],
      ..provider("Mount Path", small, "mntpath", "Mount Path", port_kind::MNTPATH, YELLOW)
    },
    K::Label => provider("Label", Size::new(14, 10), "label_out", "Label", port_kind::LABEL, GRAY),
    K::SwagAuthBasic => provider("Basic", Size::new(14, 10), "swag_auth_out", "Basic Auth", port_kind::SWAG_AUTH, BLUE),
    K::Network => provider("Network", small, "network_out", "Network", port_kind::NETWORK, GREEN),
    K::TopLevelNetwork => provider("Top-level Network", Size::new(24, 20), "network_out", "Network", port_kind::NETWORK, GREEN),
    K::Volume => provider("Volume", small, "volume_out", "Volume", port_kind::VOLUME, AMBER),
    K::TopLevelVolume => provider("Top-level Volume", Size::new(20, 18), "volume_out", "Volume", port_kind::VOLUME, AMBER),
    K::SecretOverride => provider("Secret", small, "secret_out", "Secret", port_kind::SECRET, PINK),
    K::Secret => provider("Top-level Secret", Size::new(20, 16), "secret_out", "Secret", port_kind::SECRET, PINK),
    K::Config => provider("Config", small, "config_out", "Config", port_kind::CONFIG, OCHRE),
    K::TopLevelConfig => provider("Top-level Config", Size::new(20, 18), "config_out", "Config", port_kind::CONFIG, OCHRE),
    K::OverrideGroup => Schema {
      default_data: object(json!({
        "label": "New Override Group",
        "envVars": ["PUID", "PGID", "TZ"],
        "volumes": ["/config"],
        "enabledInputs": [],
        "enabledOutputs": [],
      })),
      ..Schema::new("Override Group", Size::new(40, 30))
    },
    K::ColorBox => Schema::new("Group Box", Size::new(20, 15)),
  }
}
