//! Node-kind schemas.

use serde::{Deserialize, Serialize};

use super::NodeData;
use super::port::{InputPort, OutputPort, port_id, port_kind};

/// Default footprint in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
  pub width: u32,
  pub height: u32,
}

impl Size {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }
}

/// Restricts which environment keys and volume targets get dynamic input ports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BindingAllowList {
  pub env: Vec<String>,
  pub volumes: Vec<String>,
}

impl BindingAllowList {
  pub fn allows_env(&self, key: &str) -> bool {
    self.env.iter().any(|k| k == key)
  }

  pub fn allows_volume(&self, target: &str) -> bool {
    self.volumes.iter().any(|v| v == target)
  }
}

/// Static description of a node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
  /// Human-readable name.
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  pub default_size: Size,
  #[serde(default)]
  pub default_data: NodeData,
  pub inputs: Vec<InputPort>,
  pub outputs: Vec<OutputPort>,
  /// When set, dynamic binding ports are generated even without a
  /// `depends_on` input, filtered to this list.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bindings: Option<BindingAllowList>,
}

impl Schema {
  pub fn new(name: impl Into<String>, default_size: Size) -> Self {
    Self {
      name: name.into(),
      icon: None,
      default_size,
      default_data: NodeData::new(),
      inputs: Vec::new(),
      outputs: Vec::new(),
      bindings: None,
    }
  }

  pub fn input(&self, id: &str) -> Option<&InputPort> {
    self.inputs.iter().find(|p| p.id == id)
  }

  pub fn output(&self, id: &str) -> Option<&OutputPort> {
    self.outputs.iter().find(|p| p.id == id)
  }

  /// True for container-like kinds: those declaring a `depends_on` input.
  pub fn has_dependency_input(&self) -> bool {
    self.input(port_id::DEPENDS_ON).is_some()
  }

  /// True if any output carries a `service` value.
  pub fn exposes_service(&self) -> bool {
    self.outputs.iter().any(|o| o.kind == port_kind::SERVICE)
  }
}

/// Kinds with behavior beyond the generic container template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
  Container,
  DuckdnsSwag,
  Defaultbridge,
  EnvVarOverride,
  UserOverride,
  ShmSizeOverride,
  RestartPolicyOverride,
  SecurityOpt,
  Device,
  ParentPath,
  MountPath,
  Label,
  SwagAuthBasic,
  Network,
  TopLevelNetwork,
  Volume,
  TopLevelVolume,
  SecretOverride,
  Secret,
  Config,
  TopLevelConfig,
  OverrideGroup,
  ColorBox,
}

impl BuiltinKind {
  pub const ALL: [BuiltinKind; 23] = [
    Self::Container,
    Self::DuckdnsSwag,
    Self::Defaultbridge,
    Self::EnvVarOverride,
    Self::UserOverride,
    Self::ShmSizeOverride,
    Self::RestartPolicyOverride,
    Self::SecurityOpt,
    Self::Device,
    Self::ParentPath,
    Self::MountPath,
    Self::Label,
    Self::SwagAuthBasic,
    Self::Network,
    Self::TopLevelNetwork,
    Self::Volume,
    Self::TopLevelVolume,
    Self::SecretOverride,
    Self::Secret,
    Self::Config,
    Self::TopLevelConfig,
    Self::OverrideGroup,
    Self::ColorBox,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Container => "Container",
      Self::DuckdnsSwag => "DuckdnsSwag",
      Self::Defaultbridge => "Defaultbridge",
      Self::EnvVarOverride => "EnvVarOverride",
      Self::UserOverride => "UserOverride",
      Self::ShmSizeOverride => "ShmSizeOverride",
      Self::RestartPolicyOverride => "RestartPolicyOverride",
      Self::SecurityOpt => "SecurityOpt",
      Self::Device => "Device",
      Self::ParentPath => "ParentPath",
      Self::MountPath => "MountPath",
      Self::Label => "Label",
      Self::SwagAuthBasic => "SwagAuthBasic",
      Self::Network => "Network",
      Self::TopLevelNetwork => "TopLevelNetwork",
      Self::Volume => "Volume",
      Self::TopLevelVolume => "TopLevelVolume",
      Self::SecretOverride => "SecretOverride",
      Self::Secret => "Secret",
      Self::Config => "Config",
      Self::TopLevelConfig => "TopLevelConfig",
      Self::OverrideGroup => "OverrideGroup",
      Self::ColorBox => "ColorBox",
    }
  }

  /// Parses a node kind string. Catalog image kinds return `None`.
  pub fn parse(kind: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.as_str() == kind)
  }
}

impl std::fmt::Display for BuiltinKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
