//! External catalog feeds: container images (JSON) and reverse-proxy configs (YAML).

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::builtin;
use crate::error::CatalogError;
use crate::types::{Schema, data};

#[derive(Debug, Deserialize)]
struct ImageFeed {
  data: ImageFeedData,
}

#[derive(Debug, Deserialize)]
struct ImageFeedData {
  repositories: Repositories,
}

#[derive(Debug, Deserialize)]
struct Repositories {
  #[serde(default)]
  linuxserver: Option<Vec<ImageRecord>>,
}

/// One importable container image.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRecord {
  pub name: String,
  #[serde(default)]
  pub project_logo: Option<String>,
  #[serde(default)]
  pub config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageConfig {
  #[serde(default)]
  pub ports: Option<Vec<PortSpec>>,
  #[serde(default)]
  pub volumes: Option<Vec<VolumeSpec>>,
  #[serde(default)]
  pub env_vars: Option<Vec<EnvSpec>>,
  #[serde(default)]
  pub custom: Option<Vec<CustomSpec>>,
  #[serde(default)]
  pub security_opt: Option<Vec<SecurityOptSpec>>,
  #[serde(default)]
  pub devices: Option<Vec<DeviceSpec>>,
  #[serde(default)]
  pub caps: Option<Vec<CapSpec>>,
  #[serde(default)]
  pub networking: Option<String>,
  #[serde(default)]
  pub privileged: Option<bool>,
  #[serde(default)]
  pub hostname: Option<HostnameSpec>,
  #[serde(default)]
  pub mac_address: Option<MacAddressSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortSpec {
  pub external: Value,
  pub internal: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeSpec {
  pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvSpec {
  pub name: String,
  #[serde(default)]
  pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomSpec {
  #[serde(default)]
  pub name_compose: Option<String>,
  #[serde(default)]
  pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityOptSpec {
  pub compose_var: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSpec {
  pub host_path: String,
  pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapSpec {
  pub cap_add: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostnameSpec {
  #[serde(default)]
  pub hostname: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MacAddressSpec {
  #[serde(default)]
  pub mac_address: Option<String>,
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
  list.as_deref().filter(|l| !l.is_empty())
}

impl ImageRecord {
  /// Builds the container schema for this image. The node kind is the image name.
  pub fn to_schema(&self) -> Schema {
    let mut d = builtin::image_base_data();
    d.insert("image".into(), json!(format!("lscr.io/linuxserver/{}:latest", self.name)));
    d.insert("container_name".into(), json!(self.name));

    let empty = ImageConfig::default();
    let c = self.config.as_ref().unwrap_or(&empty);
    if let Some(ports) = non_empty(&c.ports) {
      let ports: Vec<Value> = ports
        .iter()
        .map(|p| json!(format!("{}:{}", data::display(&p.external), data::display(&p.internal))))
        .collect();
      d.insert("ports".into(), Value::Array(ports));
    }
    if let Some(volumes) = non_empty(&c.volumes) {
      let volumes = volumes.iter().map(|v| json!(format!("changeme:{}", v.path))).collect();
      d.insert("volumes".into(), Value::Array(volumes));
    }
    if let Some(env) = non_empty(&c.env_vars) {
      let env = env.iter().map(|e| json!({"key": e.name, "value": e.value})).collect();
      d.insert("environment".into(), Value::Array(env));
    }
    for custom in c.custom.iter().flatten() {
      if let Some(field) = custom.name_compose.as_deref().filter(|f| !f.is_empty()) {
        d.insert(field.to_string(), custom.value.clone());
      }
    }
    if let Some(opts) = non_empty(&c.security_opt) {
      d.insert("security_opt".into(), opts.iter().map(|s| json!(s.compose_var)).collect());
    }
    if let Some(devices) = non_empty(&c.devices) {
      let devices = devices.iter().map(|dv| json!(format!("{}:{}", dv.host_path, dv.path))).collect();
      d.insert("devices".into(), Value::Array(devices));
    }
    if let Some(caps) = non_empty(&c.caps) {
      d.insert("cap_add".into(), caps.iter().map(|cap| json!(cap.cap_add)).collect());
    }
    if let Some(mode) = c.networking.as_deref().filter(|m| !m.is_empty()) {
      d.insert("network_mode".into(), json!(mode));
    }
    if c.privileged == Some(true) {
      d.insert("privileged".into(), json!(true));
    }
    if let Some(h) = c.hostname.as_ref().and_then(|h| h.hostname.as_deref()).filter(|h| !h.is_empty()) {
      d.insert("hostname".into(), json!(h));
    }
    if let Some(m) = c.mac_address.as_ref().and_then(|m| m.mac_address.as_deref()).filter(|m| !m.is_empty()) {
      d.insert("mac_address".into(), json!(m));
    }

    builtin::container_template(&self.name, self.project_logo.clone(), d)
  }
}

/// Reverse-proxy settings for one service, keyed by lower-cased service name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
  pub name: String,
  /// Everything else, in feed order. Usually includes `port`.
  #[serde(flatten)]
  pub settings: Map<String, Value>,
}

impl ProxyConfig {
  /// Configured upstream port, accepting numbers or numeric strings.
  pub fn port(&self) -> Option<u64> {
    match self.settings.get("port")? {
      Value::Number(n) => n.as_u64(),
      Value::String(s) => data::leading_number(s),
      _ => None,
    }
  }

  /// The settings as stored on a registered-service entry (name first).
  pub fn to_value(&self) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), json!(self.name));
    map.extend(self.settings.clone());
    Value::Object(map)
  }
}

#[derive(Debug, Deserialize)]
struct ProxyFeed {
  #[serde(default)]
  swag_configs: Option<Vec<ProxyConfig>>,
}

/// Parses the image catalog JSON.
pub fn parse_image_feed(text: &str) -> Result<Vec<ImageRecord>, CatalogError> {
  let feed: ImageFeed = serde_json::from_str(text)?;
  Ok(feed.data.repositories.linuxserver.unwrap_or_default())
}

/// Parses the proxy-config catalog YAML.
pub fn parse_proxy_feed(text: &str) -> Result<Vec<ProxyConfig>, CatalogError> {
  let feed: ProxyFeed = serde_yaml::from_str(text)?;
  Ok(feed.swag_configs.unwrap_or_default())
}

async fn read(path: &Path) -> Result<String, CatalogError> {
  tokio::fs::read_to_string(path)
    .await
    .map_err(|source| CatalogError::Read {
      path: path.display().to_string(),
      source,
    })
}

/// Reads and parses an image catalog file.
#[instrument(level = "trace", skip(path), fields(path = %path.display()))]
pub async fn load_image_feed(path: &Path) -> Result<Vec<ImageRecord>, CatalogError> {
  let records = parse_image_feed(&read(path).await?)?;
  debug!(count = records.len(), "image catalog loaded");
  Ok(records)
}

/// Reads and parses a proxy-config catalog file.
#[instrument(level = "trace", skip(path), fields(path = %path.display()))]
pub async fn load_proxy_feed(path: &Path) -> Result<Vec<ProxyConfig>, CatalogError> {
  let configs = parse_proxy_feed(&read(path).await?)?;
  debug!(count = configs.len(), "proxy catalog loaded");
  Ok(configs)
}
