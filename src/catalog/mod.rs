//! Type catalog: maps a node kind to its schema.
//!
//! Built-in kinds are always present. Image kinds and proxy settings come
//! from optional external feeds; a feed that fails to load is logged and
//! simply contributes nothing.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

pub mod builtin;
#[cfg(test)]
mod catalog_test;
pub mod feed;
#[cfg(test)]
mod feed_test;

pub use feed::{ImageRecord, ProxyConfig};

use crate::types::{BuiltinKind, Schema};

/// Registry of node-kind schemas and reverse-proxy settings.
#[derive(Debug, Clone)]
pub struct Catalog {
  schemas: BTreeMap<String, Schema>,
  proxy_configs: Vec<ProxyConfig>,
}

impl Default for Catalog {
  fn default() -> Self {
    Self::builtin()
  }
}

impl Catalog {
  /// Catalog holding only the built-in kinds.
  pub fn builtin() -> Self {
    let schemas = BuiltinKind::ALL
      .into_iter()
      .map(|k| (k.as_str().to_string(), builtin::schema(k)))
      .collect();
    Self {
      schemas,
      proxy_configs: Vec::new(),
    }
  }

  /// Built-in kinds plus whatever the given feeds provide.
  pub async fn with_feeds(images: Option<&Path>, proxies: Option<&Path>) -> Self {
    let mut catalog = Self::builtin();
    if let Some(path) = images {
      match feed::load_image_feed(path).await {
        Ok(records) => catalog.register_images(&records),
        Err(e) => warn!(error = %e, "image catalog unavailable"),
      }
    }
    if let Some(path) = proxies {
      match feed::load_proxy_feed(path).await {
        Ok(configs) => catalog.set_proxy_configs(configs),
        Err(e) => warn!(error = %e, "proxy catalog unavailable"),
      }
    }
    catalog
  }

  pub fn lookup(&self, kind: &str) -> Option<&Schema> {
    self.schemas.get(kind)
  }

  /// Registers or replaces a schema.
  pub fn register(&mut self, kind: impl Into<String>, schema: Schema) {
    self.schemas.insert(kind.into(), schema);
  }

  /// Registers one container kind per image record. Built-in kinds are never shadowed.
  pub fn register_images(&mut self, records: &[ImageRecord]) {
    let mut added = 0usize;
    for record in records {
      if BuiltinKind::parse(&record.name).is_some() {
        warn!(image = %record.name, "image name collides with a built-in kind; skipped");
        continue;
      }
      self.register(record.name.clone(), record.to_schema());
      added += 1;
    }
    info!(added, "registered image kinds");
  }

  pub fn set_proxy_configs(&mut self, configs: Vec<ProxyConfig>) {
    self.proxy_configs = configs;
  }

  /// Proxy settings for a service, matched on its lower-cased name.
  pub fn proxy_config(&self, service_name: &str) -> Option<&ProxyConfig> {
    let wanted = service_name.to_lowercase();
    self.proxy_configs.iter().find(|c| c.name == wanted)
  }

  /// Image kinds (container kinds that are not built in), sorted by name.
  pub fn image_kinds(&self) -> Vec<&str> {
    self
      .schemas
      .iter()
      .filter(|(kind, schema)| schema.has_dependency_input() && BuiltinKind::parse(kind).is_none())
      .map(|(kind, _)| kind.as_str())
      .collect()
  }
}
