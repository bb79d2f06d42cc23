//! Tests for `Catalog`.

use std::io::Write;

use super::{Catalog, ImageRecord, ProxyConfig};
use crate::types::BuiltinKind;

#[test]
fn builtin_kinds_resolve() {
  let c = Catalog::builtin();
  for kind in BuiltinKind::ALL {
    assert!(c.lookup(kind.as_str()).is_some(), "{kind} missing");
  }
  assert!(c.lookup("nope").is_none());
  assert!(c.image_kinds().is_empty());
}

#[test]
fn container_kinds_are_service_like() {
  let c = Catalog::builtin();
  let container = c.lookup("Container").unwrap();
  assert!(container.has_dependency_input());
  assert!(container.exposes_service());
  let proxy = c.lookup("DuckdnsSwag").unwrap();
  assert!(!proxy.has_dependency_input());
  assert!(proxy.bindings.is_some());
  assert!(!c.lookup("Network").unwrap().exposes_service());
}

#[test]
fn images_register_but_never_shadow_builtins() {
  let mut c = Catalog::builtin();
  let records: Vec<ImageRecord> = serde_json::from_value(serde_json::json!([
    {"name": "sonarr"},
    {"name": "Network"},
    {"name": "radarr"},
  ]))
  .unwrap();
  c.register_images(&records);
  assert_eq!(c.image_kinds(), vec!["radarr", "sonarr"]);
  assert!(!c.lookup("Network").unwrap().has_dependency_input());
}

#[test]
fn proxy_config_matches_lowercase_name() {
  let mut c = Catalog::builtin();
  let configs: Vec<ProxyConfig> =
    serde_json::from_value(serde_json::json!([{"name": "sonarr", "port": 8989}])).unwrap();
  c.set_proxy_configs(configs);
  assert_eq!(c.proxy_config("Sonarr").and_then(ProxyConfig::port), Some(8989));
  assert!(c.proxy_config("radarr").is_none());
}

#[tokio::test]
async fn with_feeds_degrades_on_missing_files() {
  let dir = tempfile::tempdir().unwrap();
  let c = Catalog::with_feeds(
    Some(dir.path().join("missing.json").as_path()),
    Some(dir.path().join("missing.yml").as_path()),
  )
  .await;
  assert!(c.image_kinds().is_empty());
  assert!(c.lookup("Container").is_some());
}

#[tokio::test]
async fn with_feeds_loads_both_sections() {
  let dir = tempfile::tempdir().unwrap();
  let images = dir.path().join("images.json");
  let proxies = dir.path().join("proxies.yml");
  std::fs::File::create(&images)
    .unwrap()
    .write_all(br#"{"data":{"repositories":{"linuxserver":[{"name":"plex"}]}}}"#)
    .unwrap();
  std::fs::write(&proxies, "swag_configs:\n  - name: plex\n    port: 32400\n").unwrap();
  let c = Catalog::with_feeds(Some(images.as_path()), Some(proxies.as_path())).await;
  assert_eq!(c.image_kinds(), vec!["plex"]);
  assert_eq!(c.proxy_config("plex").and_then(ProxyConfig::port), Some(32400));
}

#[tokio::test]
async fn with_feeds_skips_malformed_image_feed() {
  let dir = tempfile::tempdir().unwrap();
  let images = dir.path().join("images.json");
  std::fs::write(&images, "{not json").unwrap();
  let c = Catalog::with_feeds(Some(images.as_path()), None).await;
  assert!(c.image_kinds().is_empty());
}

#[test]
fn image_base_data_keeps_field_order() {
  let data = super::builtin::image_base_data();
  let keys: Vec<&str> = data.keys().map(String::as_str).collect();
  assert_eq!(keys.len(), 54);
  assert_eq!(&keys[..3], &["restart", "healthcheck", "command"]);
  assert_eq!(keys.last(), Some(&"profiles"));
  assert_eq!(data["restart"], "unless-stopped");
  assert_eq!(data["healthcheck"], serde_json::json!({}));
  assert_eq!(data["oom_kill_disable"], false);
  assert_eq!(data["pull_policy"], "missing");
  assert_eq!(data["dns"], serde_json::json!([]));
}
