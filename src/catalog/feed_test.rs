//! Tests for catalog feed parsing.

use serde_json::json;

use super::feed::{parse_image_feed, parse_proxy_feed};
use crate::error::CatalogError;

const IMAGES: &str = r#"{
  "data": {
    "repositories": {
      "linuxserver": [
        {
          "name": "sonarr",
          "project_logo": "https://example.org/sonarr.png",
          "config": {
            "ports": [{"external": "8989", "internal": "8989"}],
            "volumes": [{"path": "/config"}, {"path": "/tv"}],
            "env_vars": [{"name": "PUID", "value": "1000"}, {"name": "TZ", "value": "Etc/UTC"}],
            "custom": [{"name_compose": "shm_size", "value": "1g"}, {"name_compose": "", "value": "x"}],
            "security_opt": [{"compose_var": "seccomp:unconfined"}],
            "devices": [{"host_path": "/dev/dri", "path": "/dev/dri"}],
            "caps": [{"cap_add": "NET_ADMIN"}],
            "privileged": true,
            "hostname": {"hostname": "sonarr-host"},
            "mac_address": {"mac_address": ""}
          }
        },
        {"name": "bare", "config": null}
      ]
    }
  }
}"#;

#[test]
fn image_record_becomes_container_schema() {
  let records = parse_image_feed(IMAGES).unwrap();
  assert_eq!(records.len(), 2);
  let schema = records[0].to_schema();
  let d = &schema.default_data;
  assert_eq!(schema.name, "sonarr");
  assert_eq!(schema.icon.as_deref(), Some("https://example.org/sonarr.png"));
  assert!(schema.has_dependency_input());
  assert_eq!(d["image"], "lscr.io/linuxserver/sonarr:latest");
  assert_eq!(d["container_name"], "sonarr");
  assert_eq!(d["ports"], json!(["8989:8989"]));
  assert_eq!(d["volumes"], json!(["changeme:/config", "changeme:/tv"]));
  assert_eq!(d["environment"][1], json!({"key": "TZ", "value": "Etc/UTC"}));
  assert_eq!(d["shm_size"], "1g");
  assert_eq!(d["security_opt"], json!(["seccomp:unconfined"]));
  assert_eq!(d["devices"], json!(["/dev/dri:/dev/dri"]));
  assert_eq!(d["cap_add"], json!(["NET_ADMIN"]));
  assert_eq!(d["privileged"], true);
  assert_eq!(d["hostname"], "sonarr-host");
  assert_eq!(d["mac_address"], "");
  assert!(!d.contains_key(""));
}

#[test]
fn bare_record_keeps_template_defaults() {
  let records = parse_image_feed(IMAGES).unwrap();
  let d = records[1].to_schema().default_data;
  assert_eq!(d["restart"], "unless-stopped");
  assert_eq!(d["pull_policy"], "missing");
  assert!(!d.contains_key("ports"));
}

#[test]
fn numeric_ports_render_without_quotes() {
  let text = r#"{"data":{"repositories":{"linuxserver":[
    {"name":"a","config":{"ports":[{"external":8080,"internal":80}]}}]}}}"#;
  let d = parse_image_feed(text).unwrap()[0].to_schema().default_data;
  assert_eq!(d["ports"], json!(["8080:80"]));
}

#[test]
fn missing_repository_list_is_empty() {
  let records = parse_image_feed(r#"{"data":{"repositories":{}}}"#).unwrap();
  assert!(records.is_empty());
}

#[test]
fn malformed_image_feed_is_an_error() {
  assert!(matches!(parse_image_feed("[]"), Err(CatalogError::Json(_))));
}

#[test]
fn proxy_feed_keeps_extra_settings_in_order() {
  let text = "swag_configs:\n  - name: sonarr\n    port: 8989\n    proto: http\n  - name: plex\n    port: \"32400\"\n";
  let configs = parse_proxy_feed(text).unwrap();
  assert_eq!(configs.len(), 2);
  assert_eq!(configs[0].port(), Some(8989));
  assert_eq!(configs[1].port(), Some(32400));
  assert_eq!(
    configs[0].to_value(),
    json!({"name": "sonarr", "port": 8989, "proto": "http"})
  );
  let keys: Vec<_> = configs[0].to_value().as_object().unwrap().keys().cloned().collect();
  assert_eq!(keys, vec!["name", "port", "proto"]);
}

#[test]
fn proxy_feed_without_list_is_empty() {
  assert!(parse_proxy_feed("other: 1\n").unwrap().is_empty());
}

#[test]
fn malformed_proxy_feed_is_an_error() {
  assert!(matches!(parse_proxy_feed("swag_configs: [\n"), Err(CatalogError::Yaml(_))));
}
