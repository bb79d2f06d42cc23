//! Tests for effective schema derivation.

use std::borrow::Cow;

use proptest::prelude::*;
use serde_json::{Value, json};

use crate::catalog::Catalog;
use crate::derive::effective_schema;
use crate::types::{Node, NodeData};

fn node(kind: &str, data: Value) -> Node {
  let data: NodeData = data.as_object().cloned().unwrap();
  Node::new("n", kind, data)
}

fn input_ids(kind: &str, data: Value) -> Vec<String> {
  let catalog = Catalog::builtin();
  let n = node(kind, data);
  effective_schema(&n, catalog.lookup(kind).unwrap())
    .inputs
    .iter()
    .map(|p| p.id.clone())
    .collect()
}

#[test]
fn env_provider_output_embeds_key() {
  let catalog = Catalog::builtin();
  let schema = catalog.lookup("EnvVarOverride").unwrap();
  let keyed = node("EnvVarOverride", json!({"key": "TZ", "value": "Etc/UTC"}));
  let eff = effective_schema(&keyed, schema);
  assert_eq!(eff.outputs.len(), 1);
  assert_eq!(eff.outputs[0].id, "env_out:TZ");
  assert_eq!(eff.outputs[0].kind, "env_value");

  let blank = node("EnvVarOverride", json!({"key": ""}));
  assert_eq!(effective_schema(&blank, schema).outputs[0].id, "env_out_placeholder");
}

#[test]
fn container_gets_binding_ports_after_static_ones() {
  let ids = input_ids(
    "Container",
    json!({
      "volumes": ["changeme:/config", "/srv:/data:ro", "anon"],
      "environment": [{"key": "PUID", "value": "1"}, {"key": "", "value": "x"}],
    }),
  );
  let dynamic: Vec<_> = ids.iter().skip(10).cloned().collect();
  assert_eq!(ids[0], "depends_on");
  assert_eq!(dynamic, vec!["volume:/config", "volume:/data", "env:PUID"]);
}

#[test]
fn duplicate_binding_ports_collapse() {
  let ids = input_ids(
    "Container",
    json!({"volumes": ["a:/config", "b:/config"], "environment": [{"key": "TZ"}, {"key": "TZ"}]}),
  );
  assert_eq!(ids.iter().filter(|i| *i == "volume:/config").count(), 1);
  assert_eq!(ids.iter().filter(|i| *i == "env:TZ").count(), 1);
}

#[test]
fn reverse_proxy_bindings_are_allow_listed() {
  let catalog = Catalog::builtin();
  let proxy = node("DuckdnsSwag", Value::Object(catalog.lookup("DuckdnsSwag").unwrap().default_data.clone()));
  let eff = effective_schema(&proxy, catalog.lookup("DuckdnsSwag").unwrap());
  let dynamic: Vec<_> = eff.inputs.iter().skip(5).map(|p| p.id.as_str()).collect();
  assert_eq!(dynamic, vec!["volume:/config", "env:PUID", "env:PGID", "env:TZ"]);
}

#[test]
fn long_volume_target_label_is_shortened() {
  let catalog = Catalog::builtin();
  let n = node("Container", json!({"volumes": ["x:/very/long/target/path"]}));
  let eff = effective_schema(&n, catalog.lookup("Container").unwrap());
  let port = eff.input("volume:/very/long/target/path").unwrap();
  assert_eq!(port.name, "vol: ...rget/path");
  assert!(!port.multiple);
  assert!(port.accepts("volume") && port.accepts("mntpath"));
}

#[test]
fn host_networking_disables_port_map() {
  let catalog = Catalog::builtin();
  let n = node("Container", json!({"network_mode": "host"}));
  let eff = effective_schema(&n, catalog.lookup("Container").unwrap());
  let portmap = eff.output("portmap").unwrap();
  assert!(portmap.disabled);
  assert_eq!(portmap.name, "Host");
  assert!(!eff.output("service").unwrap().disabled);
}

#[test]
fn unchanged_schema_is_borrowed() {
  let catalog = Catalog::builtin();
  let n = node("Network", json!({"name": "lan"}));
  assert!(matches!(effective_schema(&n, catalog.lookup("Network").unwrap()), Cow::Borrowed(_)));
  let c = node("Container", json!({"volumes": []}));
  assert!(matches!(effective_schema(&c, catalog.lookup("Container").unwrap()), Cow::Borrowed(_)));
}

#[test]
fn override_group_is_built_from_its_configuration() {
  let catalog = Catalog::builtin();
  let n = node(
    "OverrideGroup",
    json!({
      "envVars": ["PUID", " TZ "],
      "volumes": ["/config"],
      "enabledInputs": ["Networks", "prop:restart"],
      "enabledOutputs": ["Service"],
    }),
  );
  let eff = effective_schema(&n, catalog.lookup("OverrideGroup").unwrap());
  let ids: Vec<_> = eff.inputs.iter().map(|p| p.id.as_str()).collect();
  assert_eq!(ids, vec!["networks_in", "prop:restart", "volume:/config", "env:PUID", "env:TZ"]);
  let outs: Vec<_> = eff.outputs.iter().map(|p| p.id.as_str()).collect();
  assert_eq!(outs, vec!["service"]);
}

proptest! {
  #[test]
  fn derivation_is_idempotent(
    volumes in proptest::collection::vec("[a-z]{0,4}:/[a-z]{1,6}", 0..5),
    keys in proptest::collection::vec("[A-Z]{0,5}", 0..5),
    host in any::<bool>(),
  ) {
    let catalog = Catalog::builtin();
    let env: Vec<Value> = keys.iter().map(|k| json!({"key": k, "value": ""})).collect();
    let n = node("Container", json!({
      "volumes": volumes,
      "environment": env,
      "network_mode": if host { "host" } else { "" },
    }));
    let schema = catalog.lookup("Container").unwrap();
    let first = effective_schema(&n, schema).into_owned();
    let second = effective_schema(&n, schema).into_owned();
    prop_assert_eq!(first, second);
  }
}
