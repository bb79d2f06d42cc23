//! A directed, typed connection between an output port and an input port.

use serde::{Deserialize, Serialize};

/// One end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
  pub node_id: String,
  pub port_id: String,
}

impl Endpoint {
  pub fn new(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      port_id: port_id.into(),
    }
  }
}

/// An edge in the composer graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
  pub id: String,
  pub from: Endpoint,
  pub to: Endpoint,
  /// Source port kind at creation time; never revalidated.
  pub kind: String,
  /// Display hint copied from the source port.
  #[serde(default)]
  pub color: String,
  /// Set when connecting added the source value to an identifier list that did not already hold it.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub appended: bool,
}

impl Edge {
  /// Returns true if either end touches `node_id`.
  pub fn touches(&self, node_id: &str) -> bool {
    self.from.node_id == node_id || self.to.node_id == node_id
  }

  /// Returns true if this edge feeds `port` on `node_id`.
  pub fn feeds(&self, node_id: &str, port: &str) -> bool {
    self.to.node_id == node_id && self.to.port_id == port
  }
}
