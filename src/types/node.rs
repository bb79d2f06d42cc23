//! A node on the canvas.

use serde::{Deserialize, Serialize};

use super::NodeData;
use super::data::{self, LINKED_INPUTS};

/// Rectangle in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
  pub x1: f64,
  pub y1: f64,
  pub x2: f64,
  pub y2: f64,
}

/// A configurable unit in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  /// Selects the node's schema in the catalog.
  pub kind: String,
  pub position: Rect,
  #[serde(default)]
  pub data: NodeData,
}

impl Node {
  pub fn new(id: impl Into<String>, kind: impl Into<String>, data: NodeData) -> Self {
    Self {
      id: id.into(),
      kind: kind.into(),
      position: Rect::default(),
      data,
    }
  }

  /// Configured display name (`container_name`), if set.
  pub fn display_name(&self) -> Option<&str> {
    data::text(&self.data, "container_name")
  }

  /// Display name falling back to the node's kind.
  pub fn identifier(&self) -> &str {
    self.display_name().unwrap_or(&self.kind)
  }

  /// Returns true if `port` is marked as fed by an edge.
  pub fn is_input_linked(&self, port: &str) -> bool {
    self
      .data
      .get(LINKED_INPUTS)
      .and_then(|m| m.get(port))
      .and_then(serde_json::Value::as_bool)
      .unwrap_or(false)
  }
}
