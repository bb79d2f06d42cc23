//! The session aggregate: every node and edge on the canvas plus the view.

use serde::{Deserialize, Serialize};

use super::{Edge, Node};

/// Canvas pan and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
  pub x: f64,
  pub y: f64,
  pub scale: f64,
}

impl Default for ViewTransform {
  fn default() -> Self {
    Self {
      x: 0.0,
      y: 0.0,
      scale: 1.0,
    }
  }
}

/// Root aggregate. Operations take a session by reference and return a new one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
  pub view_transform: ViewTransform,
}

impl Session {
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty() && self.edges.is_empty()
  }

  pub fn node(&self, id: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.id == id)
  }

  pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
    self.nodes.iter_mut().find(|n| n.id == id)
  }

  pub fn edge(&self, id: &str) -> Option<&Edge> {
    self.edges.iter().find(|e| e.id == id)
  }

  /// Edges feeding `port` on `node_id`, in insertion order.
  pub fn incoming<'a>(&'a self, node_id: &'a str, port: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
    self.edges.iter().filter(move |e| e.feeds(node_id, port))
  }

  /// Edges touching `node_id` at either end.
  pub fn incident<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
    self.edges.iter().filter(move |e| e.touches(node_id))
  }
}
