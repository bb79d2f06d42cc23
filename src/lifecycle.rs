//! Session operations: adding, editing and deleting nodes, connecting and
//! disconnecting edges.
//!
//! Every operation borrows the current session and returns a new one. Edge
//! operations apply their port-specific side effects first, then run a
//! propagation pass so downstream data catches up.

use std::borrow::Cow;
use std::collections::HashSet;

use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::derive::effective_schema;
use crate::error::{ConnectError, SessionError};
use crate::propagation::propagate;
use crate::resolver::resolve;
use crate::types::data::{self, ICON, LINKED_INPUTS, NodeData, ORIGINAL_PORTS};
use crate::types::port::{identifier_list, port_id, port_kind};
use crate::types::{BuiltinKind, Edge, Endpoint, Node, Rect, Schema, Session};

/// Canvas units per schema size cell.
pub const GRID_SIZE: f64 = 20.0;

/// Upstream port used for proxied services when nothing better is known.
pub const DEFAULT_PROXY_PORT: u64 = 80;

pub fn new_node_id() -> String {
  format!("item_{}", Uuid::new_v4().simple())
}

pub fn new_edge_id() -> String {
  format!("conn_{}", Uuid::new_v4().simple())
}

/// `base`, or `base-1`, `base-2`, ... whichever is not already a container name.
pub fn unique_container_name(nodes: &[Node], base: &str) -> String {
  let taken: HashSet<&str> = nodes.iter().filter_map(Node::display_name).collect();
  let mut candidate = base.to_string();
  let mut counter = 1;
  while taken.contains(candidate.as_str()) {
    candidate = format!("{base}-{counter}");
    counter += 1;
  }
  candidate
}

fn effective<'a>(catalog: &'a Catalog, node: &Node) -> Option<Cow<'a, Schema>> {
  catalog.lookup(&node.kind).map(|s| effective_schema(node, s))
}

fn output_value(catalog: &Catalog, node: &Node) -> Value {
  effective(catalog, node)
    .and_then(|s| resolve(node, &s))
    .unwrap_or(Value::Null)
}

fn set_linked_input(data: &mut NodeData, port: &str, linked: bool) {
  let entry = data
    .entry(LINKED_INPUTS)
    .or_insert_with(|| Value::Object(Map::new()));
  if !entry.is_object() {
    *entry = Value::Object(Map::new());
  }
  if let Some(map) = entry.as_object_mut() {
    if linked {
      map.insert(port.to_string(), json!(true));
    } else {
      map.shift_remove(port);
    }
  }
}

/// Upstream port for a service attached to the proxy.
fn proxied_port(configured: Option<u64>, remembered: &[Value]) -> u64 {
  configured
    .or_else(|| {
      remembered
        .first()
        .and_then(Value::as_str)
        .and_then(|p| data::leading_number(data::split_port(p).1))
    })
    .unwrap_or(DEFAULT_PROXY_PORT)
}

impl Session {
  fn node_index(&self, id: &str) -> Option<usize> {
    self.nodes.iter().position(|n| n.id == id)
  }

  /// Checks that every node kind resolves and every edge references existing nodes.
  pub fn validate(&self, catalog: &Catalog) -> Result<(), SessionError> {
    if let Some(n) = self.nodes.iter().find(|n| catalog.lookup(&n.kind).is_none()) {
      return Err(SessionError::UnknownKind {
        node: n.id.clone(),
        kind: n.kind.clone(),
      });
    }
    for edge in &self.edges {
      for end in [&edge.from, &edge.to] {
        if self.node(&end.node_id).is_none() {
          return Err(SessionError::DanglingEdge {
            edge: edge.id.clone(),
            node: end.node_id.clone(),
          });
        }
      }
    }
    Ok(())
  }

  /// Adds a node of `kind` with its schema defaults, top-left corner at `origin`.
  ///
  /// Container-like and reverse-proxy nodes receive a unique `container_name`.
  #[instrument(level = "trace", skip(self, catalog))]
  pub fn add_node(&self, catalog: &Catalog, kind: &str, origin: (f64, f64)) -> Result<(Session, String), SessionError> {
    let id = new_node_id();
    let schema = catalog.lookup(kind).ok_or_else(|| SessionError::UnknownKind {
      node: id.clone(),
      kind: kind.to_string(),
    })?;
    let mut data = schema.default_data.clone();
    data.insert(LINKED_INPUTS.into(), Value::Object(Map::new()));
    if schema.has_dependency_input() || BuiltinKind::parse(kind) == Some(BuiltinKind::DuckdnsSwag) {
      let base = data::text(&data, "container_name").unwrap_or(kind).to_string();
      data.insert("container_name".into(), json!(unique_container_name(&self.nodes, &base)));
    }
    let node = Node {
      id: id.clone(),
      kind: kind.to_string(),
      position: Rect {
        x1: origin.0,
        y1: origin.1,
        x2: origin.0 + f64::from(schema.default_size.width) * GRID_SIZE,
        y2: origin.1 + f64::from(schema.default_size.height) * GRID_SIZE,
      },
      data,
    };
    info!(node = %id, kind, "node added");
    let mut next = self.clone();
    next.nodes.push(node);
    Ok((next, id))
  }

  /// Adds a user-authored container named `name`, keeping `icon` for display.
  pub fn add_custom_container(
    &self,
    catalog: &Catalog,
    name: &str,
    icon: Option<&str>,
    origin: (f64, f64),
  ) -> Result<(Session, String), SessionError> {
    let (mut next, id) = self.add_node(catalog, BuiltinKind::Container.as_str(), origin)?;
    let unique = unique_container_name(&self.nodes, name);
    if let Some(node) = next.node_mut(&id) {
      node.data.insert("container_name".into(), json!(unique));
      if let Some(icon) = icon.filter(|i| !i.is_empty()) {
        node.data.insert(ICON.into(), json!(icon));
      }
    }
    Ok((next, id))
  }

  /// Shallow-merges `patch` into a node's data and propagates the change.
  ///
  /// Edges left pointing at ports that no longer exist are disconnected.
  #[instrument(level = "trace", skip(self, catalog, patch))]
  pub fn update_node_data(&self, catalog: &Catalog, id: &str, patch: NodeData) -> Result<Session, SessionError> {
    let index = self
      .node_index(id)
      .ok_or_else(|| SessionError::NodeNotFound(id.to_string()))?;
    let kind = BuiltinKind::parse(&self.nodes[index].kind);

    let mut next = self.clone();
    match kind {
      Some(BuiltinKind::ColorBox) => {
        next.nodes[index].data.extend(patch);
        return Ok(next);
      }
      Some(BuiltinKind::Defaultbridge) => {
        next.nodes = self.remap_bridge_ports(catalog, index, &patch);
        if let Some(bridge) = next.node_mut(id) {
          bridge.data.extend(patch);
        }
      }
      _ => {
        next.nodes[index].data.extend(patch);
        next.nodes = propagate(catalog, &[id], next.nodes, &self.edges, &self.nodes).nodes;
      }
    }
    next.prune_stale_edges(catalog)
  }

  /// Rewrites the host half of container ports whose bridge mapping was edited,
  /// then propagates from each affected container.
  fn remap_bridge_ports(&self, catalog: &Catalog, bridge: usize, patch: &NodeData) -> Vec<Node> {
    let old_ports = data::items(&self.nodes[bridge].data, "ports");
    let mut nodes = self.nodes.clone();
    let mut touched: Vec<String> = Vec::new();

    for entry in patch.get("ports").and_then(Value::as_array).into_iter().flatten() {
      let Some(conn) = data::connection_id(entry) else { continue };
      let Some(old) = old_ports.iter().find(|p| data::connection_id(p) == Some(conn)) else {
        continue;
      };
      if old.get("mappedPort") == entry.get("mappedPort") {
        continue;
      }
      let Some(edge) = self.edge(conn) else { continue };
      let Some(internal) = entry
        .get("name")
        .and_then(Value::as_str)
        .and_then(|n| n.rsplit_once(':'))
        .map(|(_, p)| p)
      else {
        continue;
      };
      let mapped = entry.get("mappedPort").map(data::display).unwrap_or_default();
      let Some(container) = nodes.iter_mut().find(|n| n.id == edge.from.node_id) else {
        continue;
      };
      if let Some(Value::Array(ports)) = container.data.get_mut("ports") {
        for p in ports.iter_mut() {
          let Some(binding) = p.as_str() else { continue };
          if data::split_port(binding).1 == internal {
            *p = if mapped.is_empty() {
              json!(internal)
            } else {
              json!(format!("{mapped}:{internal}"))
            };
          }
        }
      }
      if !touched.contains(&container.id) {
        touched.push(container.id.clone());
      }
    }

    for container in &touched {
      debug!(container = %container, "bridge mapping changed");
      nodes = propagate(catalog, &[container.as_str()], nodes, &self.edges, &self.nodes).nodes;
    }
    nodes
  }

  fn port_exists(&self, catalog: &Catalog, end: &Endpoint, output: bool) -> bool {
    let Some(node) = self.node(&end.node_id) else {
      return false;
    };
    match effective(catalog, node) {
      Some(s) if output => s.output(&end.port_id).is_some(),
      Some(s) => s.input(&end.port_id).is_some(),
      None => false,
    }
  }

  /// Disconnects edges whose endpoints are no longer on their node's effective schema.
  fn prune_stale_edges(self, catalog: &Catalog) -> Result<Session, SessionError> {
    let mut session = self;
    while let Some(stale) = session
      .edges
      .iter()
      .find(|e| !session.port_exists(catalog, &e.from, true) || !session.port_exists(catalog, &e.to, false))
      .map(|e| e.id.clone())
    {
      info!(edge = %stale, "pruning edge to a port that no longer exists");
      session = session.disconnect(catalog, &stale)?;
    }
    Ok(session)
  }

  /// Connects an output port to an input port.
  ///
  /// Returns the new session and the created edge, or the reason no edge was created.
  #[instrument(level = "trace", skip(self, catalog))]
  pub fn connect(&self, catalog: &Catalog, from: Endpoint, to: Endpoint) -> Result<(Session, Edge), ConnectError> {
    let from_node = self
      .node(&from.node_id)
      .ok_or_else(|| ConnectError::UnknownNode(from.node_id.clone()))?;
    let to_node = self
      .node(&to.node_id)
      .ok_or_else(|| ConnectError::UnknownNode(to.node_id.clone()))?;
    if from.node_id == to.node_id {
      return Err(ConnectError::SelfLoop(from.node_id));
    }

    let unknown = |end: &Endpoint| ConnectError::UnknownPort {
      node: end.node_id.clone(),
      port: end.port_id.clone(),
    };
    let from_schema = effective(catalog, from_node).ok_or_else(|| unknown(&from))?;
    let output = from_schema.output(&from.port_id).ok_or_else(|| unknown(&from))?;
    if output.disabled {
      return Err(ConnectError::DisabledPort {
        node: from.node_id.clone(),
        port: from.port_id.clone(),
      });
    }
    let to_schema = effective(catalog, to_node).ok_or_else(|| unknown(&to))?;
    let input = to_schema.input(&to.port_id).ok_or_else(|| unknown(&to))?;
    if !input.accepts(&output.kind) {
      return Err(ConnectError::IncompatibleKind {
        port: to.port_id.clone(),
        kind: output.kind.clone(),
      });
    }
    if !input.multiple && self.incoming(&to.node_id, &to.port_id).next().is_some() {
      return Err(ConnectError::Occupied {
        node: to.node_id.clone(),
        port: to.port_id.clone(),
      });
    }

    let mut edge = Edge {
      id: new_edge_id(),
      from,
      to,
      kind: output.kind.clone(),
      color: output.color.clone(),
      appended: false,
    };
    let value = resolve(from_node, &from_schema).unwrap_or(Value::Null);

    let mut next = self.clone();
    edge.appended = next.attach(catalog, &edge, value);
    next.edges.push(edge.clone());
    next.nodes = propagate(catalog, &[edge.from.node_id.as_str()], next.nodes, &next.edges, &self.nodes).nodes;
    info!(edge = %edge.id, from = %edge.from.node_id, to = %edge.to.node_id, port = %edge.to.port_id, "connected");
    Ok((next, edge))
  }

  /// Side effects of a new edge on its endpoints.
  /// Returns true if `value` was appended to an identifier list.
  fn attach(&mut self, catalog: &Catalog, edge: &Edge, value: Value) -> bool {
    let port = edge.to.port_id.as_str();

    if port == port_id::SERVICES_IN {
      let Some(container) = self.node_mut(&edge.from.node_id) else { return false };
      let current = container.data.get("ports").cloned().unwrap_or(json!([]));
      let remembered = match container.data.get(ORIGINAL_PORTS) {
        Some(v) if !v.is_null() => v.clone(),
        _ => current,
      };
      container.data.insert("ports".into(), json!([]));
      container.data.insert(ORIGINAL_PORTS.into(), remembered.clone());
      let service_name = container.identifier().to_string();

      let config = catalog.proxy_config(&service_name);
      let port = proxied_port(
        config.and_then(|c| c.port()),
        remembered.as_array().map(Vec::as_slice).unwrap_or(&[]),
      );
      let entry = json!({
        "connectionId": edge.id,
        "serviceName": service_name,
        "port": port,
        "authProvider": "none",
        "config": config.map_or_else(|| json!({"name": service_name.to_lowercase()}), |c| c.to_value()),
      });
      if let Some(proxy) = self.node_mut(&edge.to.node_id) {
        data::push_item(&mut proxy.data, "connectedServices", entry);
      }
      return false;
    }

    let Some(dest) = self.node_mut(&edge.to.node_id) else { return false };
    if port == port_id::AUTH_IN {
      let mut entry = Map::new();
      entry.insert("connectionId".into(), json!(edge.id));
      if let Value::Object(creds) = value {
        entry.extend(creds);
      }
      data::push_item(&mut dest.data, "connectedAuth", Value::Object(entry));
      return false;
    }

    set_linked_input(&mut dest.data, port, true);
    let mut appended = false;
    if port == port_id::DEPENDS_ON {
      data::push_item(&mut dest.data, port_id::DEPENDS_ON, value);
    } else if let Some(list) = identifier_list(port) {
      if !data::items(&dest.data, list.field).contains(&value) {
        data::push_item(&mut dest.data, list.field, value.clone());
        appended = true;
      }
      data::push_item(&mut dest.data, list.linked_field, value);
    } else if port == port_id::LABELS_IN {
      let mut label = match value {
        Value::Object(map) => map,
        _ => Map::new(),
      };
      label.insert("connectionId".into(), json!(edge.id));
      label.insert("isLinked".into(), json!(true));
      data::push_item(&mut dest.data, "labels", Value::Object(label));
    }
    appended
  }

  /// Removes an edge, undoing its side effects, and propagates from the destination.
  #[instrument(level = "trace", skip(self, catalog))]
  pub fn disconnect(&self, catalog: &Catalog, edge_id: &str) -> Result<Session, SessionError> {
    let edge = self
      .edge(edge_id)
      .cloned()
      .ok_or_else(|| SessionError::EdgeNotFound(edge_id.to_string()))?;

    let mut next = self.clone();
    next.edges.retain(|e| e.id != edge.id);
    let (Some(from_node), Some(_)) = (self.node(&edge.from.node_id), self.node(&edge.to.node_id)) else {
      debug!(edge = %edge.id, "dangling edge removed");
      return Ok(next);
    };
    let value = output_value(catalog, from_node);
    let source_changed = next.detach(&edge, &value);

    let mut seeds = vec![edge.to.node_id.as_str()];
    if source_changed {
      seeds.push(edge.from.node_id.as_str());
    }
    next.nodes = propagate(catalog, &seeds, next.nodes, &next.edges, &self.nodes).nodes;
    info!(edge = %edge.id, port = %edge.to.port_id, "disconnected");
    Ok(next)
  }

  /// Inverse of [`Session::attach`]. `self.edges` no longer contains `edge`.
  /// Returns true if the source node was modified.
  fn detach(&mut self, edge: &Edge, value: &Value) -> bool {
    let port = edge.to.port_id.as_str();
    let still_fed = self.incoming(&edge.to.node_id, port).next().is_some();
    let mut source_changed = false;

    if port == port_id::SERVICES_IN {
      if let Some(container) = self.node_mut(&edge.from.node_id) {
        if let Some(remembered) = container.data.shift_remove(ORIGINAL_PORTS) {
          container.data.insert("ports".into(), remembered);
          source_changed = true;
        }
      }
    }

    let Some(dest) = self.node_mut(&edge.to.node_id) else {
      return source_changed;
    };
    if !still_fed {
      set_linked_input(&mut dest.data, port, false);
    }

    if port == port_id::SERVICES_IN {
      data::retain_items(&mut dest.data, "connectedServices", |s| data::connection_id(s) != Some(edge.id.as_str()));
    } else if port == port_id::AUTH_IN {
      let provider = data::items(&dest.data, "connectedAuth")
        .iter()
        .find(|a| data::connection_id(a) == Some(edge.id.as_str()))
        .and_then(|a| a.get("name").cloned());
      if let (Some(name), Some(Value::Array(services))) = (provider, dest.data.get_mut("connectedServices")) {
        for service in services.iter_mut().filter_map(Value::as_object_mut) {
          if service.get("authProvider") == Some(&name) {
            service.insert("authProvider".into(), json!("none"));
          }
        }
      }
      data::retain_items(&mut dest.data, "connectedAuth", |a| data::connection_id(a) != Some(edge.id.as_str()));
    } else if port == port_id::PORTS && edge.kind == port_kind::PORTMAP {
      data::retain_items(&mut dest.data, "ports", |p| data::connection_id(p) != Some(edge.id.as_str()));
    } else if port == port_id::DEPENDS_ON {
      data::remove_first(&mut dest.data, port_id::DEPENDS_ON, value);
    } else if let Some(list) = identifier_list(port) {
      data::remove_first(&mut dest.data, list.linked_field, value);
      if edge.appended && !data::items(&dest.data, list.linked_field).contains(value) {
        data::remove_first(&mut dest.data, list.field, value);
      }
    } else if port == port_id::LABELS_IN {
      data::retain_items(&mut dest.data, "labels", |l| data::connection_id(l) != Some(edge.id.as_str()));
    } else if port == port_id::PARENT_PATH && edge.kind == port_kind::MNTPATH {
      dest.data.insert("parentPath".into(), json!(""));
    }
    source_changed
  }

  /// Deletes a node after disconnecting every incident edge.
  #[instrument(level = "trace", skip(self, catalog))]
  pub fn delete_node(&self, catalog: &Catalog, id: &str) -> Result<Session, SessionError> {
    if self.node(id).is_none() {
      return Err(SessionError::NodeNotFound(id.to_string()));
    }
    let incident: Vec<String> = self.incident(id).map(|e| e.id.clone()).collect();
    let mut next = self.clone();
    for edge_id in &incident {
      next = next.disconnect(catalog, edge_id)?;
    }
    next.nodes.retain(|n| n.id != id);
    info!(node = %id, edges = incident.len(), "node deleted");
    Ok(next)
  }
}
