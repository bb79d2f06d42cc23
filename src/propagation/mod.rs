//! Breadth-first propagation of node changes along edges.
//!
//! A run starts from one or more changed nodes, resolves each visited node's
//! output value, and merges it into every downstream node through the rule
//! selected for that edge. A destination whose data actually changed is
//! queued once per run. The processed set guarantees termination on cyclic
//! graphs; a feedback cycle only sees its first pass within one run.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use tracing::{instrument, trace, warn};

mod merge_rule;
#[cfg(test)]
mod propagation_test;

pub use merge_rule::{MergeInput, MergeRule, aggregate_ports, port_entry};

use crate::catalog::Catalog;
use crate::derive::effective_schema;
use crate::resolver::resolve;
use crate::types::{Edge, Node};

/// Result of one propagation run.
#[derive(Debug, Clone)]
pub struct Propagated {
  pub nodes: Vec<Node>,
  /// Number of queue pops; bounded by seeds plus nodes.
  pub visits: usize,
}

/// Propagates changes from `seeds` through `edges`.
///
/// `nodes` is the working set (already carrying the triggering change);
/// `original` is the committed state before it, used to find values to replace.
#[instrument(level = "trace", skip_all, fields(seeds = ?seeds))]
pub fn propagate(catalog: &Catalog, seeds: &[&str], mut nodes: Vec<Node>, edges: &[Edge], original: &[Node]) -> Propagated {
  let mut queue: VecDeque<String> = seeds.iter().map(|s| s.to_string()).collect();
  let mut processed: HashSet<String> = queue.iter().cloned().collect();
  let mut visits = 0usize;

  while let Some(id) = queue.pop_front() {
    visits += 1;
    let Some(source) = nodes.iter().find(|n| n.id == id).cloned() else {
      continue;
    };
    let Some(schema) = catalog.lookup(&source.kind) else {
      warn!(node = %source.id, kind = %source.kind, "unknown kind; not propagated");
      continue;
    };
    let from_schema = effective_schema(&source, schema);
    let new_value = resolve(&source, &from_schema).unwrap_or(Value::Null);
    let old_value = original
      .iter()
      .find(|n| n.id == id)
      .and_then(|n| resolve(n, &from_schema))
      .unwrap_or(Value::Null);

    for edge in edges.iter().filter(|e| e.from.node_id == id) {
      let Some(dest) = nodes.iter().position(|n| n.id == edge.to.node_id) else {
        continue;
      };
      let rule = MergeRule::select(edge);
      if rule == MergeRule::NoOp {
        continue;
      }
      let mut merged = nodes[dest].data.clone();
      rule.apply(
        &MergeInput {
          edge,
          source: &source,
          new_value: &new_value,
          old_value: &old_value,
          edges,
          nodes: &nodes,
        },
        &mut merged,
      );
      if merged == nodes[dest].data {
        continue;
      }
      trace!(edge = %edge.id, rule = ?rule, to = %edge.to.node_id, "merged");
      nodes[dest].data = merged;
      if processed.insert(edge.to.node_id.clone()) {
        queue.push_back(edge.to.node_id.clone());
      }
    }
  }

  Propagated { nodes, visits }
}
