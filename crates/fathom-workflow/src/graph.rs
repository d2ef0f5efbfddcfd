use std::collections::{HashMap, HashSet};

use crate::edge::Edge;
use crate::node::Node;

/// Graph structure for traversal and analysis.
///
/// Edges keep their declaration order within each adjacency list, so the
/// "first" upstream of a node is the one whose edge was declared first.
#[derive(Debug, Clone)]
pub struct Graph {
  /// node_id -> outgoing edges.
  outgoing: HashMap<String, Vec<Edge>>,
  /// node_id -> incoming edges.
  incoming: HashMap<String, Vec<Edge>>,
}

impl Graph {
  /// Build a graph from nodes and edges.
  ///
  /// Edges whose endpoints are not in `nodes` are ignored; the resolver
  /// reports them before a graph is ever built for execution.
  pub fn new(nodes: &HashMap<String, Node>, edges: &[Edge]) -> Self {
    let mut outgoing: HashMap<String, Vec<Edge>> = HashMap::new();
    let mut incoming: HashMap<String, Vec<Edge>> = HashMap::new();

    for node_id in nodes.keys() {
      outgoing.entry(node_id.clone()).or_default();
      incoming.entry(node_id.clone()).or_default();
    }

    for edge in edges {
      if !nodes.contains_key(&edge.source) || !nodes.contains_key(&edge.target) {
        continue;
      }
      outgoing
        .entry(edge.source.clone())
        .or_default()
        .push(edge.clone());
      incoming
        .entry(edge.target.clone())
        .or_default()
        .push(edge.clone());
    }

    Self {
      outgoing,
      incoming,
    }
  }

  /// Edges leaving a node.
  pub fn outgoing(&self, node_id: &str) -> &[Edge] {
    self
      .outgoing
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Edges entering a node.
  pub fn incoming(&self, node_id: &str) -> &[Edge] {
    self
      .incoming
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream node ids for a given node, without duplicates.
  pub fn upstream(&self, node_id: &str) -> Vec<&str> {
    dedup(self.incoming(node_id).iter().map(|e| e.source.as_str()))
  }

  /// Find a cycle, returning its path with the first node repeated at the end.
  pub fn find_cycle(&self) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
      White,
      Gray,
      Black,
    }

    fn dfs<'a>(
      node: &'a str,
      graph: &'a Graph,
      color: &mut HashMap<&'a str, Color>,
      stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
      color.insert(node, Color::Gray);
      stack.push(node);

      for edge in graph.outgoing(node) {
        let next = edge.target.as_str();
        match color.get(next).copied().unwrap_or(Color::White) {
          Color::Gray => {
            // Back edge: the cycle is the stack suffix starting at `next`.
            let start = stack.iter().position(|n| *n == next).unwrap_or(0);
            let mut path: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
            path.push(next.to_string());
            return Some(path);
          }
          Color::White => {
            if let Some(path) = dfs(next, graph, color, stack) {
              return Some(path);
            }
          }
          Color::Black => {}
        }
      }

      stack.pop();
      color.insert(node, Color::Black);
      None
    }

    let mut ids: Vec<&str> = self.outgoing.keys().map(|s| s.as_str()).collect();
    ids.sort();

    let mut color: HashMap<&str, Color> = ids.iter().map(|id| (*id, Color::White)).collect();
    let mut stack = Vec::new();

    for id in ids {
      if color.get(id) == Some(&Color::White) {
        if let Some(path) = dfs(id, self, &mut color, &mut stack) {
          return Some(path);
        }
      }
    }

    None
  }
}

fn dedup<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
  let mut seen = HashSet::new();
  ids.filter(|id| seen.insert(*id)).collect()
}
