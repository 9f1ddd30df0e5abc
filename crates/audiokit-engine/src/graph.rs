//! Control-side topology: node records and directed edges.
//!
//! Nodes live in an append-only slot vector, so slot order is insertion
//! order. Removed nodes leave a `None` hole; slots are never reused, which
//! keeps every ordering decision stable across edits.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use audiokit_core::ParamDescriptor;

use crate::error::{EngineError, Result};
use crate::node::{NodeHandle, NodeId, NodeRole};

/// A node as the control thread sees it.
#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) handle: Arc<NodeHandle>,
    pub(crate) descriptors: Vec<ParamDescriptor>,
    /// Last accepted value per parameter index.
    pub(crate) values: Vec<f32>,
}

impl NodeRecord {
    pub(crate) fn id(&self) -> &NodeId {
        &self.handle.id
    }
}

/// Directed acyclic graph of nodes.
#[derive(Debug, Default)]
pub(crate) struct Graph {
    slots: Vec<Option<NodeRecord>>,
    index: HashMap<NodeId, usize>,
    edges: Vec<(usize, usize)>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, record: NodeRecord) -> Result<usize> {
        if self.index.contains_key(record.id()) {
            return Err(EngineError::DuplicateId(record.id().clone()));
        }
        let slot = self.slots.len();
        self.index.insert(record.id().clone(), slot);
        self.slots.push(Some(record));
        Ok(slot)
    }

    pub(crate) fn slot_of(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::UnknownNode(NodeId::from(id)))
    }

    pub(crate) fn record(&self, slot: usize) -> Option<&NodeRecord> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn record_mut(&mut self, slot: usize) -> Option<&mut NodeRecord> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Adds `from → to`.
    ///
    /// Checks run in a fixed order: both ends exist, the edge closes no
    /// cycle, it is not a duplicate, and it respects node roles.
    pub(crate) fn connect(&mut self, from: &str, to: &str) -> Result<()> {
        let src = self.slot_of(from)?;
        let dst = self.slot_of(to)?;
        if self.has_path(dst, src) {
            return Err(EngineError::CycleDetected {
                from: NodeId::from(from),
                to: NodeId::from(to),
            });
        }
        if self.edges.contains(&(src, dst)) {
            return Err(EngineError::DuplicateConnection {
                from: NodeId::from(from),
                to: NodeId::from(to),
            });
        }
        self.validate_roles(src, dst)?;
        self.edges.push((src, dst));
        Ok(())
    }

    /// Removes `from → to`, returning its position so a failed rebuild can
    /// restore it.
    pub(crate) fn disconnect(&mut self, from: &str, to: &str) -> Result<usize> {
        let src = self.slot_of(from)?;
        let dst = self.slot_of(to)?;
        let position = self
            .edges
            .iter()
            .position(|&edge| edge == (src, dst))
            .ok_or_else(|| EngineError::UnknownConnection {
                from: NodeId::from(from),
                to: NodeId::from(to),
            })?;
        self.edges.remove(position);
        Ok(position)
    }

    pub(crate) fn restore_edge(&mut self, position: usize, edge: (usize, usize)) {
        let position = position.min(self.edges.len());
        self.edges.insert(position, edge);
    }

    pub(crate) fn pop_edge(&mut self) -> Option<(usize, usize)> {
        self.edges.pop()
    }

    /// Removes a node and every edge touching it.
    pub(crate) fn remove(&mut self, id: &str) -> Result<NodeRecord> {
        let slot = self.slot_of(id)?;
        let record = self.slots[slot]
            .take()
            .ok_or_else(|| EngineError::UnknownNode(NodeId::from(id)))?;
        self.index.remove(id);
        self.edges.retain(|&(src, dst)| src != slot && dst != slot);
        Ok(record)
    }

    /// Live nodes in insertion order.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.slots.iter().flatten()
    }

    /// Slots ever allocated, live or removed.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Edges as `(from, to)` id pairs, in the order they were made.
    pub(crate) fn connections(&self) -> Vec<(String, String)> {
        self.edges
            .iter()
            .filter_map(|&(src, dst)| {
                let from = self.record(src)?.id().to_string();
                let to = self.record(dst)?.id().to_string();
                Some((from, to))
            })
            .collect()
    }

    /// Upstream slots of `slot`, in edge order.
    pub(crate) fn inputs_of(&self, slot: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|&&(_, dst)| dst == slot)
            .map(|&(src, _)| src)
            .collect()
    }

    /// True when `to` is reachable from `from` (including `from == to`).
    pub(crate) fn has_path(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.slots.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if current >= visited.len() || visited[current] {
                continue;
            }
            visited[current] = true;
            stack.extend(
                self.edges
                    .iter()
                    .filter(|&&(src, _)| src == current)
                    .map(|&(_, dst)| dst),
            );
        }
        false
    }

    /// Kahn's algorithm; ties between ready nodes go to the earliest inserted.
    ///
    /// Returns the offending edge's endpoints as a cycle error if the edge
    /// set is not acyclic, which `connect` should have made impossible.
    pub(crate) fn topological_order(&self) -> Result<Vec<usize>> {
        let mut in_degree = vec![0usize; self.slots.len()];
        for &(_, dst) in &self.edges {
            in_degree[dst] += 1;
        }

        let mut ready: BinaryHeap<Reverse<usize>> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(slot, record)| record.is_some() && in_degree[*slot] == 0)
            .map(|(slot, _)| Reverse(slot))
            .collect();

        let mut order = Vec::with_capacity(self.node_count());
        while let Some(Reverse(slot)) = ready.pop() {
            order.push(slot);
            for &(src, dst) in &self.edges {
                if src == slot {
                    in_degree[dst] -= 1;
                    if in_degree[dst] == 0 {
                        ready.push(Reverse(dst));
                    }
                }
            }
        }

        if order.len() != self.node_count() {
            let (from, to) = self
                .edges
                .iter()
                .find(|&&(_, dst)| in_degree[dst] > 0)
                .and_then(|&(src, dst)| Some((self.record(src)?, self.record(dst)?)))
                .map(|(src, dst)| (src.id().clone(), dst.id().clone()))
                .unwrap_or_else(|| (NodeId::from(""), NodeId::from("")));
            return Err(EngineError::CycleDetected { from, to });
        }
        Ok(order)
    }

    fn validate_roles(&self, src: usize, dst: usize) -> Result<()> {
        let (Some(from), Some(to)) = (self.record(src), self.record(dst)) else {
            return Ok(());
        };
        let reason = if from.handle.kind.role() == NodeRole::Sink {
            "output nodes cannot feed other nodes"
        } else if to.handle.kind.role() == NodeRole::Source {
            "input nodes cannot take upstream connections"
        } else {
            return Ok(());
        };
        Err(EngineError::InvalidConnection {
            from: from.id().clone(),
            to: to.id().clone(),
            reason,
        })
    }
}
