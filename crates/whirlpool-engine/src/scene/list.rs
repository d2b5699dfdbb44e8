use glam::Mat4;
use thiserror::Error;

use super::{Node, NodeId};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("parent {parent:?} does not exist (scene has {len} nodes)")]
    UnknownParent { parent: NodeId, len: usize },

    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
}

/// Ordered list of drawables with parent-relative transforms.
///
/// Draw order is insertion order: earlier nodes are painted first.
#[derive(Debug, Clone)]
pub struct Scene<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Default for Scene<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Scene<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node without a parent.
    pub fn add_root(&mut self, label: impl Into<String>, payload: T) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(label.into(), payload, None));
        id
    }

    /// Adds a node placed relative to `parent`.
    ///
    /// The parent must already be in this scene.
    pub fn add_child(
        &mut self,
        label: impl Into<String>,
        payload: T,
        parent: NodeId,
    ) -> Result<NodeId, SceneError> {
        if parent.index() >= self.nodes.len() {
            return Err(SceneError::UnknownParent {
                parent,
                len: self.nodes.len(),
            });
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(label.into(), payload, Some(parent)));
        Ok(id)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.index())
    }

    /// Replaces a node's local matrix. Takes effect at the next [`evaluate`](Self::evaluate).
    pub fn set_local(&mut self, id: NodeId, local: Mat4) -> Result<(), SceneError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(SceneError::UnknownNode(id))?;
        node.local = local;
        Ok(())
    }

    /// World matrix of `id` as of the last evaluation.
    #[inline]
    pub fn world(&self, id: NodeId) -> Option<Mat4> {
        self.node(id).map(Node::world)
    }

    /// Recomputes every world matrix from the current local matrices.
    ///
    /// Parents precede children, so a single forward pass sees each parent's
    /// world matrix for this evaluation, never a stale one.
    pub fn evaluate(&mut self) {
        for i in 0..self.nodes.len() {
            let parent_world = match self.nodes[i].parent {
                Some(p) => self.nodes[p.index()].world,
                None => Mat4::IDENTITY,
            };
            let node = &mut self.nodes[i];
            node.world = parent_world * node.local;
        }
    }

    /// Nodes in paint order (back-to-front).
    pub fn iter_in_paint_order(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_index(i), n))
    }
}
