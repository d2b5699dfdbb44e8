use glam::Mat4;

/// Stable handle to a node within one [`Scene`](super::Scene).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(super) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A drawable with an optional parent.
///
/// `local` is written by the owner each frame; `world` is derived by
/// [`Scene::evaluate`](super::Scene::evaluate) and is stale until then.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub label: String,
    pub payload: T,
    pub(super) parent: Option<NodeId>,
    pub(super) local: Mat4,
    pub(super) world: Mat4,
}

impl<T> Node<T> {
    pub(super) fn new(label: String, payload: T, parent: Option<NodeId>) -> Self {
        Self {
            label,
            payload,
            parent,
            local: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn local(&self) -> Mat4 {
        self.local
    }

    /// World matrix as of the last evaluation.
    #[inline]
    pub fn world(&self) -> Mat4 {
        self.world
    }
}
