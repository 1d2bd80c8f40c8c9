//! Arena-indexed scene nodes.
//!
//! Nodes are appended and never removed or re-parented, so the parent/child
//! relation is a forest by construction.  The animator still bounds every
//! recursive walk with a depth counter rather than trusting the shape.

use npc_core::SceneNodeId;

use crate::{AnimError, AnimResult};

/// One node of a model hierarchy (a body, a limb, an attached prop …).
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name:     String,
    pub parent:   Option<SceneNodeId>,
    pub children: Vec<SceneNodeId>,
}

/// Append-only arena of scene nodes.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no parent.
    pub fn add_root(&mut self, name: impl Into<String>) -> SceneNodeId {
        self.push(name.into(), None)
    }

    /// Add a node under `parent`.
    pub fn add_child(&mut self, parent: SceneNodeId, name: impl Into<String>) -> AnimResult<SceneNodeId> {
        if !self.contains(parent) {
            return Err(AnimError::UnknownNode(parent));
        }
        let id = self.push(name.into(), Some(parent));
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    fn push(&mut self, name: String, parent: Option<SceneNodeId>) -> SceneNodeId {
        let id = SceneNodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode { name, parent, children: Vec::new() });
        id
    }

    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn contains(&self, id: SceneNodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Direct children of `id`; empty for unknown ids.
    pub fn children(&self, id: SceneNodeId) -> &[SceneNodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: SceneNodeId) -> Option<SceneNodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// First node called `name`.
    pub fn find(&self, name: &str) -> Option<SceneNodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| SceneNodeId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
