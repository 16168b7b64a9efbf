//! Selection and hover state.
//!
//! Selection is shared across tools and only changes through a tool's
//! confirmed action; hover belongs to the picking loop and holds at most one
//! node.

use std::fmt;

use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Stable selection identity derived from node kind and id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey(String);

impl SelectionKey {
    pub fn new(kind: NodeKind, node: NodeId) -> Self {
        Self(format!("{}:{}", kind.tag(), node.raw()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selected entity
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRecord {
    pub key: SelectionKey,
    pub name: String,
    pub kind: NodeKind,
    pub node: NodeId,
    /// Visibility when the record was taken
    pub visible: bool,
}

impl SelectionRecord {
    /// Snapshot `node` for selection; `None` when it is not in the scene
    pub fn from_node(scene: &SceneGraph, node: NodeId) -> Option<Self> {
        let n = scene.node(node)?;
        Some(Self {
            key: SelectionKey::new(n.kind, node),
            name: n.name.clone(),
            kind: n.kind,
            node,
            visible: scene.is_effectively_visible(node),
        })
    }
}

/// Shared selection service handed to tools
pub trait SelectionContext {
    /// Replace the whole selection with `record`
    fn select(&mut self, record: SelectionRecord);

    /// Add `record` if absent, remove it if present. Returns true when it ends up selected.
    fn toggle(&mut self, record: SelectionRecord) -> bool;

    fn clear(&mut self);

    fn list(&self) -> &[SelectionRecord];

    fn contains(&self, key: &SelectionKey) -> bool {
        self.list().iter().any(|r| &r.key == key)
    }

    /// Selected nodes in selection order
    fn nodes(&self) -> Vec<NodeId> {
        self.list().iter().map(|r| r.node).collect()
    }
}

/// Ordered, duplicate-free selection with a change flag
#[derive(Debug, Default)]
pub struct SelectionSet {
    records: Vec<SelectionRecord>,
    changed: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the selection changed since the last call
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Drop records for nodes that left the scene
    pub fn remove_nodes(&mut self, nodes: &[NodeId]) {
        let before = self.records.len();
        self.records.retain(|r| !nodes.contains(&r.node));
        self.changed |= self.records.len() != before;
    }
}

impl SelectionContext for SelectionSet {
    fn select(&mut self, record: SelectionRecord) {
        let unchanged = self.records.len() == 1 && self.records[0].key == record.key;
        if !unchanged {
            self.records.clear();
            self.records.push(record);
            self.changed = true;
        }
    }

    fn toggle(&mut self, record: SelectionRecord) -> bool {
        self.changed = true;
        match self.records.iter().position(|r| r.key == record.key) {
            Some(index) => {
                self.records.remove(index);
                false
            }
            None => {
                self.records.push(record);
                true
            }
        }
    }

    fn clear(&mut self) {
        if !self.records.is_empty() {
            self.records.clear();
            self.changed = true;
        }
    }

    fn list(&self) -> &[SelectionRecord] {
        &self.records
    }
}

/// Hover change produced by [`HoverState::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverTransition {
    pub previous: Option<NodeId>,
    pub next: Option<NodeId>,
}

/// The single hovered node, if any
#[derive(Debug, Default)]
pub struct HoverState {
    current: Option<NodeId>,
}

impl HoverState {
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Move hover to `next`. Returns the transition, or `None` when nothing changed.
    pub fn update(&mut self, next: Option<NodeId>) -> Option<HoverTransition> {
        if self.current == next {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, next);
        Some(HoverTransition { previous, next })
    }

    pub fn clear(&mut self) -> Option<HoverTransition> {
        self.update(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeDesc;

    fn two_nodes() -> (SceneGraph, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let a = scene.add(scene.root(), NodeDesc::group("a")).unwrap();
        let b = scene.add(scene.root(), NodeDesc::light("b")).unwrap();
        (scene, a, b)
    }

    #[test]
    fn test_key_is_kind_and_id() {
        let (scene, a, b) = two_nodes();
        let record = SelectionRecord::from_node(&scene, b).unwrap();
        assert_eq!(record.key.as_str(), format!("light:{}", b.raw()));
        assert_ne!(record.key, SelectionRecord::from_node(&scene, a).unwrap().key);
    }

    #[test]
    fn test_reselect_is_idempotent() {
        let (scene, a, _) = two_nodes();
        let mut selection = SelectionSet::new();

        selection.select(SelectionRecord::from_node(&scene, a).unwrap());
        assert!(selection.take_changed());
        selection.select(SelectionRecord::from_node(&scene, a).unwrap());
        assert!(!selection.take_changed());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let (scene, a, b) = two_nodes();
        let mut selection = SelectionSet::new();

        selection.select(SelectionRecord::from_node(&scene, a).unwrap());
        assert!(selection.toggle(SelectionRecord::from_node(&scene, b).unwrap()));
        assert_eq!(selection.nodes(), vec![a, b]);

        assert!(!selection.toggle(SelectionRecord::from_node(&scene, a).unwrap()));
        assert_eq!(selection.nodes(), vec![b]);
    }

    #[test]
    fn test_remove_nodes_flags_change_only_when_something_left() {
        let (scene, a, b) = two_nodes();
        let mut selection = SelectionSet::new();
        selection.select(SelectionRecord::from_node(&scene, a).unwrap());
        selection.take_changed();

        selection.remove_nodes(&[b]);
        assert!(!selection.take_changed());
        selection.remove_nodes(&[a]);
        assert!(selection.take_changed());
        assert!(selection.is_empty());
    }

    #[test]
    fn test_hover_only_reports_real_transitions() {
        let (_, a, b) = two_nodes();
        let mut hover = HoverState::default();

        assert_eq!(
            hover.update(Some(a)),
            Some(HoverTransition {
                previous: None,
                next: Some(a)
            })
        );
        assert_eq!(hover.update(Some(a)), None);
        assert_eq!(hover.update(Some(b)).unwrap().previous, Some(a));
        assert_eq!(hover.clear().unwrap().next, None);
        assert_eq!(hover.clear(), None);
    }
}
