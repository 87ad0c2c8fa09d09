use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Handle to a node in the UI tree.
///
/// Nodes are the ownership anchor for GPU-backed objects: every `Paint` and
/// `Bitmap` is created as a child of a node, and detaching is the only
/// teardown trigger for the resources they own.
///
/// Handles are cheap to clone and share the same node. The tree is
/// single-threaded (render-affine), so state lives in `Cell`s behind an `Rc`.
///
/// Invariants:
/// - a node is attached from creation until its first `detach()`
/// - a parent's `live_children()` counts attached direct children only
/// - children cannot be created under a detached node
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

struct NodeInner {
    label: &'static str,
    parent: Option<Node>,
    attached: Cell<bool>,
    live_children: Cell<usize>,
}

impl Node {
    /// Creates a root node (no parent).
    pub fn root(label: &'static str) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                label,
                parent: None,
                attached: Cell::new(true),
                live_children: Cell::new(0),
            }),
        }
    }

    /// Creates an attached child of `self`.
    ///
    /// # Panics
    /// Panics if `self` has already been detached.
    pub fn child(&self, label: &'static str) -> Node {
        assert!(
            self.is_attached(),
            "cannot attach `{label}` under detached node `{}`",
            self.inner.label
        );
        self.inner.live_children.set(self.inner.live_children.get() + 1);
        Node {
            inner: Rc::new(NodeInner {
                label,
                parent: Some(self.clone()),
                attached: Cell::new(true),
                live_children: Cell::new(0),
            }),
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    #[inline]
    pub fn parent(&self) -> Option<&Node> {
        self.inner.parent.as_ref()
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.inner.attached.get()
    }

    /// Number of attached direct children.
    #[inline]
    pub fn live_children(&self) -> usize {
        self.inner.live_children.get()
    }

    /// Detaches this node from its parent.
    ///
    /// Idempotent: only the first call updates the parent's child count.
    pub fn detach(&self) {
        if !self.inner.attached.replace(false) {
            return;
        }
        if let Some(parent) = &self.inner.parent {
            let live = parent.inner.live_children.get();
            debug_assert!(live > 0, "node `{}` child count underflow", parent.inner.label);
            parent.inner.live_children.set(live.saturating_sub(1));
        }
        log::trace!("node `{}` detached", self.inner.label);
    }

    /// True when both handles refer to the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("label", &self.inner.label)
            .field("attached", &self.inner.attached.get())
            .field("live_children", &self.inner.live_children.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_increments_parent_count() {
        let root = Node::root("root");
        let a = root.child("a");
        let _b = root.child("b");
        assert_eq!(root.live_children(), 2);
        assert!(a.parent().is_some_and(|p| p.ptr_eq(&root)));
    }

    #[test]
    fn detach_is_idempotent() {
        let root = Node::root("root");
        let a = root.child("a");
        a.detach();
        a.detach();
        assert!(!a.is_attached());
        assert_eq!(root.live_children(), 0);
    }

    #[test]
    fn clones_share_state() {
        let root = Node::root("root");
        let a = root.child("a");
        let a2 = a.clone();
        a2.detach();
        assert!(!a.is_attached());
    }

    #[test]
    #[should_panic(expected = "detached node")]
    fn child_of_detached_node_panics() {
        let root = Node::root("root");
        let a = root.child("a");
        a.detach();
        let _ = a.child("late");
    }
}
