//! Document - Node arena, listener store and event dispatch.
//!
//! Elements are indices into an arena owned by the document. A fresh
//! document has one connected element, `body`; everything appended under
//! it is connected and its event path ends at `Document` then `Window`.
//! Detached elements still dispatch, but their path stops at their own root.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use super::event::{Event, Handler};
use super::selector::Selector;
use crate::types::{EventPhase, ListenerFlags, NodeId, Scope};

/// Identity of one registered listener, unique per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

// =============================================================================
// Node storage
// =============================================================================

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// =============================================================================
// Listener storage
// =============================================================================

struct ListenerEntry {
    id: ListenerId,
    flags: ListenerFlags,
    handler: Handler,
}

#[derive(Default)]
struct ListenerStore {
    by_target: HashMap<(Scope, String), Vec<ListenerEntry>>,
    next_id: usize,
}

impl ListenerStore {
    fn next_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn contains(&self, scope: Scope, event_type: &str, id: ListenerId) -> bool {
        self.by_target
            .get(&(scope, event_type.to_string()))
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }

    fn remove(&mut self, scope: Scope, event_type: &str, capture: bool, id: ListenerId) -> bool {
        let key = (scope, event_type.to_string());
        let Some(entries) = self.by_target.get_mut(&key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| !(entry.id == id && entry.flags.capture() == capture));
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.by_target.remove(&key);
        }
        removed
    }
}

/// A listener picked for invocation at one step of the event path.
struct Pending {
    id: ListenerId,
    flags: ListenerFlags,
    handler: Handler,
}

// =============================================================================
// Document
// =============================================================================

/// In-memory DOM document.
///
/// Single-threaded: share it with `Rc`. Every method takes `&self`; no
/// internal borrow is held while a listener runs, so listeners may freely
/// add or remove listeners and mutate the tree.
pub struct Document {
    nodes: RefCell<Vec<NodeData>>,
    listeners: RefCell<ListenerStore>,
    body: NodeId,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.borrow().len())
            .field("listeners", &self.listener_total())
            .finish()
    }
}

impl Document {
    /// Create a document containing an empty `body`.
    pub fn new() -> Rc<Self> {
        let body = NodeData {
            tag: "body".to_string(),
            ..NodeData::default()
        };
        Rc::new(Self {
            nodes: RefCell::new(vec![body]),
            listeners: RefCell::new(ListenerStore::default()),
            body: NodeId(0),
        })
    }

    /// The connected root element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        });
        NodeId(nodes.len() - 1)
    }

    fn exists(&self, node: NodeId) -> bool {
        node.0 < self.nodes.borrow().len()
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// Refuses (returns false) to create a cycle.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        if !self.exists(parent) || !self.exists(child) || self.contains_node(child, parent) {
            return false;
        }
        self.detach(child);
        let mut nodes = self.nodes.borrow_mut();
        nodes[child.0].parent = Some(parent);
        nodes[parent.0].children.push(child);
        true
    }

    /// Remove `node` from its parent. The subtree stays intact.
    pub fn detach(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes.get(node.0).and_then(|n| n.parent) else {
            return;
        };
        nodes[parent.0].children.retain(|c| *c != node);
        nodes[node.0].parent = None;
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow().get(node.0).map(|n| n.tag.clone())
    }

    /// Is `node` inside the tree rooted at `body`?
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains_node(self.body, node)
    }

    /// Inclusive ancestry test, like `Node.contains`.
    pub fn contains_node(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Does `scope` contain `node`? Window and document contain every
    /// connected element.
    pub fn contains(&self, scope: Scope, node: NodeId) -> bool {
        match scope {
            Scope::Element(ancestor) => self.contains_node(ancestor, node),
            Scope::Document | Scope::Window => self.is_connected(node),
        }
    }

    /// Nearest inclusive ancestor matching `selector`, like `Element.closest`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if selector.matches(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Connected elements in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|&node| self.attribute(node, "id").as_deref() == Some(id))
    }

    /// Every connected element matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|&node| selector.matches(self, node))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow().get(node.0).and_then(|n| {
            n.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// All attributes in insertion order.
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(data) = nodes.get_mut(node.0) else {
            return;
        };
        match data.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        let mut nodes = self.nodes.borrow_mut();
        let Some(data) = nodes.get_mut(node.0) else {
            return false;
        };
        let before = data.attributes.len();
        data.attributes.retain(|(k, _)| k != name);
        data.attributes.len() != before
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let classes = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &classes);
    }

    pub fn remove_class(&self, node: NodeId, class: &str) {
        let Some(existing) = self.attribute(node, "class") else {
            return;
        };
        let kept: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        self.set_attribute(node, "class", &kept.join(" "));
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Register `handler` for `event_type` on `scope`.
    pub fn add_listener(
        &self,
        scope: Scope,
        event_type: &str,
        flags: ListenerFlags,
        handler: Handler,
    ) -> ListenerId {
        let mut store = self.listeners.borrow_mut();
        let id = store.next_id();
        store
            .by_target
            .entry((scope, event_type.to_string()))
            .or_default()
            .push(ListenerEntry { id, flags, handler });
        trace!(?scope, event_type, ?id, "listener added");
        id
    }

    /// Remove a listener. Like `removeEventListener`, the event type and
    /// capture flag must match the registration.
    pub fn remove_listener(
        &self,
        scope: Scope,
        event_type: &str,
        capture: bool,
        id: ListenerId,
    ) -> bool {
        let removed = self
            .listeners
            .borrow_mut()
            .remove(scope, event_type, capture, id);
        trace!(?scope, event_type, ?id, removed, "listener removal");
        removed
    }

    pub fn has_listener(&self, scope: Scope, event_type: &str, id: ListenerId) -> bool {
        self.listeners.borrow().contains(scope, event_type, id)
    }

    /// Number of listeners for `event_type` on `scope`.
    pub fn listener_count(&self, scope: Scope, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .by_target
            .get(&(scope, event_type.to_string()))
            .map_or(0, Vec::len)
    }

    /// Number of listeners registered anywhere in this document.
    pub fn listener_total(&self) -> usize {
        self.listeners.borrow().by_target.values().map(Vec::len).sum()
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Scopes from the outermost to `target` (window first).
    fn event_path(&self, target: Scope) -> Vec<Scope> {
        let node = match target {
            Scope::Window => return vec![Scope::Window],
            Scope::Document => return vec![Scope::Window, Scope::Document],
            Scope::Element(node) => node,
        };

        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            path.push(Scope::Element(n));
            current = self.parent(n);
        }
        if self.is_connected(node) {
            path.push(Scope::Document);
            path.push(Scope::Window);
        }
        path.reverse();
        path
    }

    fn pending(&self, scope: Scope, event_type: &str, phase: EventPhase) -> Vec<Pending> {
        let store = self.listeners.borrow();
        let Some(entries) = store.by_target.get(&(scope, event_type.to_string())) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|entry| match phase {
                EventPhase::Capturing => entry.flags.capture(),
                EventPhase::Bubbling => !entry.flags.capture(),
                _ => true,
            })
            .map(|entry| Pending {
                id: entry.id,
                flags: entry.flags,
                handler: entry.handler.clone(),
            })
            .collect()
    }

    fn invoke_scope(&self, scope: Scope, phase: EventPhase, event: &Event) {
        for pending in self.pending(scope, event.event_type(), phase) {
            // Listeners removed by an earlier listener in this dispatch do not run.
            if !self.has_listener(scope, event.event_type(), pending.id) {
                continue;
            }
            if pending.flags.contains(ListenerFlags::ONCE) {
                self.remove_listener(scope, event.event_type(), pending.flags.capture(), pending.id);
            }

            event.enter_listener(scope, phase, pending.flags.contains(ListenerFlags::PASSIVE));
            if let Err(err) = (pending.handler)(event) {
                warn!(
                    event_type = event.event_type(),
                    ?scope,
                    error = %err,
                    "uncaught error in event listener"
                );
            }

            if event.immediate_propagation_stopped() {
                break;
            }
        }
    }

    /// Dispatch `event` at an element. Returns `false` if a listener
    /// prevented the default action.
    pub fn dispatch(&self, target: NodeId, event: &Event) -> bool {
        self.dispatch_to(Scope::Element(target), event)
    }

    /// Dispatch `event` at any scope.
    pub fn dispatch_to(&self, target: Scope, event: &Event) -> bool {
        let path = self.event_path(target);
        event.begin_dispatch(target.element());

        let last = path.len().saturating_sub(1);

        // Capture: window → parent of target.
        for scope in &path[..last] {
            if event.propagation_stopped() {
                break;
            }
            self.invoke_scope(*scope, EventPhase::Capturing, event);
        }

        // Target.
        if !event.propagation_stopped() {
            if let Some(scope) = path.last() {
                self.invoke_scope(*scope, EventPhase::AtTarget, event);
            }
        }

        // Bubble: parent of target → window.
        if event.bubbles() {
            for scope in path[..last].iter().rev() {
                if event.propagation_stopped() {
                    break;
                }
                self.invoke_scope(*scope, EventPhase::Bubbling, event);
            }
        }

        event.end_dispatch();
        !event.default_prevented()
    }
}
