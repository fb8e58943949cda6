//! Core types for spark-kit.
//!
//! These types are shared by the DOM model, the instance registry and the
//! event orchestrator.

// =============================================================================
// Node identity
// =============================================================================

/// Handle to an element in a [`Document`](crate::dom::Document).
///
/// Handles are arena indices. They stay valid for the lifetime of the
/// document, even after the element is detached from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Where a listener lives: an element, the document, or the window.
///
/// Event paths always end at `Document` then `Window`, so listeners on
/// those two scopes see every bubbling event in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Window,
    Document,
    Element(NodeId),
}

impl Scope {
    /// The element behind this scope, if any.
    pub fn element(self) -> Option<NodeId> {
        match self {
            Scope::Element(node) => Some(node),
            _ => None,
        }
    }
}

impl From<NodeId> for Scope {
    fn from(node: NodeId) -> Self {
        Scope::Element(node)
    }
}

// =============================================================================
// Listener flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Options passed alongside a listener, mirroring `addEventListener`.
    ///
    /// Combine with bitwise OR: `ListenerFlags::CAPTURE | ListenerFlags::ONCE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ListenerFlags: u8 {
        const NONE = 0;
        /// Fire during the capture phase instead of the bubble phase.
        const CAPTURE = 1 << 0;
        /// Remove the listener before its first invocation.
        const ONCE = 1 << 1;
        /// The listener may not cancel the event's default action.
        const PASSIVE = 1 << 2;
    }
}

impl ListenerFlags {
    /// Whether the capture bit is set. Removal must match on this.
    pub fn capture(self) -> bool {
        self.contains(ListenerFlags::CAPTURE)
    }
}

// =============================================================================
// Event detail
// =============================================================================

/// Event-family specific payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventDetail {
    #[default]
    None,
    /// `transitionstart` / `transitionrun` / `transitionend` / `transitioncancel`.
    Transition { property_name: String },
    /// `animationstart` / `animationiteration` / `animationend` / `animationcancel`.
    Animation { animation_name: String },
}

impl EventDetail {
    /// The CSS property or animation name this event is about, if any.
    ///
    /// Used by delegated listeners to filter concurrent transitions on one
    /// element by property.
    pub fn name(&self) -> Option<&str> {
        match self {
            EventDetail::None => None,
            EventDetail::Transition { property_name } => Some(property_name),
            EventDetail::Animation { animation_name } => Some(animation_name),
        }
    }
}

// =============================================================================
// Event phase
// =============================================================================

/// Dispatch phase, mirroring `Event.eventPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function stored in teardown registries and component event maps.
///
/// Call this to detach the listener (or release whatever it guards).
pub type Cleanup = Box<dyn FnOnce()>;
