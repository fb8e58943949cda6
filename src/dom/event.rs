//! DOM events.
//!
//! An [`Event`] is created by the caller, handed to
//! [`Document::dispatch`](super::Document::dispatch), and observed by
//! listeners through a shared reference. Dispatch state (phase, current
//! target, propagation flags) lives in `Cell`s so listeners can call
//! `stop_propagation` / `prevent_default` without `&mut`.

use std::cell::Cell;
use std::rc::Rc;

use crate::types::{EventDetail, EventPhase, NodeId, Scope};

/// Listener body. Errors are reported by the dispatcher and never stop it.
pub type Handler = Rc<dyn Fn(&Event) -> anyhow::Result<()>>;

/// A dispatched event.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    detail: EventDetail,
    bubbles: bool,
    cancelable: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<Scope>>,
    delegate_target: Cell<Option<NodeId>>,
    phase: Cell<EventPhase>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
    in_passive_listener: Cell<bool>,
}

impl Event {
    /// A bubbling, cancelable event with no detail.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: EventDetail::None,
            bubbles: true,
            cancelable: true,
            target: Cell::new(None),
            current_target: Cell::new(None),
            delegate_target: Cell::new(None),
            phase: Cell::new(EventPhase::None),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    /// A CSS transition event (`transitionend` etc.) for `property_name`.
    pub fn transition(event_type: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self::new(event_type).with_detail(EventDetail::Transition {
            property_name: property_name.into(),
        })
    }

    /// A CSS animation event (`animationend` etc.) for `animation_name`.
    pub fn animation(event_type: impl Into<String>, animation_name: impl Into<String>) -> Self {
        Self::new(event_type).with_detail(EventDetail::Animation {
            animation_name: animation_name.into(),
        })
    }

    /// Replace the detail payload.
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Only capture and target phases run.
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    /// `prevent_default` has no effect.
    pub fn non_cancelable(mut self) -> Self {
        self.cancelable = false;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// True for `transition*` and `animation*` events.
    pub fn is_transition_or_animation(&self) -> bool {
        !matches!(self.detail, EventDetail::None)
            || self.event_type.starts_with("transition")
            || self.event_type.starts_with("animation")
    }

    /// The element the event was dispatched at (`None` for window/document targets).
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// The scope whose listener is currently running.
    pub fn current_target(&self) -> Option<Scope> {
        self.current_target.get()
    }

    /// The element a delegated listener resolved for this invocation.
    pub fn delegate_target(&self) -> Option<NodeId> {
        self.delegate_target.get()
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Cancel the default action. Ignored inside passive listeners and
    /// for non-cancelable events.
    pub fn prevent_default(&self) {
        if self.cancelable && !self.in_passive_listener.get() {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    // -------------------------------------------------------------------------
    // Dispatcher-side state
    // -------------------------------------------------------------------------

    pub(crate) fn begin_dispatch(&self, target: Option<NodeId>) {
        self.target.set(target);
        self.propagation_stopped.set(false);
        self.immediate_propagation_stopped.set(false);
    }

    pub(crate) fn end_dispatch(&self) {
        self.phase.set(EventPhase::None);
        self.current_target.set(None);
        self.delegate_target.set(None);
        self.in_passive_listener.set(false);
    }

    pub(crate) fn enter_listener(&self, scope: Scope, phase: EventPhase, passive: bool) {
        self.current_target.set(Some(scope));
        self.phase.set(phase);
        self.in_passive_listener.set(passive);
        self.delegate_target.set(None);
    }

    pub(crate) fn set_delegate_target(&self, node: Option<NodeId>) {
        self.delegate_target.set(node);
    }

    pub(crate) fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let click = Event::new("click");
        assert_eq!(click.event_type(), "click");
        assert!(click.bubbles());
        assert!(!click.is_transition_or_animation());

        let end = Event::transition("transitionend", "opacity");
        assert_eq!(end.detail().name(), Some("opacity"));
        assert!(end.is_transition_or_animation());

        let anim = Event::animation("animationend", "fade-in");
        assert_eq!(anim.detail().name(), Some("fade-in"));
    }

    #[test]
    fn test_prevent_default_rules() {
        let event = Event::new("submit");
        event.prevent_default();
        assert!(event.default_prevented());

        let event = Event::new("scroll").non_cancelable();
        event.prevent_default();
        assert!(!event.default_prevented());

        let event = Event::new("touchstart");
        event.enter_listener(Scope::Document, EventPhase::Bubbling, true);
        event.prevent_default();
        assert!(!event.default_prevented());
    }

    #[test]
    fn test_stop_immediate_implies_stop() {
        let event = Event::new("click");
        event.stop_immediate_propagation();
        assert!(event.propagation_stopped());
        assert!(event.immediate_propagation_stopped());
    }
}
