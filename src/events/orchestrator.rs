//! Orchestrator - Fault-isolated listeners and a named teardown registry.
//!
//! Each widget creates its own `Orchestrator`; nothing is shared between
//! contexts. It does two things:
//!
//! - `attach` / `attach_delegate` put listeners on the document whose
//!   errors and panics are caught at this boundary, and hand back a
//!   remover that detaches exactly that listener.
//! - `push` / `teardown` keep one cleanup per alias. Pushing onto an
//!   occupied alias runs the old cleanup first, so a slot can be re-armed
//!   without leaking the previous listener.
//!
//! Faults are swallowed always and logged only when
//! [`KitConfig::development`] is set.
//!
//! # Example
//!
//! ```ignore
//! let ctx = Orchestrator::new(&document, KitConfig::default());
//!
//! let remove = ctx.attach(Scope::Element(button), "click", |event| {
//!     toggle();
//!     Ok(())
//! }, &ListenerOptions::default());
//! ctx.push("click", remove);
//!
//! // Later
//! ctx.teardown(None);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::config::KitConfig;
use crate::dom::{Document, Event, Handler, Selector};
use crate::error::SelectorError;
use crate::types::{Cleanup, ListenerFlags, Scope};
use crate::util::run_guarded;

// =============================================================================
// Listener options
// =============================================================================

/// Options for [`Orchestrator::attach`] and [`Orchestrator::attach_delegate`].
#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    /// Native listener flags (capture / once / passive).
    pub flags: ListenerFlags,
    /// Delegated listeners only run for targets inside a match of this selector.
    pub delegate: Option<Selector>,
    /// Delegated listeners only run for transition/animation events about
    /// this CSS property or animation name.
    pub name: Option<String>,
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: ListenerFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn capture(self) -> Self {
        self.with_flags(ListenerFlags::CAPTURE)
    }

    pub fn once(self) -> Self {
        self.with_flags(ListenerFlags::ONCE)
    }

    pub fn passive(self) -> Self {
        self.with_flags(ListenerFlags::PASSIVE)
    }

    pub fn delegate(mut self, selector: Selector) -> Self {
        self.delegate = Some(selector);
        self
    }

    /// Parse and set the delegate selector.
    pub fn delegate_to(self, selector: &str) -> Result<Self, SelectorError> {
        Ok(self.delegate(Selector::parse(selector)?))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// One widget's listener and teardown context.
pub struct Orchestrator {
    document: Rc<Document>,
    config: KitConfig,
    /// Alias → cleanup, in registration order.
    teardowns: RefCell<Vec<(String, Cleanup)>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("aliases", &self.aliases())
            .field("development", &self.config.development)
            .finish()
    }
}

impl Orchestrator {
    /// Create an empty, isolated context.
    pub fn new(document: &Rc<Document>, config: KitConfig) -> Self {
        Self {
            document: document.clone(),
            config,
            teardowns: RefCell::new(Vec::new()),
        }
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Attach `handler` for `event_type` on `scope`.
    ///
    /// Errors and panics from `handler` are caught and (in development)
    /// logged; they never reach the dispatcher. The returned remover detaches
    /// this exact listener, matching event type and capture flag.
    pub fn attach<F>(
        &self,
        scope: Scope,
        event_type: &str,
        handler: F,
        options: &ListenerOptions,
    ) -> impl FnOnce() + use<F> + 'static
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        let development = self.config.development;
        let label = event_type.to_string();
        let wrapped: Handler = Rc::new(move |event: &Event| -> anyhow::Result<()> {
            run_guarded(development, "listener", &label, || handler(event));
            Ok(())
        });

        let id = self
            .document
            .add_listener(scope, event_type, options.flags, wrapped);

        let document = self.document.clone();
        let event_type = event_type.to_string();
        let capture = options.flags.capture();
        move || {
            document.remove_listener(scope, &event_type, capture, id);
        }
    }

    /// Attach one listener on `scope` that resolves the effective target at
    /// dispatch time.
    ///
    /// The native target is walked up to the nearest ancestor matching
    /// `options.delegate`; the handler is skipped if nothing matches or the
    /// match lies outside `scope`. With `options.name`, transition and
    /// animation events about any other property or animation are skipped.
    /// The resolved element is available as [`Event::delegate_target`].
    ///
    /// Without a delegate selector the native target itself is used.
    pub fn attach_delegate<F>(
        &self,
        scope: Scope,
        event_type: &str,
        handler: F,
        options: &ListenerOptions,
    ) -> impl FnOnce() + use<F> + 'static
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        let selector = options.delegate.clone();
        let name = options.name.clone();
        // Weak: the handler is stored inside the document.
        let document = Rc::downgrade(&self.document);

        let delegated = move |event: &Event| -> anyhow::Result<()> {
            let Some(document) = document.upgrade() else {
                return Ok(());
            };
            let Some(target) = event.target() else {
                return Ok(());
            };

            let resolved = match &selector {
                Some(selector) => match document.closest(target, selector) {
                    Some(node) => node,
                    None => return Ok(()),
                },
                None => target,
            };
            if !document.contains(scope, resolved) {
                return Ok(());
            }

            if let Some(name) = &name {
                if event.is_transition_or_animation() && event.detail().name() != Some(name.as_str()) {
                    return Ok(());
                }
            }

            event.set_delegate_target(Some(resolved));
            handler(event)
        };

        self.attach(scope, event_type, delegated, options)
    }

    // -------------------------------------------------------------------------
    // Teardown registry
    // -------------------------------------------------------------------------

    fn run_teardown(&self, alias: &str, callback: Cleanup) {
        trace!(alias, "running teardown");
        run_guarded(self.config.development, "teardown", alias, || {
            callback();
            Ok(())
        });
    }

    /// Store `callback` under `alias`.
    ///
    /// If the alias is taken, the old callback runs first (synchronously)
    /// and the new one takes its place in registration order.
    pub fn push<F>(&self, alias: &str, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let previous = {
            let mut teardowns = self.teardowns.borrow_mut();
            teardowns
                .iter()
                .position(|(existing, _)| existing == alias)
                .map(|index| (index, teardowns.remove(index)))
        };

        let index = match previous {
            Some((index, (_, old))) => {
                self.run_teardown(alias, old);
                Some(index)
            }
            None => None,
        };

        let mut teardowns = self.teardowns.borrow_mut();
        let entry = (alias.to_string(), Box::new(callback) as Cleanup);
        match index {
            Some(index) if index <= teardowns.len() => teardowns.insert(index, entry),
            _ => teardowns.push(entry),
        }
    }

    /// Run and drop one alias (`Some`) or every alias in registration order
    /// (`None`).
    ///
    /// Returns `true` if at least one callback ran. A failing callback never
    /// stops the rest.
    pub fn teardown(&self, alias: Option<&str>) -> bool {
        match alias {
            Some(alias) => {
                let entry = {
                    let mut teardowns = self.teardowns.borrow_mut();
                    teardowns
                        .iter()
                        .position(|(existing, _)| existing == alias)
                        .map(|index| teardowns.remove(index))
                };
                match entry {
                    Some((alias, callback)) => {
                        self.run_teardown(&alias, callback);
                        true
                    }
                    None => false,
                }
            }
            None => {
                let entries = std::mem::take(&mut *self.teardowns.borrow_mut());
                if entries.is_empty() {
                    return false;
                }
                for (alias, callback) in entries {
                    self.run_teardown(&alias, callback);
                }
                true
            }
        }
    }

    /// Shorthand for `teardown(None)`.
    pub fn teardown_all(&self) -> bool {
        self.teardown(None)
    }

    pub fn has(&self, alias: &str) -> bool {
        self.teardowns.borrow().iter().any(|(existing, _)| existing == alias)
    }

    /// Registered aliases in registration order.
    pub fn aliases(&self) -> Vec<String> {
        self.teardowns
            .borrow()
            .iter()
            .map(|(alias, _)| alias.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.teardowns.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.teardowns.borrow().is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use std::cell::Cell;

    fn setup() -> (Rc<Document>, Orchestrator) {
        let doc = Document::new();
        let ctx = Orchestrator::new(&doc, KitConfig::development());
        (doc, ctx)
    }

    /// body > menu.menu > li.item > span
    fn menu(doc: &Document) -> (NodeId, NodeId, NodeId) {
        let menu = doc.create_element("ul");
        doc.add_class(menu, "menu");
        let item = doc.create_element("li");
        doc.add_class(item, "item");
        let span = doc.create_element("span");
        doc.append_child(doc.body(), menu);
        doc.append_child(menu, item);
        doc.append_child(item, span);
        (menu, item, span)
    }

    fn counter() -> (Rc<Cell<usize>>, impl Fn(&Event) -> anyhow::Result<()> + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move |_: &Event| -> anyhow::Result<()> {
            c.set(c.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn test_attach_and_remove() {
        let (doc, ctx) = setup();
        let (_, _, span) = menu(&doc);
        let (count, handler) = counter();

        let remove = ctx.attach(Scope::Element(span), "click", handler, &ListenerOptions::new());
        doc.dispatch(span, &Event::new("click"));
        assert_eq!(count.get(), 1);

        remove();
        doc.dispatch(span, &Event::new("click"));
        assert_eq!(count.get(), 1);
        assert_eq!(doc.listener_total(), 0);
    }

    #[test]
    fn test_remover_matches_capture_flag() {
        let (doc, ctx) = setup();
        let (_, _, span) = menu(&doc);
        let (_, handler) = counter();

        let remove = ctx.attach(Scope::Document, "click", handler, &ListenerOptions::new().capture());
        assert_eq!(doc.listener_count(Scope::Document, "click"), 1);
        remove();
        assert_eq!(doc.listener_count(Scope::Document, "click"), 0);
        doc.dispatch(span, &Event::new("click"));
    }

    #[test]
    fn test_faulty_handler_is_isolated() {
        let (doc, ctx) = setup();
        let (_, item, span) = menu(&doc);
        let (count, handler) = counter();

        let remove_err = ctx.attach(
            Scope::Element(span),
            "click",
            |_| Err(anyhow::anyhow!("broken handler")),
            &ListenerOptions::new(),
        );
        let remove_panic = ctx.attach(
            Scope::Element(span),
            "click",
            |_| panic!("handler blew up"),
            &ListenerOptions::new(),
        );
        let _keep = ctx.attach(Scope::Element(item), "click", handler, &ListenerOptions::new());

        // Neither fault escapes dispatch, and the sibling still runs.
        doc.dispatch(span, &Event::new("click"));
        assert_eq!(count.get(), 1);

        // Removers still detach the faulty listeners.
        remove_err();
        remove_panic();
        assert_eq!(doc.listener_count(Scope::Element(span), "click"), 0);
    }

    #[test]
    fn test_delegate_resolves_matching_ancestor() {
        let (doc, ctx) = setup();
        let (menu, item, span) = menu(&doc);
        let seen = Rc::new(Cell::new(None));
        let s = seen.clone();

        let _remove = ctx.attach_delegate(
            Scope::Element(menu),
            "click",
            move |event| {
                s.set(event.delegate_target());
                Ok(())
            },
            &ListenerOptions::new().delegate_to(".item").unwrap(),
        );

        doc.dispatch(span, &Event::new("click"));
        assert_eq!(seen.get(), Some(item));
    }

    #[test]
    fn test_delegate_skips_non_matching_target() {
        let (doc, ctx) = setup();
        let (menu, _, _) = menu(&doc);
        let (count, handler) = counter();

        let _remove = ctx.attach_delegate(
            Scope::Element(menu),
            "click",
            handler,
            &ListenerOptions::new().delegate_to(".item").unwrap(),
        );

        // The menu itself is not inside any `.item`.
        doc.dispatch(menu, &Event::new("click"));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_delegate_skips_match_outside_scope() {
        let (doc, ctx) = setup();
        let (menu, item, span) = menu(&doc);
        doc.add_class(menu, "panel");
        let (count, handler) = counter();

        // Scope is the item; `.panel` only matches the menu above it.
        let _remove = ctx.attach_delegate(
            Scope::Element(item),
            "click",
            handler,
            &ListenerOptions::new().delegate_to(".panel").unwrap(),
        );

        doc.dispatch(span, &Event::new("click"));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_delegate_name_filter() {
        let (doc, ctx) = setup();
        let (menu, item, _) = menu(&doc);
        let (count, handler) = counter();

        let _remove = ctx.attach_delegate(
            Scope::Element(menu),
            "transitionend",
            handler,
            &ListenerOptions::new().delegate_to(".item").unwrap().name("opacity"),
        );

        doc.dispatch(item, &Event::transition("transitionend", "transform"));
        assert_eq!(count.get(), 0);
        doc.dispatch(item, &Event::transition("transitionend", "opacity"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_name_filter_ignores_other_events() {
        let (doc, ctx) = setup();
        let (menu, item, _) = menu(&doc);
        let (count, handler) = counter();

        let _remove = ctx.attach_delegate(
            Scope::Element(menu),
            "click",
            handler,
            &ListenerOptions::new().name("opacity"),
        );

        doc.dispatch(item, &Event::new("click"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_delegate_faulty_handler_can_be_removed() {
        let (doc, ctx) = setup();
        let (menu, item, _) = menu(&doc);

        let remove = ctx.attach_delegate(
            Scope::Element(menu),
            "click",
            |_| Err(anyhow::anyhow!("nope")),
            &ListenerOptions::new().delegate_to(".item").unwrap(),
        );
        doc.dispatch(item, &Event::new("click"));
        remove();
        assert_eq!(doc.listener_count(Scope::Element(menu), "click"), 0);
    }

    #[test]
    fn test_push_replaces_and_runs_previous() {
        let (_doc, ctx) = setup();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let f = first.clone();
        ctx.push("start", move || f.set(f.get() + 1));
        assert_eq!(first.get(), 0);

        let s = second.clone();
        ctx.push("start", move || s.set(s.get() + 1));
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
        assert_eq!(ctx.len(), 1);

        assert!(ctx.teardown(Some("start")));
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_push_keeps_registration_order() {
        let (_doc, ctx) = setup();
        ctx.push("a", || {});
        ctx.push("b", || {});
        ctx.push("a", || {});
        assert_eq!(ctx.aliases(), vec!["a", "b"]);
    }

    #[test]
    fn test_teardown_all_in_order_and_idempotent() {
        let (_doc, ctx) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        for alias in ["start", "run", "end"] {
            let l = log.clone();
            ctx.push(alias, move || l.borrow_mut().push(alias));
        }

        assert!(ctx.teardown(None));
        assert_eq!(*log.borrow(), vec!["start", "run", "end"]);
        assert!(ctx.is_empty());

        // Second call finds nothing.
        assert!(!ctx.teardown(None));
        assert!(!ctx.teardown_all());
    }

    #[test]
    fn test_teardown_single_alias() {
        let (_doc, ctx) = setup();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        ctx.push("end", move || r.set(true));
        ctx.push("cancel", || {});

        assert!(!ctx.teardown(Some("missing")));
        assert!(ctx.teardown(Some("end")));
        assert!(ran.get());
        assert!(!ctx.has("end"));
        assert!(ctx.has("cancel"));
        assert!(!ctx.teardown(Some("end")));
    }

    #[test]
    fn test_panicking_teardown_does_not_block_others() {
        let (_doc, ctx) = setup();
        let after = Rc::new(Cell::new(false));
        ctx.push("bad", || panic!("detach failed"));
        let a = after.clone();
        ctx.push("good", move || a.set(true));

        assert!(ctx.teardown(None));
        assert!(after.get());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_contexts_are_isolated() {
        let doc = Document::new();
        let a = Orchestrator::new(&doc, KitConfig::production());
        let b = Orchestrator::new(&doc, KitConfig::production());
        a.push("start", || {});

        assert!(!b.teardown(None));
        assert!(a.has("start"));
    }

    #[test]
    fn test_attach_push_teardown_detaches() {
        let (doc, ctx) = setup();
        let (_, _, span) = menu(&doc);
        let (count, handler) = counter();

        let remove = ctx.attach(Scope::Element(span), "click", handler, &ListenerOptions::new());
        ctx.push("click", remove);
        doc.dispatch(span, &Event::new("click"));
        assert!(ctx.teardown(None));
        doc.dispatch(span, &Event::new("click"));
        assert_eq!(count.get(), 1);
        assert_eq!(doc.listener_total(), 0);
    }
}
