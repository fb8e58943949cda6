//! Component base - State every widget carries.
//!
//! `ComponentBase` owns the id, the element, the event map (category →
//! name → remover), the merged options and the reactive `initialized` flag.
//! Concrete widgets embed one and expose it through
//! [`Component::base`](super::Component::base).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;
use spark_signals::{signal, Signal};
use tracing::trace;

use super::options::{merge_options, Options};
use crate::dom::Document;
use crate::engine::Registry;
use crate::error::RegistryError;
use crate::types::{Cleanup, NodeId};
use crate::util::{generate_id, run_guarded};

/// Listener removers by category, then by name.
pub type EventMap = HashMap<String, HashMap<String, Cleanup>>;

/// Shared widget state.
pub struct ComponentBase {
    kind: String,
    id: String,
    element: NodeId,
    document: Rc<Document>,
    registry: Weak<Registry>,
    development: bool,
    events: RefCell<EventMap>,
    options: Options,
    initialized: Signal<bool>,
}

impl std::fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBase")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("element", &self.element)
            .field("events", &self.event_count())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ComponentBase {
    /// Build the base for a widget of `kind` bound to `element`.
    ///
    /// The id is `id` if given, else the element's `id` attribute, else a
    /// generated one. Options are `overrides` shallow-merged over `defaults`.
    pub fn new(
        registry: &Rc<Registry>,
        document: &Rc<Document>,
        kind: &str,
        element: NodeId,
        id: Option<&str>,
        defaults: &Options,
        overrides: &Options,
    ) -> Self {
        let id = id
            .map(str::to_string)
            .or_else(|| document.attribute(element, "id").filter(|id| !id.is_empty()))
            .unwrap_or_else(|| generate_id(registry.config().effective_id_length()));

        Self {
            kind: kind.to_string(),
            id,
            element,
            document: document.clone(),
            registry: Rc::downgrade(registry),
            development: registry.config().development,
            events: RefCell::new(HashMap::new()),
            options: merge_options(defaults, overrides),
            initialized: signal(false),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    /// The owning registry, if it is still alive.
    pub fn registry(&self) -> Option<Rc<Registry>> {
        self.registry.upgrade()
    }

    // -------------------------------------------------------------------------
    // Options
    // -------------------------------------------------------------------------

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Deserialize the merged options into a typed struct.
    pub fn options_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.options.clone()))
    }

    // -------------------------------------------------------------------------
    // Initialized flag
    // -------------------------------------------------------------------------

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn set_initialized(&self, value: bool) {
        self.initialized.set(value);
    }

    /// The reactive flag itself, for deriveds and effects.
    pub fn initialized_signal(&self) -> Signal<bool> {
        self.initialized.clone()
    }

    // -------------------------------------------------------------------------
    // Event map
    // -------------------------------------------------------------------------

    /// Remember a remover under `(category, name)`.
    ///
    /// A remover already stored under the same slot runs first, so
    /// re-tracking never orphans a listener.
    pub fn track_event<F>(&self, category: &str, name: &str, remover: F)
    where
        F: FnOnce() + 'static,
    {
        let previous = self
            .events
            .borrow_mut()
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string(), Box::new(remover));
        if let Some(previous) = previous {
            trace!(kind = %self.kind, id = %self.id, category, name, "replacing tracked listener");
            self.run_remover(category, name, previous);
        }
    }

    /// A panicking remover is logged (in development) and never stops the
    /// removers after it.
    fn run_remover(&self, category: &str, name: &str, remover: Cleanup) {
        let label = format!("{}/{category}/{name}", self.id);
        run_guarded(self.development, "component event", &label, || {
            remover();
            Ok(())
        });
    }

    pub fn has_event(&self, category: &str, name: &str) -> bool {
        self.events
            .borrow()
            .get(category)
            .is_some_and(|names| names.contains_key(name))
    }

    /// Run and forget one remover.
    pub fn release_event(&self, category: &str, name: &str) -> bool {
        let remover = {
            let mut events = self.events.borrow_mut();
            let Some(names) = events.get_mut(category) else {
                return false;
            };
            let remover = names.remove(name);
            if names.is_empty() {
                events.remove(category);
            }
            remover
        };
        match remover {
            Some(remover) => {
                self.run_remover(category, name, remover);
                true
            }
            None => false,
        }
    }

    /// Run and forget every remover. Returns how many ran, including ones
    /// that failed.
    pub fn release_events(&self) -> usize {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        let mut released = 0;
        for (category, names) in events {
            for (name, remover) in names {
                self.run_remover(&category, &name, remover);
                released += 1;
            }
        }
        released
    }

    /// Number of tracked removers.
    pub fn event_count(&self) -> usize {
        self.events.borrow().values().map(HashMap::len).sum()
    }

    // -------------------------------------------------------------------------
    // Registry bookkeeping
    // -------------------------------------------------------------------------

    /// Remove this instance's entry from the registry.
    ///
    /// A dropped registry has nothing left to remove, which counts as success.
    pub fn unregister(&self) -> Result<(), RegistryError> {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.kind, &self.id),
            None => Ok(()),
        }
    }
}
