//! Transition lifecycle - Four delegated transition phases under one teardown.
//!
//! Each phase is attached through [`Orchestrator::attach_delegate`] and
//! pushed under its alias (`start`, `run`, `end`, `cancel`), so a caller can
//! drop one phase or the whole group.

use std::rc::Rc;

use crate::config::KitConfig;
use crate::dom::{Document, Handler};
use crate::types::Scope;

use super::orchestrator::{ListenerOptions, Orchestrator};

// =============================================================================
// Phases
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    Start,
    Run,
    End,
    Cancel,
}

impl TransitionPhase {
    /// Every phase in attach order.
    pub const ALL: [TransitionPhase; 4] = [
        TransitionPhase::Start,
        TransitionPhase::Run,
        TransitionPhase::End,
        TransitionPhase::Cancel,
    ];

    /// Teardown alias for this phase.
    pub fn alias(self) -> &'static str {
        match self {
            TransitionPhase::Start => "start",
            TransitionPhase::Run => "run",
            TransitionPhase::End => "end",
            TransitionPhase::Cancel => "cancel",
        }
    }

    /// Native event type for this phase.
    pub fn event_type(self) -> &'static str {
        match self {
            TransitionPhase::Start => "transitionstart",
            TransitionPhase::Run => "transitionrun",
            TransitionPhase::End => "transitionend",
            TransitionPhase::Cancel => "transitioncancel",
        }
    }

    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.alias() == alias)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Optional handler per phase. Phases without a handler are not attached.
#[derive(Clone, Default)]
pub struct TransitionHandlers {
    pub on_start: Option<Handler>,
    pub on_run: Option<Handler>,
    pub on_end: Option<Handler>,
    pub on_cancel: Option<Handler>,
}

impl std::fmt::Debug for TransitionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionHandlers")
            .field("on_start", &self.on_start.is_some())
            .field("on_run", &self.on_run.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

impl TransitionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::dom::Event) -> anyhow::Result<()> + 'static,
    {
        self.on_start = Some(Rc::new(f));
        self
    }

    pub fn on_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::dom::Event) -> anyhow::Result<()> + 'static,
    {
        self.on_run = Some(Rc::new(f));
        self
    }

    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::dom::Event) -> anyhow::Result<()> + 'static,
    {
        self.on_end = Some(Rc::new(f));
        self
    }

    pub fn on_cancel<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::dom::Event) -> anyhow::Result<()> + 'static,
    {
        self.on_cancel = Some(Rc::new(f));
        self
    }

    fn get(&self, phase: TransitionPhase) -> Option<&Handler> {
        match phase {
            TransitionPhase::Start => self.on_start.as_ref(),
            TransitionPhase::Run => self.on_run.as_ref(),
            TransitionPhase::End => self.on_end.as_ref(),
            TransitionPhase::Cancel => self.on_cancel.as_ref(),
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Owns the teardown context of one transition lifecycle.
///
/// Listeners stay attached until [`teardown`](Self::teardown) runs;
/// dropping the handle does not detach them.
#[derive(Debug)]
pub struct TransitionHandle {
    context: Orchestrator,
}

impl TransitionHandle {
    /// Tear down one phase, or every phase with `None`.
    /// Returns `true` if anything was attached.
    pub fn teardown(&self, phase: Option<TransitionPhase>) -> bool {
        self.context.teardown(phase.map(TransitionPhase::alias))
    }

    /// Same as [`teardown`](Self::teardown), by alias.
    pub fn teardown_alias(&self, alias: Option<&str>) -> bool {
        self.context.teardown(alias)
    }

    pub fn is_active(&self, phase: TransitionPhase) -> bool {
        self.context.has(phase.alias())
    }

    /// Attached phases in attach order.
    pub fn active_phases(&self) -> Vec<TransitionPhase> {
        self.context
            .aliases()
            .iter()
            .filter_map(|alias| TransitionPhase::from_alias(alias))
            .collect()
    }

    /// The combined teardown as a bare closure.
    pub fn into_teardown(self) -> impl Fn(Option<&str>) -> bool {
        move |alias: Option<&str>| self.context.teardown(alias)
    }
}

/// Attach delegated listeners for every phase that has a handler.
///
/// `options` applies to all four listeners; set `delegate` to pick the
/// transitioning element and `name` to follow a single CSS property.
pub fn transition_lifecycle(
    document: &Rc<Document>,
    config: KitConfig,
    scope: Scope,
    handlers: TransitionHandlers,
    options: ListenerOptions,
) -> TransitionHandle {
    let context = Orchestrator::new(document, config);

    for phase in TransitionPhase::ALL {
        let Some(handler) = handlers.get(phase).cloned() else {
            continue;
        };
        let remove = context.attach_delegate(
            scope,
            phase.event_type(),
            move |event| handler(event),
            &options,
        );
        context.push(phase.alias(), remove);
    }

    TransitionHandle { context }
}

// =============================================================================
// TESTS
// =============================================================================
