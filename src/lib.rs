//! # spark-kit
//!
//! Lifecycle plumbing for DOM widget libraries.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! reactive `initialized` flag every widget carries.
//!
//! ## Architecture
//!
//! Widgets are objects bound to one element each. The kit supplies the parts
//! every widget needs around its own behavior:
//!
//! ```text
//! Registry (kind → id → widget) ← mount ← Component (ComponentBase)
//!                                              ↓ initialize
//!                              Orchestrator (guarded listeners + teardowns)
//!                                              ↓
//!                                  Document (capture/target/bubble dispatch)
//! ```
//!
//! Everything is single-threaded and shared through `Rc`. Callbacks never run
//! while internal state is borrowed, so handlers may call back into the kit.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, Scope, ListenerFlags, Cleanup)
//! - [`dom`] - In-memory document, selectors and events
//! - [`engine`] - Instance registry
//! - [`component`] - Component trait, shared base, options
//! - [`events`] - Teardown orchestrator and transition lifecycle
//! - [`config`] - Runtime configuration
//! - [`error`] - Error types
//! - [`util`] - Small helpers (clamp, coercion, ids)

pub mod component;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod events;
pub mod types;
pub mod util;

// Re-export commonly used items
pub use types::*;

pub use engine::{InstanceMap, KindMap, Registry};

pub use component::{
    merge_options, mount, options_from_dataset, Component, ComponentBase, EventMap, Options,
};

pub use events::{
    transition_lifecycle, ListenerOptions, Orchestrator, TransitionHandle, TransitionHandlers,
    TransitionPhase,
};

pub use dom::{Document, Event, Handler, ListenerId, Selector};

pub use config::KitConfig;

pub use error::{ConfigError, RegistryError, SelectorError};
