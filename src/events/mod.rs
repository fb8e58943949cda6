//! Events Module - Listener lifecycles for widgets.
//!
//! - **Orchestrator** - Per-widget teardown context: guarded listeners,
//!   delegation, aliased cleanups
//! - **Transition** - `start` / `run` / `end` / `cancel` transition phases
//!   bundled behind one teardown
//!
//! # Example
//!
//! ```ignore
//! use spark_kit::{ListenerOptions, Orchestrator, Scope};
//!
//! let ctx = Orchestrator::new(&document, config);
//! let remove = ctx.attach_delegate(
//!     Scope::Element(list),
//!     "click",
//!     |event| {
//!         println!("item {:?}", event.delegate_target());
//!         Ok(())
//!     },
//!     &ListenerOptions::new().delegate_to("li")?,
//! );
//! ctx.push("click", remove);
//! ctx.teardown(None);
//! ```

mod orchestrator;
mod transition;

pub use orchestrator::*;
pub use transition::*;
