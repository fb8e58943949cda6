//! Engine - The instance container.
//!
//! Widgets are grouped by kind, then keyed by id:
//!
//! ```text
//! "Toast" → { "toast-1" → Toast, "toast-2" → Toast }
//! "Modal" → { "signup"  → Modal }
//! ```
//!
//! A kind must be registered before instances can be added under it. Ids
//! are unique within a kind only.

mod registry;

pub use registry::*;
