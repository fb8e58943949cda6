//! DOM Module - The document widgets attach to.
//!
//! A small in-memory DOM with the parts the kit relies on:
//!
//! - **Document** - Element arena, attributes/classes, tree queries
//! - **Selector** - Compound selector lists for delegation and lookup
//! - **Event** - Event payloads with capture/target/bubble dispatch
//!
//! # Example
//!
//! ```ignore
//! use spark_kit::dom::{Document, Event};
//! use spark_kit::{ListenerFlags, Scope};
//! use std::rc::Rc;
//!
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! doc.append_child(doc.body(), button);
//!
//! doc.add_listener(Scope::Document, "click", ListenerFlags::NONE, Rc::new(|event: &Event| {
//!     println!("clicked {:?}", event.target());
//!     Ok(())
//! }));
//! doc.dispatch(button, &Event::new("click"));
//! ```

mod document;
mod event;
mod selector;

pub use document::*;
pub use event::*;
pub use selector::*;
