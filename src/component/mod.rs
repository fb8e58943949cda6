//! Components - The lifecycle contract every widget implements.
//!
//! A widget:
//! 1. Builds a [`ComponentBase`] (id, element, options, event map)
//! 2. Mounts itself into the [`Registry`] under its kind
//! 3. Attaches listeners in `initialize`, tracking their removers
//! 4. Releases them in `destroy` and drops its registry entry in `remove`
//!
//! # Example
//!
//! ```ignore
//! struct Dismiss { base: ComponentBase }
//!
//! impl Component for Dismiss {
//!     fn base(&self) -> &ComponentBase { &self.base }
//!     fn initialize(&self) -> anyhow::Result<()> { Ok(()) }
//!     fn destroy(&self) { self.base.release_events(); }
//!     fn remove(&self) -> Result<(), RegistryError> { self.base.unregister() }
//! }
//!
//! let dismiss = mount(&registry, Dismiss { base }, false)?;
//! dismiss.initialize()?;
//! ```

mod base;
mod options;

pub use base::*;
pub use options::*;

use std::rc::Rc;

use tracing::debug;

use crate::engine::Registry;
use crate::error::RegistryError;
use crate::types::NodeId;

/// Lifecycle capabilities of a widget instance.
pub trait Component {
    /// Shared state (id, element, events, options, initialized flag).
    fn base(&self) -> &ComponentBase;

    fn id(&self) -> &str {
        self.base().id()
    }

    fn kind(&self) -> &str {
        self.base().kind()
    }

    fn element(&self) -> NodeId {
        self.base().element()
    }

    fn is_initialized(&self) -> bool {
        self.base().is_initialized()
    }

    /// Widget-specific setup.
    fn initialize(&self) -> anyhow::Result<()>;

    /// Release what the widget holds: listeners, timers, injected DOM.
    fn destroy(&self);

    /// Drop the widget's own bookkeeping, usually its registry entry.
    fn remove(&self) -> Result<(), RegistryError>;

    /// `destroy` then `remove`. No rollback if either half fails.
    fn destroy_and_remove(&self) {
        self.destroy();
        let _ = self.remove();
    }
}

/// Register `component`'s kind if needed, then add it under its own id.
///
/// Fails with `Duplicate` when the id is taken and `override_existing` is
/// false; the component is dropped in that case.
pub fn mount<C>(
    registry: &Rc<Registry>,
    component: C,
    override_existing: bool,
) -> Result<Rc<C>, RegistryError>
where
    C: Component + 'static,
{
    let kind = component.kind().to_string();
    let id = component.id().to_string();

    if !registry.has_kind(&kind) {
        registry.register(&kind)?;
    }

    let component = Rc::new(component);
    registry.add(&kind, component.clone(), Some(&id), override_existing)?;
    debug!(kind = %kind, id = %id, "component mounted");
    Ok(component)
}


#[cfg(test)]
mod tests {
    use super::testing::Tally;
    use super::*;
    use crate::config::KitConfig;

    #[test]
    fn test_mount_registers_kind_once() {
        let registry = Registry::new(KitConfig::default());

        let a = mount(&registry, Tally::build(&registry, "Accordion", "a"), false).unwrap();
        let b = mount(&registry, Tally::build(&registry, "Accordion", "b"), false).unwrap();

        assert_eq!(registry.kinds(), vec!["Accordion"]);
        assert!(registry.has("Accordion", a.id()));
        assert!(registry.has("Accordion", b.id()));
    }

    #[test]
    fn test_mount_collision() {
        let registry = Registry::new(KitConfig::default());
        let first = mount(&registry, Tally::build(&registry, "Modal", "m"), false).unwrap();

        let err = mount(&registry, Tally::build(&registry, "Modal", "m"), false).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(first.destroyed(), 0);

        let second = mount(&registry, Tally::build(&registry, "Modal", "m"), true).unwrap();
        assert_eq!(first.destroyed(), 1);
        let stored = registry.get("Modal", "m").unwrap();
        assert!(Rc::ptr_eq(&stored, &(second as Rc<dyn Component>)));
    }

    #[test]
    fn test_default_destroy_and_remove() {
        let registry = Registry::new(KitConfig::default());
        let tally = mount(&registry, Tally::build(&registry, "Toast", "t"), false).unwrap();
        tally.initialize().unwrap();
        assert_eq!(tally.initialized(), 1);
        assert!(tally.is_initialized());

        tally.destroy_and_remove();
        assert_eq!(tally.destroyed(), 1);
        assert_eq!(tally.removed(), 1);
        assert!(!tally.is_initialized());
        assert!(!registry.has("Toast", "t"));

        // Second call: remove fails inside, destroy still runs, no panic.
        tally.destroy_and_remove();
        assert_eq!(tally.destroyed(), 2);
        assert_eq!(tally.removed(), 2);
    }
}
