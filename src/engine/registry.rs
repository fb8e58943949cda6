//! Instance Registry - Live widget instances by kind and id.
//!
//! Manages the bookkeeping for every constructed widget:
//! - Kind registration (once per kind, never removed)
//! - Instance add / override / update / lookup / removal
//! - Lifecycle forwarding (`destroy`, `destroy_and_remove`)
//!
//! Every failure is soft. Operations return `Err(RegistryError)` and log a
//! diagnostic: `warn!` for a missing or duplicate kind (container level),
//! `error!` for a missing instance (leaf level). Nothing panics, so callers
//! must check the result.
//!
//! The registry is an owned value. Create one per application (or per test)
//! and hand it to widgets by reference.
//!
//! # Example
//!
//! ```ignore
//! use spark_kit::{KitConfig, Registry};
//!
//! let registry = Registry::new(KitConfig::default());
//! registry.register("Toast")?;
//! let id = registry.add("Toast", toast, Some("toast-1"), false)?;
//! assert!(registry.has("Toast", &id));
//! registry.destroy_and_remove("Toast", &id);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::component::Component;
use crate::config::KitConfig;
use crate::error::RegistryError;
use crate::util::generate_id;

/// Instances of one kind, keyed by id.
pub type InstanceMap = HashMap<String, Rc<dyn Component>>;

/// Every kind, keyed by kind name.
pub type KindMap = HashMap<String, InstanceMap>;

/// Random ids tried per id-less `add` before giving up.
pub const MAX_ID_ATTEMPTS: usize = 64;

// =============================================================================
// Registry State
// =============================================================================

/// Container of live component instances.
pub struct Registry {
    kinds: RefCell<KindMap>,
    config: KitConfig,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds = self.kinds.borrow();
        let mut counts: Vec<(&String, usize)> = kinds.iter().map(|(k, v)| (k, v.len())).collect();
        counts.sort();
        f.debug_struct("Registry")
            .field("kinds", &counts)
            .field("config", &self.config)
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new(config: KitConfig) -> Rc<Self> {
        Rc::new(Self {
            kinds: RefCell::new(HashMap::new()),
            config,
        })
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    fn unknown_kind(kind: &str) -> RegistryError {
        warn!(kind, "component kind does not exist");
        RegistryError::UnknownKind { kind: kind.to_string() }
    }

    fn unknown_instance(kind: &str, id: &str) -> RegistryError {
        error!(kind, id, "instance does not exist");
        RegistryError::UnknownInstance {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Look up the instance at `(kind, id)` without holding the borrow.
    fn lookup(&self, kind: &str, id: &str) -> Result<Rc<dyn Component>, RegistryError> {
        let kinds = self.kinds.borrow();
        let Some(instances) = kinds.get(kind) else {
            return Err(Self::unknown_kind(kind));
        };
        instances
            .get(id)
            .cloned()
            .ok_or_else(|| Self::unknown_instance(kind, id))
    }

    // =========================================================================
    // Kinds
    // =========================================================================

    /// Create an empty instance map for `kind`.
    ///
    /// Fails with `KindExists` if the kind is already registered; existing
    /// instances are left untouched.
    pub fn register(&self, kind: &str) -> Result<(), RegistryError> {
        let mut kinds = self.kinds.borrow_mut();
        if kinds.contains_key(kind) {
            warn!(kind, "component kind is already registered");
            return Err(RegistryError::KindExists { kind: kind.to_string() });
        }
        kinds.insert(kind.to_string(), HashMap::new());
        debug!(kind, "component kind registered");
        Ok(())
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.borrow().contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.kinds.borrow().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Number of instances under `kind` (0 for unknown kinds).
    pub fn len(&self, kind: &str) -> usize {
        self.kinds.borrow().get(kind).map_or(0, HashMap::len)
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Store `instance` under `(kind, id)`.
    ///
    /// With no `id`, a random one is generated (failing with `IdsExhausted`
    /// if no free one turns up). If the slot is taken and
    /// `override_existing` is false, fails with `Duplicate` and the stored
    /// instance is unchanged. With override, the previous instance's
    /// `destroy_and_remove` runs before the new one is stored, so its
    /// listeners never outlive it.
    ///
    /// Returns the id the instance was stored under.
    pub fn add(
        &self,
        kind: &str,
        instance: Rc<dyn Component>,
        id: Option<&str>,
        override_existing: bool,
    ) -> Result<String, RegistryError> {
        let (id, prior) = {
            let kinds = self.kinds.borrow();
            let Some(instances) = kinds.get(kind) else {
                return Err(Self::unknown_kind(kind));
            };
            let id = match id {
                Some(id) => id.to_string(),
                None => self.free_id(kind, instances)?,
            };
            let prior = instances.get(&id).cloned();
            (id, prior)
        };

        if let Some(prior) = prior {
            if !override_existing {
                warn!(kind, id = %id, "instance already exists");
                return Err(RegistryError::Duplicate {
                    kind: kind.to_string(),
                    id,
                });
            }
            debug!(kind, id = %id, "overriding instance");
            // No borrow is held here: the old instance usually calls back
            // into `remove`.
            prior.destroy_and_remove();
        }

        let replaced = self
            .kinds
            .borrow_mut()
            .get_mut(kind)
            .and_then(|instances| instances.insert(id.clone(), instance));
        drop(replaced);
        debug!(kind, id = %id, "instance added");
        Ok(id)
    }

    /// A random id not yet used under `kind`. Gives up after
    /// [`MAX_ID_ATTEMPTS`] collisions.
    fn free_id(&self, kind: &str, instances: &InstanceMap) -> Result<String, RegistryError> {
        let length = self.config.effective_id_length();
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = generate_id(length);
            if !instances.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        error!(kind, length, "could not generate a free instance id");
        Err(RegistryError::IdsExhausted {
            kind: kind.to_string(),
            length,
        })
    }

    /// The instance at `(kind, id)`.
    pub fn get(&self, kind: &str, id: &str) -> Result<Rc<dyn Component>, RegistryError> {
        self.lookup(kind, id)
    }

    /// Snapshot of every instance under `kind`.
    pub fn get_many(&self, kind: &str) -> Result<InstanceMap, RegistryError> {
        self.kinds
            .borrow()
            .get(kind)
            .cloned()
            .ok_or_else(|| Self::unknown_kind(kind))
    }

    /// Replace the instance at an existing `(kind, id)`.
    ///
    /// Strictly an update: fails if the kind or the id is absent. The old
    /// instance is not destroyed.
    pub fn set(
        &self,
        kind: &str,
        instance: Rc<dyn Component>,
        id: &str,
    ) -> Result<(), RegistryError> {
        let previous = {
            let mut kinds = self.kinds.borrow_mut();
            let Some(instances) = kinds.get_mut(kind) else {
                return Err(Self::unknown_kind(kind));
            };
            let Some(slot) = instances.get_mut(id) else {
                return Err(Self::unknown_instance(kind, id));
            };
            std::mem::replace(slot, instance)
        };
        drop(previous);
        debug!(kind, id, "instance updated");
        Ok(())
    }

    /// Membership check. No logging, no side effects.
    pub fn has(&self, kind: &str, id: &str) -> bool {
        self.kinds
            .borrow()
            .get(kind)
            .is_some_and(|instances| instances.contains_key(id))
    }

    /// Drop the bookkeeping entry. Does not call `destroy`.
    pub fn remove(&self, kind: &str, id: &str) -> Result<(), RegistryError> {
        // Taken out of the map first so the instance is dropped after the
        // borrow ends (its Drop may touch the registry).
        let removed = {
            let mut kinds = self.kinds.borrow_mut();
            let Some(instances) = kinds.get_mut(kind) else {
                return Err(Self::unknown_kind(kind));
            };
            instances.remove(id)
        };
        match removed {
            Some(_) => {
                debug!(kind, id, "instance removed");
                Ok(())
            }
            None => Err(Self::unknown_instance(kind, id)),
        }
    }

    /// Run the instance's own `destroy`. The entry stays registered.
    pub fn destroy(&self, kind: &str, id: &str) -> Result<(), RegistryError> {
        let instance = self.lookup(kind, id)?;
        instance.destroy();
        debug!(kind, id, "instance destroyed");
        Ok(())
    }

    /// `destroy` then `remove`.
    ///
    /// Always returns `true`, even when either step failed (unknown kind or
    /// id). The individual failures are still logged.
    pub fn destroy_and_remove(&self, kind: &str, id: &str) -> bool {
        let _ = self.destroy(kind, id);
        let _ = self.remove(kind, id);
        true
    }

    /// Snapshot of the whole kind → id → instance structure.
    pub fn all(&self) -> KindMap {
        self.kinds.borrow().clone()
    }

    /// Log registered kinds and their instance ids. Returns how many
    /// instances were reported.
    pub fn debug(&self, kind: Option<&str>) -> usize {
        if let Some(kind) = kind {
            if !self.has_kind(kind) {
                let _ = Self::unknown_kind(kind);
                return 0;
            }
        }

        let kinds = self.kinds.borrow();
        let mut names: Vec<&String> = kinds
            .keys()
            .filter(|name| kind.is_none_or(|wanted| name.as_str() == wanted))
            .collect();
        names.sort();

        let mut reported = 0;
        for name in names {
            let mut ids: Vec<&String> = kinds[name].keys().collect();
            ids.sort();
            reported += ids.len();
            info!(kind = %name, count = ids.len(), ids = ?ids, "registry contents");
        }
        reported
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::Tally;
    use crate::config::MIN_ID_LENGTH;

    fn setup() -> Rc<Registry> {
        Registry::new(KitConfig::default())
    }

    #[test]
    fn test_add_requires_registered_kind() {
        let registry = setup();
        let tally = Tally::new(&registry, "Toast", "t1");

        let err = registry.add("Toast", tally, Some("t1"), false).unwrap_err();
        assert_eq!(err, RegistryError::UnknownKind { kind: "Toast".into() });
        assert!(!registry.has_kind("Toast"));
        assert!(registry.get_many("Toast").is_err());
    }

    #[test]
    fn test_register_twice_keeps_instances() {
        let registry = setup();
        assert!(registry.register("Toast").is_ok());
        registry.add("Toast", Tally::new(&registry, "Toast", "t1"), Some("t1"), false).unwrap();

        let err = registry.register("Toast").unwrap_err();
        assert_eq!(err, RegistryError::KindExists { kind: "Toast".into() });
        assert!(registry.has("Toast", "t1"));
    }

    #[test]
    fn test_duplicate_without_override() {
        let registry = setup();
        registry.register("Modal").unwrap();
        let first = Tally::new(&registry, "Modal", "m");
        let second = Tally::new(&registry, "Modal", "m");

        registry.add("Modal", first.clone(), Some("m"), false).unwrap();
        let err = registry.add("Modal", second.clone(), Some("m"), false).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));

        let stored = registry.get("Modal", "m").unwrap();
        assert!(Rc::ptr_eq(&stored, &(first.clone() as Rc<dyn Component>)));
        assert_eq!(first.destroyed(), 0);
    }

    #[test]
    fn test_override_destroys_previous() {
        let registry = setup();
        registry.register("Modal").unwrap();
        let first = Tally::new(&registry, "Modal", "m");
        let second = Tally::new(&registry, "Modal", "m");

        registry.add("Modal", first.clone(), Some("m"), false).unwrap();
        registry.add("Modal", second.clone(), Some("m"), true).unwrap();

        assert_eq!(first.destroyed(), 1);
        assert_eq!(first.removed(), 1);
        let stored = registry.get("Modal", "m").unwrap();
        assert!(Rc::ptr_eq(&stored, &(second.clone() as Rc<dyn Component>)));
        assert_eq!(registry.len("Modal"), 1);
    }

    #[test]
    fn test_generated_id() {
        let registry = setup();
        registry.register("Tooltip").unwrap();
        let id = registry
            .add("Tooltip", Tally::new(&registry, "Tooltip", "ignored"), None, false)
            .unwrap();
        assert_eq!(id.len(), registry.config().id_length);
        assert!(registry.has("Tooltip", &id));
    }

    #[test]
    fn test_get_misses() {
        let registry = setup();
        assert!(matches!(registry.get("Nope", "x"), Err(RegistryError::UnknownKind { .. })));
        registry.register("Drawer").unwrap();
        assert!(matches!(
            registry.get("Drawer", "x"),
            Err(RegistryError::UnknownInstance { .. })
        ));
    }

    #[test]
    fn test_set_is_update_only() {
        let registry = setup();
        registry.register("Drawer").unwrap();
        let a = Tally::new(&registry, "Drawer", "d");
        let b = Tally::new(&registry, "Drawer", "d");

        assert!(matches!(
            registry.set("Drawer", b.clone(), "d"),
            Err(RegistryError::UnknownInstance { .. })
        ));
        assert!(!registry.has("Drawer", "d"));
        assert!(matches!(
            registry.set("Nope", b.clone(), "d"),
            Err(RegistryError::UnknownKind { .. })
        ));

        registry.add("Drawer", a.clone(), Some("d"), false).unwrap();
        registry.set("Drawer", b.clone(), "d").unwrap();
        let stored = registry.get("Drawer", "d").unwrap();
        assert!(Rc::ptr_eq(&stored, &(b.clone() as Rc<dyn Component>)));
        // Update never destroys the replaced instance.
        assert_eq!(a.destroyed(), 0);
    }

    #[test]
    fn test_remove_then_has_and_destroy() {
        let registry = setup();
        registry.register("Toast").unwrap();
        let tally = Tally::new(&registry, "Toast", "t");
        registry.add("Toast", tally.clone(), Some("t"), false).unwrap();

        registry.remove("Toast", "t").unwrap();
        assert!(!registry.has("Toast", "t"));
        // Removal is bookkeeping only.
        assert_eq!(tally.destroyed(), 0);
        assert!(registry.destroy("Toast", "t").is_err());
        assert!(registry.remove("Toast", "t").is_err());
    }

    #[test]
    fn test_destroy_keeps_entry() {
        let registry = setup();
        registry.register("Toast").unwrap();
        let tally = Tally::new(&registry, "Toast", "t");
        registry.add("Toast", tally.clone(), Some("t"), false).unwrap();

        registry.destroy("Toast", "t").unwrap();
        assert_eq!(tally.destroyed(), 1);
        assert!(registry.has("Toast", "t"));
    }

    #[test]
    fn test_destroy_and_remove_is_lenient() {
        let registry = setup();

        // Returns true even though both steps fail: the kind does not exist.
        assert!(registry.destroy_and_remove("Ghost", "nobody"));

        registry.register("Toast").unwrap();
        // Known kind, missing id: still true.
        assert!(registry.destroy_and_remove("Toast", "nobody"));

        let tally = Tally::new(&registry, "Toast", "t");
        registry.add("Toast", tally.clone(), Some("t"), false).unwrap();
        assert!(registry.destroy_and_remove("Toast", "t"));
        assert_eq!(tally.destroyed(), 1);
        assert!(!registry.has("Toast", "t"));
    }

    #[test]
    fn test_ids_are_scoped_per_kind() {
        let registry = setup();
        registry.register("Modal").unwrap();
        registry.register("Drawer").unwrap();
        registry.add("Modal", Tally::new(&registry, "Modal", "x"), Some("x"), false).unwrap();
        registry.add("Drawer", Tally::new(&registry, "Drawer", "x"), Some("x"), false).unwrap();

        assert!(registry.has("Modal", "x"));
        assert!(registry.has("Drawer", "x"));
    }

    #[test]
    fn test_all_and_debug() {
        let registry = setup();
        registry.register("Modal").unwrap();
        registry.register("Toast").unwrap();
        registry.add("Toast", Tally::new(&registry, "Toast", "a"), Some("a"), false).unwrap();
        registry.add("Toast", Tally::new(&registry, "Toast", "b"), Some("b"), false).unwrap();

        let all = registry.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["Toast"].len(), 2);
        assert!(all["Modal"].is_empty());
        assert_eq!(registry.kinds(), vec!["Modal", "Toast"]);

        assert_eq!(registry.debug(None), 2);
        assert_eq!(registry.debug(Some("Modal")), 0);
        assert_eq!(registry.debug(Some("Nope")), 0);

        // Snapshot: mutating the registry afterwards does not change it.
        registry.remove("Toast", "a").unwrap();
        assert_eq!(all["Toast"].len(), 2);
    }

    #[test]
    fn test_short_id_length_still_generates_free_ids() {
        let config = KitConfig { id_length: 0, ..KitConfig::default() };
        let registry = Registry::new(config);
        registry.register("Toast").unwrap();

        let mut ids = Vec::new();
        for n in 0..20 {
            let tally = Tally::new(&registry, "Toast", &format!("t{n}"));
            ids.push(registry.add("Toast", tally, None, false).unwrap());
        }

        assert!(ids.iter().all(|id| id.len() == MIN_ID_LENGTH));
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(registry.len("Toast"), 20);
    }

    #[test]
    fn test_ids_exhausted_is_not_kind_level() {
        let err = RegistryError::IdsExhausted { kind: "Toast".into(), length: 4 };
        assert!(!err.is_kind_level());
        assert_eq!(err.to_string(), "no free id of length 4 for kind `Toast`");
    }
}
