//! Toast demo - A dismissible notification built on spark-kit.
//!
//! Shows the pieces a widget combines:
//! - `ComponentBase` for id, options and the initialized flag
//! - `mount` to land in the registry
//! - `Orchestrator` for a delegated dismiss click
//! - `transition_lifecycle` to finish hiding after the fade-out
//!
//! Run with: `cargo run --example toast`

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use serde_json::json;
use spark_kit::{
    mount, options_from_dataset, transition_lifecycle, Component, ComponentBase, Document,
    Event, KitConfig, ListenerOptions, NodeId, Options, Orchestrator, Registry, RegistryError,
    Scope, TransitionHandle, TransitionHandlers,
};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToastOptions {
    auto_hide: bool,
    delay: u64,
}

struct Toast {
    base: ComponentBase,
    config: KitConfig,
    context: Orchestrator,
    fade: RefCell<Option<TransitionHandle>>,
}

impl Toast {
    fn new(registry: &Rc<Registry>, document: &Rc<Document>, element: NodeId) -> Self {
        let defaults = match json!({ "autoHide": true, "delay": 5000 }) {
            serde_json::Value::Object(map) => map,
            _ => Options::new(),
        };
        let overrides = options_from_dataset(document, element, "toast");
        let config = registry.config().clone();
        Self {
            base: ComponentBase::new(registry, document, "Toast", element, None, &defaults, &overrides),
            context: Orchestrator::new(document, config.clone()),
            config,
            fade: RefCell::new(None),
        }
    }
}

// Listeners live inside the document, so they only hold it weakly.
fn start_hide(document: &Weak<Document>, element: NodeId) {
    if let Some(document) = document.upgrade() {
        document.add_class(element, "hiding");
        info!(?element, "toast hiding");
    }
}

fn finish_hide(document: &Weak<Document>, element: NodeId) {
    if let Some(document) = document.upgrade() {
        document.remove_class(element, "hiding");
        document.add_class(element, "hidden");
        info!(?element, "toast hidden");
    }
}

impl Component for Toast {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn initialize(&self) -> anyhow::Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let options: ToastOptions = self.base.options_as()?;
        info!(id = %self.id(), auto_hide = options.auto_hide, delay = options.delay, "toast options");

        let element = self.element();
        let scope = Scope::Element(element);

        let document = Rc::downgrade(self.base.document());
        let remove = self.context.attach_delegate(
            scope,
            "click",
            move |_: &Event| {
                start_hide(&document, element);
                Ok(())
            },
            &ListenerOptions::new().delegate_to("[data-dismiss-target]")?,
        );
        self.context.push("dismiss", remove);

        let document = Rc::downgrade(self.base.document());
        let fade = transition_lifecycle(
            self.base.document(),
            self.config.clone(),
            scope,
            TransitionHandlers::new().on_end(move |_| {
                finish_hide(&document, element);
                Ok(())
            }),
            ListenerOptions::new().name("opacity"),
        );
        *self.fade.borrow_mut() = Some(fade);

        self.base.set_initialized(true);
        Ok(())
    }

    fn destroy(&self) {
        self.context.teardown(None);
        if let Some(fade) = self.fade.borrow_mut().take() {
            fade.teardown(None);
        }
        self.base.release_events();
        self.base.set_initialized(false);
    }

    fn remove(&self) -> Result<(), RegistryError> {
        self.base.unregister()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let registry = Registry::new(KitConfig::from_env()?);
    let document = Document::new();

    let element = document.create_element("div");
    document.set_attribute(element, "id", "welcome");
    document.set_attribute(element, "data-toast-delay", "1500");
    let close = document.create_element("button");
    document.set_attribute(close, "data-dismiss-target", "#welcome");
    document.append_child(document.body(), element);
    document.append_child(element, close);

    let toast = mount(&registry, Toast::new(&registry, &document, element), false)?;
    toast.initialize()?;
    registry.debug(None);

    document.dispatch(close, &Event::new("click"));
    // Another property finishing first is ignored.
    document.dispatch(element, &Event::transition("transitionend", "transform"));
    document.dispatch(element, &Event::transition("transitionend", "opacity"));
    info!(hidden = document.has_class(element, "hidden"), "after dismiss");

    registry.destroy_and_remove("Toast", toast.id());
    info!(
        listeners = document.listener_total(),
        registered = registry.has("Toast", "welcome"),
        "torn down"
    );
    Ok(())
}
