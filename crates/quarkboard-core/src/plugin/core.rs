use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;

use super::config::{Directories, PluginConfig};
use super::context::PluginContext;
use crate::document::{Document, Window};
use crate::error::BoxError;
use crate::host::Host;

// ─── AsAny ────────────────────────────────────────────────────────────────────

/// Upcast to `Any` for downcasting trait objects.
///
/// Implemented for every `'static` type; call it on `&dyn Plugin`, not on a
/// `Box<dyn Plugin>`, or the box itself is what gets upcast.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ─── PluginKind ───────────────────────────────────────────────────────────────

/// Nominal identity of a concrete plugin type.
///
/// Two kinds are equal iff they were taken from the same Rust type. The type
/// name is carried for logs only and never takes part in comparison.
#[derive(Clone, Copy)]
pub struct PluginKind {
    id: TypeId,
    type_name: &'static str,
}

impl PluginKind {
    /// The kind of `P`.
    pub fn of<P: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            type_name: std::any::type_name::<P>(),
        }
    }

    /// Fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        let start = base.rfind("::").map_or(0, |i| i + 2);
        &self.type_name[start..]
    }
}

impl PartialEq for PluginKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PluginKind {}

impl Hash for PluginKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PluginKind").field(&self.type_name).finish()
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// ─── PluginIdentity ───────────────────────────────────────────────────────────

/// Nominal identity of a plugin's concrete type.
///
/// Implemented for every [`Plugin`] by a blanket impl. A plugin cannot
/// provide its own, so two plugins compare equal only when they really are
/// the same type.
pub trait PluginIdentity {
    fn kind(&self) -> PluginKind;

    /// Whether `other` is an instance of the same concrete plugin type.
    fn is(&self, other: &dyn Plugin) -> bool;
}

impl<T: Plugin> PluginIdentity for T {
    fn kind(&self) -> PluginKind {
        PluginKind::of::<T>()
    }

    fn is(&self, other: &dyn Plugin) -> bool {
        self.kind() == other.kind()
    }
}

// ─── Plugin ───────────────────────────────────────────────────────────────────

/// The contract every Quarkboard plugin implements.
///
/// Only [`context`](Plugin::context) is required. Lifecycle hooks default to
/// no-ops and contribution methods default to contributing nothing.
///
/// Hooks are not called directly by the host; it goes through
/// [`PluginInstance`](super::PluginInstance), which enforces ordering.
///
/// # Example
///
/// ```rust,ignore
/// struct Analytics {
///     ctx: PluginContext,
/// }
///
/// impl Plugin for Analytics {
///     fn context(&self) -> &PluginContext {
///         &self.ctx
///     }
///
///     fn load(&mut self) -> Result<(), BoxError> {
///         self.ctx.on("page:view", |args| tracing::info!(?args, "page view"));
///         Ok(())
///     }
///
///     fn scripts(&self) -> Vec<String> {
///         vec!["analytics.js".into()]
///     }
/// }
/// ```
pub trait Plugin: AsAny + PluginIdentity + Send + Sync {
    /// The base state embedded in the concrete plugin.
    fn context(&self) -> &PluginContext;

    /// Called once, as the last step of construction.
    ///
    /// `app`, `config` and `enabled` are already assigned. Other plugins may
    /// not have been constructed yet.
    fn init(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once after every plugin finished `init`.
    fn load(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Injects markup into the document being compiled.
    ///
    /// May run zero or many times, interleaved with other plugins.
    fn html(&self, _document: &mut Document, _window: &mut Window) {}

    /// Script references, in load order.
    fn scripts(&self) -> Vec<String> {
        Vec::new()
    }

    /// Stylesheet references, in load order.
    fn styles(&self) -> Vec<String> {
        Vec::new()
    }

    /// Terminal hook. Listeners registered through the context are removed
    /// right after this returns.
    fn unload(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn app(&self) -> &Arc<dyn Host> {
        self.context().app()
    }

    fn config(&self) -> &PluginConfig {
        self.context().config()
    }

    fn name(&self) -> &str {
        self.context().name()
    }

    fn enabled(&self) -> bool {
        self.context().enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.context().set_enabled(enabled);
    }

    fn directories(&self) -> Directories {
        self.context().directories()
    }

    /// Forwards to the host bus. Returns `self` for chaining.
    fn emit(&self, event: &str, args: &[Value]) -> &Self
    where
        Self: Sized,
    {
        self.context().emit(event, args);
        self
    }

    /// Registers a tracked listener on the host bus. Returns `self` for chaining.
    fn on<F>(&self, event: &str, listener: F) -> &Self
    where
        Self: Sized,
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.context().on(event, listener);
        self
    }

    /// Registers a tracked one-shot listener on the host bus. Returns `self`
    /// for chaining.
    fn once<F>(&self, event: &str, listener: F) -> &Self
    where
        Self: Sized,
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.context().once(event, listener);
        self
    }
}

/// Constructs a concrete plugin from its context.
///
/// Keep `create` to field assignment; setup belongs in [`Plugin::init`].
pub trait PluginFactory: Plugin + Sized {
    fn create(context: PluginContext) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Clock {
        ctx: PluginContext,
    }

    impl Plugin for Clock {
        fn context(&self) -> &PluginContext {
            &self.ctx
        }
    }

    // Same shape as `Clock`, different type.
    struct Calendar {
        ctx: PluginContext,
    }

    impl Plugin for Calendar {
        fn context(&self) -> &PluginContext {
            &self.ctx
        }
    }

    fn context(name: &str, host: &Arc<TestHost>) -> PluginContext {
        PluginContext::new(PluginConfig::new(name, "/srv"), host.clone())
    }

    #[test]
    fn test_defaults_contribute_nothing() {
        let host = Arc::new(TestHost::default());
        let clock = Clock {
            ctx: context("clock", &host),
        };

        assert!(clock.scripts().is_empty());
        assert!(clock.styles().is_empty());
        assert_eq!(clock.scripts(), clock.scripts());

        let mut document = Document::new();
        let mut window = Window::new();
        clock.html(&mut document, &mut window);
        assert!(document.is_empty());
        assert!(window.globals().is_empty());
    }

    #[test]
    fn test_is_compares_concrete_types() {
        let host = Arc::new(TestHost::default());
        let a = Clock {
            ctx: context("a", &host),
        };
        let b = Clock {
            ctx: context("b", &host),
        };
        let c = Calendar {
            ctx: context("a", &host),
        };

        assert!(a.is(&b));
        assert!(b.is(&a));
        assert!(!a.is(&c));
        assert!(!c.is(&a));

        let boxed: Box<dyn Plugin> = Box::new(b);
        assert!(a.is(boxed.as_ref()));
        assert_eq!(boxed.kind(), PluginKind::of::<Clock>());
    }

    #[test]
    fn test_kind_follows_concrete_type_through_trait_objects() {
        let host = Arc::new(TestHost::default());
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(Clock {
                ctx: context("clock", &host),
            }),
            Box::new(Calendar {
                ctx: context("calendar", &host),
            }),
        ];

        let kinds: Vec<_> = plugins.iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            [PluginKind::of::<Clock>(), PluginKind::of::<Calendar>()]
        );
        assert!(!plugins[0].is(plugins[1].as_ref()));
        assert!(plugins[1].is(plugins[1].as_ref()));

        // The kind matches what a downcast would see.
        let calendar: &dyn Plugin = plugins[1].as_ref();
        assert!(calendar.as_any().downcast_ref::<Calendar>().is_some());
        assert_ne!(calendar.kind(), PluginKind::of::<Clock>());
    }

    #[test]
    fn test_kind_display_uses_short_name() {
        assert_eq!(PluginKind::of::<Clock>().to_string(), "Clock");
        assert!(PluginKind::of::<Clock>().type_name().ends_with("::Clock"));
    }

    #[test]
    fn test_chained_delegation() {
        let host = Arc::new(TestHost::default());
        let clock = Clock {
            ctx: context("clock", &host),
        };
        let counter = Arc::new(AtomicUsize::new(0));
        let c1 = Arc::clone(&counter);
        let c2 = Arc::clone(&counter);

        clock
            .on("tick", move |args| {
                c1.fetch_add(args.len(), Ordering::SeqCst);
            })
            .once("tick", move |_| {
                c2.fetch_add(100, Ordering::SeqCst);
            })
            .emit("tick", &[json!(1), json!(2)])
            .emit("tick", &[json!(3)]);

        assert_eq!(counter.load(Ordering::SeqCst), 103);
    }

    #[test]
    fn test_enabled_round_trips_through_trait() {
        let host = Arc::new(TestHost::default());
        let clock = Clock {
            ctx: context("clock", &host),
        };

        assert!(clock.enabled());
        clock.set_enabled(false);
        assert!(!clock.enabled());
        clock.set_enabled(true);
        assert!(clock.enabled());
        assert_eq!(clock.name(), "clock");
    }
}
