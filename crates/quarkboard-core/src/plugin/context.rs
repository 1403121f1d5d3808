//! [`PluginContext`], the base state embedded in every plugin.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use super::config::{Directories, PluginConfig};
use crate::event::{Listener, ListenerId};
use crate::host::Host;

struct Registration {
    event: String,
    id: ListenerId,
}

/// Base state shared by every plugin: its host, its configuration, the
/// `enabled` flag, and the listeners it registered on the host bus.
///
/// The `app` and `config` bindings never change after construction.
/// `enabled` is advisory and may be flipped by anyone at any time; the
/// last write wins.
///
/// Listeners registered through [`on`](Self::on) / [`once`](Self::once) are
/// remembered and removed from the host bus when the plugin is unloaded, or
/// when the context is dropped.
pub struct PluginContext {
    app: Arc<dyn Host>,
    config: Arc<PluginConfig>,
    enabled: AtomicBool,
    registrations: Arc<Mutex<Vec<Registration>>>,
}

impl PluginContext {
    /// Creates the context for a plugin about to be constructed.
    pub fn new(config: impl Into<Arc<PluginConfig>>, app: Arc<dyn Host>) -> Self {
        Self {
            app,
            config: config.into(),
            enabled: AtomicBool::new(true),
            registrations: Arc::default(),
        }
    }

    pub fn app(&self) -> &Arc<dyn Host> {
        &self.app
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// The configured plugin name.
    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// See [`PluginConfig::directories`].
    pub fn directories(&self) -> Directories {
        self.config.directories()
    }

    /// Value of a command-line option given to the host.
    pub fn opt(&self, option: &str) -> Option<Value> {
        self.app.opt(option)
    }

    /// Whether a command-line option was given to the host.
    pub fn has_opt(&self, option: &str) -> bool {
        self.app.has_opt(option)
    }

    // ─── Event delegation ─────────────────────────────────────────────────────

    /// Emits `event` on the host bus. Every listener has run when this returns.
    pub fn emit(&self, event: &str, args: &[Value]) -> &Self {
        self.app.emit(event, args);
        self
    }

    /// Registers a listener on the host bus. Returns `self` for chaining.
    pub fn on<F>(&self, event: &str, listener: F) -> &Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.subscribe(event, listener);
        self
    }

    /// Registers a one-shot listener on the host bus. Returns `self` for
    /// chaining.
    pub fn once<F>(&self, event: &str, listener: F) -> &Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.subscribe_once(event, listener);
        self
    }

    /// Like [`on`](Self::on), but returns the registration handle.
    pub fn subscribe<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let id = self.app.on(event, Arc::new(listener) as Listener);
        self.track(event, id);
        id
    }

    /// Like [`once`](Self::once), but returns the registration handle.
    ///
    /// The registration forgets itself when the listener fires.
    pub fn subscribe_once<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let registrations: Weak<Mutex<Vec<Registration>>> = Arc::downgrade(&self.registrations);
        let own_id: Arc<OnceLock<ListenerId>> = Arc::default();
        let slot = Arc::clone(&own_id);
        let wrapper = move |args: &[Value]| {
            if let (Some(registrations), Some(id)) = (registrations.upgrade(), slot.get()) {
                registrations.lock().retain(|r| r.id != *id);
            }
            listener(args);
        };

        // Held across registration so a concurrent emit cannot prune before
        // the entry exists.
        let mut tracked = self.registrations.lock();
        let id = self.app.once(event, Arc::new(wrapper) as Listener);
        let _ = own_id.set(id);
        trace!(plugin = %self.name(), event, "Tracking one-shot listener");
        tracked.push(Registration {
            event: event.to_string(),
            id,
        });
        id
    }

    /// Removes a listener this context registered.
    ///
    /// Returns `false` when the handle is unknown to this context or the
    /// listener is already gone from the bus.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut registrations = self.registrations.lock();
        let Some(pos) = registrations
            .iter()
            .position(|r| r.id == id && r.event == event)
        else {
            return false;
        };
        registrations.remove(pos);
        drop(registrations);
        self.app.off(event, id)
    }

    /// Number of registrations tracked by this context.
    pub fn tracked_listeners(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Removes every tracked listener from the host bus.
    ///
    /// Returns how many were still registered. One-shot listeners that
    /// already fired are not counted.
    pub(crate) fn release_listeners(&self) -> usize {
        let registrations = std::mem::take(&mut *self.registrations.lock());
        let released = registrations
            .iter()
            .filter(|r| self.app.off(&r.event, r.id))
            .count();
        if released > 0 {
            debug!(plugin = %self.name(), released, "Released plugin listeners");
        }
        released
    }

    fn track(&self, event: &str, id: ListenerId) {
        trace!(plugin = %self.name(), event, "Tracking listener");
        self.registrations.lock().push(Registration {
            event: event.to_string(),
            id,
        });
    }
}

impl Drop for PluginContext {
    fn drop(&mut self) {
        self.release_listeners();
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("config", &self.config)
            .field("enabled", &self.enabled())
            .field("tracked_listeners", &self.tracked_listeners())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn setup() -> (Arc<TestHost>, PluginContext) {
        let host = Arc::new(TestHost::default());
        let ctx = PluginContext::new(
            PluginConfig::new("clock", "/root").with_pjson(json!({
                "directories": { "js": "a", "css": "b", "images": "c" }
            })),
            host.clone(),
        );
        (host, ctx)
    }

    #[test]
    fn test_accessors() {
        let (_host, ctx) = setup();
        assert_eq!(ctx.name(), "clock");
        assert!(ctx.enabled());
        assert_eq!(ctx.directories().len(), 3);
        assert_eq!(ctx.config().root(), std::path::Path::new("/root"));
    }

    #[test]
    fn test_emit_reaches_direct_and_plugin_listeners_in_order() {
        let (host, ctx) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        host.bus.on("x", move |args| s.lock().push(("host", args.to_vec())));
        let s = Arc::clone(&seen);
        ctx.on("x", move |args| s.lock().push(("plugin", args.to_vec())));

        ctx.emit("x", &[json!(1), json!(2)]);

        assert_eq!(
            *seen.lock(),
            vec![
                ("host", vec![json!(1), json!(2)]),
                ("plugin", vec![json!(1), json!(2)]),
            ]
        );
    }

    #[test]
    fn test_once_invoked_exactly_once() {
        let (_host, ctx) = setup();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        ctx.once("x", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        ctx.emit("x", &[]).emit("x", &[]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_removes_tracked_listeners_only() {
        let (host, ctx) = setup();
        host.bus.on("x", |_| {});
        ctx.on("x", |_| {}).on("y", |_| {}).once("z", |_| {}).once("w", |_| {});
        ctx.emit("z", &[]);

        assert_eq!(ctx.tracked_listeners(), 3);
        assert_eq!(ctx.release_listeners(), 3);
        assert_eq!(ctx.tracked_listeners(), 0);
        assert_eq!(host.bus.listener_count("x"), 1);
        assert_eq!(host.bus.listener_count("y"), 0);
    }

    #[test]
    fn test_fired_once_listeners_are_forgotten() {
        let (host, ctx) = setup();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..1_000 {
            let c = Arc::clone(&counter);
            ctx.once("tick", move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .emit("tick", &[]);
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1_000);
        assert_eq!(host.bus.listener_count("tick"), 0);
        assert_eq!(ctx.tracked_listeners(), 0);

        // A pending one-shot stays tracked until it fires.
        let id = ctx.subscribe_once("tick", |_| {});
        assert_eq!(ctx.tracked_listeners(), 1);
        ctx.emit("tick", &[]);
        assert_eq!(ctx.tracked_listeners(), 0);
        assert!(!ctx.off("tick", id));
    }

    #[test]
    fn test_drop_releases_listeners() {
        let (host, ctx) = setup();
        ctx.on("x", |_| {});
        assert_eq!(host.bus.listener_count("x"), 1);

        drop(ctx);
        assert_eq!(host.bus.listener_count("x"), 0);
    }

    #[test]
    fn test_off_only_accepts_own_registrations() {
        let (host, ctx) = setup();
        let foreign = host.bus.on("x", |_| {});
        let own = ctx.subscribe("x", |_| {});

        assert!(!ctx.off("x", foreign));
        assert!(ctx.off("x", own));
        assert!(!ctx.off("x", own));
        assert_eq!(host.bus.listener_count("x"), 1);
    }

    #[test]
    fn test_options_forward_to_host() {
        let mut host = TestHost::default();
        host.options.insert("verbose".into(), json!(true));
        let ctx = PluginContext::new(PluginConfig::new("clock", "/root"), Arc::new(host));

        assert_eq!(ctx.opt("verbose"), Some(json!(true)));
        assert!(ctx.has_opt("verbose"));
        assert!(!ctx.has_opt("quiet"));
    }
}
