//! [`PluginInstance`]: a constructed plugin and its lifecycle state.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::config::PluginConfig;
use super::context::PluginContext;
use super::core::{Plugin, PluginFactory, PluginIdentity, PluginKind};
use super::descriptor::{PluginDescriptor, QUARKBOARD_PLUGIN_API_VERSION};
use crate::document::{Document, Window};
use crate::error::{Operation, PluginError, PluginResult};
use crate::host::Host;

/// Lifecycle state of a [`PluginInstance`].
///
/// ```text
/// construct() ──► Initialized
///      load() ──► Loaded | Failed
///    unload() ──► Unloaded
/// ```
///
/// `Created` is only observable from inside `init`, i.e. never by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// The plugin value exists but `init` has not returned yet.
    Created,
    /// `init` succeeded; waiting for `load`.
    Initialized,
    /// `load` succeeded; contribution methods are accepted.
    Loaded,
    /// `load` returned an error. Only `unload` is accepted.
    Failed,
    /// Terminal.
    Unloaded,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initialized => "initialized",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
            Self::Unloaded => "unloaded",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructed plugin, driven by the host through its lifecycle.
///
/// Every call is checked against the current [`LifecycleState`]; a call the
/// state does not allow returns [`PluginError::Lifecycle`] without reaching
/// the plugin.
pub struct PluginInstance {
    plugin: Box<dyn Plugin>,
    state: LifecycleState,
}

impl PluginInstance {
    /// Constructs the plugin described by `descriptor` and runs its `init`.
    ///
    /// When `init` fails the plugin is dropped, which also removes any
    /// listener it registered.
    pub fn construct(
        descriptor: &PluginDescriptor,
        config: PluginConfig,
        app: Arc<dyn Host>,
    ) -> PluginResult<Self> {
        let name = config.name().to_string();

        if !descriptor.is_compatible() {
            warn!(
                plugin = %name,
                descriptor_version = %format!(
                    "{}.{}",
                    descriptor.api_version >> 16,
                    descriptor.api_version & 0xFFFF
                ),
                host_version = %format!(
                    "{}.{}",
                    QUARKBOARD_PLUGIN_API_VERSION >> 16,
                    QUARKBOARD_PLUGIN_API_VERSION & 0xFFFF
                ),
                "Plugin API version mismatch"
            );
            return Err(PluginError::IncompatibleApi {
                plugin: name,
                version: descriptor.api_version,
            });
        }

        let context = PluginContext::new(config, app);
        let mut instance = Self {
            plugin: descriptor.instantiate(context),
            state: LifecycleState::Created,
        };

        instance.plugin.init().map_err(|source| {
            error!(plugin = %name, error = %source, "Plugin init failed");
            PluginError::hook(&name, Operation::Init, source)
        })?;
        instance.state = LifecycleState::Initialized;

        debug!(plugin = %name, kind = %descriptor.kind, "Plugin initialized");
        Ok(instance)
    }

    /// Shorthand for [`construct`](Self::construct) with
    /// [`PluginDescriptor::of::<P>()`](PluginDescriptor::of).
    pub fn new<P: PluginFactory>(config: PluginConfig, app: Arc<dyn Host>) -> PluginResult<Self> {
        Self::construct(&PluginDescriptor::of::<P>(), config, app)
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn kind(&self) -> PluginKind {
        self.plugin.kind()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.plugin.enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.plugin.set_enabled(enabled);
    }

    /// The plugin itself, for accessors and identity checks.
    pub fn plugin(&self) -> &dyn Plugin {
        &*self.plugin
    }

    /// Returns the concrete plugin if it is a `P`.
    pub fn downcast_ref<P: Plugin>(&self) -> Option<&P> {
        let plugin: &dyn Plugin = &*self.plugin;
        plugin.as_any().downcast_ref::<P>()
    }

    /// Returns the concrete plugin mutably if it is a `P`.
    pub fn downcast_mut<P: Plugin>(&mut self) -> Option<&mut P> {
        let plugin: &mut dyn Plugin = &mut *self.plugin;
        plugin.as_any_mut().downcast_mut::<P>()
    }

    // ─── Lifecycle ────────────────────────────────────────────────────────────

    /// Runs the plugin's `load` hook.
    ///
    /// On error the instance moves to [`LifecycleState::Failed`] and the
    /// hook's error is returned.
    pub fn load(&mut self) -> PluginResult<()> {
        self.check_state(Operation::Load, &[LifecycleState::Initialized])?;

        match self.plugin.load() {
            Ok(()) => {
                self.state = LifecycleState::Loaded;
                debug!(plugin = %self.name(), "Plugin loaded");
                Ok(())
            }
            Err(source) => {
                self.state = LifecycleState::Failed;
                error!(plugin = %self.name(), error = %source, "Plugin load failed");
                Err(PluginError::hook(self.name(), Operation::Load, source))
            }
        }
    }

    /// Lets the plugin inject markup.
    pub fn html(&self, document: &mut Document, window: &mut Window) -> PluginResult<()> {
        self.check_state(Operation::Html, &[LifecycleState::Loaded])?;
        self.plugin.html(document, window);
        Ok(())
    }

    pub fn scripts(&self) -> PluginResult<Vec<String>> {
        self.check_state(Operation::Scripts, &[LifecycleState::Loaded])?;
        Ok(self.plugin.scripts())
    }

    pub fn styles(&self) -> PluginResult<Vec<String>> {
        self.check_state(Operation::Styles, &[LifecycleState::Loaded])?;
        Ok(self.plugin.styles())
    }

    /// Runs the plugin's `unload` hook, then removes every listener it
    /// registered through its context.
    ///
    /// The instance is [`LifecycleState::Unloaded`] afterwards even when the
    /// hook fails.
    pub fn unload(&mut self) -> PluginResult<()> {
        self.check_state(
            Operation::Unload,
            &[LifecycleState::Loaded, LifecycleState::Failed],
        )?;

        let result = self.plugin.unload();
        self.state = LifecycleState::Unloaded;
        let released = self.plugin.context().release_listeners();
        debug!(plugin = %self.name(), released, "Plugin unloaded");

        result.map_err(|source| {
            error!(plugin = %self.name(), error = %source, "Plugin unload failed");
            PluginError::hook(self.name(), Operation::Unload, source)
        })
    }

    fn check_state(&self, operation: Operation, allowed: &[LifecycleState]) -> PluginResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            warn!(
                plugin = %self.name(),
                operation = %operation,
                state = %self.state,
                "Rejected out-of-order plugin call"
            );
            Err(PluginError::lifecycle(self.name(), operation, self.state))
        }
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("state", &self.state)
            .field("enabled", &self.enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::testing::TestHost;
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records every hook call into a journal shared through the host bus.
    struct Recorder {
        ctx: PluginContext,
        journal: Journal,
        fail_load: bool,
    }

    impl PluginFactory for Recorder {
        fn create(ctx: PluginContext) -> Self {
            let fail_load = ctx.config().settings()["fail_load"].as_bool().unwrap_or(false);
            Self {
                ctx,
                journal: Arc::new(Mutex::new(Vec::new())),
                fail_load,
            }
        }
    }

    impl Plugin for Recorder {
        fn context(&self) -> &PluginContext {
            &self.ctx
        }

        fn init(&mut self) -> Result<(), BoxError> {
            self.journal.lock().push("init".into());
            let journal = Arc::clone(&self.journal);
            self.ctx.on("ping", move |_| journal.lock().push("ping".into()));
            Ok(())
        }

        fn load(&mut self) -> Result<(), BoxError> {
            self.journal.lock().push("load".into());
            if self.fail_load {
                return Err("boom".into());
            }
            Ok(())
        }

        fn html(&self, document: &mut Document, window: &mut Window) {
            document.append_body(format!("<div id=\"{}\"></div>", self.name()));
            window.set(self.name(), json!(true));
        }

        fn scripts(&self) -> Vec<String> {
            vec!["recorder.js".into()]
        }

        fn unload(&mut self) -> Result<(), BoxError> {
            self.journal.lock().push("unload".into());
            Ok(())
        }
    }

    struct FailsInit {
        ctx: PluginContext,
    }

    impl PluginFactory for FailsInit {
        fn create(ctx: PluginContext) -> Self {
            Self { ctx }
        }
    }

    impl Plugin for FailsInit {
        fn context(&self) -> &PluginContext {
            &self.ctx
        }

        fn init(&mut self) -> Result<(), BoxError> {
            self.ctx.on("ping", |_| {});
            Err("bad config".into())
        }
    }

    fn journal(instance: &PluginInstance) -> Vec<String> {
        instance
            .downcast_ref::<Recorder>()
            .map(|r| r.journal.lock().clone())
            .unwrap_or_default()
    }

    fn recorder(host: &Arc<TestHost>, settings: Value) -> PluginInstance {
        PluginInstance::new::<Recorder>(
            PluginConfig::new("recorder", "/srv/recorder").with_settings(settings),
            host.clone(),
        )
        .unwrap()
    }

    #[test]
    fn test_init_runs_during_construction() {
        let host = Arc::new(TestHost::default());
        let instance = recorder(&host, Value::Null);

        assert_eq!(instance.state(), LifecycleState::Initialized);
        assert_eq!(journal(&instance), ["init"]);
        assert!(instance.enabled());
    }

    #[test]
    fn test_full_lifecycle() {
        let host = Arc::new(TestHost::default());
        let mut instance = recorder(&host, Value::Null);

        instance.load().unwrap();
        assert_eq!(instance.state(), LifecycleState::Loaded);

        let mut document = Document::new();
        let mut window = Window::new();
        instance.html(&mut document, &mut window).unwrap();
        instance.html(&mut document, &mut window).unwrap();
        assert_eq!(document.body().len(), 2);
        assert_eq!(window.get("recorder"), Some(&json!(true)));
        assert_eq!(instance.scripts().unwrap(), instance.scripts().unwrap());
        assert!(instance.styles().unwrap().is_empty());

        host.bus.emit("ping", &[]);
        instance.unload().unwrap();
        assert_eq!(instance.state(), LifecycleState::Unloaded);
        assert_eq!(journal(&instance), ["init", "load", "ping", "unload"]);
    }

    #[test]
    fn test_out_of_order_calls_are_rejected() {
        let host = Arc::new(TestHost::default());
        let mut instance = recorder(&host, Value::Null);

        assert!(matches!(
            instance.unload(),
            Err(PluginError::Lifecycle {
                operation: Operation::Unload,
                state: LifecycleState::Initialized,
                ..
            })
        ));
        assert!(matches!(
            instance.scripts(),
            Err(PluginError::Lifecycle { operation: Operation::Scripts, .. })
        ));

        instance.load().unwrap();
        assert!(matches!(
            instance.load(),
            Err(PluginError::Lifecycle { operation: Operation::Load, .. })
        ));

        instance.unload().unwrap();
        assert!(matches!(
            instance.unload(),
            Err(PluginError::Lifecycle {
                state: LifecycleState::Unloaded,
                ..
            })
        ));
        assert!(instance.html(&mut Document::new(), &mut Window::new()).is_err());
        assert_eq!(journal(&instance), ["init", "load", "unload"]);
    }

    #[test]
    fn test_failed_load_can_still_unload() {
        let host = Arc::new(TestHost::default());
        let mut instance = recorder(&host, json!({ "fail_load": true }));

        let err = instance.load().unwrap_err();
        assert!(matches!(err, PluginError::Hook { stage: Operation::Load, .. }));
        assert_eq!(instance.state(), LifecycleState::Failed);
        assert!(instance.scripts().is_err());

        instance.unload().unwrap();
        assert_eq!(host.bus.listener_count("ping"), 0);
    }

    #[test]
    fn test_unload_releases_listeners() {
        let host = Arc::new(TestHost::default());
        let mut instance = recorder(&host, Value::Null);
        host.bus.on("ping", |_| {});
        assert_eq!(host.bus.listener_count("ping"), 2);

        instance.load().unwrap();
        instance.unload().unwrap();
        assert_eq!(host.bus.listener_count("ping"), 1);
    }

    #[test]
    fn test_failed_init_propagates_and_cleans_up() {
        let host = Arc::new(TestHost::default());
        let result = PluginInstance::new::<FailsInit>(
            PluginConfig::new("broken", "/srv/broken"),
            host.clone(),
        );

        assert!(matches!(
            result,
            Err(PluginError::Hook { stage: Operation::Init, .. })
        ));
        assert_eq!(host.bus.listener_count("ping"), 0);
    }

    #[test]
    fn test_incompatible_descriptor_is_rejected() {
        let host = Arc::new(TestHost::default());
        let mut desc = PluginDescriptor::of::<Recorder>();
        desc.api_version = 0x0002_0000;

        let result = PluginInstance::construct(
            &desc,
            PluginConfig::new("recorder", "/srv/recorder"),
            host.clone(),
        );
        assert!(matches!(result, Err(PluginError::IncompatibleApi { .. })));
    }

    #[test]
    fn test_identity_through_instances() {
        let host = Arc::new(TestHost::default());
        let a = recorder(&host, Value::Null);
        let b = recorder(&host, Value::Null);
        let c = PluginInstance::new::<FailsInit>(PluginConfig::new("x", "/x"), host.clone());

        assert!(a.plugin().is(b.plugin()));
        assert_eq!(a.kind(), PluginKind::of::<Recorder>());
        assert!(c.is_err());
        assert!(a.downcast_ref::<FailsInit>().is_none());
    }
}
