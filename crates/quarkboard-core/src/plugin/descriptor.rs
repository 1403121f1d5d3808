//! Plugin descriptor: the static, `Copy` handle to a plugin type.

use super::context::PluginContext;
use super::core::{Plugin, PluginFactory, PluginKind};

// ─── API versioning ───────────────────────────────────────────────────────────

/// Current Quarkboard plugin API version (1.0).
pub const QUARKBOARD_PLUGIN_API_VERSION: u32 = 0x0001_0000;

// ─── PluginDescriptor ─────────────────────────────────────────────────────────

/// A static, `Copy` descriptor that identifies and instantiates a plugin type.
///
/// ```rust,ignore
/// let clock = PluginDescriptor::of::<Clock>();
/// let instance = PluginInstance::construct(&clock, config, host)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Plugin API version this descriptor was compiled against.
    pub api_version: u32,

    /// Identity of the concrete plugin type.
    pub kind: PluginKind,

    /// Factory that creates the plugin around its context.
    pub create: fn(PluginContext) -> Box<dyn Plugin>,
}

fn create_boxed<P: PluginFactory>(context: PluginContext) -> Box<dyn Plugin> {
    Box::new(P::create(context))
}

impl PluginDescriptor {
    /// Describes the plugin type `P`.
    pub fn of<P: PluginFactory>() -> Self {
        Self {
            api_version: QUARKBOARD_PLUGIN_API_VERSION,
            kind: PluginKind::of::<P>(),
            create: create_boxed::<P>,
        }
    }

    /// Returns `true` if this descriptor's API version is compatible with the
    /// running host.
    ///
    /// The major part must match exactly; the descriptor's minor part must be
    /// ≤ the host's minor part.
    pub fn is_compatible(&self) -> bool {
        let host_major = QUARKBOARD_PLUGIN_API_VERSION >> 16;
        let host_minor = QUARKBOARD_PLUGIN_API_VERSION & 0xFFFF;
        let desc_major = self.api_version >> 16;
        let desc_minor = self.api_version & 0xFFFF;
        desc_major == host_major && desc_minor <= host_minor
    }

    /// Creates the plugin without running any lifecycle hook.
    ///
    /// Prefer [`PluginInstance::construct`](super::PluginInstance::construct),
    /// which also runs `init` and tracks the lifecycle.
    #[inline]
    pub fn instantiate(&self, context: PluginContext) -> Box<dyn Plugin> {
        (self.create)(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop {
        ctx: PluginContext,
    }

    impl Plugin for Noop {
        fn context(&self) -> &PluginContext {
            &self.ctx
        }
    }

    impl PluginFactory for Noop {
        fn create(ctx: PluginContext) -> Self {
            Self { ctx }
        }
    }

    #[test]
    fn test_compatibility() {
        let mut desc = PluginDescriptor::of::<Noop>();
        assert!(desc.is_compatible());
        assert_eq!(desc.kind, PluginKind::of::<Noop>());

        desc.api_version = 0x0002_0000;
        assert!(!desc.is_compatible());

        desc.api_version = 0x0001_0001;
        assert!(!desc.is_compatible());

        desc.api_version = 0x0000_0000;
        assert!(!desc.is_compatible());
    }
}
