//! [`PluginConfig`] and the derived asset [`Directories`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Plugin-scoped configuration supplied by the host at construction time.
///
/// Read-only from the plugin's perspective. Field names follow the host's
/// wire shape:
///
/// ```json
/// {
///   "pluginName": "clock",
///   "pluginRoot": "/srv/plugins/clock",
///   "pjson": { "directories": { "js": "dist/js", "css": "dist/css", "images": "img" } },
///   "settings": { "format": "HH:mm" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    plugin_name: String,
    plugin_root: PathBuf,
    #[serde(default)]
    pjson: Value,
    #[serde(default)]
    settings: Value,
}

impl PluginConfig {
    /// Creates a config with an empty package descriptor and no settings.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            plugin_name: name.into(),
            plugin_root: root.into(),
            pjson: Value::Null,
            settings: Value::Null,
        }
    }

    /// Sets the parsed package descriptor.
    pub fn with_pjson(mut self, pjson: Value) -> Self {
        self.pjson = pjson;
        self
    }

    /// Sets the plugin's section of the host configuration.
    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    /// The configured plugin name.
    pub fn name(&self) -> &str {
        &self.plugin_name
    }

    /// The plugin's root directory.
    pub fn root(&self) -> &Path {
        &self.plugin_root
    }

    /// The parsed package descriptor, `Value::Null` when none was supplied.
    pub fn pjson(&self) -> &Value {
        &self.pjson
    }

    /// The raw settings section, `Value::Null` when absent.
    pub fn settings(&self) -> &Value {
        &self.settings
    }

    /// Deserialises the settings section into `T`.
    ///
    /// A missing section is read as an empty object, so a `T` annotated with
    /// `#[serde(default)]` falls back to its defaults.
    pub fn settings_as<T>(&self) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        match &self.settings {
            Value::Null => T::deserialize(&Value::Object(Map::new())),
            settings => T::deserialize(settings),
        }
    }

    /// Projects `pjson.directories` onto the plugin root.
    ///
    /// Recomputed on every call. An absent or malformed `directories` value
    /// yields an empty mapping, and entries that are not strings are skipped.
    pub fn directories(&self) -> Directories {
        let Some(declared) = self.pjson.get("directories").and_then(Value::as_object) else {
            return Directories::default();
        };

        DirectoryKind::ALL
            .into_iter()
            .filter_map(|kind| {
                declared
                    .get(kind.key())
                    .and_then(Value::as_str)
                    .map(|sub| (kind, self.plugin_root.join(sub)))
            })
            .collect()
    }
}

/// Asset directory a plugin may declare in its package descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectoryKind {
    Js,
    Css,
    Images,
}

impl DirectoryKind {
    pub const ALL: [Self; 3] = [Self::Js, Self::Css, Self::Images];

    /// The key used under `pjson.directories`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Css => "css",
            Self::Images => "images",
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolved asset directories of a plugin. No existence check is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directories(BTreeMap<DirectoryKind, PathBuf>);

impl Directories {
    pub fn get(&self, kind: DirectoryKind) -> Option<&Path> {
        self.0.get(&kind).map(PathBuf::as_path)
    }

    pub fn js(&self) -> Option<&Path> {
        self.get(DirectoryKind::Js)
    }

    pub fn css(&self) -> Option<&Path> {
        self.get(DirectoryKind::Css)
    }

    pub fn images(&self) -> Option<&Path> {
        self.get(DirectoryKind::Images)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DirectoryKind, &Path)> {
        self.0.iter().map(|(kind, path)| (*kind, path.as_path()))
    }
}

impl FromIterator<(DirectoryKind, PathBuf)> for Directories {
    fn from_iter<I: IntoIterator<Item = (DirectoryKind, PathBuf)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
