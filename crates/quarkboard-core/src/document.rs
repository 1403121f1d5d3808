//! Render boundary handed to [`Plugin::html`](crate::Plugin::html).
//!
//! The shapes are owned by the document compiler; they only collect what
//! plugins inject.

use serde_json::{Map, Value};

/// Markup collected for the generated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    title: Option<String>,
    head: Vec<String>,
    body: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Fragments injected into `<head>`, in insertion order.
    pub fn head(&self) -> &[String] {
        &self.head
    }

    /// Fragments injected into `<body>`, in insertion order.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn append_head(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.head.push(fragment.into());
        self
    }

    pub fn append_body(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.body.push(fragment.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.head.is_empty() && self.body.is_empty()
    }
}

/// Client-side globals exposed to the generated document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    globals: Map<String, Value>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a global, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.globals.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.globals.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.globals.contains_key(key)
    }

    pub fn globals(&self) -> &Map<String, Value> {
        &self.globals
    }
}
