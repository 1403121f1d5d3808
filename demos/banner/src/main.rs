//! Banner Example
//!
//! A single plugin that renders a banner into the generated page and changes
//! its text whenever something emits `announce` on the host bus.
//!
//! # Usage
//!
//! ```bash
//! # Print the compiled page once
//! cargo run --package quarkboard-banner -- -o text="Hello"
//!
//! # Keep the plugins loaded until Ctrl+C
//! cargo run --package quarkboard-banner -- -o serve
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use parking_lot::RwLock;
use quarkboard::core::Host;
use quarkboard::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BannerSettings {
    text: String,
    level: String,
}

impl Default for BannerSettings {
    fn default() -> Self {
        Self {
            text: "Welcome to Quarkboard".into(),
            level: "info".into(),
        }
    }
}

struct Banner {
    ctx: PluginContext,
    settings: BannerSettings,
    text: Arc<RwLock<String>>,
}

impl PluginFactory for Banner {
    fn create(ctx: PluginContext) -> Self {
        let settings: BannerSettings = ctx.config().settings_as().unwrap_or_default();
        let text = ctx
            .opt("text")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| settings.text.clone());

        Self {
            ctx,
            settings,
            text: Arc::new(RwLock::new(text)),
        }
    }
}

impl Plugin for Banner {
    fn context(&self) -> &PluginContext {
        &self.ctx
    }

    fn load(&mut self) -> Result<(), BoxError> {
        let text = Arc::clone(&self.text);
        self.ctx.on("announce", move |args: &[Value]| {
            if let Some(message) = args.first().and_then(Value::as_str) {
                *text.write() = message.to_string();
            }
        });
        info!(plugin = %self.name(), "Banner listening for announcements");
        Ok(())
    }

    fn html(&self, document: &mut Document, window: &mut Window) {
        document
            .append_head("<meta name=\"banner\" content=\"on\">")
            .append_body(format!(
                "<div class=\"banner banner-{}\">{}</div>",
                self.settings.level,
                self.text.read()
            ));
        window.set("banner", json!({ "level": self.settings.level }));
    }

    fn scripts(&self) -> Vec<String> {
        self.directories()
            .js()
            .map(|dir| vec![dir.join("banner.js").display().to_string()])
            .unwrap_or_default()
    }

    fn styles(&self) -> Vec<String> {
        self.directories()
            .css()
            .map(|dir| vec![dir.join("banner.css").display().to_string()])
            .unwrap_or_default()
    }
}

fn render(bundle: &Bundle) -> String {
    let mut page = String::from("<!doctype html>\n<html>\n<head>\n");
    if let Some(title) = bundle.document.title() {
        page.push_str(&format!("<title>{title}</title>\n"));
    }
    for style in &bundle.styles {
        page.push_str(&format!("<link rel=\"stylesheet\" href=\"{style}\">\n"));
    }
    for fragment in bundle.document.head() {
        page.push_str(fragment);
        page.push('\n');
    }
    page.push_str("</head>\n<body>\n");
    for fragment in bundle.document.body() {
        page.push_str(fragment);
        page.push('\n');
    }
    page.push_str(&format!(
        "<script>window.quarkboard = {};</script>\n",
        Value::Object(bundle.window.globals().clone())
    ));
    for script in &bundle.scripts {
        page.push_str(&format!("<script src=\"{script}\"></script>\n"));
    }
    page.push_str("</body>\n</html>\n");
    page
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut board = QuarkboardBuilder::from_cli(&cli).build()?;

    let pjson = json!({
        "name": "banner",
        "directories": { "js": "assets/js", "css": "assets/css" }
    });
    board.register::<Banner>(PluginConfig::new("banner", "plugins/banner").with_pjson(pjson))?;

    if board.host().has_opt("serve") {
        board.run().await?;
        return Ok(());
    }

    board.start()?;
    board.host().emit("announce", &[json!("Plugins loaded")]);

    let mut template = Document::new();
    template.set_title("Quarkboard");
    let bundle = board.compile_into(template)?;
    println!("{}", render(&bundle));

    board.stop()?;
    Ok(())
}
