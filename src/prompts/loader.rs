//! Prompt loader
//!
//! Registers the embedded templates and lets a prompts directory override
//! any of them by file name (`<name>.hbs`).

use std::path::Path;

use eyre::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

pub const CLARIFY_CONVERSATION: &str = "clarify-conversation";
pub const CLARIFY_CHECKLIST: &str = "clarify-checklist";
pub const PLAN_FINAL: &str = "plan-final";
pub const STRICT_JSON_REMINDER: &str = "strict-json-reminder";

pub struct PromptLoader {
    registry: Handlebars<'static>,
}

impl PromptLoader {
    /// Build a loader with embedded defaults, then apply directory overrides.
    pub fn new(prompts_dir: Option<&Path>) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in embedded::all() {
            registry
                .register_template_string(name, source)
                .context(format!("Failed to register embedded template '{}'", name))?;
        }

        let mut loader = Self { registry };
        if let Some(dir) = prompts_dir {
            loader.load_overrides(dir)?;
        }
        Ok(loader)
    }

    fn load_overrides(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "prompts directory not present; using embedded templates");
            return Ok(());
        }

        for entry in std::fs::read_dir(dir).context("Failed to read prompts directory")? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("hbs") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)
                .context(format!("Failed to read template {}", path.display()))?;
            self.registry
                .register_template_string(&name, source)
                .context(format!("Failed to compile template '{}'", name))?;
            info!(%name, "prompt template overridden from file");
        }
        Ok(())
    }

    /// Render a template with the given context.
    pub fn render(&self, name: &str, ctx: &impl Serialize) -> Result<String> {
        self.registry
            .render(name, ctx)
            .context(format!("Failed to render template '{}'", name))
    }

    /// The raw strict-JSON reminder, appended to retry prompts.
    pub fn strict_json_reminder(&self) -> Result<String> {
        self.render(STRICT_JSON_REMINDER, &serde_json::json!({}))
    }
}
