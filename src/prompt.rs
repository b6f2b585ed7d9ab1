//! System instruction template
//!
//! The full spatial-reasoning instruction ships as a Markdown asset under
//! config/prompts/; a compact built-in text covers running without one. The
//! canonical layout text is spliced in at render time.

/// Placeholder replaced with the canonical layout text
pub const LAYOUT_PLACEHOLDER: &str = "{layout_json}";

const TEMPLATE_PATHS: [&str; 2] = [
    "config/prompts/spatial_reasoner.md",
    "../config/prompts/spatial_reasoner.md",
];

const FALLBACK_TEMPLATE: &str = "You are a Spatial Layout Reasoning Assistant that interprets natural \
language commands against a 3D room layout. Analyze the provided layout JSON and the user's command, \
resolve the target object, any reference object and the target position in room coordinates, and \
respond with a single JSON object describing the resolved action. Respond with JSON only, no \
explanations.\n\nThe following is the spatial layout:\n{layout_json}\n";

/// Instruction template for the session's system entry
#[derive(Clone, Debug)]
pub struct SystemPromptTemplate {
    template: String,
}

impl SystemPromptTemplate {
    /// Loads the template from the config directory, falling back to the
    /// built-in text when no asset is found.
    pub fn load() -> Self {
        Self::load_from(&TEMPLATE_PATHS)
    }

    fn load_from(paths: &[&str]) -> Self {
        let template = paths
            .iter()
            .find_map(|p| std::fs::read_to_string(p).ok())
            .unwrap_or_else(|| {
                tracing::warn!("no system prompt asset found, using the built-in fallback template");
                FALLBACK_TEMPLATE.to_string()
            });
        Self { template }
    }

    pub fn from_text(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Renders the system entry content for the given canonical layout text.
    /// A template without the placeholder gets the layout appended as a
    /// trailing section instead.
    pub fn render(&self, layout_text: &str) -> String {
        if self.template.contains(LAYOUT_PLACEHOLDER) {
            self.template.replace(LAYOUT_PLACEHOLDER, layout_text)
        } else {
            format!(
                "{}\n\nThe following is the spatial layout:\n{}\n",
                self.template.trim_end(),
                layout_text
            )
        }
    }
}

impl Default for SystemPromptTemplate {
    fn default() -> Self {
        Self::from_text(FALLBACK_TEMPLATE)
    }
}
