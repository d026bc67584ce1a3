use serde::{Deserialize, Serialize};

use crate::core::ToolKind;
use crate::core::defaults::{
    DEFAULT_ID_PREFIX, DEFAULT_ID_START, DEFAULT_PLOT_HEIGHT, DEFAULT_PLOT_WIDTH, DEFAULT_TOOLS,
};
use crate::error::{SceneError, SceneResult};

/// Document bootstrap configuration.
///
/// Serializable so hosts can persist document setup next to their data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    #[serde(default = "default_id_start")]
    pub id_start: u64,
    #[serde(default = "default_plot_width")]
    pub plot_width: u32,
    #[serde(default = "default_plot_height")]
    pub plot_height: u32,
    #[serde(default = "default_tools")]
    pub default_tools: Vec<ToolKind>,
    /// Run `Document::validate` before every `to_json` and log findings.
    #[serde(default)]
    pub validate_on_serialize: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            id_start: default_id_start(),
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
            default_tools: default_tools(),
            validate_on_serialize: false,
        }
    }
}

impl DocumentConfig {
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: &str) -> Self {
        self.id_prefix = prefix.to_owned();
        self
    }

    #[must_use]
    pub fn with_id_start(mut self, start: u64) -> Self {
        self.id_start = start;
        self
    }

    #[must_use]
    pub fn with_plot_size(mut self, width: u32, height: u32) -> Self {
        self.plot_width = width;
        self.plot_height = height;
        self
    }

    #[must_use]
    pub fn with_default_tools(mut self, tools: Vec<ToolKind>) -> Self {
        self.default_tools = tools;
        self
    }

    #[must_use]
    pub fn with_validate_on_serialize(mut self, enabled: bool) -> Self {
        self.validate_on_serialize = enabled;
        self
    }

    pub fn validate(&self) -> SceneResult<()> {
        if self.id_prefix.is_empty() {
            return Err(SceneError::InvalidData(
                "id prefix must not be empty".to_owned(),
            ));
        }
        if self.id_prefix.chars().any(|c| c.is_ascii_digit()) {
            return Err(SceneError::InvalidData(
                "id prefix must not contain digits".to_owned(),
            ));
        }
        if self.plot_width == 0 || self.plot_height == 0 {
            return Err(SceneError::InvalidCanvas {
                width: self.plot_width,
                height: self.plot_height,
            });
        }
        Ok(())
    }

    /// Serializes config to pretty JSON for config files.
    pub fn to_json_pretty(&self) -> SceneResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SceneError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> SceneResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| SceneError::InvalidData(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_owned()
}

fn default_id_start() -> u64 {
    DEFAULT_ID_START
}

fn default_plot_width() -> u32 {
    DEFAULT_PLOT_WIDTH
}

fn default_plot_height() -> u32 {
    DEFAULT_PLOT_HEIGHT
}

fn default_tools() -> Vec<ToolKind> {
    DEFAULT_TOOLS.to_vec()
}
