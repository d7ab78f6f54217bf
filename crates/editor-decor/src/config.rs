//! Editor configuration consumed by the overlay engine and the facade.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default tab width used when measuring columns.
pub const DEFAULT_TAB_SIZE: usize = 4;
/// Default indentation unit width.
pub const DEFAULT_INDENT_UNIT: usize = 2;
/// Prefix prepended to line classes and overlay token classes.
pub const DEFAULT_CLASS_PREFIX: &str = "cm-";
/// Reserved token prefix marking a line-level overlay class.
pub const DEFAULT_LINE_TOKEN_PREFIX: &str = "line-";

/// Document/view configuration.
///
/// Missing JSON fields fall back to their defaults:
///
/// ```rust
/// use editor_decor::EditorConfig;
///
/// let config = EditorConfig::from_json(r#"{ "tab_size": 8 }"#).unwrap();
/// assert_eq!(config.tab_size, 8);
/// assert_eq!(config.class_prefix, "cm-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of a tab character, in columns.
    pub tab_size: usize,
    /// Width of one indentation unit, handed to overlay `start_state`.
    pub indent_unit: usize,
    /// Prefix applied to line classes and overlay token classes.
    pub class_prefix: String,
    /// Overlay tokens starting with this prefix become line-level decorations.
    pub line_token_prefix: String,
}

impl EditorConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the tab width.
    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size.max(1);
        self
    }

    /// Set the indentation unit width.
    pub fn with_indent_unit(mut self, indent_unit: usize) -> Self {
        self.indent_unit = indent_unit;
        self
    }

    /// Set the class prefix (use `""` to keep classes verbatim).
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    /// Set the reserved line-level token prefix.
    pub fn with_line_token_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.line_token_prefix = prefix.into();
        self
    }

    /// Apply the class prefix to a bare class name.
    pub fn prefixed(&self, class: &str) -> String {
        format!("{}{}", self.class_prefix, class)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
            indent_unit: DEFAULT_INDENT_UNIT,
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            line_token_prefix: DEFAULT_LINE_TOKEN_PREFIX.to_string(),
        }
    }
}
