//! Navigation settings.
//!
//! Settings are plain data with serde support so hosts can keep them in their own JSON
//! configuration:
//!
//! ```json
//! {
//!   "go_errors_first": true,
//!   "show_error_tooltip": false,
//!   "search_options": { "case_sensitive": false }
//! }
//! ```

use crate::NavError;
use crate::error_nav::ErrorNavOptions;
use crate::search::SearchOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings consulted by a [`NavigationSession`](crate::NavigationSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavSettings {
    /// "Next error" starts at the most severe tier instead of considering all tiers at once.
    pub go_errors_first: bool,
    /// Show the diagnostic detail popup after error navigation.
    pub show_error_tooltip: bool,
    /// Search options used when the host has no find field.
    pub search_options: SearchOptions,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            go_errors_first: true,
            show_error_tooltip: true,
            search_options: SearchOptions::default(),
        }
    }
}

impl NavSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, NavError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, NavError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn error_nav_options(&self) -> ErrorNavOptions {
        ErrorNavOptions {
            go_errors_first: self.go_errors_first,
            show_tooltip: self.show_error_tooltip,
        }
    }
}
