//! Values bound to the settings panel.

use crate::core::config::PanelConfig;

/// Flat set of panel-bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsParams {
    /// Case color as a hex string
    pub case_color: String,
    /// Background color as a hex string
    pub background: String,
    /// Read-only time display
    pub time: String,
    pub wireframe: bool,
}

impl SettingsParams {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            case_color: config.case_color.clone(),
            background: config.background.clone(),
            time: String::new(),
            wireframe: false,
        }
    }
}

impl Default for SettingsParams {
    fn default() -> Self {
        Self::from_config(&PanelConfig::default())
    }
}

/// An edit made in the settings panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    CaseColor(String),
    Background(String),
    Wireframe(bool),
}
