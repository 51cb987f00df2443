//! Jinja settings as they appear in editor configuration, and the plugin that
//! switches Jinja support on.

use serde::{Deserialize, Serialize};

use crate::templates::TemplateEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JinjaConfig {
    pub enable: bool,
    #[serde(alias = "docLink", skip_serializing_if = "Option::is_none")]
    pub doc_link: Option<String>,
    #[serde(alias = "templatePanel")]
    pub template_panel: TemplatePanelSetting,
}

impl JinjaConfig {
    pub fn enabled() -> Self {
        Self {
            enable: true,
            ..Self::default()
        }
    }

    /// Jinja is on and the panel has not been switched off.
    pub fn panel_enabled(&self) -> bool {
        self.enable
            && match &self.template_panel {
                TemplatePanelSetting::Toggle(on) => *on,
                TemplatePanelSetting::Custom(panel) => panel.enable.unwrap_or(true),
            }
    }

    pub fn panel(&self) -> Option<&TemplatePanelConfig> {
        match &self.template_panel {
            TemplatePanelSetting::Custom(panel) => Some(panel),
            TemplatePanelSetting::Toggle(_) => None,
        }
    }
}

/// `template_panel = false` or a table of panel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplatePanelSetting {
    Toggle(bool),
    Custom(TemplatePanelConfig),
}

impl Default for TemplatePanelSetting {
    fn default() -> Self {
        TemplatePanelSetting::Toggle(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TemplatePanelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<TemplateEntry>>,
    #[serde(alias = "notFoundContent", skip_serializing_if = "Option::is_none")]
    pub not_found_content: Option<String>,
}

/// Enables Jinja highlighting and the template panel when installed.
///
/// Options passed in are kept, but `enable` is always forced on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JinjaPlugin {
    config: Option<JinjaConfig>,
}

impl JinjaPlugin {
    pub fn new(options: Option<JinjaConfig>) -> Self {
        Self {
            config: options.map(|options| JinjaConfig {
                enable: true,
                ..options
            }),
        }
    }

    pub fn config(&self) -> Option<&JinjaConfig> {
        self.config.as_ref()
    }
}

/// Effective Jinja settings for an editor.
///
/// Explicitly enabled editor settings win. Otherwise the first Jinja plugin
/// enables support with its own options, or the defaults. `None` means Jinja
/// is off.
pub fn resolve_jinja(props: Option<&JinjaConfig>, plugins: &[JinjaPlugin]) -> Option<JinjaConfig> {
    if let Some(props) = props
        && props.enable
    {
        return Some(props.clone());
    }
    let plugin = plugins.first()?;
    Some(plugin.config.clone().unwrap_or_else(JinjaConfig::enabled))
}
