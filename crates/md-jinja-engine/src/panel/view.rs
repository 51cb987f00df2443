use serde::Serialize;

use super::position::PanelPosition;

pub const LISTBOX_LABEL: &str = "Jinja template list";
pub const DOC_LINK_TEXT: &str = "Usage guide";
pub const DOC_LINK_ARIA_LABEL: &str = "Open Jinja usage guide (new window)";
pub const LOADING_TEXT: &str = "Loading...";
pub const NOT_FOUND_TEXT: &str = "No templates";

/// Renderer-neutral description of the open panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub role: &'static str,
    pub label: &'static str,
    pub position: PanelPosition,
    pub doc_link: Option<DocLink>,
    pub body: PanelBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocLink {
    pub href: String,
    pub text: &'static str,
    pub aria_label: &'static str,
    /// Opens in a new browsing context without opener access.
    pub new_window: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelBody {
    Loading(String),
    Empty(String),
    Options(Vec<OptionView>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub role: &'static str,
    pub title: String,
    pub description: Option<String>,
    pub selected: bool,
}

impl PanelView {
    pub fn titles(&self) -> Vec<&str> {
        match &self.body {
            PanelBody::Options(options) => options.iter().map(|o| o.title.as_str()).collect(),
            PanelBody::Loading(_) | PanelBody::Empty(_) => Vec::new(),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match &self.body {
            PanelBody::Options(options) => options.iter().position(|o| o.selected),
            PanelBody::Loading(_) | PanelBody::Empty(_) => None,
        }
    }
}
