//! Jinja-aware highlighting and the template insertion panel for a
//! Markdown editor.
//!
//! - [`document`]: the rich-text tree both halves operate on
//! - [`highlight`]: span decoration with an identity-keyed cache
//! - [`panel`]: the floating template picker
//! - [`templates`]: the snippet catalog and async loaders
//! - [`config`]: Jinja settings and the enabling plugin

pub mod config;
pub mod document;
pub mod highlight;
pub mod panel;
pub mod templates;

pub use config::{JinjaConfig, JinjaPlugin, TemplatePanelConfig, TemplatePanelSetting, resolve_jinja};
pub use document::{Document, DocumentError, Edit, Element, Node, NodeId, NodeKind, Patch, Path, Point, Range, TextRun};
pub use highlight::{Category, DecorationCache, Decorator, Span};
pub use panel::{
    CommitOutcome, EditorHost, HeadlessHost, KeyOutcome, OpenOutcome, PanelKey, PanelOptions, PanelView, TemplatePanel,
};
pub use templates::{ItemsSource, LoadContext, LoadFuture, TemplateEntry, TemplateLoader, default_catalog};
