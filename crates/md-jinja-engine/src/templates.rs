//! Jinja snippets offered by the template panel.

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::document::Path;

/// Default usage guide linked from the panel.
pub const DEFAULT_DOC_LINK: &str = "https://jinja.palletsprojects.com/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Literal text inserted into the document.
    pub template: String,
}

impl TemplateEntry {
    pub fn new(title: impl Into<String>, description: Option<&str>, template: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
            template: template.into(),
        }
    }
}

/// The built-in catalog, in display order.
pub fn default_catalog() -> Vec<TemplateEntry> {
    vec![
        TemplateEntry::new("Variable interpolation", Some("{{ variable }}"), "{{ }}"),
        TemplateEntry::new(
            "Conditional",
            Some("{% if condition %}...{% endif %}"),
            "{% if  %}\n  \n{% endif %}",
        ),
        TemplateEntry::new(
            "Loop",
            Some("{% for item in list %}...{% endfor %}"),
            "{% for  in  %}\n  \n{% endfor %}",
        ),
        TemplateEntry::new("Filter", Some("{{ value | filter }}"), "{{  | }}"),
        TemplateEntry::new("Set variable", Some("{% set name = value %}"), "{% set  =  %}"),
    ]
}

/// What a loader gets to see when the panel opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadContext {
    pub anchor: Path,
    /// Text of the anchored node at open time, trigger included.
    pub anchor_text: String,
    pub trigger: String,
}

pub type LoadFuture = LocalBoxFuture<'static, anyhow::Result<Vec<TemplateEntry>>>;

/// Asynchronous catalog provider.
pub trait TemplateLoader {
    fn load(&self, context: LoadContext) -> LoadFuture;
}

impl<F> TemplateLoader for F
where
    F: Fn(LoadContext) -> LoadFuture,
{
    fn load(&self, context: LoadContext) -> LoadFuture {
        self(context)
    }
}

/// Where the panel gets its items from.
#[derive(Clone, Default)]
pub enum ItemsSource {
    #[default]
    Default,
    Static(Vec<TemplateEntry>),
    Loader(Rc<dyn TemplateLoader>),
}

impl ItemsSource {
    pub fn loader(loader: impl TemplateLoader + 'static) -> Self {
        ItemsSource::Loader(Rc::new(loader))
    }
}

impl fmt::Debug for ItemsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemsSource::Default => f.write_str("Default"),
            ItemsSource::Static(items) => f.debug_tuple("Static").field(items).finish(),
            ItemsSource::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_catalog_has_five_entries_in_order() {
        let titles: Vec<String> = default_catalog().into_iter().map(|t| t.title).collect();
        assert_eq!(
            titles,
            vec!["Variable interpolation", "Conditional", "Loop", "Filter", "Set variable"]
        );
    }

    #[test]
    fn variable_interpolation_entry() {
        let catalog = default_catalog();
        let variable = &catalog[0];
        assert_eq!(variable.template, "{{ }}");
        assert_eq!(variable.description.as_deref(), Some("{{ variable }}"));
    }

    #[test]
    fn every_template_is_non_empty() {
        assert!(default_catalog().iter().all(|t| !t.template.is_empty()));
    }

    #[test]
    fn doc_link_is_a_url() {
        assert!(DEFAULT_DOC_LINK.starts_with("https://"));
    }

    #[test]
    fn closures_are_loaders() {
        let source = ItemsSource::loader(|context: LoadContext| -> LoadFuture {
            async move { Ok(vec![TemplateEntry::new(context.trigger, None, "x")]) }.boxed_local()
        });
        let ItemsSource::Loader(loader) = source else {
            panic!("expected a loader");
        };
        let items = futures::executor::block_on(loader.load(LoadContext {
            anchor: Path::from([0]),
            anchor_text: "{}".into(),
            trigger: "{}".into(),
        }))
        .unwrap();
        assert_eq!(items[0].title, "{}");
    }
}
