//! # Template Panel
//!
//! Floating list of Jinja snippets opened when the trigger (default `{}`) is
//! typed. The host detects the trigger and calls [`TemplatePanel::open`] with
//! the anchor path; the panel then owns keyboard and outside-click handling
//! until it closes, and on commit replaces the trigger text with the chosen
//! template in one atomic edit.
//!
//! ```text
//! Closed --open--> Open(loading) --finish_load--> Open(ready) --commit/esc/click--> Closed
//!        \--open (static items)----------------> Open(ready)
//! ```
//!
//! Catalog loaders are asynchronous. Every load gets a [`LoadToken`]; a
//! completion is applied only if its token is the one the panel is waiting
//! for, so a slow answer from an earlier cycle can never overwrite a newer one.

pub mod host;
pub mod position;
pub mod view;

pub use host::{DocumentHost, EditorHost, HeadlessHost, ListenerId, ListenerKind, Rect, Viewport};
pub use position::{PanelPosition, place};
pub use view::{DocLink, OptionView, PanelBody, PanelView};

use crate::config::JinjaConfig;
use crate::document::{DocumentError, Edit, Patch, Path, Range};
use crate::templates::{
    DEFAULT_DOC_LINK, ItemsSource, LoadContext, LoadFuture, TemplateEntry, TemplateLoader, default_catalog,
};

pub const DEFAULT_TRIGGER: &str = "{}";
pub const PANEL_MAX_HEIGHT: f32 = 320.0;

#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub trigger: String,
    /// Usage guide link; empty hides it.
    pub doc_link: String,
    pub source: ItemsSource,
    /// Shown instead of the list when there are no items.
    pub not_found_content: Option<String>,
    pub max_height: f32,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER.to_string(),
            doc_link: DEFAULT_DOC_LINK.to_string(),
            source: ItemsSource::Default,
            not_found_content: None,
            max_height: PANEL_MAX_HEIGHT,
        }
    }
}

impl PanelOptions {
    pub fn from_config(config: &JinjaConfig) -> Self {
        let mut options = Self {
            doc_link: config
                .doc_link
                .clone()
                .unwrap_or_else(|| DEFAULT_DOC_LINK.to_string()),
            ..Self::default()
        };
        if let Some(panel) = config.panel() {
            if let Some(trigger) = &panel.trigger {
                options.trigger = trigger.clone();
            }
            if let Some(items) = &panel.items {
                options.source = ItemsSource::Static(items.clone());
            }
            options.not_found_content = panel.not_found_content.clone();
        }
        options
    }

    pub fn with_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
        self.source = ItemsSource::loader(loader);
        self
    }

    pub fn with_items(mut self, items: Vec<TemplateEntry>) -> Self {
        self.source = ItemsSource::Static(items);
        self
    }
}

/// Identifies one catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// A catalog load the host has to drive to completion.
pub struct PendingLoad {
    pub token: LoadToken,
    future: LoadFuture,
}

impl PendingLoad {
    /// Await the loader; pass the result to [`TemplatePanel::finish_load`].
    pub async fn settle(self) -> LoadCompletion {
        LoadCompletion {
            token: self.token,
            result: self.future.await,
        }
    }
}

pub struct LoadCompletion {
    pub token: LoadToken,
    pub result: anyhow::Result<Vec<TemplateEntry>>,
}

pub enum OpenOutcome {
    /// Items were available immediately.
    Ready,
    /// Items come from a loader; drive the load and report back.
    Loading(PendingLoad),
    /// A previous load is still outstanding.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Other,
}

#[derive(Debug, PartialEq)]
pub enum KeyOutcome {
    /// Not for the panel; let the editor have it.
    Ignored,
    /// Handled by the panel; the editor must not see it.
    Consumed,
    Closed,
    Committed(CommitOutcome),
}

#[derive(Debug, PartialEq)]
pub enum CommitOutcome {
    Inserted(Patch),
    /// The anchor no longer resolves to a position.
    Skipped,
    Failed(DocumentError),
}

#[derive(Debug)]
struct OpenState {
    anchor: Path,
    loading: bool,
    position: PanelPosition,
    listeners: Vec<ListenerId>,
}

pub struct TemplatePanel {
    options: PanelOptions,
    open: Option<OpenState>,
    items: Vec<TemplateEntry>,
    active_index: usize,
    next_token: u64,
    awaiting: Option<LoadToken>,
}

impl TemplatePanel {
    pub fn new(options: PanelOptions) -> Self {
        Self {
            options,
            open: None,
            items: default_catalog(),
            active_index: 0,
            next_token: 0,
            awaiting: None,
        }
    }

    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    pub fn trigger(&self) -> &str {
        &self.options.trigger
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.open.as_ref().is_some_and(|open| open.loading)
    }

    pub fn anchor(&self) -> Option<&Path> {
        self.open.as_ref().map(|open| &open.anchor)
    }

    pub fn position(&self) -> Option<PanelPosition> {
        self.open.as_ref().map(|open| open.position)
    }

    pub fn items(&self) -> &[TemplateEntry] {
        &self.items
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Start a cycle anchored at `anchor`.
    ///
    /// Re-opening while ready moves the panel to the new anchor. Re-opening
    /// while a load is outstanding is ignored until that load settles.
    pub fn open(&mut self, anchor: Path, host: &mut impl EditorHost) -> OpenOutcome {
        if self.is_loading() {
            log::debug!("ignoring trigger at {anchor} while templates load");
            return OpenOutcome::Ignored;
        }
        if self.is_open() {
            self.release(host);
        }

        let position = match host.anchor_rect(&anchor) {
            Some(rect) => place(rect, host.viewport(), self.options.max_height),
            None => {
                log::debug!("anchor {anchor} has no rendered position");
                PanelPosition::default()
            }
        };
        let listeners = vec![
            host.listen(ListenerKind::Keyboard),
            host.listen(ListenerKind::OutsideClick),
        ];

        let (loading, outcome) = match self.options.source.clone() {
            ItemsSource::Default => {
                self.set_items(default_catalog());
                (false, OpenOutcome::Ready)
            }
            ItemsSource::Static(items) => {
                self.set_items(items);
                (false, OpenOutcome::Ready)
            }
            ItemsSource::Loader(loader) => {
                self.next_token += 1;
                let token = LoadToken(self.next_token);
                self.awaiting = Some(token);
                let future = loader.load(LoadContext {
                    anchor: anchor.clone(),
                    anchor_text: host.string_at(&anchor),
                    trigger: self.options.trigger.clone(),
                });
                (true, OpenOutcome::Loading(PendingLoad { token, future }))
            }
        };

        self.active_index = 0;
        self.open = Some(OpenState {
            anchor,
            loading,
            position,
            listeners,
        });
        outcome
    }

    /// Apply a settled load. Returns `false` when the completion was stale.
    pub fn finish_load(&mut self, completion: LoadCompletion) -> bool {
        if self.awaiting != Some(completion.token) || !self.is_open() {
            log::debug!("discarding stale template load {:?}", completion.token);
            return false;
        }
        self.awaiting = None;

        match completion.result {
            Ok(items) => self.set_items(items),
            Err(err) => {
                if cfg!(debug_assertions) {
                    log::error!("Failed to load template items: {err:#}");
                }
                self.set_items(default_catalog());
            }
        }
        if let Some(open) = &mut self.open {
            open.loading = false;
        }
        true
    }

    pub fn handle_key(&mut self, key: PanelKey, host: &mut impl EditorHost) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        if key == PanelKey::Escape {
            self.close(host);
            host.focus();
            return KeyOutcome::Closed;
        }

        let len = self.items.len();
        match key {
            PanelKey::ArrowUp | PanelKey::ArrowDown if self.is_loading() || len == 0 => KeyOutcome::Consumed,
            PanelKey::ArrowUp => {
                self.active_index = if self.active_index == 0 {
                    len - 1
                } else {
                    self.active_index - 1
                };
                KeyOutcome::Consumed
            }
            PanelKey::ArrowDown => {
                self.active_index = (self.active_index + 1) % len;
                KeyOutcome::Consumed
            }
            PanelKey::Enter if self.is_loading() => KeyOutcome::Consumed,
            PanelKey::Enter => match self.items.get(self.active_index).cloned() {
                Some(item) => KeyOutcome::Committed(self.insert(&item, host)),
                None => KeyOutcome::Ignored,
            },
            PanelKey::Escape | PanelKey::Other => KeyOutcome::Ignored,
        }
    }

    /// A pointer press somewhere on screen. Returns `true` if it closed the panel.
    pub fn pointer_down(&mut self, inside_panel: bool, host: &mut impl EditorHost) -> bool {
        if inside_panel || !self.is_open() {
            return false;
        }
        self.close(host);
        true
    }

    pub fn hover(&mut self, index: usize) {
        if self.is_open() && !self.is_loading() && index < self.items.len() {
            self.active_index = index;
        }
    }

    /// Pointer commit on the item at `index`.
    pub fn commit(&mut self, index: usize, host: &mut impl EditorHost) -> Option<CommitOutcome> {
        if !self.is_open() || self.is_loading() {
            return None;
        }
        let item = self.items.get(index).cloned()?;
        Some(self.insert(&item, host))
    }

    /// End the cycle: release listeners, drop the anchor, forget any load.
    pub fn close(&mut self, host: &mut impl EditorHost) {
        self.release(host);
        self.awaiting = None;
        self.active_index = 0;
    }

    pub fn view(&self) -> Option<PanelView> {
        let open = self.open.as_ref()?;
        let doc_link = (!self.options.doc_link.is_empty()).then(|| DocLink {
            href: self.options.doc_link.clone(),
            text: view::DOC_LINK_TEXT,
            aria_label: view::DOC_LINK_ARIA_LABEL,
            new_window: true,
        });
        let body = if open.loading {
            PanelBody::Loading(view::LOADING_TEXT.to_string())
        } else if self.items.is_empty() {
            PanelBody::Empty(
                self.options
                    .not_found_content
                    .clone()
                    .unwrap_or_else(|| view::NOT_FOUND_TEXT.to_string()),
            )
        } else {
            PanelBody::Options(
                self.items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| OptionView {
                        role: "option",
                        title: item.title.clone(),
                        description: item.description.clone(),
                        selected: i == self.active_index,
                    })
                    .collect(),
            )
        };
        Some(PanelView {
            role: "listbox",
            label: view::LISTBOX_LABEL,
            position: open.position,
            doc_link,
            body,
        })
    }

    fn set_items(&mut self, items: Vec<TemplateEntry>) {
        self.items = items;
        self.active_index = 0;
    }

    fn release(&mut self, host: &mut impl EditorHost) {
        if let Some(open) = self.open.take() {
            for id in open.listeners {
                host.unlisten(id);
            }
        }
    }

    /// Replace the trigger before the anchor's end with `item`, then close.
    fn insert(&mut self, item: &TemplateEntry, host: &mut impl EditorHost) -> CommitOutcome {
        let outcome = match self.anchor().and_then(|anchor| host.end_of(anchor)) {
            None => {
                log::debug!("template commit skipped: anchor no longer resolves");
                CommitOutcome::Skipped
            }
            Some(end) => {
                let start = host
                    .point_before(&end, self.options.trigger.chars().count())
                    .unwrap_or_else(|| end.clone());
                let edits = vec![
                    Edit::Delete {
                        range: Range::new(start.clone(), end),
                    },
                    Edit::InsertText {
                        at: start,
                        text: item.template.clone(),
                    },
                ];
                match host.apply_edits(edits) {
                    Ok(patch) => {
                        host.focus();
                        CommitOutcome::Inserted(patch)
                    }
                    Err(err) => {
                        log::warn!("Failed to insert template {:?}: {err}", item.title);
                        CommitOutcome::Failed(err)
                    }
                }
            }
        };
        self.close(host);
        outcome
    }
}
