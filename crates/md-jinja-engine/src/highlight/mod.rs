//! # Highlighting
//!
//! Turns elements into highlight [`Span`]s for the renderer.
//!
//! - **`matchers`**: regex tokenizers (footnotes, HTML, links, Jinja) and line markers
//! - **`cache`**: identity-keyed span cache
//! - **`decorator`**: per-element orchestration
//!
//! Spans from different matchers may overlap. The renderer decides which wins.

pub mod cache;
pub mod decorator;
pub mod matchers;
pub mod span;

pub use cache::DecorationCache;
pub use decorator::{DecorationMode, Decorator};
pub use matchers::{MatchGroup, Matcher, RegexScanner, Scanner, line_marker};
pub use span::{Category, Span, Token};
