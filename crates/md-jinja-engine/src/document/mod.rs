/*!
 * # Document Model
 *
 * A small rich-text tree the highlighter and the template panel operate on.
 *
 * - **`node`**: `Element`, `TextRun`, `NodeKind` and `NodeId` (element identity)
 * - **`path`**: `Path`, `Point` and `Range` addressing
 * - **`edit`**: `Edit` commands, `Patch` results and `DocumentError`
 * - **`tree`**: the `Document` itself, with atomic batch application
 *
 * Offsets are measured in chars. Elements get a new `NodeId` whenever their
 * content changes, which is what lets the decoration cache key on identity.
 */

pub mod edit;
pub mod node;
pub mod path;
pub mod tree;

pub use edit::{DocumentError, Edit, Patch};
pub use node::{Element, Node, NodeId, NodeKind, TextRun};
pub use path::{Path, Point, Range};
pub use tree::Document;
