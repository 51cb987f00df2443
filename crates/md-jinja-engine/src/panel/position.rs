use serde::Serialize;

use super::host::{Rect, Viewport};

/// Where the panel is drawn. Exactly one of `top`/`bottom` is set once the
/// anchor has been located; both are `None` for the fallback position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PanelPosition {
    pub left: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
    /// Distance from the bottom of the viewport, when placed above the anchor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f32>,
}

/// Place the panel below `anchor`, or above it when there is not enough room
/// below but enough above.
pub fn place(anchor: Rect, viewport: Viewport, max_height: f32) -> PanelPosition {
    let left = anchor.left + viewport.scroll_x;
    let space_below = viewport.height - anchor.bottom;
    if space_below < max_height && anchor.top > max_height {
        return PanelPosition {
            left,
            top: None,
            bottom: Some(viewport.height - anchor.top),
        };
    }
    PanelPosition {
        left,
        top: Some(anchor.bottom + viewport.scroll_y),
        bottom: None,
    }
}
