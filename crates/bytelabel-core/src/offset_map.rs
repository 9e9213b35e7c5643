//! Offset mapping between absolute content offsets and rendered windows.
//!
//! A region is stored with absolute offsets into the full content. The
//! renderer only ever shows one window of the content, and numbers its byte
//! nodes from zero at the window start (`data-offset`). These functions
//! convert between the two and look up the nodes for a range.
//!
//! # Example
//!
//! Content: 32 bytes, window `4..12`, region `4..8`:
//!
//! - local range: `0..4`
//! - resolved nodes: the nodes with `data-offset` 0, 1, 2, 3

use std::ops::Range;

use crate::platform::{ByteNode, ViewBinding};
use crate::types::{LocalRange, WindowOffset};

/// Convert an absolute range to offsets local to `window`.
///
/// Offsets before the window start saturate to zero.
pub fn local_range(absolute: Range<usize>, window: &WindowOffset) -> LocalRange {
    LocalRange::new(
        absolute.start.saturating_sub(window.start),
        absolute.end.saturating_sub(window.start),
    )
}

/// Convert a range local to `window` back to absolute offsets.
///
/// Inverse of [`local_range`] for ranges inside the window.
pub fn absolute_range(local: LocalRange, window: &WindowOffset) -> Range<usize> {
    (window.start + local.start)..(window.start + local.end)
}

/// Find the rendered byte nodes covering `local`, ordered by offset.
///
/// Invalid nodes (bytes outside the loaded range) are skipped. Returns an
/// empty vector when nothing is mounted; callers treat that as a no-op.
pub fn resolve_nodes<V: ViewBinding>(view: &V, local: LocalRange) -> Vec<V::Node> {
    if local.is_degenerate() {
        return Vec::new();
    }

    let mut nodes: Vec<V::Node> = view
        .byte_nodes()
        .into_iter()
        .filter(|node| !node.is_invalid() && local.contains(node.offset()))
        .collect();
    nodes.sort_by_key(|node| node.offset());

    tracing::trace!(
        target: "bytelabel::offsets",
        local_start = local.start,
        local_end = local.end,
        resolved = nodes.len(),
        "resolve_nodes"
    );

    nodes
}
