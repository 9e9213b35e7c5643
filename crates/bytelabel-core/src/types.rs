//! Core annotation types: identifiers, drag selections, and offset windows.
//!
//! These types are framework-agnostic and carry no view state.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Unique, immutable identifier of a region.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(SmolStr);

impl RegionId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(format_smolstr!("r-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grouping key shared by all regions selected within one area.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(SmolStr);

impl AreaId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(format_smolstr!("a-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute bounds of a window into the content, half-open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOffset {
    pub start: usize,
    pub end: usize,
}

impl WindowOffset {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The window covering the whole content.
    pub fn full(content_len: usize) -> Self {
        Self {
            start: 0,
            end: content_len,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if the absolute range `[start, end)` lies inside this window.
    pub fn contains_range(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A range relative to the start of the rendered window, half-open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalRange {
    pub start: usize,
    pub end: usize,
}

impl LocalRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A range with `start >= end` selects nothing.
    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.is_degenerate()
    }

    /// Check if a local node offset falls inside the range.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Boundary markers of the current drag selection, as reported by the renderer.
///
/// `end` is exclusive. Either marker is absent when the renderer has no
/// selection boundary on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionMarkers {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl SelectionMarkers {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both markers, only when they describe a non-empty span.
    pub fn span(&self) -> Option<LocalRange> {
        let (start, end) = (self.start?, self.end?);
        (start < end).then_some(LocalRange::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_range_contains() {
        let range = LocalRange::new(2, 6);
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(5));
        assert!(!range.contains(6)); // end is exclusive
        assert!(LocalRange::new(4, 4).is_degenerate());
        assert!(LocalRange::new(5, 4).is_degenerate());
    }

    #[test]
    fn test_window_contains_range() {
        let window = WindowOffset::new(4, 12);
        assert_eq!(window.len(), 8);
        assert!(window.contains_range(4, 12));
        assert!(window.contains_range(6, 8));
        assert!(!window.contains_range(3, 8));
        assert!(!window.contains_range(6, 13));
        assert_eq!(WindowOffset::full(32), WindowOffset::new(0, 32));
    }

    #[test]
    fn test_markers_span() {
        assert_eq!(SelectionMarkers::new(4, 12).span(), Some(LocalRange::new(4, 12)));
        assert_eq!(SelectionMarkers::new(12, 12).span(), None);
        assert_eq!(SelectionMarkers::new(12, 4).span(), None);
        let missing = SelectionMarkers {
            start: Some(3),
            end: None,
        };
        assert_eq!(missing.span(), None);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RegionId::generate(), RegionId::generate());
        let area = AreaId::generate();
        assert!(area.as_str().starts_with("a-"));
    }
}
