//! Platform abstraction traits for the annotation core.
//!
//! These traits define the interface between the annotation logic and its
//! collaborators: the renderer that paints bytes as nodes (`ViewBinding`)
//! and the annotation store that owns results and labeling controls
//! (`AnnotationHost`). The core never touches a global document; the browser
//! implementation lives in `bytelabel-browser`, and `MemoryView` is an
//! in-memory one.

use std::collections::BTreeSet;

use smol_str::SmolStr;

use crate::color::Rgba;
use crate::error::{AnnotationError, PlatformError};
use crate::region::RegionRecord;
use crate::types::{AreaId, RegionId, SelectionMarkers};

/// Key of a rendered byte node: its `data-offset` within the rendered window.
///
/// Stable only for the lifetime of one render; nodes are re-resolved by
/// offset after every re-render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub usize);

/// Positional parity class of a byte node, used for zebra striping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(offset: usize) -> Self {
        if offset % 2 == 0 { Parity::Even } else { Parity::Odd }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_css(self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        }
    }
}

/// Concrete presentation written to one byte node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodePaint {
    pub background: Rgba,
    pub foreground: Rgba,
    pub cursor: Cursor,
    pub weight: FontWeight,
}

/// A byte node as exposed by the renderer.
pub trait ByteNode {
    /// The node's `data-offset` within the rendered window.
    fn offset(&self) -> usize;

    /// Whether the node stands for a byte outside the loaded range.
    fn is_invalid(&self) -> bool;

    /// Parity class the renderer styled the node with.
    fn parity(&self) -> Parity {
        Parity::of(self.offset())
    }

    fn key(&self) -> NodeKey {
        NodeKey(self.offset())
    }
}

/// Rendering collaborator.
///
/// Style writes are ephemeral presentation state: a re-render may clobber
/// them at any time, so callers repaint rather than trust an earlier paint.
pub trait ViewBinding {
    type Node: ByteNode;

    /// All currently rendered byte nodes, in document order.
    ///
    /// Empty when nothing is mounted.
    fn byte_nodes(&self) -> Vec<Self::Node>;

    /// The `selectionStart` / `selectionEnd` markers of the current drag.
    fn selection_markers(&self) -> SelectionMarkers;

    /// Write presentation to a node.
    ///
    /// Returns `PlatformError::StaleNode` if the node is gone.
    fn paint(&mut self, node: &Self::Node, paint: &NodePaint) -> Result<(), PlatformError>;

    /// Attach a click handler on `node` that reports `region` when clicked.
    fn attach_click(&mut self, node: &Self::Node, region: &RegionId) -> Result<(), PlatformError>;

    /// Remove the click handler `region` holds on the node keyed `key`.
    ///
    /// Must tolerate nodes that no longer exist.
    fn detach_click(&mut self, key: NodeKey, region: &RegionId);
}

/// A labeling control eligible to receive a new region.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelControl {
    /// Name of the control in the labeling configuration.
    pub name: SmolStr,
    /// Currently selected label values.
    pub labels: Vec<SmolStr>,
    /// Color of the selected label.
    pub color: Rgba,
}

/// Annotation store collaborator.
pub trait AnnotationHost {
    /// Labeling controls that can receive a region right now.
    ///
    /// Empty means "cannot label now".
    fn active_controls(&self) -> Vec<LabelControl>;

    /// Persist a new region result.
    fn create_result(
        &mut self,
        region: &RegionId,
        area: Option<&AreaId>,
        value: &RegionRecord,
        control: &LabelControl,
    ) -> Result<(), AnnotationError>;

    /// Notify the store that `region` became (or stopped being) the current one.
    fn toggle_region_selection(&mut self, region: &RegionId, selected: bool);

    /// Notify the store that a region was deleted.
    fn delete_result(&mut self, _region: &RegionId) {}

    /// Color of a restored region carrying `labels`, if the store knows one.
    fn label_color(&self, _labels: &BTreeSet<SmolStr>) -> Option<Rgba> {
        None
    }
}

impl<T: AnnotationHost> AnnotationHost for &mut T {
    fn active_controls(&self) -> Vec<LabelControl> {
        (**self).active_controls()
    }

    fn create_result(
        &mut self,
        region: &RegionId,
        area: Option<&AreaId>,
        value: &RegionRecord,
        control: &LabelControl,
    ) -> Result<(), AnnotationError> {
        (**self).create_result(region, area, value, control)
    }

    fn toggle_region_selection(&mut self, region: &RegionId, selected: bool) {
        (**self).toggle_region_selection(region, selected)
    }

    fn delete_result(&mut self, region: &RegionId) {
        (**self).delete_result(region)
    }

    fn label_color(&self, labels: &BTreeSet<SmolStr>) -> Option<Rgba> {
        (**self).label_color(labels)
    }
}
