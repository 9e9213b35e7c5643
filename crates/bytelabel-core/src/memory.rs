//! In-memory collaborators for headless hosts and tests.
//!
//! `MemoryView` behaves like a rendered byte grid: nodes numbered from zero,
//! paints and click handlers stored per node, and a re-render that wipes
//! both. `MemoryHost` records results the way an annotation store would.

use std::collections::{BTreeMap, BTreeSet};

use smol_str::SmolStr;

use crate::color::Rgba;
use crate::error::{AnnotationError, PlatformError};
use crate::platform::{
    AnnotationHost, ByteNode, LabelControl, NodeKey, NodePaint, ViewBinding,
};
use crate::region::RegionRecord;
use crate::types::{AreaId, RegionId, SelectionMarkers};

/// A byte node of a `MemoryView`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryNode {
    pub offset: usize,
    pub invalid: bool,
}

impl ByteNode for MemoryNode {
    fn offset(&self) -> usize {
        self.offset
    }

    fn is_invalid(&self) -> bool {
        self.invalid
    }
}

/// In-memory rendering collaborator.
#[derive(Clone, Debug, Default)]
pub struct MemoryView {
    nodes: Vec<MemoryNode>,
    paints: BTreeMap<usize, NodePaint>,
    listeners: BTreeSet<(RegionId, NodeKey)>,
    markers: SelectionMarkers,
    stale: BTreeSet<usize>,
    render_count: usize,
}

impl MemoryView {
    /// A view with `len` byte nodes already mounted.
    pub fn mounted(len: usize) -> Self {
        let mut view = Self::default();
        view.mount(len);
        view
    }

    /// Re-render the grid with `len` nodes.
    ///
    /// Like a real re-render this drops every paint and click handler.
    pub fn mount(&mut self, len: usize) {
        self.nodes = (0..len)
            .map(|offset| MemoryNode {
                offset,
                invalid: false,
            })
            .collect();
        self.paints.clear();
        self.listeners.clear();
        self.stale.clear();
        self.markers = SelectionMarkers::default();
        self.render_count += 1;
    }

    /// Remove every node.
    pub fn unmount(&mut self) {
        self.nodes.clear();
        self.paints.clear();
        self.listeners.clear();
        self.stale.clear();
    }

    /// Flag the node at `offset` as standing for an unloaded byte.
    pub fn mark_invalid(&mut self, offset: usize) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.offset == offset) {
            node.invalid = true;
        }
    }

    /// Make the node at `offset` disappear on its next use, as if removed
    /// by a re-render between resolution and paint.
    pub fn make_stale(&mut self, offset: usize) {
        self.stale.insert(offset);
    }

    /// Set the drag selection markers.
    pub fn select(&mut self, start: usize, end: usize) {
        self.markers = SelectionMarkers::new(start, end);
    }

    pub fn set_markers(&mut self, markers: SelectionMarkers) {
        self.markers = markers;
    }

    /// Last paint written to the node at `offset`.
    pub fn paint_at(&self, offset: usize) -> Option<&NodePaint> {
        self.paints.get(&offset)
    }

    /// Number of click handlers attached, across all regions.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Offsets of nodes holding a click handler for `region`.
    pub fn listeners_for(&self, region: &RegionId) -> Vec<usize> {
        self.listeners
            .iter()
            .filter(|(id, _)| id == region)
            .map(|(_, key)| key.0)
            .collect()
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    fn check_live(&self, node: &MemoryNode) -> Result<(), PlatformError> {
        let mounted = self.nodes.iter().any(|n| n.offset == node.offset);
        if !mounted || self.stale.contains(&node.offset) {
            return Err(PlatformError::StaleNode(node.offset));
        }
        Ok(())
    }
}

impl ViewBinding for MemoryView {
    type Node = MemoryNode;

    fn byte_nodes(&self) -> Vec<MemoryNode> {
        self.nodes.clone()
    }

    fn selection_markers(&self) -> SelectionMarkers {
        self.markers
    }

    fn paint(&mut self, node: &MemoryNode, paint: &NodePaint) -> Result<(), PlatformError> {
        self.check_live(node)?;
        self.paints.insert(node.offset, *paint);
        Ok(())
    }

    fn attach_click(&mut self, node: &MemoryNode, region: &RegionId) -> Result<(), PlatformError> {
        self.check_live(node)?;
        self.listeners.insert((region.clone(), node.key()));
        Ok(())
    }

    fn detach_click(&mut self, key: NodeKey, region: &RegionId) {
        self.listeners.remove(&(region.clone(), key));
    }
}

/// In-memory annotation store.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    pub controls: Vec<LabelControl>,
    pub results: BTreeMap<RegionId, (Option<AreaId>, RegionRecord, LabelControl)>,
    pub selection_log: Vec<(RegionId, bool)>,
    pub deleted: Vec<RegionId>,
}

impl MemoryHost {
    /// A store with one active labeling control.
    pub fn with_control(control: LabelControl) -> Self {
        Self {
            controls: vec![control],
            ..Self::default()
        }
    }
}

impl AnnotationHost for MemoryHost {
    fn active_controls(&self) -> Vec<LabelControl> {
        self.controls.clone()
    }

    fn create_result(
        &mut self,
        region: &RegionId,
        area: Option<&AreaId>,
        value: &RegionRecord,
        control: &LabelControl,
    ) -> Result<(), AnnotationError> {
        self.results.insert(
            region.clone(),
            (area.cloned(), value.clone(), control.clone()),
        );
        Ok(())
    }

    fn toggle_region_selection(&mut self, region: &RegionId, selected: bool) {
        self.selection_log.push((region.clone(), selected));
    }

    fn delete_result(&mut self, region: &RegionId) {
        self.results.remove(region);
        self.deleted.push(region.clone());
    }

    fn label_color(&self, labels: &BTreeSet<SmolStr>) -> Option<Rgba> {
        self.controls
            .iter()
            .find(|control| control.labels.iter().any(|label| labels.contains(label)))
            .map(|control| control.color)
    }
}
