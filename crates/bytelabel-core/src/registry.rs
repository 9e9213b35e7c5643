//! Region registry.
//!
//! Owns the content, the regions annotated on it, the reconciler painting
//! them and the host store they are persisted to. All region mutation goes
//! through here so the single current region and the listener table stay
//! consistent with the region list.

use std::ops::Range;

use bytes::Bytes;

use crate::config::StyleConfig;
use crate::error::AnnotationError;
use crate::highlight::HighlightReconciler;
use crate::platform::{AnnotationHost, ViewBinding};
use crate::region::{RangeDescriptor, Region, RegionRecord, Serializable, WindowBound};
use crate::types::{AreaId, RegionId, WindowOffset};

pub struct RegionRegistry<V: ViewBinding, H: AnnotationHost> {
    content: Bytes,
    regions: Vec<Region>,
    reconciler: HighlightReconciler<V>,
    host: H,
    current_region: Option<RegionId>,
}

impl<V: ViewBinding, H: AnnotationHost> RegionRegistry<V, H> {
    pub fn new(content: impl Into<Bytes>, view: V, host: H, style: StyleConfig) -> Self {
        let content = content.into();
        let reconciler = HighlightReconciler::new(view, style, content.len());
        Self {
            content,
            regions: Vec::new(),
            reconciler,
            host,
            current_region: None,
        }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id() == id)
    }

    /// The region last clicked or selected, if any.
    pub fn current_region(&self) -> Option<&RegionId> {
        self.current_region.as_ref()
    }

    pub fn regions_in_area(&self, area: &AreaId) -> usize {
        self.regions
            .iter()
            .filter(|r| r.area_id() == Some(area))
            .count()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn reconciler(&self) -> &HighlightReconciler<V> {
        &self.reconciler
    }

    pub fn view(&self) -> &V {
        self.reconciler.view()
    }

    pub fn view_mut(&mut self) -> &mut V {
        self.reconciler.view_mut()
    }

    pub fn viewport(&self) -> WindowOffset {
        self.reconciler.viewport()
    }

    /// Change the displayed window.
    ///
    /// The renderer re-renders for the new window; call `rerender_all`
    /// once it has.
    pub fn set_viewport(&mut self, viewport: WindowOffset) {
        self.reconciler.set_viewport(viewport);
    }

    pub fn set_style(&mut self, style: StyleConfig) {
        self.reconciler.set_style(style);
        self.rerender_all();
    }

    /// Create, persist and highlight a region over `range`.
    ///
    /// Returns `None` without mutating anything when no labeling control is
    /// active, the range is invalid, or the store refuses the result.
    pub fn add_region(&mut self, range: RangeDescriptor) -> Option<&Region> {
        let Some(control) = self.host.active_controls().into_iter().next() else {
            tracing::debug!(
                target: "bytelabel::registry",
                start = range.start,
                end = range.end,
                "no active labeling control, region not created"
            );
            return None;
        };

        let region = match Region::new(
            RegionId::generate(),
            range,
            &self.content,
            control.labels.iter().cloned(),
            control.color,
        ) {
            Ok(region) => region,
            Err(err) => {
                tracing::warn!(target: "bytelabel::registry", error = %err, "rejected region");
                return None;
            }
        };

        let record = region.serialize();
        if let Err(err) = self
            .host
            .create_result(region.id(), region.area_id(), &record, &control)
        {
            tracing::warn!(target: "bytelabel::registry", error = %err, "store refused region");
            return None;
        }

        tracing::debug!(
            target: "bytelabel::registry",
            region = %region.id(),
            control = %control.name,
            start = region.start(),
            end = region.end(),
            "region added"
        );

        self.regions.push(region);
        let idx = self.regions.len() - 1;
        self.regions[idx].set_highlighted(true, &mut self.reconciler);
        self.regions.get(idx)
    }

    /// Rebuild a persisted region and highlight it.
    ///
    /// With `area`, a record saved without grouping joins that area.
    /// The store already holds the result, so it is not notified.
    pub fn restore_region(
        &mut self,
        record: RegionRecord,
        area: Option<(&AreaId, WindowOffset)>,
    ) -> Result<&Region, AnnotationError> {
        let (start, end) = (record.value.start, record.value.end);
        if end > self.content.len() {
            return Err(AnnotationError::OutOfBounds {
                start,
                end,
                len: self.content.len(),
            });
        }

        if let Some((_, window)) = area {
            if record.value.window_offset.is_none() && !window.contains_range(start, end) {
                return Err(AnnotationError::InvalidRecord(format!(
                    "range {start}..{end} is outside window {}..{}",
                    window.start, window.end
                )));
            }
        }

        let color = self
            .host
            .label_color(&record.value.labels)
            .unwrap_or(self.reconciler.style().default_label_color);
        let mut region = Region::from_record(RegionId::generate(), record, color)?;
        if region.decode_content()? != self.content[start..end] {
            return Err(AnnotationError::InvalidRecord(format!(
                "content does not match bytes {start}..{end}"
            )));
        }
        if let Some((area_id, window)) = area {
            region.adopt_area(area_id, window);
        }

        self.regions.push(region);
        let idx = self.regions.len() - 1;
        self.regions[idx].set_highlighted(true, &mut self.reconciler);
        Ok(&self.regions[idx])
    }

    /// React to a click on a byte node of `id`.
    ///
    /// Hidden regions ignore clicks. Returns whether `id` is now current.
    pub fn handle_span_click(&mut self, id: &RegionId) -> bool {
        let hidden = match self.region(id) {
            Some(region) => region.is_hidden(),
            None => return false,
        };
        if hidden {
            tracing::trace!(target: "bytelabel::registry", region = %id, "click on hidden region");
            return false;
        }
        self.select(id)
    }

    /// Make `id` the current region, deselecting the previous one.
    fn select(&mut self, id: &RegionId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };

        if self.current_region.as_ref() != Some(id) {
            self.clear_selection();
        }

        self.regions[idx].set_selected(true, &mut self.reconciler);
        self.host.toggle_region_selection(id, true);
        self.current_region = Some(id.clone());
        true
    }

    /// Deselect the current region, if any.
    pub fn clear_selection(&mut self) {
        let Some(previous) = self.current_region.take() else {
            return;
        };
        if let Some(idx) = self.index_of(&previous) {
            self.regions[idx].set_selected(false, &mut self.reconciler);
        }
        self.host.toggle_region_selection(&previous, false);
    }

    pub fn set_hidden(&mut self, id: &RegionId, hidden: bool) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.regions[idx].set_hidden(hidden, &mut self.reconciler);
        if hidden {
            let range = self.regions[idx].absolute_range();
            self.repaint_overlapping(range, id);
        }
        true
    }

    /// Flip visibility. Returns the new hidden flag.
    pub fn toggle_hidden(&mut self, id: &RegionId) -> Option<bool> {
        let hidden = !self.region(id)?.is_hidden();
        self.set_hidden(id, hidden);
        Some(hidden)
    }

    /// Remove a region, restore its bytes' appearance and tell the store.
    pub fn delete_region(&mut self, id: &RegionId) -> Option<Region> {
        let idx = self.index_of(id)?;
        if self.current_region.as_ref() == Some(id) {
            self.clear_selection();
        }

        let mut region = self.regions.remove(idx);
        region.set_highlighted(false, &mut self.reconciler);
        region.destroy(&mut self.reconciler);
        self.repaint_overlapping(region.absolute_range(), id);
        self.host.delete_result(id);

        tracing::debug!(target: "bytelabel::registry", region = %id, "region deleted");
        Some(region)
    }

    /// Delete every region of `area`. Returns their ids.
    pub fn discard_area(&mut self, area: &AreaId) -> Vec<RegionId> {
        let ids: Vec<RegionId> = self
            .regions
            .iter()
            .filter(|r| r.area_id() == Some(area))
            .map(|r| r.id().clone())
            .collect();
        for id in &ids {
            self.delete_region(id);
        }
        ids
    }

    /// Repaint every region after the renderer re-rendered.
    ///
    /// The re-render dropped every handler, so the listener table is
    /// reset before repainting.
    pub fn rerender_all(&mut self) {
        self.reconciler.reset_listeners();
        for region in &self.regions {
            self.reconciler.apply_highlight(region);
        }
        tracing::trace!(target: "bytelabel::registry", regions = self.regions.len(), "rerendered");
    }

    pub fn serialize_all(&self) -> Vec<RegionRecord> {
        self.regions.iter().map(Serializable::serialize).collect()
    }

    /// Release every region, as when the document is discarded.
    pub fn destroy_all(&mut self) {
        self.current_region = None;
        for mut region in self.regions.drain(..) {
            region.destroy(&mut self.reconciler);
        }
    }

    /// Repaint regions sharing bytes with `range` after `reset` was
    /// unpainted there. The current region is painted last so its emphasis
    /// stays on top.
    fn repaint_overlapping(&mut self, range: Range<usize>, reset: &RegionId) {
        let current = self.current_region.clone();
        let overlapping = |region: &&Region| {
            region.id() != reset
                && region.is_highlighted()
                && !region.is_hidden()
                && region.start() < range.end
                && range.start < region.end()
        };

        let mut repainted = 0;
        for region in self.regions.iter().filter(overlapping) {
            if Some(region.id()) != current.as_ref() {
                self.reconciler.apply_highlight(region);
                repainted += 1;
            }
        }
        for region in self.regions.iter().filter(overlapping) {
            if Some(region.id()) == current.as_ref() {
                self.reconciler.apply_highlight(region);
                repainted += 1;
            }
        }

        if repainted > 0 {
            tracing::trace!(
                target: "bytelabel::registry",
                region = %reset,
                repainted,
                "repainted overlap"
            );
        }
    }

    fn index_of(&self, id: &RegionId) -> Option<usize> {
        self.regions.iter().position(|r| r.id() == id)
    }
}
