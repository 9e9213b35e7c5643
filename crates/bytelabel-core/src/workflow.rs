//! Two-step selection workflow.
//!
//! The user first narrows the view to an area of the content, then drags
//! spans inside it to create labeled regions:
//!
//! ```text
//! SelectingArea --confirm_area--> Labeling --finish_drag--> Labeling
//!       ^                            |
//!       +----------- back -----------+
//! ```
//!
//! On reload, persisted regions are regrouped into their area and the
//! workflow jumps straight to `Labeling`.

use bytes::Bytes;

use crate::config::WorkflowOptions;
use crate::error::AnnotationError;
use crate::offset_map::absolute_range;
use crate::platform::{AnnotationHost, ViewBinding};
use crate::region::{RangeDescriptor, RegionRecord};
use crate::registry::RegionRegistry;
use crate::types::{AreaId, RegionId, WindowOffset};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    SelectingArea,
    Labeling,
}

/// The sub-window regions are being labeled within.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Area {
    id: AreaId,
    window: WindowOffset,
    snapshot: Bytes,
}

impl Area {
    pub fn id(&self) -> &AreaId {
        &self.id
    }

    pub fn window(&self) -> WindowOffset {
        self.window
    }

    /// The area's bytes, which the renderer displays with offsets re-zeroed.
    pub fn snapshot(&self) -> &Bytes {
        &self.snapshot
    }
}

/// Result of asking to leave the labeling step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackOutcome {
    /// Back in area selection; these regions were deleted.
    Returned { discarded: Vec<RegionId> },
    /// The area holds regions; ask the user, then call again confirmed.
    NeedsConfirmation { pending: usize },
}

#[derive(Clone, Debug)]
pub struct SelectionWorkflow {
    state: WorkflowState,
    area: Option<Area>,
    alert: bool,
    options: WorkflowOptions,
}

impl Default for SelectionWorkflow {
    fn default() -> Self {
        Self::new(WorkflowOptions::default())
    }
}

impl SelectionWorkflow {
    pub fn new(options: WorkflowOptions) -> Self {
        Self {
            state: WorkflowState::SelectingArea,
            area: None,
            alert: false,
            options,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn area(&self) -> Option<&Area> {
        self.area.as_ref()
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Whether the last area confirmation was rejected.
    pub fn alert(&self) -> bool {
        self.alert
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = false;
    }

    /// Window the renderer should display.
    pub fn visible_window(&self, content_len: usize) -> WindowOffset {
        self.area
            .as_ref()
            .map(|area| area.window)
            .unwrap_or_else(|| WindowOffset::full(content_len))
    }

    /// Turn the current drag into the active area.
    ///
    /// Rejects missing or empty drags, raising the alert and staying in
    /// `SelectingArea`. On success the registry's viewport moves to the
    /// area; re-render the view and call `rerender_all`.
    pub fn confirm_area<V: ViewBinding, H: AnnotationHost>(
        &mut self,
        registry: &mut RegionRegistry<V, H>,
    ) -> Result<&Area, AnnotationError> {
        if self.state != WorkflowState::SelectingArea {
            return Err(AnnotationError::AreaAlreadyActive);
        }

        let markers = registry.view().selection_markers();
        let viewport = registry.viewport();
        let span = markers
            .span()
            .map(|local| absolute_range(local, &viewport))
            .filter(|range| range.end <= registry.content().len());

        let Some(range) = span else {
            tracing::warn!(
                target: "bytelabel::workflow",
                start = ?markers.start,
                end = ?markers.end,
                "rejected area selection"
            );
            self.alert = true;
            return Err(AnnotationError::InvalidSelection {
                start: markers.start,
                end: markers.end,
            });
        };

        let window = WindowOffset::new(range.start, range.end);
        let area = Area {
            id: AreaId::generate(),
            window,
            snapshot: registry.content().slice(range),
        };

        tracing::debug!(
            target: "bytelabel::workflow",
            area = %area.id,
            start = window.start,
            end = window.end,
            "area confirmed"
        );

        registry.set_viewport(window);
        self.alert = false;
        self.state = WorkflowState::Labeling;
        Ok(&*self.area.insert(area))
    }

    /// Create a region from the drag that just ended inside the area.
    ///
    /// Silent no-op when not labeling, when selection is disabled, when the
    /// drag is degenerate, or when no labeling control is active.
    pub fn finish_drag<V: ViewBinding, H: AnnotationHost>(
        &mut self,
        registry: &mut RegionRegistry<V, H>,
    ) -> Option<RegionId> {
        let area = self.area.as_ref()?;
        if !self.options.selection_enabled {
            tracing::debug!(target: "bytelabel::workflow", "selection disabled, drag ignored");
            return None;
        }

        let markers = registry.view().selection_markers();
        let Some(local) = markers.span() else {
            tracing::debug!(target: "bytelabel::workflow", ?markers, "degenerate drag ignored");
            return None;
        };

        let range = absolute_range(local, &area.window);
        if !area.window.contains_range(range.start, range.end) {
            tracing::debug!(
                target: "bytelabel::workflow",
                start = range.start,
                end = range.end,
                "drag outside area ignored"
            );
            return None;
        }

        let descriptor = RangeDescriptor {
            start: range.start,
            end: range.end,
            area_id: Some(area.id.clone()),
            window_offset: Some(area.window),
        };
        registry.add_region(descriptor).map(|region| region.id().clone())
    }

    /// Leave the labeling step.
    ///
    /// Discarding the area's regions needs `confirmed` when there are any.
    pub fn back<V: ViewBinding, H: AnnotationHost>(
        &mut self,
        registry: &mut RegionRegistry<V, H>,
        confirmed: bool,
    ) -> Result<BackOutcome, AnnotationError> {
        let area = self.area.as_ref().ok_or(AnnotationError::NotLabeling)?;

        let pending = registry.regions_in_area(&area.id);
        if pending > 0 && !confirmed {
            return Ok(BackOutcome::NeedsConfirmation { pending });
        }

        let discarded = registry.discard_area(&area.id);
        tracing::debug!(
            target: "bytelabel::workflow",
            area = %area.id,
            discarded = discarded.len(),
            "returned to area selection"
        );

        self.area = None;
        self.state = WorkflowState::SelectingArea;
        let content_len = registry.content().len();
        registry.set_viewport(WindowOffset::full(content_len));
        Ok(BackOutcome::Returned { discarded })
    }

    /// Restore persisted regions, regrouping them into their area.
    ///
    /// Records without an area join the one area the others share. Records
    /// from more than one area cannot be grouped: the error is reported and
    /// nothing is restored. Individually invalid records are skipped.
    pub fn restore<V: ViewBinding, H: AnnotationHost>(
        &mut self,
        registry: &mut RegionRegistry<V, H>,
        records: Vec<RegionRecord>,
    ) -> Result<Option<&Area>, AnnotationError> {
        if self.state != WorkflowState::SelectingArea {
            return Err(AnnotationError::AreaAlreadyActive);
        }
        if records.is_empty() {
            return Ok(None);
        }

        let mut areas: Vec<Option<AreaId>> = Vec::new();
        for record in &records {
            if let Some(id) = &record.value.area_id {
                if !areas.iter().any(|a| a.as_ref() == Some(id)) {
                    areas.push(Some(id.clone()));
                }
            }
        }
        if areas.len() > 1 {
            tracing::error!(
                target: "bytelabel::workflow",
                ?areas,
                "persisted regions belong to several areas"
            );
            return Err(AnnotationError::InconsistentPersistedGrouping { areas });
        }

        let area_id = match areas.pop().flatten() {
            Some(id) => id,
            None => AreaId::generate(),
        };
        let content_len = registry.content().len();
        let window = records
            .iter()
            .find_map(|record| record.value.window_offset)
            .unwrap_or_else(|| WindowOffset::full(content_len));
        if window.end > content_len || window.is_empty() {
            return Err(AnnotationError::InvalidRecord(format!(
                "window {}..{} does not fit content of length {content_len}",
                window.start, window.end
            )));
        }

        registry.set_viewport(window);
        let total = records.len();
        let mut restored = 0;
        for record in records {
            match registry.restore_region(record, Some((&area_id, window))) {
                Ok(_) => restored += 1,
                Err(err) => {
                    tracing::warn!(
                        target: "bytelabel::workflow",
                        error = %err,
                        "skipped persisted region"
                    );
                }
            }
        }

        tracing::debug!(
            target: "bytelabel::workflow",
            area = %area_id,
            restored,
            total,
            "restored area"
        );

        let area = Area {
            id: area_id,
            window,
            snapshot: registry.content().slice(window.to_range()),
        };
        self.alert = false;
        self.state = WorkflowState::Labeling;
        Ok(Some(&*self.area.insert(area)))
    }
}
