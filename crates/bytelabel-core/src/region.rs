//! Annotated byte regions.
//!
//! A `Region` is plain data: absolute coordinates, a base64 snapshot of the
//! covered bytes, its grouping key, labels and transient view flags. Its
//! capabilities are split into three narrow traits:
//!
//! - `Serializable`: projection to the persisted record
//! - `WindowBound`: absolute range and the window it was selected within
//! - `Highlightable`: what the reconciler needs to paint it
//!
//! Flag setters take the reconciler explicitly and repaint synchronously, so
//! view state is never stale between a user action and its visual result.

use std::collections::BTreeSet;
use std::ops::Range;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::color::Rgba;
use crate::error::AnnotationError;
use crate::highlight::HighlightReconciler;
use crate::offset_map;
use crate::platform::ViewBinding;
use crate::types::{AreaId, LocalRange, RegionId, WindowOffset};

/// Persisted form of a region.
///
/// ```json
/// { "value": { "start": 4, "end": 8, "content": "BAUGBw==",
///              "areaId": "a-1", "windowOffset": { "start": 4, "end": 12 },
///              "labels": ["Header"] } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub value: RegionValue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionValue {
    /// Absolute start offset, inclusive.
    pub start: usize,
    /// Absolute end offset, exclusive.
    pub end: usize,
    /// Base64 of bytes `[start, end)`.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<AreaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_offset: Option<WindowOffset>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<SmolStr>,
}

impl RegionRecord {
    pub fn from_json(json: &str) -> Result<Self, AnnotationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AnnotationError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Absolute coordinates of a new region, before it is registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeDescriptor {
    pub start: usize,
    pub end: usize,
    pub area_id: Option<AreaId>,
    pub window_offset: Option<WindowOffset>,
}

/// Transient view flags. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub hidden: bool,
    pub selected: bool,
    pub highlighted: bool,
}

impl ViewState {
    /// Derived: selected regions get bold, fully opaque emphasis.
    pub fn bold_emphasis(&self) -> bool {
        !self.hidden && self.highlighted && self.selected
    }
}

/// Projection to the persisted record.
pub trait Serializable {
    fn serialize(&self) -> RegionRecord;
}

/// A range of the content, optionally tied to the window it was selected in.
pub trait WindowBound {
    /// Absolute half-open range.
    fn absolute_range(&self) -> Range<usize>;

    /// Window the range was selected within, if recorded.
    fn window_offset(&self) -> Option<WindowOffset>;

    /// The window, defaulting to the full content.
    fn window(&self, content_len: usize) -> WindowOffset {
        self.window_offset()
            .unwrap_or_else(|| WindowOffset::full(content_len))
    }

    /// Offsets relative to `window`.
    fn local_range(&self, window: &WindowOffset) -> LocalRange {
        offset_map::local_range(self.absolute_range(), window)
    }
}

/// What the reconciler needs to paint a region.
pub trait Highlightable {
    fn id(&self) -> &RegionId;
    fn view_state(&self) -> ViewState;
    fn color(&self) -> Rgba;
}

/// One annotated byte range.
#[derive(Clone, Debug)]
pub struct Region {
    id: RegionId,
    area_id: Option<AreaId>,
    start: usize,
    end: usize,
    content: String,
    window_offset: Option<WindowOffset>,
    labels: BTreeSet<SmolStr>,
    color: Rgba,
    view: ViewState,
    destroyed: bool,
}

impl Region {
    /// Build a region over `range` of `content`, snapshotting the bytes.
    pub fn new(
        id: RegionId,
        range: RangeDescriptor,
        content: &[u8],
        labels: impl IntoIterator<Item = SmolStr>,
        color: Rgba,
    ) -> Result<Self, AnnotationError> {
        validate_coordinates(range.start, range.end, range.window_offset)?;
        let bytes = content
            .get(range.start..range.end)
            .ok_or(AnnotationError::OutOfBounds {
                start: range.start,
                end: range.end,
                len: content.len(),
            })?;

        Ok(Self {
            id,
            area_id: range.area_id,
            start: range.start,
            end: range.end,
            content: STANDARD.encode(bytes),
            window_offset: range.window_offset,
            labels: labels.into_iter().collect(),
            color,
            view: ViewState::default(),
            destroyed: false,
        })
    }

    /// Rebuild a region from its persisted record, checking every invariant.
    pub fn from_record(
        id: RegionId,
        record: RegionRecord,
        color: Rgba,
    ) -> Result<Self, AnnotationError> {
        let value = record.value;
        validate_coordinates(value.start, value.end, value.window_offset)?;

        let decoded = STANDARD.decode(value.content.as_bytes())?;
        if decoded.len() != value.end - value.start {
            return Err(AnnotationError::InvalidRecord(format!(
                "content holds {} bytes but range {}..{} covers {}",
                decoded.len(),
                value.start,
                value.end,
                value.end - value.start
            )));
        }

        Ok(Self {
            id,
            area_id: value.area_id,
            start: value.start,
            end: value.end,
            content: value.content,
            window_offset: value.window_offset,
            labels: value.labels,
            color,
            view: ViewState::default(),
            destroyed: false,
        })
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn area_id(&self) -> Option<&AreaId> {
        self.area_id.as_ref()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Base64 snapshot of the covered bytes.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn decode_content(&self) -> Result<Vec<u8>, AnnotationError> {
        Ok(STANDARD.decode(self.content.as_bytes())?)
    }

    pub fn labels(&self) -> &BTreeSet<SmolStr> {
        &self.labels
    }

    pub fn is_hidden(&self) -> bool {
        self.view.hidden
    }

    pub fn is_selected(&self) -> bool {
        self.view.selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.view.highlighted
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Attach the region to an area. Used when restoring records saved
    /// before regions carried their area.
    pub(crate) fn adopt_area(&mut self, area_id: &AreaId, window: WindowOffset) {
        self.area_id.get_or_insert_with(|| area_id.clone());
        self.window_offset.get_or_insert(window);
    }

    pub fn set_hidden<V: ViewBinding>(
        &mut self,
        hidden: bool,
        reconciler: &mut HighlightReconciler<V>,
    ) {
        self.view.hidden = hidden;
        reconciler.apply_highlight(&*self);
    }

    pub fn set_selected<V: ViewBinding>(
        &mut self,
        selected: bool,
        reconciler: &mut HighlightReconciler<V>,
    ) {
        self.view.selected = selected;
        reconciler.apply_highlight(&*self);
    }

    pub fn set_highlighted<V: ViewBinding>(
        &mut self,
        highlighted: bool,
        reconciler: &mut HighlightReconciler<V>,
    ) {
        self.view.highlighted = highlighted;
        reconciler.apply_highlight(&*self);
    }

    /// Detach every listener this region registered.
    ///
    /// A second call is a no-op.
    pub fn destroy<V: ViewBinding>(&mut self, reconciler: &mut HighlightReconciler<V>) {
        if self.destroyed {
            tracing::debug!(
                target: "bytelabel::registry",
                region = %self.id,
                "destroy called on destroyed region"
            );
            return;
        }
        reconciler.remove_events(&self.id);
        self.destroyed = true;
    }
}

impl Serializable for Region {
    fn serialize(&self) -> RegionRecord {
        RegionRecord {
            value: RegionValue {
                start: self.start,
                end: self.end,
                content: self.content.clone(),
                area_id: self.area_id.clone(),
                window_offset: self.window_offset,
                labels: self.labels.clone(),
            },
        }
    }
}

impl WindowBound for Region {
    fn absolute_range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn window_offset(&self) -> Option<WindowOffset> {
        self.window_offset
    }
}

impl Highlightable for Region {
    fn id(&self) -> &RegionId {
        &self.id
    }

    fn view_state(&self) -> ViewState {
        self.view
    }

    fn color(&self) -> Rgba {
        self.color
    }
}

fn validate_coordinates(
    start: usize,
    end: usize,
    window: Option<WindowOffset>,
) -> Result<(), AnnotationError> {
    if start >= end {
        return Err(AnnotationError::InvalidRecord(format!(
            "empty range {start}..{end}"
        )));
    }
    match window {
        Some(window) if !window.contains_range(start, end) => {
            Err(AnnotationError::InvalidRecord(format!(
                "range {start}..{end} is outside window {}..{}",
                window.start, window.end
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StyleConfig;
    use crate::memory::MemoryView;

    const RED: Rgba = Rgba(0xFF0000FF);

    fn packet() -> Vec<u8> {
        (0u8..32).collect()
    }

    fn no_labels() -> Vec<SmolStr> {
        Vec::new()
    }

    fn region_at(start: usize, end: usize, window: Option<WindowOffset>) -> Region {
        Region::new(
            RegionId::new("r-test"),
            RangeDescriptor {
                start,
                end,
                area_id: Some(AreaId::new("a-test")),
                window_offset: window,
            },
            &packet(),
            [SmolStr::new("Header")],
            RED,
        )
        .unwrap()
    }

    #[test]
    fn test_content_snapshot() {
        let region = region_at(4, 8, Some(WindowOffset::new(4, 12)));
        assert_eq!(region.content(), "BAUGBw==");
        assert_eq!(region.decode_content().unwrap(), vec![4, 5, 6, 7]);
        assert_eq!(region.decode_content().unwrap().len(), region.end() - region.start());
    }

    #[test]
    fn test_serialized_record_shape() {
        let region = region_at(4, 8, Some(WindowOffset::new(4, 12)));
        insta::assert_json_snapshot!(region.serialize(), @r###"
        {
          "value": {
            "start": 4,
            "end": 8,
            "content": "BAUGBw==",
            "areaId": "a-test",
            "windowOffset": {
              "start": 4,
              "end": 12
            },
            "labels": [
              "Header"
            ]
          }
        }
        "###);
    }

    #[test]
    fn test_record_round_trip() {
        let region = region_at(6, 11, Some(WindowOffset::new(4, 12)));
        let json = region.serialize().to_json().unwrap();
        let restored =
            Region::from_record(
                RegionId::new("r-other"),
                RegionRecord::from_json(&json).unwrap(),
                RED,
            )
                .unwrap();

        assert_eq!(restored.start(), region.start());
        assert_eq!(restored.end(), region.end());
        assert_eq!(restored.content(), region.content());
        assert_eq!(restored.area_id(), region.area_id());
        assert_eq!(restored.window_offset(), region.window_offset());
        assert_eq!(restored.serialize(), region.serialize());
    }

    #[test]
    fn test_serialize_omits_view_state() {
        let mut reconciler =
            HighlightReconciler::new(MemoryView::mounted(32), StyleConfig::default(), 32);
        let mut region = region_at(0, 3, None);
        let before = region.serialize();
        region.set_highlighted(true, &mut reconciler);
        region.set_selected(true, &mut reconciler);
        region.set_hidden(true, &mut reconciler);
        assert_eq!(region.serialize(), before);

        let json = before.to_json().unwrap();
        assert!(!json.contains("hidden"));
        assert!(!json.contains("windowOffset"));
    }

    #[test]
    fn test_minimal_record_parses() {
        let record = RegionRecord::from_json(r#"{"value":{"start":0,"end":3,"content":"AAEC"}}"#)
            .unwrap();
        let region = Region::from_record(RegionId::generate(), record, RED).unwrap();
        assert_eq!(region.area_id(), None);
        assert_eq!(region.window(32), WindowOffset::full(32));
        assert!(region.labels().is_empty());
    }

    #[test]
    fn test_rejects_content_length_mismatch() {
        let record = RegionRecord::from_json(r#"{"value":{"start":0,"end":4,"content":"AAEC"}}"#)
            .unwrap();
        let err = Region::from_record(RegionId::generate(), record, RED).unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidRecord(_)));
    }

    #[test]
    fn test_rejects_bad_base64() {
        let record = RegionRecord::from_json(r#"{"value":{"start":0,"end":3,"content":"!!!"}}"#)
            .unwrap();
        let err = Region::from_record(RegionId::generate(), record, RED).unwrap_err();
        assert!(matches!(err, AnnotationError::ContentDecode(_)));
    }

    #[test]
    fn test_rejects_range_outside_window() {
        let err = Region::new(
            RegionId::generate(),
            RangeDescriptor {
                start: 2,
                end: 8,
                area_id: None,
                window_offset: Some(WindowOffset::new(4, 12)),
            },
            &packet(),
            no_labels(),
            RED,
        )
        .unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidRecord(_)));
    }

    #[test]
    fn test_rejects_empty_and_out_of_bounds() {
        let empty = RangeDescriptor {
            start: 5,
            end: 5,
            area_id: None,
            window_offset: None,
        };
        assert!(Region::new(RegionId::generate(), empty, &packet(), no_labels(), RED).is_err());

        let past_end = RangeDescriptor {
            start: 30,
            end: 40,
            area_id: None,
            window_offset: None,
        };
        let err =
            Region::new(RegionId::generate(), past_end, &packet(), no_labels(), RED).unwrap_err();
        assert!(matches!(err, AnnotationError::OutOfBounds { len: 32, .. }));
    }

    #[test]
    fn test_local_range_inverts_construction() {
        let window = WindowOffset::new(4, 12);
        let local = LocalRange::new(1, 6);
        let absolute = offset_map::absolute_range(local, &window);
        let region = region_at(absolute.start, absolute.end, Some(window));
        assert_eq!(region.local_range(&window), local);
    }

    #[test]
    fn test_bold_emphasis() {
        let state = ViewState {
            hidden: false,
            selected: true,
            highlighted: true,
        };
        assert!(state.bold_emphasis());
        assert!(!ViewState { hidden: true, ..state }.bold_emphasis());
        assert!(!ViewState { highlighted: false, ..state }.bold_emphasis());
    }

    #[test]
    fn test_destroy_without_highlight_is_noop() {
        let mut reconciler =
            HighlightReconciler::new(MemoryView::mounted(32), StyleConfig::default(), 32);
        let mut region = region_at(0, 3, None);
        region.destroy(&mut reconciler);
        assert!(region.is_destroyed());
        region.destroy(&mut reconciler);
        assert_eq!(reconciler.view().listener_count(), 0);
    }
}
