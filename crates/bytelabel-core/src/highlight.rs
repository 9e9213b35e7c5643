//! Highlight reconciliation.
//!
//! Maps a region's view flags to a presentation and writes it to the byte
//! nodes the region covers, then keeps its click handlers in step:
//!
//! | hidden | highlighted | selected | result                                   |
//! |--------|-------------|----------|------------------------------------------|
//! | yes    | -           | -        | reset, default cursor, no handler        |
//! | no     | no          | -        | reset, default cursor, no handler        |
//! | no     | yes         | no       | label color at low emphasis, pointer     |
//! | no     | yes         | yes      | label color at full emphasis, bold       |
//!
//! Paints are ephemeral: the renderer may drop them on any re-render, so
//! every call recomputes from the flags and repaints from scratch.

use std::collections::BTreeSet;

use crate::color::Rgba;
use crate::config::StyleConfig;
use crate::error::PlatformError;
use crate::offset_map::{local_range, resolve_nodes};
use crate::platform::{ByteNode, Cursor, FontWeight, NodeKey, NodePaint, Parity, ViewBinding};
use crate::region::{Highlightable, ViewState, WindowBound};
use crate::types::{RegionId, WindowOffset};

/// Presentation computed from a region's flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Appearance {
    /// Back to the canvas background; no interaction.
    Reset,
    /// Label color applied; clickable.
    Emphasized { color: Rgba, full: bool },
}

impl Appearance {
    pub fn for_state(state: ViewState, color: Rgba) -> Self {
        if state.hidden || !state.highlighted {
            Appearance::Reset
        } else {
            Appearance::Emphasized {
                color,
                full: state.bold_emphasis(),
            }
        }
    }

    pub fn wants_listener(&self) -> bool {
        matches!(self, Appearance::Emphasized { .. })
    }

    /// Concrete paint for a node of the given parity.
    pub fn paint(&self, parity: Parity, style: &StyleConfig) -> NodePaint {
        match *self {
            Appearance::Reset => NodePaint {
                cursor: Cursor::Default,
                weight: FontWeight::Normal,
                ..color_paint(style.canvas_background, parity, 1.0, style)
            },
            Appearance::Emphasized { color, full } => {
                let opacity = if full { 1.0 } else { style.unselected_opacity };
                NodePaint {
                    cursor: Cursor::Pointer,
                    weight: if full { FontWeight::Bold } else { FontWeight::Normal },
                    ..color_paint(color, parity, opacity, style)
                }
            }
        }
    }
}

/// Apply `color` to a node.
///
/// The canvas background restores the node's parity palette so unlabeled
/// bytes keep their striping. Any other color is painted flat with the label
/// foreground, faded by `opacity`.
pub fn color_paint(color: Rgba, parity: Parity, opacity: f64, style: &StyleConfig) -> NodePaint {
    if color.same_rgb(style.canvas_background) {
        let palette = style.palette(parity);
        return NodePaint {
            background: palette.background,
            foreground: palette.foreground,
            cursor: Cursor::Default,
            weight: FontWeight::Normal,
        };
    }

    NodePaint {
        background: color.blend_toward_transparent(opacity),
        foreground: style.label_foreground,
        cursor: Cursor::Default,
        weight: FontWeight::Normal,
    }
}

/// Paints regions onto a `ViewBinding` and tracks their click handlers.
///
/// Handlers are recorded in a table keyed by `(RegionId, NodeKey)`, so
/// registering twice never attaches twice and removal needs no node lookup.
pub struct HighlightReconciler<V: ViewBinding> {
    view: V,
    style: StyleConfig,
    content_len: usize,
    viewport: WindowOffset,
    listeners: BTreeSet<(RegionId, NodeKey)>,
}

impl<V: ViewBinding> HighlightReconciler<V> {
    /// Create a reconciler whose viewport is the full content.
    pub fn new(view: V, style: StyleConfig, content_len: usize) -> Self {
        Self {
            view,
            style,
            content_len,
            viewport: WindowOffset::full(content_len),
            listeners: BTreeSet::new(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn set_style(&mut self, style: StyleConfig) {
        self.style = style;
    }

    pub fn content_len(&self) -> usize {
        self.content_len
    }

    /// The window the renderer currently displays.
    pub fn viewport(&self) -> WindowOffset {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: WindowOffset) {
        tracing::debug!(
            target: "bytelabel::highlight",
            start = viewport.start,
            end = viewport.end,
            "viewport changed"
        );
        self.viewport = viewport;
    }

    /// Nodes covering `region` in the current viewport.
    ///
    /// Empty when the region lies outside what is displayed.
    pub fn resolve<R: WindowBound + Highlightable>(&self, region: &R) -> Vec<V::Node> {
        let range = region.absolute_range();
        if !self.viewport.contains_range(range.start, range.end) {
            tracing::trace!(
                target: "bytelabel::highlight",
                region = %region.id(),
                "region outside viewport"
            );
            return Vec::new();
        }
        resolve_nodes(&self.view, local_range(range, &self.viewport))
    }

    /// Repaint `region` from its flags and sync its click handlers.
    pub fn apply_highlight<R: WindowBound + Highlightable>(&mut self, region: &R) {
        let color = self.style.effective_color(region.color());
        let appearance = Appearance::for_state(region.view_state(), color);
        let nodes = self.resolve(region);

        tracing::trace!(
            target: "bytelabel::highlight",
            region = %region.id(),
            ?appearance,
            nodes = nodes.len(),
            "apply_highlight"
        );

        for node in &nodes {
            let paint = appearance.paint(node.parity(), &self.style);
            if let Err(err) = self.view.paint(node, &paint) {
                log_stale(region.id(), err);
            }
        }

        if appearance.wants_listener() {
            self.bind(region.id(), &nodes);
        } else {
            self.remove_events(region.id());
        }
    }

    /// Attach a click handler to every node of `region`.
    ///
    /// Idempotent. Hidden regions never get handlers.
    pub fn register_events<R: WindowBound + Highlightable>(&mut self, region: &R) {
        if region.view_state().hidden {
            self.remove_events(region.id());
            return;
        }
        let nodes = self.resolve(region);
        self.bind(region.id(), &nodes);
    }

    /// Detach every handler `region` holds.
    pub fn remove_events(&mut self, region: &RegionId) {
        let keys: Vec<NodeKey> = self
            .listeners
            .iter()
            .filter(|(id, _)| id == region)
            .map(|(_, key)| *key)
            .collect();

        for key in keys {
            self.view.detach_click(key, region);
            self.listeners.remove(&(region.clone(), key));
        }
    }

    /// Detach and forget every handler, for all regions.
    ///
    /// Call before repainting after the renderer re-mounted its nodes.
    pub fn reset_listeners(&mut self) {
        for (region, key) in std::mem::take(&mut self.listeners) {
            self.view.detach_click(key, &region);
        }
    }

    /// Number of handlers `region` currently holds.
    pub fn listener_count(&self, region: &RegionId) -> usize {
        self.listeners.iter().filter(|(id, _)| id == region).count()
    }

    fn bind(&mut self, region: &RegionId, nodes: &[V::Node]) {
        for node in nodes {
            let entry = (region.clone(), node.key());
            if self.listeners.contains(&entry) {
                continue;
            }
            match self.view.attach_click(node, region) {
                Ok(()) => {
                    self.listeners.insert(entry);
                }
                Err(err) => log_stale(region, err),
            }
        }
    }
}

fn log_stale(region: &RegionId, err: PlatformError) {
    tracing::warn!(
        target: "bytelabel::highlight",
        region = %region,
        error = %err,
        "skipping byte node"
    );
}

#[cfg(test)]
mod tests {
    use smol_str::SmolStr;

    use super::*;
    use crate::memory::MemoryView;
    use crate::region::{RangeDescriptor, Region};

    const RED: Rgba = Rgba(0xFF0000FF);

    fn reconciler() -> HighlightReconciler<MemoryView> {
        HighlightReconciler::new(MemoryView::mounted(16), StyleConfig::default(), 16)
    }

    fn region(start: usize, end: usize, color: Rgba) -> Region {
        let content: Vec<u8> = (0u8..16).collect();
        Region::new(
            RegionId::new(format!("r-{start}")),
            RangeDescriptor {
                start,
                end,
                area_id: None,
                window_offset: None,
            },
            &content,
            [SmolStr::new("Field")],
            color,
        )
        .unwrap()
    }

    #[test]
    fn test_appearance_table() {
        let hidden = ViewState {
            hidden: true,
            selected: true,
            highlighted: true,
        };
        assert_eq!(Appearance::for_state(hidden, RED), Appearance::Reset);

        let plain = ViewState::default();
        assert_eq!(Appearance::for_state(plain, RED), Appearance::Reset);

        let highlighted = ViewState {
            highlighted: true,
            ..ViewState::default()
        };
        assert_eq!(
            Appearance::for_state(highlighted, RED),
            Appearance::Emphasized {
                color: RED,
                full: false
            }
        );

        let selected = ViewState {
            highlighted: true,
            selected: true,
            ..ViewState::default()
        };
        assert_eq!(
            Appearance::for_state(selected, RED),
            Appearance::Emphasized {
                color: RED,
                full: true
            }
        );
    }

    #[test]
    fn test_paint_values() {
        let style = StyleConfig::default();

        let reset = Appearance::Reset.paint(Parity::Odd, &style);
        assert_eq!(reset.background, style.odd_palette.background);
        assert_eq!(reset.foreground, style.odd_palette.foreground);
        assert_eq!(reset.cursor, Cursor::Default);

        let low = Appearance::Emphasized {
            color: RED,
            full: false,
        }
        .paint(Parity::Even, &style);
        assert_eq!(low.background, Rgba(0xFF00004D));
        assert_eq!(low.foreground, Rgba::WHITE);
        assert_eq!(low.cursor, Cursor::Pointer);
        assert_eq!(low.weight, FontWeight::Normal);

        let full = Appearance::Emphasized {
            color: RED,
            full: true,
        }
        .paint(Parity::Even, &style);
        assert_eq!(full.background, RED);
        assert_eq!(full.weight, FontWeight::Bold);
        assert_eq!(full.cursor, Cursor::Pointer);
    }

    #[test]
    fn test_canvas_color_restores_striping() {
        let style = StyleConfig::default();
        let even = color_paint(style.canvas_background, Parity::Even, 1.0, &style);
        let odd = color_paint(style.canvas_background, Parity::Odd, 1.0, &style);
        assert_eq!(even.background, style.even_palette.background);
        assert_eq!(odd.background, style.odd_palette.background);
        assert_ne!(even.background, odd.background);
    }

    #[test]
    fn test_apply_highlight_paints_and_binds() {
        let mut reconciler = reconciler();
        let mut region = region(2, 5, RED);
        region.set_highlighted(true, &mut reconciler);

        let view = reconciler.view();
        for offset in 2..5 {
            let paint = view.paint_at(offset).unwrap();
            assert_eq!(paint.cursor, Cursor::Pointer);
            assert_eq!(paint.background, Rgba(0xFF00004D));
        }
        assert!(view.paint_at(1).is_none());
        assert!(view.paint_at(5).is_none());
        assert_eq!(view.listeners_for(region.id()), vec![2, 3, 4]);
        assert_eq!(reconciler.listener_count(region.id()), 3);
    }

    #[test]
    fn test_apply_highlight_is_idempotent() {
        let mut reconciler = reconciler();
        let mut region = region(0, 4, RED);
        region.set_highlighted(true, &mut reconciler);
        let first: Vec<_> = (0..4).map(|o| *reconciler.view().paint_at(o).unwrap()).collect();

        reconciler.apply_highlight(&region);
        reconciler.apply_highlight(&region);
        let second: Vec<_> = (0..4).map(|o| *reconciler.view().paint_at(o).unwrap()).collect();

        assert_eq!(first, second);
        assert_eq!(reconciler.view().listener_count(), 4);
    }

    #[test]
    fn test_register_twice_remove_once() {
        let mut reconciler = reconciler();
        let mut region = region(3, 7, RED);
        region.set_highlighted(true, &mut reconciler);

        reconciler.register_events(&region);
        reconciler.register_events(&region);
        assert_eq!(reconciler.view().listener_count(), 4);

        reconciler.remove_events(region.id());
        assert_eq!(reconciler.view().listener_count(), 0);
        assert_eq!(reconciler.listener_count(region.id()), 0);
    }

    #[test]
    fn test_hidden_region_never_binds() {
        let mut reconciler = reconciler();
        let mut region = region(0, 4, RED);
        region.set_highlighted(true, &mut reconciler);
        region.set_hidden(true, &mut reconciler);
        assert_eq!(reconciler.view().listener_count(), 0);

        reconciler.register_events(&region);
        assert_eq!(reconciler.view().listener_count(), 0);

        let paint = reconciler.view().paint_at(0).unwrap();
        assert_eq!(paint.background, reconciler.style().even_palette.background);
        assert_eq!(paint.cursor, Cursor::Default);
    }

    #[test]
    fn test_stale_node_is_skipped() {
        let mut reconciler = reconciler();
        reconciler.view_mut().make_stale(2);
        let mut region = region(1, 4, RED);
        region.set_highlighted(true, &mut reconciler);

        let view = reconciler.view();
        assert!(view.paint_at(1).is_some());
        assert!(view.paint_at(2).is_none());
        assert!(view.paint_at(3).is_some());
        assert_eq!(view.listeners_for(region.id()), vec![1, 3]);
    }

    #[test]
    fn test_unmounted_view_is_noop() {
        let mut reconciler =
            HighlightReconciler::new(MemoryView::default(), StyleConfig::default(), 16);
        let mut region = region(0, 4, RED);
        region.set_highlighted(true, &mut reconciler);
        assert_eq!(reconciler.listener_count(region.id()), 0);
    }

    #[test]
    fn test_region_outside_viewport_is_not_painted() {
        let mut reconciler = reconciler();
        reconciler.set_viewport(WindowOffset::new(8, 16));
        let mut region = region(2, 5, RED);
        region.set_highlighted(true, &mut reconciler);
        assert!(reconciler.view().paint_at(2).is_none());
        assert_eq!(reconciler.view().listener_count(), 0);
    }

    #[test]
    fn test_viewport_offsets_are_local() {
        let mut reconciler =
            HighlightReconciler::new(MemoryView::mounted(8), StyleConfig::default(), 32);
        reconciler.set_viewport(WindowOffset::new(4, 12));
        let content: Vec<u8> = (0u8..32).collect();
        let mut region = Region::new(
            RegionId::new("r-window"),
            RangeDescriptor {
                start: 4,
                end: 8,
                area_id: None,
                window_offset: Some(WindowOffset::new(4, 12)),
            },
            &content,
            [SmolStr::new("Field")],
            RED,
        )
        .unwrap();
        region.set_highlighted(true, &mut reconciler);
        assert_eq!(reconciler.view().listeners_for(region.id()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reset_listeners_after_remount() {
        let mut reconciler = reconciler();
        let mut region = region(0, 2, RED);
        region.set_highlighted(true, &mut reconciler);

        reconciler.view_mut().mount(16);
        assert_eq!(reconciler.view().listener_count(), 0);

        reconciler.reset_listeners();
        reconciler.apply_highlight(&region);
        assert_eq!(reconciler.view().listeners_for(region.id()), vec![0, 1]);
    }

    #[test]
    fn test_highlight_color_override() {
        let style = StyleConfig {
            highlight_color: Some(Rgba(0x00FF00FF)),
            ..StyleConfig::default()
        };
        let mut reconciler = HighlightReconciler::new(MemoryView::mounted(4), style, 4);
        let mut region = region(0, 1, RED);
        region.set_highlighted(true, &mut reconciler);
        region.set_selected(true, &mut reconciler);
        assert_eq!(reconciler.view().paint_at(0).unwrap().background, Rgba(0x00FF00FF));
    }
}
