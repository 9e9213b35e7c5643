//! bytelabel-core: byte-range annotation logic without framework dependencies.
//!
//! This crate provides:
//! - `Region` - one labeled byte range, with its persisted `RegionRecord`
//! - `HighlightReconciler` - paints regions and manages their click handlers
//! - `RegionRegistry` - region list, current region and host store binding
//! - `SelectionWorkflow` - area selection, then labeling within the area
//! - `ViewBinding` / `AnnotationHost` - the renderer and store seams
//! - `MemoryView` / `MemoryHost` - in-memory implementations of both

pub mod color;
pub mod config;
pub mod error;
pub mod highlight;
pub mod memory;
pub mod offset_map;
pub mod platform;
pub mod region;
pub mod registry;
pub mod types;
pub mod workflow;

pub use color::Rgba;
pub use config::{Palette, StyleConfig, WorkflowOptions};
pub use error::{AnnotationError, ConfigError, PlatformError};
pub use highlight::{Appearance, HighlightReconciler};
pub use memory::{MemoryHost, MemoryNode, MemoryView};
pub use offset_map::{absolute_range, local_range, resolve_nodes};
pub use platform::{
    AnnotationHost, ByteNode, Cursor, FontWeight, LabelControl, NodeKey, NodePaint, Parity,
    ViewBinding,
};
pub use region::{
    Highlightable, RangeDescriptor, Region, RegionRecord, RegionValue, Serializable, ViewState,
    WindowBound,
};
pub use registry::RegionRegistry;
pub use smol_str::SmolStr;
pub use types::{AreaId, LocalRange, RegionId, SelectionMarkers, WindowOffset};
pub use workflow::{Area, BackOutcome, SelectionWorkflow, WorkflowState};
