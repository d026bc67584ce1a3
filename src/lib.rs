//! chart-scene: a document model for interactive plots.
//!
//! Plots are built as a graph of typed models (data sources, views, ranges,
//! glyph renderers, axes and tools) owned by a [`Document`]. The document
//! resolves auto-fitting ranges from the plotted data, renders plots into
//! backend-agnostic [`render::RenderFrame`]s and keeps remote replicas in
//! sync through a JSON snapshot plus incremental patch protocol.

pub mod core;
pub mod document;
pub mod error;
pub mod render;
pub mod telemetry;

pub use document::{Document, DocumentConfig, SharedDocument};
pub use error::{SceneError, SceneResult};
