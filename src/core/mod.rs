pub mod defaults;
pub mod glyph;
pub mod id;
pub mod plot;
pub mod primitives;
pub mod property;
pub mod range;
pub mod renderer;
pub mod scale;
pub mod source;
pub mod value;
pub mod view;

pub use glyph::{DataSpec, Dimension, FillProps, Glyph, HasFillProps, HasLineProps, LineProps};
pub use id::{IdAllocator, ModelId};
pub use plot::{Axis, AxisKind, Plot, ScaleKind, Tool, ToolKind};
pub use primitives::Extent;
pub use property::{ModelArgs, ModelCategory, PropertyContainer, PropertyDescriptor, PropertyKind};
pub use range::{
    Bounds, DataRange1d, Factor, FactorMapping, FactorRange, Follow, PaddingUnits, Range1d,
    RendererSelection, ResolvedRange, ScaleHint,
};
pub use renderer::{GlyphRenderer, RenderState, StateGlyph};
pub use scale::{AxisScale, LinearScale, LogScale};
pub use source::{Column, ColumnData, ColumnDataSource, ColumnPatch, ColumnPatches, PatchTarget};
pub use value::PropertyValue;
pub use view::{CdsView, Filter, FilterResolver, SetOperation};
