//! Named defaults and factories used when a plot omits ranges, axes or tools.

use crate::core::plot::{Axis, AxisKind, ScaleKind, Tool, ToolKind};
use crate::core::range::DataRange1d;

pub const DEFAULT_PLOT_WIDTH: u32 = 600;
pub const DEFAULT_PLOT_HEIGHT: u32 = 600;
pub const DEFAULT_ID_PREFIX: &str = "p";
pub const DEFAULT_ID_START: u64 = 1001;

pub const DEFAULT_TOOLS: &[ToolKind] = &[
    ToolKind::Pan,
    ToolKind::WheelZoom,
    ToolKind::BoxZoom,
    ToolKind::Reset,
    ToolKind::Save,
];

/// Range created for a plot dimension without one.
#[must_use]
pub fn default_range() -> DataRange1d {
    DataRange1d::default()
}

/// Axis matching the kind of range and scale it annotates.
#[must_use]
pub fn default_axis(categorical: bool, scale: ScaleKind) -> Axis {
    let kind = match (categorical, scale) {
        (true, _) => AxisKind::Categorical,
        (false, ScaleKind::Log) => AxisKind::Log,
        (false, ScaleKind::Linear) => AxisKind::Linear,
    };
    Axis::new(kind)
}

#[must_use]
pub fn default_tools(kinds: &[ToolKind]) -> Vec<Tool> {
    kinds.iter().copied().map(Tool::new).collect()
}
