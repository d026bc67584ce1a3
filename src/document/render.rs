use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::core::glyph::{FillVisuals, LineVisuals, resolve_fill, resolve_line};
use crate::core::property::ModelCategory;
use crate::core::{
    AxisScale, ColumnDataSource, DataSpec, Glyph, GlyphRenderer, ModelId, Plot, PropertyValue,
    RenderState, ResolvedRange, StateGlyph,
};
use crate::document::Document;
use crate::document::resolution::wrong_kind;
use crate::error::{SceneError, SceneResult};
use crate::render::{
    Canvas, Color, LinePrimitive, MarkerPrimitive, PolygonPrimitive, RectPrimitive, RenderFrame, Stroke,
    TextHAlign, TextPrimitive,
};

const TITLE_FONT_SIZE_PX: f64 = 13.0;
const AXIS_COLOR: Color = Color::rgb(0.0, 0.0, 0.0);
const AXIS_STROKE_WIDTH: f64 = 1.0;

/// Data-to-pixel mapping for one renderer.
struct Layer {
    x_range: ResolvedRange,
    y_range: ResolvedRange,
    x_scale: AxisScale,
    y_scale: AxisScale,
    width: f64,
    height: f64,
}

impl Layer {
    fn px(&self, x: f64) -> f64 {
        self.x_scale.map(x, self.width)
    }

    /// Pixel rows grow downwards.
    fn py(&self, y: f64) -> f64 {
        self.height - self.y_scale.map(y, self.height)
    }

    fn x_data(&self, value: &PropertyValue) -> f64 {
        self.x_range.synthetic(value)
    }

    fn y_data(&self, value: &PropertyValue) -> f64 {
        self.y_range.synthetic(value)
    }

    fn point(&self, x: &PropertyValue, y: &PropertyValue) -> (f64, f64) {
        (self.px(self.x_data(x)), self.py(self.y_data(y)))
    }
}

struct Style {
    line: LineVisuals,
    fill: Option<FillVisuals>,
}

impl Style {
    fn stroke(&self) -> Option<Stroke> {
        (self.line.width > 0.0).then(|| Stroke::new(self.line.color, self.line.width))
    }

    fn fill(&self) -> Option<Color> {
        self.fill.map(|fill| fill.color)
    }
}

impl Document {
    /// Resolves every range the plot's renderers use and emits the plot as
    /// pixel-space primitives.
    ///
    /// Renderers whose ranges have no extent yet, or whose range name is not
    /// defined on the plot, are skipped.
    pub fn render_plot(&mut self, plot_id: &ModelId) -> SceneResult<RenderFrame> {
        let plot = self.plot_entry(plot_id)?.clone();
        let width = f64::from(plot.width);
        let height = f64::from(plot.height);
        let mut frame = RenderFrame::new(Canvas::new(plot.width, plot.height));

        for renderer_id in &plot.renderers {
            let Some(renderer) = self.renderer(renderer_id).cloned() else {
                warn!(plot = %plot_id, renderer = %renderer_id, "plot lists a missing renderer");
                continue;
            };
            if !renderer.visible {
                continue;
            }
            let Some(layer) = self.layer_for(&plot, &renderer, width, height)? else {
                trace!(renderer = %renderer_id, "renderer skipped: ranges unresolved");
                continue;
            };
            let rows = self.view_indices(renderer_id)?;
            self.draw_renderer(&mut frame, &renderer, &rows, &layer)?;
        }

        for _ in &plot.below {
            frame.lines.push(LinePrimitive::new(
                0.0,
                height,
                width,
                height,
                AXIS_STROKE_WIDTH,
                AXIS_COLOR,
            ));
        }
        for _ in &plot.left {
            frame.lines.push(LinePrimitive::new(
                0.0,
                0.0,
                0.0,
                height,
                AXIS_STROKE_WIDTH,
                AXIS_COLOR,
            ));
        }
        if let Some(title) = plot.title.as_deref().filter(|title| !title.is_empty()) {
            frame.texts.push(TextPrimitive::new(
                title,
                frame.canvas.center_x(),
                TITLE_FONT_SIZE_PX,
                TITLE_FONT_SIZE_PX,
                AXIS_COLOR,
                TextHAlign::Center,
            ));
        }

        debug!(
            plot = %plot_id,
            primitives = frame.primitive_count(),
            "plot rendered"
        );
        Ok(frame)
    }

    fn plot_entry(&self, id: &ModelId) -> SceneResult<&Plot> {
        let entry = self.entry(id)?;
        entry
            .body
            .as_plot()
            .ok_or_else(|| wrong_kind(id, ModelCategory::Plot, entry.body.category()))
    }

    fn layer_for(
        &mut self,
        plot: &Plot,
        renderer: &GlyphRenderer,
        width: f64,
        height: f64,
    ) -> SceneResult<Option<Layer>> {
        let (Some(x_id), Some(y_id)) = (
            plot.range_named(true, &renderer.x_range_name),
            plot.range_named(false, &renderer.y_range_name),
        ) else {
            warn!(
                x_range = %renderer.x_range_name,
                y_range = %renderer.y_range_name,
                "renderer range name is not defined on its plot"
            );
            return Ok(None);
        };
        let (Some(x_range), Some(y_range)) = (self.resolve_range(x_id)?, self.resolve_range(y_id)?)
        else {
            return Ok(None);
        };
        let scales = AxisScale::new(plot.x_scale, x_range.start(), x_range.end()).and_then(|x| {
            AxisScale::new(plot.y_scale, y_range.start(), y_range.end()).map(|y| (x, y))
        });
        let (x_scale, y_scale) = match scales {
            Ok(scales) => scales,
            Err(err) => {
                warn!(error = %err, "renderer skipped: degenerate scale domain");
                return Ok(None);
            }
        };
        Ok(Some(Layer {
            x_range,
            y_range,
            x_scale,
            y_scale,
            width,
            height,
        }))
    }

    fn draw_renderer(
        &self,
        frame: &mut RenderFrame,
        renderer: &GlyphRenderer,
        rows: &[usize],
        layer: &Layer,
    ) -> SceneResult<()> {
        let source = self.source_entry(&renderer.data_source)?;
        let base = self
            .glyph(&renderer.glyph)
            .ok_or_else(|| SceneError::UnknownModel(renderer.glyph.clone()))?;

        let selected: HashSet<usize> = source.selected().iter().copied().collect();
        let groups: Vec<(RenderState, Vec<usize>)> = if renderer.muted {
            vec![(RenderState::Muted, rows.to_vec())]
        } else if selected.is_empty() || base.is_connected() {
            vec![(RenderState::Normal, rows.to_vec())]
        } else {
            let (chosen, others): (Vec<usize>, Vec<usize>) =
                rows.iter().copied().partition(|row| selected.contains(row));
            vec![
                (RenderState::Nonselected, others),
                (RenderState::Selected, chosen),
            ]
        };

        for (state, rows) in groups {
            if rows.is_empty() {
                continue;
            }
            let glyph = self.glyph_for_state(renderer, base, state);
            let style = Style {
                line: resolve_line(&glyph, base)?,
                fill: resolve_fill(&glyph, base)?,
            };
            draw_glyph(frame, &glyph, source, &rows, layer, &style);
        }
        Ok(())
    }

    fn glyph_for_state(&self, renderer: &GlyphRenderer, base: &Glyph, state: RenderState) -> Glyph {
        match renderer.state_glyph(state) {
            None | Some(StateGlyph::Disabled) => base.clone(),
            Some(StateGlyph::Auto) => base.faded(base, GlyphRenderer::auto_alpha(state)),
            Some(StateGlyph::Explicit(id)) => self.glyph(id).cloned().unwrap_or_else(|| {
                warn!(glyph = %id, "state glyph is missing; using the base glyph");
                base.clone()
            }),
        }
    }
}

fn value_at(spec: &DataSpec, source: &ColumnDataSource, row: usize) -> PropertyValue {
    match spec {
        DataSpec::Field(name) => source
            .column(name)
            .and_then(|column| column.value(row))
            .unwrap_or(PropertyValue::Null),
        DataSpec::Value(value) => PropertyValue::Number(*value),
    }
}

fn number_at(spec: &DataSpec, source: &ColumnDataSource, row: usize) -> f64 {
    match spec {
        DataSpec::Field(name) => source
            .column(name)
            .and_then(|column| column.number(row))
            .unwrap_or(f64::NAN),
        DataSpec::Value(value) => *value,
    }
}

fn list_at<'a>(spec: &DataSpec, source: &'a ColumnDataSource, row: usize) -> &'a [f64] {
    spec.field_name()
        .and_then(|name| source.column(name))
        .and_then(|column| column.number_list(row))
        .unwrap_or(&[])
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

/// Segments between consecutive points; a non-finite point breaks the line.
fn push_polyline(frame: &mut RenderFrame, points: &[(f64, f64)], style: &Style) {
    if style.line.width <= 0.0 {
        return;
    }
    for pair in points.windows(2) {
        let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
        if all_finite(&[x1, y1, x2, y2]) {
            frame.lines.push(LinePrimitive::new(
                x1,
                y1,
                x2,
                y2,
                style.line.width,
                style.line.color,
            ));
        }
    }
}

fn push_rect(frame: &mut RenderFrame, layer: &Layer, corners: [f64; 4], style: &Style) {
    let [left, bottom, right, top] = corners;
    let (x1, y1, x2, y2) = (layer.px(left), layer.py(bottom), layer.px(right), layer.py(top));
    if all_finite(&[x1, y1, x2, y2]) {
        frame.rects.push(
            RectPrimitive::from_corners(x1, y1, x2, y2).styled(style.fill(), style.stroke()),
        );
    }
}

fn draw_glyph(
    frame: &mut RenderFrame,
    glyph: &Glyph,
    source: &ColumnDataSource,
    rows: &[usize],
    layer: &Layer,
    style: &Style,
) {
    match glyph {
        Glyph::Scatter(scatter) => {
            for &row in rows {
                let (x, y) = layer.point(
                    &value_at(&scatter.x, source, row),
                    &value_at(&scatter.y, source, row),
                );
                let size = number_at(&scatter.size, source, row);
                if all_finite(&[x, y, size]) && size >= 0.0 {
                    frame.markers.push(MarkerPrimitive {
                        x,
                        y,
                        size,
                        marker: scatter.marker,
                        fill: style.fill(),
                        stroke: style.stroke(),
                    });
                }
            }
        }
        Glyph::Line(line) => {
            let points: Vec<(f64, f64)> = rows
                .iter()
                .map(|&row| {
                    layer.point(&value_at(&line.x, source, row), &value_at(&line.y, source, row))
                })
                .collect();
            push_polyline(frame, &points, style);
        }
        Glyph::MultiLine(multi) => {
            for &row in rows {
                let points: Vec<(f64, f64)> = list_at(&multi.xs, source, row)
                    .iter()
                    .zip(list_at(&multi.ys, source, row))
                    .map(|(x, y)| (layer.px(*x), layer.py(*y)))
                    .collect();
                push_polyline(frame, &points, style);
            }
        }
        Glyph::Patch(patch) => {
            let points: Vec<(f64, f64)> = rows
                .iter()
                .map(|&row| {
                    layer.point(&value_at(&patch.x, source, row), &value_at(&patch.y, source, row))
                })
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect();
            if points.len() >= 3 {
                frame.polygons.push(PolygonPrimitive {
                    points,
                    fill: style.fill(),
                    stroke: style.stroke(),
                });
            }
        }
        Glyph::Rect(rect) => {
            for &row in rows {
                let x = layer.x_data(&value_at(&rect.x, source, row));
                let y = layer.y_data(&value_at(&rect.y, source, row));
                let half_width = number_at(&rect.width, source, row) / 2.0;
                let half_height = number_at(&rect.height, source, row) / 2.0;
                push_rect(
                    frame,
                    layer,
                    [x - half_width, y - half_height, x + half_width, y + half_height],
                    style,
                );
            }
        }
        Glyph::VBar(bar) => {
            for &row in rows {
                let x = layer.x_data(&value_at(&bar.x, source, row));
                let half_width = number_at(&bar.width, source, row) / 2.0;
                let bottom = layer.y_data(&value_at(&bar.bottom, source, row));
                let top = layer.y_data(&value_at(&bar.top, source, row));
                push_rect(frame, layer, [x - half_width, bottom, x + half_width, top], style);
            }
        }
        Glyph::HBar(bar) => {
            for &row in rows {
                let y = layer.y_data(&value_at(&bar.y, source, row));
                let half_height = number_at(&bar.height, source, row) / 2.0;
                let left = layer.x_data(&value_at(&bar.left, source, row));
                let right = layer.x_data(&value_at(&bar.right, source, row));
                push_rect(frame, layer, [left, y - half_height, right, y + half_height], style);
            }
        }
        Glyph::Quad(quad) => {
            for &row in rows {
                let left = layer.x_data(&value_at(&quad.left, source, row));
                let right = layer.x_data(&value_at(&quad.right, source, row));
                let bottom = layer.y_data(&value_at(&quad.bottom, source, row));
                let top = layer.y_data(&value_at(&quad.top, source, row));
                push_rect(frame, layer, [left, bottom, right, top], style);
            }
        }
    }
}
