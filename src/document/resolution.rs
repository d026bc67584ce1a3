//! Lazy range and view resolution with dependency-tracked caches.
//!
//! A resolved value stays valid until one of the models it was computed
//! from changes. Each cache entry records those models; any mutation of one
//! of them drops the entry and the next read recomputes it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexSet;
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::core::glyph::CoordinateSpec;
use crate::core::property::ModelCategory;
use crate::core::{
    Column, ColumnDataSource, DataRange1d, DataSpec, Dimension, Extent, Factor, FactorMapping,
    FactorRange, Glyph, GlyphRenderer, ModelId, RendererSelection, ResolvedRange,
};
use crate::document::{Document, Model};
use crate::error::{SceneError, SceneResult};

#[derive(Debug)]
struct Cached<T> {
    value: T,
    deps: HashSet<ModelId>,
}

#[derive(Debug, Default)]
pub(crate) struct ResolutionCache {
    ranges: HashMap<ModelId, Cached<Option<ResolvedRange>>>,
    views: HashMap<ModelId, Cached<Arc<[usize]>>>,
}

impl ResolutionCache {
    /// Drops every entry computed from `changed`.
    pub(crate) fn invalidate(&mut self, changed: &ModelId) {
        self.ranges.retain(|_, cached| !cached.deps.contains(changed));
        self.views.retain(|_, cached| !cached.deps.contains(changed));
    }

    pub(crate) fn clear(&mut self) {
        self.ranges.clear();
        self.views.clear();
    }

    fn is_cached(&self, id: &ModelId) -> bool {
        self.ranges.contains_key(id) || self.views.contains_key(id)
    }
}

pub(crate) fn wrong_kind(id: &ModelId, expected: ModelCategory, actual: ModelCategory) -> SceneError {
    SceneError::WrongModelKind {
        id: id.clone(),
        expected: expected.label(),
        actual: actual.label(),
    }
}

impl Document {
    /// Effective extent of a range.
    ///
    /// `Range1d` returns its fields. `DataRange1d` and `FactorRange` are
    /// recomputed from their data on first read after a dependency changed.
    /// `Ok(None)` means an auto range has no data to fit yet.
    pub fn resolve_range(&mut self, id: &ModelId) -> SceneResult<Option<ResolvedRange>> {
        match &self.entry(id)?.body {
            Model::Range1d(range) => {
                return Ok(Some(ResolvedRange::Continuous {
                    start: range.start,
                    end: range.end,
                }));
            }
            Model::DataRange1d(_) | Model::FactorRange(_) => {}
            other => return Err(wrong_kind(id, ModelCategory::Range, other.category())),
        }
        if let Some(cached) = self.cache.ranges.get(id) {
            return Ok(cached.value.clone());
        }
        if !self.recomputing.insert(id.clone()) {
            warn!(range = %id, "range recomputation re-entered; leaving extent unset");
            return Ok(None);
        }

        let mut deps = HashSet::new();
        let resolved = self.compute_range(id, &mut deps);
        self.recomputing.remove(id);
        let resolved = resolved?;
        deps.insert(id.clone());
        trace!(range = %id, deps = deps.len(), resolved = ?resolved, "range resolved");
        self.cache.ranges.insert(
            id.clone(),
            Cached {
                value: resolved.clone(),
                deps,
            },
        );
        Ok(resolved)
    }

    /// Whether a resolved value for `id` is currently cached.
    #[must_use]
    pub fn is_resolved(&self, id: &ModelId) -> bool {
        self.cache.is_cached(id)
    }

    /// Drops every cached range and view.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Rows a renderer draws, in view order.
    pub fn view_indices(&mut self, renderer_id: &ModelId) -> SceneResult<Arc<[usize]>> {
        if let Some(cached) = self.cache.views.get(renderer_id) {
            return Ok(Arc::clone(&cached.value));
        }
        let mut deps = HashSet::from([renderer_id.clone()]);
        let rows: Arc<[usize]> = {
            let renderer = self.renderer_entry(renderer_id)?;
            let source = self.source_entry(&renderer.data_source)?;
            deps.insert(renderer.data_source.clone());
            self.rows_for(renderer, source, &mut deps).into()
        };
        self.cache.views.insert(
            renderer_id.clone(),
            Cached {
                value: Arc::clone(&rows),
                deps,
            },
        );
        Ok(rows)
    }

    fn compute_range(
        &self,
        id: &ModelId,
        deps: &mut HashSet<ModelId>,
    ) -> SceneResult<Option<ResolvedRange>> {
        match &self.entry(id)?.body {
            Model::DataRange1d(range) => {
                let extent = self.data_extent(id, range, deps);
                Ok(range
                    .compute(extent)
                    .map(|(start, end)| ResolvedRange::Continuous { start, end }))
            }
            Model::FactorRange(range) => Ok(self.factor_mapping(id, range, deps).map(|mapping| {
                ResolvedRange::Categorical(Arc::new(mapping))
            })),
            other => Err(wrong_kind(id, ModelCategory::Range, other.category())),
        }
    }

    /// Combined finite extent of everything a data range scans.
    fn data_extent(
        &self,
        id: &ModelId,
        range: &DataRange1d,
        deps: &mut HashSet<ModelId>,
    ) -> Option<Extent> {
        let mut extent = None;
        for (renderer_id, dimension) in
            self.renderer_scope(id, &range.renderers, range.only_visible, deps)
        {
            extent = Extent::merge_option(extent, self.renderer_extent(&renderer_id, dimension, deps));
        }
        for source_id in &range.sources {
            deps.insert(source_id.clone());
            let Some(source) = self.source(source_id) else {
                warn!(range = %id, source = %source_id, "range references a missing source; skipping");
                continue;
            };
            let source_extent = source
                .data()
                .values()
                .map(Column::finite_extent)
                .fold(None, Extent::merge_option);
            extent = Extent::merge_option(extent, source_extent);
        }
        extent
    }

    /// Factors of a categorical range: explicit ones, or those found in the
    /// plotted data in first-appearance order.
    fn factor_mapping(
        &self,
        id: &ModelId,
        range: &FactorRange,
        deps: &mut HashSet<ModelId>,
    ) -> Option<FactorMapping> {
        if !range.factors.is_empty() {
            return Some(range.mapping());
        }
        let factors = self.derive_factors(id, deps);
        if factors.is_empty() {
            return None;
        }
        Some(FactorMapping::build(&factors, range))
    }

    pub(crate) fn derive_factors(&self, id: &ModelId, deps: &mut HashSet<ModelId>) -> Vec<Factor> {
        let mut found: IndexSet<Factor> = IndexSet::new();
        for (renderer_id, dimension) in
            self.renderer_scope(id, &RendererSelection::Auto, false, deps)
        {
            let Some((renderer, source, glyph)) = self.renderer_parts(&renderer_id, deps) else {
                continue;
            };
            let rows = self.rows_for(renderer, source, deps);
            for spec in glyph.coordinate_specs(dimension) {
                let Some(column) = spec.spec.field_name().and_then(|name| source.column(name))
                else {
                    continue;
                };
                for row in rows.iter().copied() {
                    if let Some(factor) = factor_at(column, row) {
                        found.insert(factor);
                    }
                }
            }
        }

        let mut factors: Vec<Factor> = found.into_iter().collect();
        if let Some(level) = factors.first().map(Factor::level) {
            let before = factors.len();
            factors.retain(|factor| factor.level() == level);
            if factors.len() != before {
                warn!(
                    range = %id,
                    dropped = before - factors.len(),
                    "derived factors with mixed nesting levels; keeping the first level"
                );
            }
        }
        factors
    }

    /// Renderers feeding range `id`, each with the dimension it feeds.
    ///
    /// `Auto` takes every renderer of every plot using the range whose
    /// range name matches. Explicit renderers feed every dimension the range
    /// is used in, or x when no plot uses it yet.
    fn renderer_scope(
        &self,
        id: &ModelId,
        selection: &RendererSelection,
        only_visible: bool,
        deps: &mut HashSet<ModelId>,
    ) -> Vec<(ModelId, Dimension)> {
        let mut scope = Vec::new();
        let mut used: SmallVec<[Dimension; 2]> = SmallVec::new();
        for entry in self.models.values() {
            let Some(plot) = entry.body.as_plot() else {
                continue;
            };
            for (horizontal, dimension) in [(true, Dimension::X), (false, Dimension::Y)] {
                let Some(name) = plot.range_name_of(horizontal, id) else {
                    continue;
                };
                deps.insert(entry.id.clone());
                if !used.contains(&dimension) {
                    used.push(dimension);
                }
                if *selection != RendererSelection::Auto {
                    continue;
                }
                for renderer_id in &plot.renderers {
                    deps.insert(renderer_id.clone());
                    let Some(renderer) = self.renderer(renderer_id) else {
                        continue;
                    };
                    let range_name = if horizontal {
                        &renderer.x_range_name
                    } else {
                        &renderer.y_range_name
                    };
                    if range_name != name || (only_visible && !renderer.visible) {
                        continue;
                    }
                    scope.push((renderer_id.clone(), dimension));
                }
            }
        }

        if let RendererSelection::Explicit(ids) = selection {
            if used.is_empty() {
                used.push(Dimension::X);
            }
            for renderer_id in ids {
                deps.insert(renderer_id.clone());
                if only_visible && self.renderer(renderer_id).is_some_and(|r| !r.visible) {
                    continue;
                }
                scope.extend(used.iter().map(|dimension| (renderer_id.clone(), *dimension)));
            }
        }
        scope
    }

    fn renderer_extent(
        &self,
        renderer_id: &ModelId,
        dimension: Dimension,
        deps: &mut HashSet<ModelId>,
    ) -> Option<Extent> {
        let (renderer, source, glyph) = self.renderer_parts(renderer_id, deps)?;
        let rows = self.rows_for(renderer, source, deps);
        glyph
            .coordinate_specs(dimension)
            .iter()
            .map(|spec| spec_extent(spec, source, &rows))
            .fold(None, Extent::merge_option)
    }

    /// Renderer with its source and glyph. Missing pieces degrade to no
    /// contribution.
    fn renderer_parts(
        &self,
        renderer_id: &ModelId,
        deps: &mut HashSet<ModelId>,
    ) -> Option<(&GlyphRenderer, &ColumnDataSource, &Glyph)> {
        deps.insert(renderer_id.clone());
        let Some(renderer) = self.renderer(renderer_id) else {
            warn!(renderer = %renderer_id, "range references a missing renderer; skipping");
            return None;
        };
        deps.insert(renderer.data_source.clone());
        deps.insert(renderer.glyph.clone());
        let Some(source) = self.source(&renderer.data_source) else {
            warn!(renderer = %renderer_id, source = %renderer.data_source, "renderer source is missing; skipping");
            return None;
        };
        let Some(glyph) = self.glyph(&renderer.glyph) else {
            warn!(renderer = %renderer_id, glyph = %renderer.glyph, "renderer glyph is missing; skipping");
            return None;
        };
        Some((renderer, source, glyph))
    }

    /// Rows selected by the renderer's view, or every row without one.
    pub(crate) fn rows_for(
        &self,
        renderer: &GlyphRenderer,
        source: &ColumnDataSource,
        deps: &mut HashSet<ModelId>,
    ) -> Vec<usize> {
        let Some(view_id) = &renderer.view else {
            return (0..source.row_count()).collect();
        };
        deps.extend(self.references(std::slice::from_ref(view_id)));
        match self.models.get(view_id).and_then(|entry| entry.body.as_view()) {
            Some(view) => view.compute_indices(source, self),
            None => {
                warn!(view = %view_id, "renderer view is missing; drawing every row");
                (0..source.row_count()).collect()
            }
        }
    }

    pub(crate) fn renderer(&self, id: &ModelId) -> Option<&GlyphRenderer> {
        self.models.get(id).and_then(|entry| entry.body.as_renderer())
    }

    pub(crate) fn source(&self, id: &ModelId) -> Option<&ColumnDataSource> {
        self.models.get(id).and_then(|entry| entry.body.as_source())
    }

    pub(crate) fn glyph(&self, id: &ModelId) -> Option<&Glyph> {
        self.models.get(id).and_then(|entry| entry.body.as_glyph())
    }

    pub(crate) fn renderer_entry(&self, id: &ModelId) -> SceneResult<&GlyphRenderer> {
        let entry = self.entry(id)?;
        entry
            .body
            .as_renderer()
            .ok_or_else(|| wrong_kind(id, ModelCategory::Renderer, entry.body.category()))
    }

    pub(crate) fn source_entry(&self, id: &ModelId) -> SceneResult<&ColumnDataSource> {
        let entry = self.entry(id)?;
        entry
            .body
            .as_source()
            .ok_or_else(|| wrong_kind(id, ModelCategory::DataSource, entry.body.category()))
    }
}

/// Extent of one coordinate spec over `rows`, widened by half the paired
/// width or height where the glyph has one.
fn spec_extent(spec: &CoordinateSpec<'_>, source: &ColumnDataSource, rows: &[usize]) -> Option<Extent> {
    let half_extent = |row: usize| match spec.extent {
        Some(DataSpec::Value(width)) => width / 2.0,
        Some(DataSpec::Field(name)) => source
            .column(name)
            .and_then(|column| column.number(row))
            .map_or(0.0, |width| width / 2.0),
        None => 0.0,
    };
    match spec.spec {
        DataSpec::Value(value) => Extent::of(*value).map(|extent| extent.widened(half_extent(0))),
        DataSpec::Field(name) => match source.column(name)? {
            Column::Numbers(values) => rows
                .iter()
                .filter_map(|&row| {
                    let extent = Extent::of(*values.get(row)?)?;
                    Some(extent.widened(half_extent(row)))
                })
                .reduce(Extent::merge),
            Column::NumberLists(lists) => rows
                .iter()
                .filter_map(|&row| lists.get(row))
                .map(|values| Extent::scan(values))
                .fold(None, Extent::merge_option),
            Column::Strings(_) | Column::StringLists(_) => None,
        },
    }
}

fn factor_at(column: &Column, row: usize) -> Option<Factor> {
    match column {
        Column::Strings(values) => values.get(row).map(|value| Factor::L1(value.clone())),
        Column::StringLists(values) => match values.get(row)?.as_slice() {
            [a] => Some(Factor::L1(a.clone())),
            [a, b] => Some(Factor::L2(a.clone(), b.clone())),
            [a, b, c] => Some(Factor::L3(a.clone(), b.clone(), c.clone())),
            _ => None,
        },
        Column::Numbers(_) | Column::NumberLists(_) => None,
    }
}
