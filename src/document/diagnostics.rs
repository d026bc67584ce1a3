use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::{Filter, ModelId};
use crate::document::{Document, Model};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    MissingRenderers,
    DuplicateFactors,
    BadColumnName,
    ViewLengthMismatch,
    MissingRange,
    EmptyFactorRange,
}

impl DiagnosticCode {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingRenderers => "W-1000",
            Self::DuplicateFactors => "E-1001",
            Self::BadColumnName => "E-1002",
            Self::ViewLengthMismatch => "E-1003",
            Self::MissingRange => "E-1004",
            Self::EmptyFactorRange => "W-1005",
        }
    }

    #[must_use]
    pub const fn level(self) -> DiagnosticLevel {
        match self {
            Self::MissingRenderers | Self::EmptyFactorRange => DiagnosticLevel::Warning,
            Self::DuplicateFactors
            | Self::BadColumnName
            | Self::ViewLengthMismatch
            | Self::MissingRange => DiagnosticLevel::Error,
        }
    }
}

/// A reported, non-fatal problem with the document graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: DiagnosticCode,
    pub model: ModelId,
    pub message: String,
}

impl Diagnostic {
    fn new(code: DiagnosticCode, model: &ModelId, message: String) -> Self {
        Self {
            level: code.level(),
            code,
            model: model.clone(),
            message,
        }
    }
}

impl Document {
    /// Checks the graph for problems that do not block rendering.
    #[must_use]
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for entry in self.models.values() {
            match &entry.body {
                Model::Plot(plot) => {
                    if plot.renderers.is_empty() {
                        found.push(Diagnostic::new(
                            DiagnosticCode::MissingRenderers,
                            &entry.id,
                            "plot has no renderers".to_owned(),
                        ));
                    }
                    for (dimension, range) in [("x_range", &plot.x_range), ("y_range", &plot.y_range)] {
                        if range.is_none() {
                            found.push(Diagnostic::new(
                                DiagnosticCode::MissingRange,
                                &entry.id,
                                format!("plot has no {dimension}"),
                            ));
                        }
                    }
                    for renderer_id in &plot.renderers {
                        let Some(renderer) = self.renderer(renderer_id) else {
                            continue;
                        };
                        for (horizontal, name) in
                            [(true, &renderer.x_range_name), (false, &renderer.y_range_name)]
                        {
                            if plot.range_named(horizontal, name).is_none() {
                                found.push(Diagnostic::new(
                                    DiagnosticCode::MissingRange,
                                    renderer_id,
                                    format!("range `{name}` is not defined on plot {}", entry.id),
                                ));
                            }
                        }
                    }
                }
                Model::FactorRange(range) => {
                    if range.factors.is_empty() {
                        if self.derive_factors(&entry.id, &mut HashSet::new()).is_empty() {
                            found.push(Diagnostic::new(
                                DiagnosticCode::EmptyFactorRange,
                                &entry.id,
                                "factor range has no factors and none can be derived".to_owned(),
                            ));
                        }
                    } else {
                        let mapping = range.mapping();
                        if !mapping.duplicates().is_empty() {
                            found.push(Diagnostic::new(
                                DiagnosticCode::DuplicateFactors,
                                &entry.id,
                                format!("duplicate factors: {:?}", mapping.duplicates()),
                            ));
                        }
                    }
                }
                Model::GlyphRenderer(_) => self.check_renderer(&entry.id, &mut found),
                _ => {}
            }
        }
        found
    }

    fn check_renderer(&self, id: &ModelId, found: &mut Vec<Diagnostic>) {
        let Some(renderer) = self.renderer(id) else {
            return;
        };
        let Some(source) = self.source(&renderer.data_source) else {
            return;
        };
        if let Some(glyph) = self.glyph(&renderer.glyph) {
            for field in glyph.fields() {
                if source.column(field).is_none() {
                    found.push(Diagnostic::new(
                        DiagnosticCode::BadColumnName,
                        id,
                        format!(
                            "glyph reads column `{field}` missing from {} (columns: [{}])",
                            renderer.data_source,
                            source.column_names().join(", ")
                        ),
                    ));
                }
            }
        }

        let Some(view) = renderer
            .view
            .as_ref()
            .and_then(|view_id| self.models.get(view_id))
            .and_then(|entry| entry.body.as_view())
        else {
            return;
        };
        if let Some(view_source) = &view.source {
            if *view_source != renderer.data_source {
                found.push(Diagnostic::new(
                    DiagnosticCode::ViewLengthMismatch,
                    id,
                    format!(
                        "view is bound to {view_source} but the renderer draws {}",
                        renderer.data_source
                    ),
                ));
            }
        }
        for filter_id in &view.filters {
            if let Some(Filter::Boolean { booleans }) = self
                .models
                .get(filter_id)
                .and_then(|entry| entry.body.as_filter())
            {
                if booleans.len() != source.row_count() {
                    found.push(Diagnostic::new(
                        DiagnosticCode::ViewLengthMismatch,
                        filter_id,
                        format!(
                            "boolean filter has {} entries but the source has {} rows",
                            booleans.len(),
                            source.row_count()
                        ),
                    ));
                }
            }
        }
    }
}
