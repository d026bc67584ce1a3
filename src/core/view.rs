//! Row views over a data source.
//!
//! A view is the AND of its filters. Each filter is a pure function of the
//! source producing a boolean row mask; set-algebra filters combine the masks
//! of operand filters referenced by id.

use tracing::warn;

use crate::core::property::{
    PropertyContainer, PropertyDescriptor, PropertyKind, unknown_property,
};
use crate::core::source::ColumnDataSource;
use crate::core::value::ref_list;
use crate::core::{ModelId, PropertyValue};
use crate::error::{SceneError, SceneResult};

/// Looks up filter models by id while evaluating composite filters.
pub trait FilterResolver {
    fn filter(&self, id: &ModelId) -> Option<&Filter>;
}

/// Resolver for views whose filters are all leaf filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOperands;

impl FilterResolver for NoOperands {
    fn filter(&self, _id: &ModelId) -> Option<&Filter> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    Intersection,
    Union,
    Difference,
    SymmetricDifference,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    AllIndices,
    Index { indices: Vec<usize> },
    Boolean { booleans: Vec<bool> },
    Group { column_name: String, group: PropertyValue },
    Inversion { operand: Option<ModelId> },
    Composite { operation: SetOperation, operands: Vec<ModelId> },
}

const ALL_INDICES_PROPERTIES: &[PropertyDescriptor] = &[];
const INDEX_FILTER_PROPERTIES: &[PropertyDescriptor] =
    &[PropertyDescriptor::new("indices", PropertyKind::IndexList)];
const BOOLEAN_FILTER_PROPERTIES: &[PropertyDescriptor] =
    &[PropertyDescriptor::new("booleans", PropertyKind::BoolList)];
const GROUP_FILTER_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("column_name", PropertyKind::String),
    PropertyDescriptor::new("group", PropertyKind::Any),
];
const INVERSION_FILTER_PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor::new(
    "operand",
    PropertyKind::Nullable(&PropertyKind::Ref(crate::core::ModelCategory::Filter)),
)];
const COMPOSITE_FILTER_PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor::new(
    "operands",
    PropertyKind::RefList(crate::core::ModelCategory::Filter),
)];

impl Filter {
    #[must_use]
    pub fn index(indices: Vec<usize>) -> Self {
        Self::Index { indices }
    }

    #[must_use]
    pub fn boolean(booleans: Vec<bool>) -> Self {
        Self::Boolean { booleans }
    }

    #[must_use]
    pub fn group(column_name: &str, group: impl Into<PropertyValue>) -> Self {
        Self::Group {
            column_name: column_name.to_owned(),
            group: group.into(),
        }
    }

    #[must_use]
    pub fn inversion(operand: ModelId) -> Self {
        Self::Inversion {
            operand: Some(operand),
        }
    }

    #[must_use]
    pub fn composite(operation: SetOperation, operands: Vec<ModelId>) -> Self {
        Self::Composite {
            operation,
            operands,
        }
    }

    /// Bare instance for a wire type name.
    #[must_use]
    pub fn bare(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "AllIndices" => Self::AllIndices,
            "IndexFilter" => Self::Index {
                indices: Vec::new(),
            },
            "BooleanFilter" => Self::Boolean {
                booleans: Vec::new(),
            },
            "GroupFilter" => Self::Group {
                column_name: String::new(),
                group: PropertyValue::Null,
            },
            "InversionFilter" => Self::Inversion { operand: None },
            "IntersectionFilter" => Self::composite(SetOperation::Intersection, Vec::new()),
            "UnionFilter" => Self::composite(SetOperation::Union, Vec::new()),
            "DifferenceFilter" => Self::composite(SetOperation::Difference, Vec::new()),
            "SymmetricDifferenceFilter" => {
                Self::composite(SetOperation::SymmetricDifference, Vec::new())
            }
            _ => return None,
        })
    }

    /// Row mask of this filter over `source`.
    pub fn compute_mask(&self, source: &ColumnDataSource, resolver: &dyn FilterResolver) -> Vec<bool> {
        let mut visiting = Vec::new();
        self.mask_inner(source, resolver, &mut visiting)
    }

    fn mask_inner(
        &self,
        source: &ColumnDataSource,
        resolver: &dyn FilterResolver,
        visiting: &mut Vec<ModelId>,
    ) -> Vec<bool> {
        let rows = source.row_count();
        match self {
            Self::AllIndices => vec![true; rows],
            Self::Index { indices } => {
                let mut mask = vec![false; rows];
                for index in indices.iter().copied().filter(|index| *index < rows) {
                    mask[index] = true;
                }
                mask
            }
            Self::Boolean { booleans } => (0..rows)
                .map(|row| booleans.get(row).copied().unwrap_or(false))
                .collect(),
            Self::Group {
                column_name,
                group,
            } => match source.column(column_name) {
                Some(column) => (0..rows)
                    .map(|row| column.value(row).as_ref() == Some(group))
                    .collect(),
                None => vec![false; rows],
            },
            Self::Inversion { operand } => {
                let inner = match operand {
                    Some(id) => operand_mask(id, source, resolver, visiting),
                    None => vec![false; rows],
                };
                inner.into_iter().map(|value| !value).collect()
            }
            Self::Composite {
                operation,
                operands,
            } => {
                let mut masks = operands
                    .iter()
                    .map(|id| operand_mask(id, source, resolver, visiting));
                let Some(first) = masks.next() else {
                    return match operation {
                        SetOperation::Intersection => vec![true; rows],
                        _ => vec![false; rows],
                    };
                };
                masks.fold(first, |acc, mask| {
                    acc.into_iter()
                        .zip(mask)
                        .map(|(left, right)| match operation {
                            SetOperation::Intersection => left && right,
                            SetOperation::Union => left || right,
                            SetOperation::Difference => left && !right,
                            SetOperation::SymmetricDifference => left != right,
                        })
                        .collect()
                })
            }
        }
    }

    /// Filter models referenced as operands.
    #[must_use]
    pub fn operands(&self) -> Vec<ModelId> {
        match self {
            Self::Inversion {
                operand: Some(operand),
            } => vec![operand.clone()],
            Self::Composite { operands, .. } => operands.clone(),
            _ => Vec::new(),
        }
    }
}

fn operand_mask(
    id: &ModelId,
    source: &ColumnDataSource,
    resolver: &dyn FilterResolver,
    visiting: &mut Vec<ModelId>,
) -> Vec<bool> {
    let rows = source.row_count();
    if visiting.contains(id) {
        warn!(filter = %id, "cyclic filter operand contributes no rows");
        return vec![false; rows];
    }
    let Some(filter) = resolver.filter(id) else {
        warn!(filter = %id, "missing filter operand contributes no rows");
        return vec![false; rows];
    };
    visiting.push(id.clone());
    let mask = filter.mask_inner(source, resolver, visiting);
    visiting.pop();
    mask
}

impl PropertyContainer for Filter {
    fn type_name(&self) -> &'static str {
        match self {
            Self::AllIndices => "AllIndices",
            Self::Index { .. } => "IndexFilter",
            Self::Boolean { .. } => "BooleanFilter",
            Self::Group { .. } => "GroupFilter",
            Self::Inversion { .. } => "InversionFilter",
            Self::Composite { operation, .. } => match operation {
                SetOperation::Intersection => "IntersectionFilter",
                SetOperation::Union => "UnionFilter",
                SetOperation::Difference => "DifferenceFilter",
                SetOperation::SymmetricDifference => "SymmetricDifferenceFilter",
            },
        }
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        match self {
            Self::AllIndices => ALL_INDICES_PROPERTIES,
            Self::Index { .. } => INDEX_FILTER_PROPERTIES,
            Self::Boolean { .. } => BOOLEAN_FILTER_PROPERTIES,
            Self::Group { .. } => GROUP_FILTER_PROPERTIES,
            Self::Inversion { .. } => INVERSION_FILTER_PROPERTIES,
            Self::Composite { .. } => COMPOSITE_FILTER_PROPERTIES,
        }
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        match (self, name) {
            (Self::Index { indices }, "indices") => Ok(PropertyValue::List(
                indices
                    .iter()
                    .map(|index| PropertyValue::Number(*index as f64))
                    .collect(),
            )),
            (Self::Boolean { booleans }, "booleans") => Ok(booleans.clone().into()),
            (Self::Group { column_name, .. }, "column_name") => Ok(column_name.clone().into()),
            (Self::Group { group, .. }, "group") => Ok(group.clone()),
            (Self::Inversion { operand }, "operand") => Ok(operand.clone().into()),
            (Self::Composite { operands, .. }, "operands") => Ok(ref_list(operands)),
            _ => Err(unknown_property(self.type_name(), name)),
        }
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        let type_name = self.type_name();
        match (self, name) {
            (Self::Index { indices }, "indices") => {
                *indices = value
                    .expect_list(name)?
                    .iter()
                    .map(|item| item.expect_usize(name))
                    .collect::<SceneResult<_>>()?;
            }
            (Self::Boolean { booleans }, "booleans") => {
                *booleans = value
                    .expect_list(name)?
                    .iter()
                    .map(|item| item.expect_bool(name))
                    .collect::<SceneResult<_>>()?;
            }
            (Self::Group { column_name, .. }, "column_name") => {
                *column_name = value.expect_str(name)?.to_owned();
            }
            (Self::Group { group, .. }, "group") => {
                if !matches!(
                    value,
                    PropertyValue::String(_) | PropertyValue::Number(_) | PropertyValue::Bool(_)
                ) {
                    return Err(SceneError::validation(
                        name,
                        format!("group must be a scalar, got {}", value.type_label()),
                    ));
                }
                *group = value;
            }
            (Self::Inversion { operand }, "operand") => {
                *operand = value.expect_optional_ref(name)?;
            }
            (Self::Composite { operands, .. }, "operands") => {
                *operands = value.expect_ref_list(name)?;
            }
            _ => return Err(unknown_property(type_name, name)),
        }
        Ok(())
    }
}

/// View over a data source: the AND of its filters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CdsView {
    pub source: Option<ModelId>,
    pub filters: Vec<ModelId>,
}

const CDS_VIEW_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new(
        "source",
        PropertyKind::Nullable(&PropertyKind::Ref(crate::core::ModelCategory::DataSource)),
    ),
    PropertyDescriptor::new(
        "filters",
        PropertyKind::RefList(crate::core::ModelCategory::Filter),
    ),
];

impl CdsView {
    #[must_use]
    pub fn new(filters: Vec<ModelId>) -> Self {
        Self {
            source: None,
            filters,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: ModelId) -> Self {
        self.source = Some(source);
        self
    }

    /// Sorted rows where every filter holds. No filters selects every row.
    pub fn compute_indices(
        &self,
        source: &ColumnDataSource,
        resolver: &dyn FilterResolver,
    ) -> Vec<usize> {
        let rows = source.row_count();
        let mut mask = vec![true; rows];
        for id in &self.filters {
            let Some(filter) = resolver.filter(id) else {
                warn!(filter = %id, "view references a missing filter; no rows match");
                return Vec::new();
            };
            for (slot, value) in mask.iter_mut().zip(filter.compute_mask(source, resolver)) {
                *slot &= value;
            }
        }
        mask.into_iter()
            .enumerate()
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect()
    }
}

impl PropertyContainer for CdsView {
    fn type_name(&self) -> &'static str {
        "CDSView"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        CDS_VIEW_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        match name {
            "source" => Ok(self.source.clone().into()),
            "filters" => Ok(ref_list(&self.filters)),
            _ => Err(unknown_property(self.type_name(), name)),
        }
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "source" => self.source = value.expect_optional_ref(name)?,
            "filters" => self.filters = value.expect_ref_list(name)?,
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}

/// Resolver over an in-memory list of `(id, filter)` pairs.
impl FilterResolver for Vec<(ModelId, Filter)> {
    fn filter(&self, id: &ModelId) -> Option<&Filter> {
        self.iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, filter)| filter)
    }
}
