use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::{Extent, datetime_to_unix_millis, decimal_to_f64};
use crate::core::property::{PropertyContainer, PropertyDescriptor, PropertyKind, unknown_property};
use crate::core::PropertyValue;
use crate::error::{SceneError, SceneResult};

/// One homogeneous column of a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numbers(Vec<f64>),
    Strings(Vec<String>),
    NumberLists(Vec<Vec<f64>>),
    StringLists(Vec<Vec<String>>),
}

impl Default for Column {
    fn default() -> Self {
        Self::Numbers(Vec::new())
    }
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numbers(values) => values.len(),
            Self::Strings(values) => values.len(),
            Self::NumberLists(values) => values.len(),
            Self::StringLists(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn element_label(&self) -> &'static str {
        match self {
            Self::Numbers(_) => "number",
            Self::Strings(_) => "string",
            Self::NumberLists(_) => "number list",
            Self::StringLists(_) => "string list",
        }
    }

    pub fn from_datetimes(times: &[DateTime<Utc>]) -> Self {
        Self::Numbers(times.iter().copied().map(datetime_to_unix_millis).collect())
    }

    pub fn from_decimals(values: &[Decimal], column: &str) -> SceneResult<Self> {
        values
            .iter()
            .map(|value| decimal_to_f64(*value, column))
            .collect::<SceneResult<Vec<_>>>()
            .map(Self::Numbers)
    }

    #[must_use]
    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Self::Numbers(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn number(&self, row: usize) -> Option<f64> {
        self.as_numbers().and_then(|values| values.get(row).copied())
    }

    #[must_use]
    pub fn number_list(&self, row: usize) -> Option<&[f64]> {
        match self {
            Self::NumberLists(values) => values.get(row).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Row value as a generic property value.
    #[must_use]
    pub fn value(&self, row: usize) -> Option<PropertyValue> {
        match self {
            Self::Numbers(values) => values.get(row).map(|v| PropertyValue::Number(*v)),
            Self::Strings(values) => values.get(row).map(|v| PropertyValue::String(v.clone())),
            Self::NumberLists(values) => values.get(row).map(|v| v.clone().into()),
            Self::StringLists(values) => values.get(row).map(|v| v.clone().into()),
        }
    }

    /// Finite extent over numeric content; nested lists are flattened.
    #[must_use]
    pub fn finite_extent(&self) -> Option<Extent> {
        match self {
            Self::Numbers(values) => Extent::scan(values),
            Self::NumberLists(values) => values
                .iter()
                .map(|row| Extent::scan(row))
                .fold(None, Extent::merge_option),
            Self::Strings(_) | Self::StringLists(_) => None,
        }
    }

    /// Builds a column from generic values, requiring one element type.
    ///
    /// `null` entries in numeric columns become NaN.
    pub fn from_values(values: &[PropertyValue], column: &str) -> SceneResult<Self> {
        let Some(first) = values.iter().find(|value| !value.is_null()) else {
            return Ok(Self::Numbers(vec![f64::NAN; values.len()]));
        };

        let mismatch = |index: usize, value: &PropertyValue, expected: &str| {
            SceneError::validation(
                column,
                format!(
                    "column values must be homogeneous: element {index} is {}, expected {expected}",
                    value.type_label()
                ),
            )
        };

        match first {
            PropertyValue::Number(_) => values
                .iter()
                .enumerate()
                .map(|(index, value)| match value {
                    PropertyValue::Number(v) => Ok(*v),
                    PropertyValue::Null => Ok(f64::NAN),
                    other => Err(mismatch(index, other, "number")),
                })
                .collect::<SceneResult<Vec<_>>>()
                .map(Self::Numbers),
            PropertyValue::String(_) => values
                .iter()
                .enumerate()
                .map(|(index, value)| match value {
                    PropertyValue::String(v) => Ok(v.clone()),
                    other => Err(mismatch(index, other, "string")),
                })
                .collect::<SceneResult<Vec<_>>>()
                .map(Self::Strings),
            PropertyValue::List(inner) => {
                let numeric = inner
                    .iter()
                    .find(|value| !value.is_null())
                    .is_none_or(|value| matches!(value, PropertyValue::Number(_)));
                if numeric {
                    values
                        .iter()
                        .enumerate()
                        .map(|(index, value)| match value {
                            PropertyValue::List(items) => items
                                .iter()
                                .map(|item| match item {
                                    PropertyValue::Number(v) => Ok(*v),
                                    PropertyValue::Null => Ok(f64::NAN),
                                    other => Err(mismatch(index, other, "number")),
                                })
                                .collect::<SceneResult<Vec<_>>>(),
                            other => Err(mismatch(index, other, "list")),
                        })
                        .collect::<SceneResult<Vec<_>>>()
                        .map(Self::NumberLists)
                } else {
                    values
                        .iter()
                        .enumerate()
                        .map(|(index, value)| match value {
                            PropertyValue::List(items) => items
                                .iter()
                                .map(|item| match item {
                                    PropertyValue::String(v) => Ok(v.clone()),
                                    other => Err(mismatch(index, other, "string")),
                                })
                                .collect::<SceneResult<Vec<_>>>(),
                            other => Err(mismatch(index, other, "list")),
                        })
                        .collect::<SceneResult<Vec<_>>>()
                        .map(Self::StringLists)
                }
            }
            other => Err(SceneError::validation(
                column,
                format!(
                    "column elements must be numbers, strings or lists, got {}",
                    other.type_label()
                ),
            )),
        }
    }

    #[must_use]
    pub fn to_values(&self) -> PropertyValue {
        PropertyValue::List((0..self.len()).filter_map(|row| self.value(row)).collect())
    }

    fn set_element(&mut self, row: usize, value: &PropertyValue, column: &str) -> SceneResult<()> {
        let replacement = Self::from_values(std::slice::from_ref(value), column)?;
        match (self, replacement) {
            (Self::Numbers(values), Self::Numbers(mut new)) => values[row] = new.remove(0),
            (Self::Strings(values), Self::Strings(mut new)) => values[row] = new.remove(0),
            (Self::NumberLists(values), Self::NumberLists(mut new)) => values[row] = new.remove(0),
            (Self::StringLists(values), Self::StringLists(mut new)) => values[row] = new.remove(0),
            // an empty nested list decodes as numeric; accept it for string lists too
            (Self::StringLists(values), Self::NumberLists(new)) if new[0].is_empty() => {
                values[row] = Vec::new();
            }
            (existing, new) => {
                return Err(SceneError::validation(
                    column,
                    format!(
                        "cannot patch {} column with {} value",
                        existing.element_label(),
                        new.element_label()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn append(&mut self, other: Column, column: &str) -> SceneResult<()> {
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.is_empty() {
            return Ok(());
        }
        match (self, other) {
            (Self::Numbers(values), Self::Numbers(new)) => values.extend(new),
            (Self::Strings(values), Self::Strings(new)) => values.extend(new),
            (Self::NumberLists(values), Self::NumberLists(new)) => values.extend(new),
            (Self::StringLists(values), Self::StringLists(new)) => values.extend(new),
            (existing, new) => {
                return Err(SceneError::validation(
                    column,
                    format!(
                        "cannot stream {} values into {} column",
                        new.element_label(),
                        existing.element_label()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn drop_front(&mut self, count: usize) {
        match self {
            Self::Numbers(values) => {
                values.drain(..count);
            }
            Self::Strings(values) => {
                values.drain(..count);
            }
            Self::NumberLists(values) => {
                values.drain(..count);
            }
            Self::StringLists(values) => {
                values.drain(..count);
            }
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Self::Numbers(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Self::Strings(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Self::Strings(values)
    }
}

impl From<Vec<Vec<f64>>> for Column {
    fn from(values: Vec<Vec<f64>>) -> Self {
        Self::NumberLists(values)
    }
}

impl From<Vec<Vec<String>>> for Column {
    fn from(values: Vec<Vec<String>>) -> Self {
        Self::StringLists(values)
    }
}

/// Ordered column-name → column mapping.
pub type ColumnData = IndexMap<String, Column>;

/// Target of one patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchTarget {
    Index(usize),
    Slice {
        #[serde(default)]
        start: Option<usize>,
        #[serde(default)]
        stop: Option<usize>,
        #[serde(default)]
        step: Option<usize>,
    },
}

impl PatchTarget {
    fn rows(self, column: &str, len: usize) -> SceneResult<Vec<usize>> {
        match self {
            Self::Index(index) => {
                if index >= len {
                    return Err(SceneError::IndexOutOfBounds {
                        column: column.to_owned(),
                        index,
                        len,
                    });
                }
                Ok(vec![index])
            }
            Self::Slice { start, stop, step } => {
                let start = start.unwrap_or(0);
                let stop = stop.unwrap_or(len);
                let step = step.unwrap_or(1);
                if step == 0 {
                    return Err(SceneError::validation(column, "patch slice step must be > 0"));
                }
                if stop > len {
                    return Err(SceneError::IndexOutOfBounds {
                        column: column.to_owned(),
                        index: stop,
                        len,
                    });
                }
                if start > stop {
                    return Err(SceneError::validation(
                        column,
                        format!("patch slice must have start <= stop, got {start}..{stop}"),
                    ));
                }
                Ok((start..stop).step_by(step).collect())
            }
        }
    }
}

/// One `(target, value)` patch entry. Slice targets take a list value.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPatch {
    pub target: PatchTarget,
    pub value: PropertyValue,
}

impl ColumnPatch {
    #[must_use]
    pub fn index(index: usize, value: impl Into<PropertyValue>) -> Self {
        Self {
            target: PatchTarget::Index(index),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn slice(start: usize, stop: usize, values: Vec<PropertyValue>) -> Self {
        Self {
            target: PatchTarget::Slice {
                start: Some(start),
                stop: Some(stop),
                step: None,
            },
            value: PropertyValue::List(values),
        }
    }
}

pub type ColumnPatches = IndexMap<String, Vec<ColumnPatch>>;

/// Named-column, equal-length table shared between renderers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDataSource {
    data: ColumnData,
    selected: Vec<usize>,
}

const COLUMN_DATA_SOURCE_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("data", PropertyKind::ColumnData),
    PropertyDescriptor::new("selected", PropertyKind::IndexList),
];

impl ColumnDataSource {
    pub fn new(data: ColumnData) -> SceneResult<Self> {
        validate_lengths(&data)?;
        Ok(Self {
            data,
            selected: Vec::new(),
        })
    }

    /// Convenience for building from `(name, column)` pairs.
    pub fn from_columns<I, S, C>(columns: I) -> SceneResult<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<Column>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|(name, column)| (name.into(), column.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.data.get(name)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.values().next().map_or(0, Column::len)
    }

    #[must_use]
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn set_selected(&mut self, selected: Vec<usize>) {
        self.selected = selected;
    }

    /// Replaces all data at once.
    pub fn replace_data(&mut self, data: ColumnData) -> SceneResult<()> {
        validate_lengths(&data)?;
        self.data = data;
        Ok(())
    }

    pub fn add_column(&mut self, name: &str, column: Column) -> SceneResult<()> {
        if !self.data.is_empty() && column.len() != self.row_count() {
            return Err(SceneError::LengthMismatch {
                column: name.to_owned(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        self.data.insert(name.to_owned(), column);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> SceneResult<Column> {
        self.data
            .shift_remove(name)
            .ok_or_else(|| SceneError::UnknownColumn(name.to_owned()))
    }

    /// Replaces one element in place.
    pub fn patch(&mut self, column: &str, index: usize, value: impl Into<PropertyValue>) -> SceneResult<()> {
        let mut patches = ColumnPatches::new();
        patches.insert(column.to_owned(), vec![ColumnPatch::index(index, value)]);
        self.patch_many(&patches)
    }

    /// Applies every patch or none of them. Column lengths never change.
    pub fn patch_many(&mut self, patches: &ColumnPatches) -> SceneResult<()> {
        let mut staged = self.data.clone();
        for (name, entries) in patches {
            let column = staged
                .get_mut(name)
                .ok_or_else(|| SceneError::UnknownColumn(name.clone()))?;
            for entry in entries {
                let rows = entry.target.rows(name, column.len())?;
                match entry.target {
                    PatchTarget::Index(_) => column.set_element(rows[0], &entry.value, name)?,
                    PatchTarget::Slice { .. } => {
                        let values = entry.value.expect_list(name)?;
                        if values.len() != rows.len() {
                            return Err(SceneError::validation(
                                name,
                                format!(
                                    "slice patch covers {} rows but supplies {} values",
                                    rows.len(),
                                    values.len()
                                ),
                            ));
                        }
                        for (row, value) in rows.into_iter().zip(values) {
                            column.set_element(row, value, name)?;
                        }
                    }
                }
            }
        }
        trace!(columns = patches.len(), "patched column data source");
        self.data = staged;
        Ok(())
    }

    /// Appends rows to every column, trimming from the front to `rollover`.
    pub fn stream(&mut self, new_rows: ColumnData, rollover: Option<usize>) -> SceneResult<()> {
        let missing: Vec<String> = self
            .data
            .keys()
            .filter(|name| !new_rows.contains_key(*name))
            .cloned()
            .collect();
        let extra: Vec<String> = new_rows
            .keys()
            .filter(|name| !self.data.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(SceneError::ColumnMismatch { missing, extra });
        }
        validate_lengths(&new_rows)?;

        let mut staged = self.data.clone();
        for (name, column) in new_rows {
            let target = staged
                .get_mut(&name)
                .ok_or_else(|| SceneError::UnknownColumn(name.clone()))?;
            target.append(column, &name)?;
            if let Some(rollover) = rollover {
                let len = target.len();
                if len > rollover {
                    target.drop_front(len - rollover);
                }
            }
        }
        self.data = staged;
        trace!(rows = self.row_count(), ?rollover, "streamed column data source");
        Ok(())
    }
}

impl PropertyContainer for ColumnDataSource {
    fn type_name(&self) -> &'static str {
        "ColumnDataSource"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        COLUMN_DATA_SOURCE_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        match name {
            "data" => Ok(column_data_to_value(&self.data)),
            "selected" => Ok(PropertyValue::List(
                self.selected
                    .iter()
                    .map(|row| PropertyValue::Number(*row as f64))
                    .collect(),
            )),
            _ => Err(unknown_property(self.type_name(), name)),
        }
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "data" => self.replace_data(column_data_from_value(&value, name)?),
            "selected" => {
                self.selected = value
                    .expect_list(name)?
                    .iter()
                    .map(|item| item.expect_usize(name))
                    .collect::<SceneResult<_>>()?;
                Ok(())
            }
            _ => Err(unknown_property(self.type_name(), name)),
        }
    }
}

#[must_use]
pub fn column_data_to_value(data: &ColumnData) -> PropertyValue {
    PropertyValue::Map(
        data.iter()
            .map(|(name, column)| (name.clone(), column.to_values()))
            .collect(),
    )
}

pub fn column_data_from_value(value: &PropertyValue, property: &str) -> SceneResult<ColumnData> {
    value
        .expect_map(property)?
        .iter()
        .map(|(name, column)| {
            let values = column.expect_list(name)?;
            Ok((name.clone(), Column::from_values(values, name)?))
        })
        .collect()
}

fn validate_lengths(data: &ColumnData) -> SceneResult<()> {
    let mut columns = data.iter();
    let Some((_, first)) = columns.next() else {
        return Ok(());
    };
    let expected = first.len();
    for (name, column) in columns {
        if column.len() != expected {
            return Err(SceneError::LengthMismatch {
                column: name.clone(),
                expected,
                actual: column.len(),
            });
        }
    }
    Ok(())
}
