use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::core::ModelId;
use crate::error::{SceneError, SceneResult};

/// Dynamically typed property value exchanged through `get`/`set` and the
/// wire format.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(IndexMap<String, PropertyValue>),
    Ref(ModelId),
}

impl PropertyValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Ref(_) => "reference",
        }
    }

    pub fn expect_bool(&self, property: &str) -> SceneResult<bool> {
        match self {
            Self::Bool(value) => Ok(*value),
            other => Err(mismatch(property, "bool", other)),
        }
    }

    pub fn expect_number(&self, property: &str) -> SceneResult<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            other => Err(mismatch(property, "number", other)),
        }
    }

    pub fn expect_finite(&self, property: &str) -> SceneResult<f64> {
        let value = self.expect_number(property)?;
        if !value.is_finite() {
            return Err(SceneError::validation(property, "number must be finite"));
        }
        Ok(value)
    }

    pub fn expect_non_negative(&self, property: &str) -> SceneResult<f64> {
        let value = self.expect_finite(property)?;
        if value < 0.0 {
            return Err(SceneError::validation(property, "number must be >= 0"));
        }
        Ok(value)
    }

    pub fn expect_optional_finite(&self, property: &str) -> SceneResult<Option<f64>> {
        if self.is_null() {
            return Ok(None);
        }
        self.expect_finite(property).map(Some)
    }

    pub fn expect_usize(&self, property: &str) -> SceneResult<usize> {
        let value = self.expect_finite(property)?;
        if value < 0.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
            return Err(SceneError::validation(
                property,
                format!("expected a non-negative integer, got {value}"),
            ));
        }
        Ok(value as usize)
    }

    pub fn expect_str(&self, property: &str) -> SceneResult<&str> {
        match self {
            Self::String(value) => Ok(value),
            other => Err(mismatch(property, "string", other)),
        }
    }

    pub fn expect_optional_string(&self, property: &str) -> SceneResult<Option<String>> {
        if self.is_null() {
            return Ok(None);
        }
        self.expect_str(property).map(|value| Some(value.to_owned()))
    }

    pub fn expect_list(&self, property: &str) -> SceneResult<&[PropertyValue]> {
        match self {
            Self::List(values) => Ok(values),
            other => Err(mismatch(property, "list", other)),
        }
    }

    pub fn expect_map(&self, property: &str) -> SceneResult<&IndexMap<String, PropertyValue>> {
        match self {
            Self::Map(values) => Ok(values),
            other => Err(mismatch(property, "map", other)),
        }
    }

    pub fn expect_ref(&self, property: &str) -> SceneResult<ModelId> {
        match self {
            Self::Ref(id) => Ok(id.clone()),
            other => Err(mismatch(property, "reference", other)),
        }
    }

    pub fn expect_optional_ref(&self, property: &str) -> SceneResult<Option<ModelId>> {
        if self.is_null() {
            return Ok(None);
        }
        self.expect_ref(property).map(Some)
    }

    pub fn expect_ref_list(&self, property: &str) -> SceneResult<Vec<ModelId>> {
        self.expect_list(property)?
            .iter()
            .map(|item| item.expect_ref(property))
            .collect()
    }

    pub fn expect_ref_map(&self, property: &str) -> SceneResult<IndexMap<String, ModelId>> {
        self.expect_map(property)?
            .iter()
            .map(|(key, item)| Ok((key.clone(), item.expect_ref(property)?)))
            .collect()
    }

    pub fn expect_number_list(&self, property: &str) -> SceneResult<Vec<f64>> {
        self.expect_list(property)?
            .iter()
            .map(|item| item.expect_number(property))
            .collect()
    }

    /// Collects every model id referenced anywhere inside this value.
    pub fn collect_refs(&self, out: &mut Vec<ModelId>) {
        match self {
            Self::Ref(id) => out.push(id.clone()),
            Self::List(values) => values.iter().for_each(|value| value.collect_refs(out)),
            Self::Map(values) => values.values().for_each(|value| value.collect_refs(out)),
            Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => {}
        }
    }

    /// Encodes into the JSON wire representation.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Number(value) => encode_number(*value),
            Self::String(value) => Value::String(value.clone()),
            Self::List(values) => Value::Array(values.iter().map(Self::to_wire).collect()),
            Self::Map(values) => Value::Object(
                values
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_wire()))
                    .collect(),
            ),
            Self::Ref(id) => {
                let mut object = Map::new();
                object.insert("ref".to_owned(), Value::String(id.as_str().to_owned()));
                Value::Object(object)
            }
        }
    }

    /// Decodes the JSON wire representation.
    pub fn from_wire(value: &Value) -> SceneResult<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(*value),
            Value::Number(number) => Self::Number(number.as_f64().ok_or_else(|| {
                SceneError::InvalidData(format!("number {number} is not representable as f64"))
            })?),
            Value::String(value) => Self::String(value.clone()),
            Value::Array(values) => Self::List(
                values
                    .iter()
                    .map(Self::from_wire)
                    .collect::<SceneResult<Vec<_>>>()?,
            ),
            Value::Object(object) => {
                if let Some(id) = ref_target(object) {
                    return Ok(Self::Ref(ModelId::new(id)));
                }
                if let Some(number) = decode_number_rep(object)? {
                    return Ok(Self::Number(number));
                }
                Self::Map(
                    object
                        .iter()
                        .map(|(key, value)| Ok((key.clone(), Self::from_wire(value)?)))
                        .collect::<SceneResult<IndexMap<_, _>>>()?,
                )
            }
        })
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ModelId> for PropertyValue {
    fn from(value: ModelId) -> Self {
        Self::Ref(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

pub(crate) fn ref_list(ids: &[ModelId]) -> PropertyValue {
    PropertyValue::List(ids.iter().cloned().map(PropertyValue::Ref).collect())
}

pub(crate) fn ref_map(ids: &IndexMap<String, ModelId>) -> PropertyValue {
    PropertyValue::Map(
        ids.iter()
            .map(|(key, id)| (key.clone(), PropertyValue::Ref(id.clone())))
            .collect(),
    )
}

fn mismatch(property: &str, expected: &str, actual: &PropertyValue) -> SceneError {
    SceneError::validation(
        property,
        format!("expected {expected}, got {}", actual.type_label()),
    )
}

fn encode_number(value: f64) -> Value {
    if let Some(number) = Number::from_f64(value) {
        return Value::Number(number);
    }
    let label = if value.is_nan() {
        "nan"
    } else if value.is_sign_positive() {
        "+inf"
    } else {
        "-inf"
    };
    let mut object = Map::new();
    object.insert("type".to_owned(), Value::String("number".to_owned()));
    object.insert("value".to_owned(), Value::String(label.to_owned()));
    Value::Object(object)
}

fn ref_target(object: &Map<String, Value>) -> Option<&str> {
    if object.len() != 1 {
        return None;
    }
    object.get("ref").and_then(Value::as_str)
}

fn decode_number_rep(object: &Map<String, Value>) -> SceneResult<Option<f64>> {
    if object.len() != 2 || object.get("type").and_then(Value::as_str) != Some("number") {
        return Ok(None);
    }
    match object.get("value") {
        Some(Value::String(label)) => match label.as_str() {
            "nan" => Ok(Some(f64::NAN)),
            "+inf" => Ok(Some(f64::INFINITY)),
            "-inf" => Ok(Some(f64::NEG_INFINITY)),
            other => Err(SceneError::InvalidData(format!(
                "unknown number representation `{other}`"
            ))),
        },
        Some(Value::Number(number)) => Ok(number.as_f64()),
        _ => Ok(None),
    }
}
