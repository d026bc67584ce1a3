//! Categorical ranges.
//!
//! Factors are laid out on a synthetic numeric axis: every leaf factor
//! occupies one unit, neighbouring leaves are separated by `factor_padding`,
//! middle-level groups by `subgroup_padding` and top-level groups by
//! `group_padding`. Each factor sits at the center of its unit.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::core::PropertyValue;
use crate::core::property::{
    ModelArgs, PropertyContainer, PropertyDescriptor, PropertyKind, unknown_property,
};
use crate::core::range::{Bounds, PaddingUnits};
use crate::error::{SceneError, SceneResult};

pub const DEFAULT_FACTOR_PADDING: f64 = 0.0;
pub const DEFAULT_SUBGROUP_PADDING: f64 = 0.8;
pub const DEFAULT_GROUP_PADDING: f64 = 1.4;

/// One categorical label, possibly nested up to three levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Factor {
    L1(String),
    L2(String, String),
    L3(String, String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactorLevel {
    One,
    Two,
    Three,
}

impl Factor {
    #[must_use]
    pub fn level(&self) -> FactorLevel {
        match self {
            Self::L1(_) => FactorLevel::One,
            Self::L2(..) => FactorLevel::Two,
            Self::L3(..) => FactorLevel::Three,
        }
    }

    #[must_use]
    pub fn top(&self) -> &str {
        match self {
            Self::L1(top) | Self::L2(top, _) | Self::L3(top, _, _) => top,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> PropertyValue {
        match self {
            Self::L1(a) => a.as_str().into(),
            Self::L2(a, b) => vec![a.as_str(), b.as_str()].into(),
            Self::L3(a, b, c) => vec![a.as_str(), b.as_str(), c.as_str()].into(),
        }
    }

    /// Scalar values become single-level factors; numbers are stringified.
    pub fn from_value(value: &PropertyValue, property: &str) -> SceneResult<Self> {
        match value {
            PropertyValue::String(label) => Ok(Self::L1(label.clone())),
            PropertyValue::Number(number) if number.is_finite() => {
                Ok(Self::L1(number_label(*number)))
            }
            PropertyValue::List(parts) => {
                let labels = parts
                    .iter()
                    .map(|part| part.expect_str(property).map(str::to_owned))
                    .collect::<SceneResult<Vec<_>>>()?;
                match <[String; 2]>::try_from(labels) {
                    Ok([a, b]) => Ok(Self::L2(a, b)),
                    Err(labels) => match <[String; 3]>::try_from(labels) {
                        Ok([a, b, c]) => Ok(Self::L3(a, b, c)),
                        Err(labels) => Err(SceneError::validation(
                            property,
                            format!("nested factors need 2 or 3 levels, got {}", labels.len()),
                        )),
                    },
                }
            }
            other => Err(SceneError::validation(
                property,
                format!("expected a factor, got {}", other.type_label()),
            )),
        }
    }
}

impl From<&str> for Factor {
    fn from(label: &str) -> Self {
        Self::L1(label.to_owned())
    }
}

impl From<(&str, &str)> for Factor {
    fn from((a, b): (&str, &str)) -> Self {
        Self::L2(a.to_owned(), b.to_owned())
    }
}

impl From<(&str, &str, &str)> for Factor {
    fn from((a, b, c): (&str, &str, &str)) -> Self {
        Self::L3(a.to_owned(), b.to_owned(), c.to_owned())
    }
}

fn number_label(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Synthetic coordinates of every factor of a range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorMapping {
    pub start: f64,
    pub end: f64,
    level: Option<FactorLevel>,
    factors: Vec<Factor>,
    duplicates: Vec<Factor>,
    leaves: HashMap<Factor, f64>,
    tops: IndexMap<String, f64>,
    mids: HashMap<(String, String), f64>,
}

impl FactorMapping {
    /// Unique factors in first-appearance order.
    #[must_use]
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Repeated factors, reported but mapped to their first coordinate.
    #[must_use]
    pub fn duplicates(&self) -> &[Factor] {
        &self.duplicates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    #[must_use]
    pub fn coordinate(&self, factor: &Factor) -> Option<f64> {
        self.leaves.get(factor).copied()
    }

    /// Center of a top-level group.
    #[must_use]
    pub fn top_coordinate(&self, top: &str) -> Option<f64> {
        self.tops.get(top).copied()
    }

    /// Center of a middle-level group of a three-level range.
    #[must_use]
    pub fn mid_coordinate(&self, top: &str, mid: &str) -> Option<f64> {
        self.mids.get(&(top.to_owned(), mid.to_owned())).copied()
    }

    /// Maps a number, a factor or a `[factor.., offset]` list onto the axis.
    #[must_use]
    pub fn synthetic(&self, value: &PropertyValue) -> f64 {
        match value {
            PropertyValue::Number(number) => *number,
            PropertyValue::String(label) => self.lookup(&[label.as_str()]),
            PropertyValue::List(parts) => {
                let (offset, labels) = match parts.split_last() {
                    Some((PropertyValue::Number(offset), rest)) => (*offset, rest),
                    _ => (0.0, parts.as_slice()),
                };
                let labels: Option<Vec<&str>> = labels
                    .iter()
                    .map(|part| match part {
                        PropertyValue::String(label) => Some(label.as_str()),
                        _ => None,
                    })
                    .collect();
                labels.map_or(f64::NAN, |labels| self.lookup(&labels) + offset)
            }
            _ => f64::NAN,
        }
    }

    fn lookup(&self, labels: &[&str]) -> f64 {
        let found = match (self.level, labels) {
            (Some(FactorLevel::One), [a]) => self.coordinate(&Factor::from(*a)),
            (Some(_), [a]) => self.top_coordinate(a),
            (Some(FactorLevel::Two), [a, b]) => self.coordinate(&Factor::from((*a, *b))),
            (Some(FactorLevel::Three), [a, b]) => self.mid_coordinate(a, b),
            (Some(FactorLevel::Three), [a, b, c]) => {
                self.coordinate(&Factor::from((*a, *b, *c)))
            }
            _ => None,
        };
        found.unwrap_or(f64::NAN)
    }

    /// Lays out `factors` with the given paddings. `factors` must share one
    /// nesting level.
    #[must_use]
    pub fn build(factors: &[Factor], range: &FactorRange) -> Self {
        let mut unique = Vec::with_capacity(factors.len());
        let mut duplicates = Vec::new();
        let mut seen = std::collections::HashSet::with_capacity(factors.len());
        for factor in factors {
            if seen.insert(factor) {
                unique.push(factor.clone());
            } else if !duplicates.contains(factor) {
                duplicates.push(factor.clone());
            }
        }

        let mut mapping = Self {
            level: unique.first().map(Factor::level),
            duplicates,
            ..Self::default()
        };

        let inner_padding = match mapping.level {
            None => 0.0,
            Some(FactorLevel::One) => {
                let labels: Vec<&str> = unique.iter().map(Factor::top).collect();
                let (values, inner) = map_one_level(&labels, range.factor_padding, 0.0);
                for (label, value) in labels.iter().zip(values) {
                    mapping.leaves.insert(Factor::from(*label), value);
                }
                inner
            }
            Some(FactorLevel::Two) => {
                let pairs: Vec<(&str, &str)> = unique
                    .iter()
                    .filter_map(|factor| match factor {
                        Factor::L2(a, b) => Some((a.as_str(), b.as_str())),
                        _ => None,
                    })
                    .collect();
                let layout = map_two_levels(&pairs, range.group_padding, range.factor_padding, 0.0);
                for ((a, b), value) in pairs.iter().zip(&layout.leaves) {
                    mapping.leaves.insert(Factor::from((*a, *b)), *value);
                }
                mapping.tops = layout.tops;
                layout.inner_padding
            }
            Some(FactorLevel::Three) => {
                let triples: Vec<(&str, &str, &str)> = unique
                    .iter()
                    .filter_map(|factor| match factor {
                        Factor::L3(a, b, c) => Some((a.as_str(), b.as_str(), c.as_str())),
                        _ => None,
                    })
                    .collect();
                let layout = map_three_levels(
                    &triples,
                    range.group_padding,
                    range.subgroup_padding,
                    range.factor_padding,
                );
                for ((a, b, c), value) in triples.iter().zip(&layout.leaves) {
                    mapping.leaves.insert(Factor::from((*a, *b, *c)), *value);
                }
                mapping.tops = layout.tops;
                mapping.mids = layout.mids;
                layout.inner_padding
            }
        };

        let end = unique.len() as f64 + inner_padding;
        let half = range
            .range_padding_units
            .half_padding(end, range.range_padding);
        mapping.start = -half;
        mapping.end = end + half;
        mapping.factors = unique;
        mapping
    }
}

/// Coordinates `0.5 + i * (1 + padding) + offset` and the total inner padding.
fn map_one_level(labels: &[&str], padding: f64, offset: f64) -> (Vec<f64>, f64) {
    let values = labels
        .iter()
        .enumerate()
        .map(|(index, _)| 0.5 + index as f64 * (1.0 + padding) + offset)
        .collect();
    let inner = labels.len().saturating_sub(1) as f64 * padding;
    (values, inner)
}

struct TwoLevelLayout {
    leaves: Vec<f64>,
    tops: IndexMap<String, f64>,
    inner_padding: f64,
}

/// Groups in first-appearance order of their key.
fn group_by_first<'a, T: Copy>(items: &[(&'a str, T)]) -> IndexMap<&'a str, Vec<T>> {
    let mut groups: IndexMap<&str, Vec<T>> = IndexMap::new();
    for (key, item) in items {
        groups.entry(*key).or_default().push(*item);
    }
    groups
}

fn map_two_levels(
    pairs: &[(&str, &str)],
    outer_padding: f64,
    factor_padding: f64,
    offset: f64,
) -> TwoLevelLayout {
    let groups = group_by_first(pairs);
    let mut positions: HashMap<(&str, &str), f64> = HashMap::with_capacity(pairs.len());
    let mut tops = IndexMap::with_capacity(groups.len());
    let mut suboffset = offset;
    let mut total_subpadding = 0.0;

    for (top, subs) in &groups {
        let (values, subpadding) = map_one_level(subs, factor_padding, suboffset);
        total_subpadding += subpadding;
        let mean = values.iter().sum::<f64>() / subs.len() as f64;
        for (sub, value) in subs.iter().zip(values) {
            positions.insert((*top, *sub), value);
        }
        tops.insert((*top).to_owned(), mean);
        suboffset += subs.len() as f64 + outer_padding + subpadding;
    }

    let leaves = pairs
        .iter()
        .map(|pair| positions.get(pair).copied().unwrap_or(f64::NAN))
        .collect();
    let inner_padding =
        groups.len().saturating_sub(1) as f64 * outer_padding + total_subpadding;
    TwoLevelLayout {
        leaves,
        tops,
        inner_padding,
    }
}

struct ThreeLevelLayout {
    leaves: Vec<f64>,
    tops: IndexMap<String, f64>,
    mids: HashMap<(String, String), f64>,
    inner_padding: f64,
}

fn map_three_levels(
    triples: &[(&str, &str, &str)],
    outer_padding: f64,
    inner_padding: f64,
    factor_padding: f64,
) -> ThreeLevelLayout {
    let keyed: Vec<(&str, (&str, &str))> = triples.iter().map(|(a, b, c)| (*a, (*b, *c))).collect();
    let groups = group_by_first(&keyed);
    let mut positions: HashMap<(&str, &str, &str), f64> = HashMap::with_capacity(triples.len());
    let mut tops = IndexMap::with_capacity(groups.len());
    let mut mids = HashMap::new();
    let mut suboffset = 0.0;
    let mut total_subpadding = 0.0;

    for (top, pairs) in &groups {
        let layout = map_two_levels(pairs, inner_padding, factor_padding, suboffset);
        total_subpadding += layout.inner_padding;
        for ((mid, leaf), value) in pairs.iter().zip(&layout.leaves) {
            positions.insert((*top, *mid, *leaf), *value);
        }
        let mid_sum: f64 = pairs
            .iter()
            .filter_map(|(mid, _)| layout.tops.get(*mid))
            .sum();
        tops.insert((*top).to_owned(), mid_sum / pairs.len() as f64);
        for (mid, value) in layout.tops {
            mids.insert(((*top).to_owned(), mid), value);
        }
        suboffset += pairs.len() as f64 + outer_padding + layout.inner_padding;
    }

    let leaves = triples
        .iter()
        .map(|triple| positions.get(triple).copied().unwrap_or(f64::NAN))
        .collect();
    let inner_padding =
        groups.len().saturating_sub(1) as f64 * outer_padding + total_subpadding;
    ThreeLevelLayout {
        leaves,
        tops,
        mids,
        inner_padding,
    }
}

const FACTOR_RANGE_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("factors", PropertyKind::Factors),
    PropertyDescriptor::new("factor_padding", PropertyKind::NonNegative),
    PropertyDescriptor::new("subgroup_padding", PropertyKind::NonNegative),
    PropertyDescriptor::new("group_padding", PropertyKind::NonNegative),
    PropertyDescriptor::new("range_padding", PropertyKind::NonNegative),
    PropertyDescriptor::new(
        "range_padding_units",
        PropertyKind::Enum(PaddingUnits::LABELS),
    ),
    PropertyDescriptor::new("bounds", PropertyKind::Bounds),
];

/// Range over categorical factors.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRange {
    /// Explicit factors; empty means derive them from the plotted data.
    pub factors: Vec<Factor>,
    pub factor_padding: f64,
    pub subgroup_padding: f64,
    pub group_padding: f64,
    pub range_padding: f64,
    pub range_padding_units: PaddingUnits,
    pub bounds: Bounds,
}

impl Default for FactorRange {
    fn default() -> Self {
        Self {
            factors: Vec::new(),
            factor_padding: DEFAULT_FACTOR_PADDING,
            subgroup_padding: DEFAULT_SUBGROUP_PADDING,
            group_padding: DEFAULT_GROUP_PADDING,
            range_padding: 0.0,
            range_padding_units: PaddingUnits::Percent,
            bounds: Bounds::Unbounded,
        }
    }
}

impl FactorRange {
    pub fn new<F: Into<Factor>>(factors: impl IntoIterator<Item = F>) -> SceneResult<Self> {
        let factors: Vec<Factor> = factors.into_iter().map(Into::into).collect();
        check_levels(&factors, "factors")?;
        Ok(Self {
            factors,
            ..Self::default()
        })
    }

    /// Positional scalars become factors; a positional list, or positionals
    /// combined with the `factors` keyword, is ambiguous and rejected.
    pub fn from_args(args: &ModelArgs) -> SceneResult<Self> {
        let mut range = Self::default();
        if !args.positional.is_empty() {
            if args.keywords.contains_key("factors") {
                return Err(SceneError::invalid_argument(
                    "FactorRange",
                    "factors may be given positionally or with the `factors` keyword, not both",
                ));
            }
            if args
                .positional
                .iter()
                .any(|value| matches!(value, PropertyValue::List(_)))
            {
                return Err(SceneError::invalid_argument(
                    "FactorRange",
                    "pass factors as separate positional arguments or with `factors=`, not as a list",
                ));
            }
            let factors = args
                .positional
                .iter()
                .map(|value| Factor::from_value(value, "factors"))
                .collect::<SceneResult<Vec<_>>>()
                .map_err(|err| SceneError::invalid_argument("FactorRange", err.to_string()))?;
            range.factors = factors;
        }
        args.apply_keywords(&mut range)?;
        Ok(range)
    }

    #[must_use]
    pub fn with_paddings(mut self, factor: f64, subgroup: f64, group: f64) -> Self {
        self.factor_padding = factor;
        self.subgroup_padding = subgroup;
        self.group_padding = group;
        self
    }

    #[must_use]
    pub fn with_range_padding(mut self, padding: f64, units: PaddingUnits) -> Self {
        self.range_padding = padding;
        self.range_padding_units = units;
        self
    }

    /// Mapping over the explicit factors.
    #[must_use]
    pub fn mapping(&self) -> FactorMapping {
        FactorMapping::build(&self.factors, self)
    }
}

fn check_levels(factors: &[Factor], property: &str) -> SceneResult<()> {
    let Some(first) = factors.first() else {
        return Ok(());
    };
    let level = first.level();
    if let Some(mixed) = factors.iter().find(|factor| factor.level() != level) {
        return Err(SceneError::validation(
            property,
            format!("factor {mixed:?} does not match the nesting level of {first:?}"),
        ));
    }
    Ok(())
}

impl PropertyContainer for FactorRange {
    fn type_name(&self) -> &'static str {
        "FactorRange"
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        FACTOR_RANGE_PROPERTIES
    }

    fn get(&self, name: &str) -> SceneResult<PropertyValue> {
        Ok(match name {
            "factors" => PropertyValue::List(self.factors.iter().map(Factor::to_value).collect()),
            "factor_padding" => self.factor_padding.into(),
            "subgroup_padding" => self.subgroup_padding.into(),
            "group_padding" => self.group_padding.into(),
            "range_padding" => self.range_padding.into(),
            "range_padding_units" => self.range_padding_units.label().into(),
            "bounds" => self.bounds.to_value(),
            _ => return Err(unknown_property(self.type_name(), name)),
        })
    }

    fn apply(&mut self, name: &str, value: PropertyValue) -> SceneResult<()> {
        match name {
            "factors" => {
                let factors = value
                    .expect_list(name)?
                    .iter()
                    .map(|item| Factor::from_value(item, name))
                    .collect::<SceneResult<Vec<_>>>()?;
                check_levels(&factors, name)?;
                self.factors = factors;
            }
            "factor_padding" => self.factor_padding = value.expect_non_negative(name)?,
            "subgroup_padding" => self.subgroup_padding = value.expect_non_negative(name)?,
            "group_padding" => self.group_padding = value.expect_non_negative(name)?,
            "range_padding" => self.range_padding = value.expect_non_negative(name)?,
            "range_padding_units" => {
                self.range_padding_units = PaddingUnits::from_value(&value, name)?;
            }
            "bounds" => self.bounds = Bounds::from_value(&value, name)?,
            _ => return Err(unknown_property(self.type_name(), name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Factor, FactorRange};
    use crate::core::PropertyValue;

    #[test]
    fn two_level_groups_are_separated_by_group_padding() {
        let range = FactorRange::new([("a", "x"), ("a", "y"), ("b", "x")])
            .expect("range")
            .with_paddings(0.0, 0.8, 1.0);
        let mapping = range.mapping();

        assert_eq!(mapping.coordinate(&Factor::from(("a", "x"))), Some(0.5));
        assert_eq!(mapping.coordinate(&Factor::from(("a", "y"))), Some(1.5));
        assert_eq!(mapping.coordinate(&Factor::from(("b", "x"))), Some(3.5));
        assert_eq!(mapping.top_coordinate("a"), Some(1.0));
        assert_eq!(mapping.end, 4.0);
    }

    #[test]
    fn offsets_shift_factor_centers() {
        let mapping = FactorRange::new(["a", "b"]).expect("range").mapping();
        let value = PropertyValue::List(vec!["b".into(), 0.25.into()]);
        assert_eq!(mapping.synthetic(&value), 1.75);
        assert!(mapping.synthetic(&"zzz".into()).is_nan());
    }
}
