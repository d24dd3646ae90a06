//! Typed scalar values.
//!
//! An [`Element`] carries one decision-variable or output value together
//! with its semantic type, optional unit, optional bounds and optimization
//! role. The value is normalized exactly once, at creation: discrete kinds
//! are rounded to whole numbers and bounded values are clamped. Every
//! comparison therefore sees the stored, already-normalized value.

use crate::error::{MoeaError, Result};
use std::cmp::Ordering;
use std::sync::Arc;

/// Semantic type of an [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// Continuous value.
    Real,
    /// Whole number with a meaningful distance.
    Integer,
    /// Ordered category encoded as a whole number.
    Ordinal,
    /// Unordered category encoded as a whole number.
    Nominal,
}

impl ElementType {
    /// Whether values of this kind are rounded to whole numbers.
    pub fn is_discrete(self) -> bool {
        !matches!(self, ElementType::Real)
    }

    /// Whether values of this kind are categories (ordinal or nominal).
    pub fn is_categorical(self) -> bool {
        matches!(self, ElementType::Ordinal | ElementType::Nominal)
    }
}

/// Optimization role of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptimizationType {
    /// Lower is better.
    Minimize,
    /// Higher is better.
    Maximize,
    /// Not an objective.
    #[default]
    None,
}

/// Closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    /// The unit interval `[0, 1]`.
    pub const UNIT: Bounds = Bounds {
        lower: 0.0,
        upper: 1.0,
    };

    /// Creates bounds, rejecting NaN and inverted intervals.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(MoeaError::configuration(format!(
                "invalid bounds [{lower}, {upper}]"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Lower bound.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Clamps `value` into the interval. NaN stays NaN.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    /// Whether `value` lies inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// A single typed value.
///
/// # Examples
///
/// ```
/// use u_moea::representation::{Bounds, Element, ElementType};
///
/// let bounds = Bounds::new(0.0, 10.0).unwrap();
/// let e = Element::new(12.7, ElementType::Integer).with_bounds(bounds);
/// assert_eq!(e.value(), 10.0);
///
/// let e = e.with_value(3.4);
/// assert_eq!(e.value(), 3.0);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    value: f64,
    kind: ElementType,
    bounds: Option<Bounds>,
    role: OptimizationType,
    unit: Option<Arc<str>>,
}

impl Element {
    /// Creates an unbounded element with no role.
    pub fn new(value: f64, kind: ElementType) -> Self {
        Self {
            value: normalize(value, kind, None),
            kind,
            bounds: None,
            role: OptimizationType::None,
            unit: None,
        }
    }

    /// Creates a real-valued element.
    pub fn real(value: f64) -> Self {
        Self::new(value, ElementType::Real)
    }

    /// Creates an integer element.
    pub fn integer(value: i64) -> Self {
        Self::new(value as f64, ElementType::Integer)
    }

    /// Attaches bounds and re-applies the clamping policy.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self.value = normalize(self.value, self.kind, self.bounds.as_ref());
        self
    }

    /// Sets the optimization role.
    pub fn with_role(mut self, role: OptimizationType) -> Self {
        self.role = role;
        self
    }

    /// Sets the unit label.
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Returns a new element with the same metadata holding `value`.
    ///
    /// The creation policy (rounding, clamping) is applied to `value`.
    pub fn with_value(&self, value: f64) -> Self {
        Self {
            value: normalize(value, self.kind, self.bounds.as_ref()),
            kind: self.kind,
            bounds: self.bounds,
            role: self.role,
            unit: self.unit.clone(),
        }
    }

    /// The stored numeric value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The semantic type.
    pub fn kind(&self) -> ElementType {
        self.kind
    }

    /// The bounds, if any.
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// The optimization role.
    pub fn role(&self) -> OptimizationType {
        self.role
    }

    /// The unit label, if any.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

fn normalize(value: f64, kind: ElementType, bounds: Option<&Bounds>) -> f64 {
    let mut v = if kind.is_discrete() { value.round() } else { value };
    if let Some(b) = bounds {
        v = b.clamp(v);
        // Rounding may have crossed a fractional bound.
        if kind.is_discrete() && !b.contains(v.round()) {
            v = if v.ceil() <= b.upper() { v.ceil() } else { v.floor() };
        } else if kind.is_discrete() {
            v = v.round();
        }
    }
    v
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl PartialOrd for Element {
    /// Elements of different kinds are not comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.kind != other.kind {
            return None;
        }
        self.value.partial_cmp(&other.value)
    }
}

/// Declaration of one function input or output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementProperties {
    name: String,
    description: String,
    kind: ElementType,
    bounds: Option<Bounds>,
    role: OptimizationType,
    unit: Option<Arc<str>>,
}

impl ElementProperties {
    /// Creates a real-valued declaration with no bounds and no role.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: ElementType::Real,
            bounds: None,
            role: OptimizationType::None,
            unit: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the semantic type.
    pub fn with_kind(mut self, kind: ElementType) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the bounds.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Sets the unit label.
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Marks the output as an objective to minimize.
    pub fn minimize(mut self) -> Self {
        self.role = OptimizationType::Minimize;
        self
    }

    /// Marks the output as an objective to maximize.
    pub fn maximize(mut self) -> Self {
        self.role = OptimizationType::Maximize;
        self
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Semantic type.
    pub fn kind(&self) -> ElementType {
        self.kind
    }

    /// Bounds, if any.
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Optimization role.
    pub fn role(&self) -> OptimizationType {
        self.role
    }

    /// Unit label, if any.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Creates an element carrying these metadata.
    pub fn element(&self, value: f64) -> Element {
        let mut e = Element::new(value, self.kind).with_role(self.role);
        if let Some(b) = self.bounds {
            e = e.with_bounds(b);
        }
        if let Some(u) = &self.unit {
            e.unit = Some(Arc::clone(u));
        }
        e
    }

    /// Whether two declarations of the same name describe the same variable.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.bounds == other.bounds
    }
}
