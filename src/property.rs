//! Named, typed properties.
//!
//! Every operator and algorithm exposes its tunable parameters as a list of
//! [`PropertyDescriptor`]s with get/set access through [`Configurable`]. An
//! external editor can enumerate, display and persist them without the
//! engine knowing anything about the storage format.

use crate::error::{MoeaError, Result};

/// The type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyKind {
    /// Boolean flag.
    Bool,
    /// Signed integer.
    Int,
    /// Floating point number.
    Real,
    /// Free text.
    Text,
    /// Vector of floating point numbers.
    RealVec,
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Real(f64),
    /// Free text.
    Text(String),
    /// Vector of floating point numbers.
    RealVec(Vec<f64>),
}

impl PropertyValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Real(_) => PropertyKind::Real,
            PropertyValue::Text(_) => PropertyKind::Text,
            PropertyValue::RealVec(_) => PropertyKind::RealVec,
        }
    }

    /// Extracts a boolean.
    pub fn into_bool(self, key: &str) -> Result<bool> {
        match self {
            PropertyValue::Bool(b) => Ok(b),
            other => Err(type_mismatch(key, PropertyKind::Bool, &other)),
        }
    }

    /// Extracts a real number. Integers are widened.
    pub fn into_real(self, key: &str) -> Result<f64> {
        match self {
            PropertyValue::Real(v) => Ok(v),
            PropertyValue::Int(v) => Ok(v as f64),
            other => Err(type_mismatch(key, PropertyKind::Real, &other)),
        }
    }

    /// Extracts a non-negative integer.
    pub fn into_usize(self, key: &str) -> Result<usize> {
        match self {
            PropertyValue::Int(v) if v >= 0 => Ok(v as usize),
            PropertyValue::Int(v) => Err(MoeaError::configuration(format!(
                "property `{key}` must be non-negative, got {v}"
            ))),
            other => Err(type_mismatch(key, PropertyKind::Int, &other)),
        }
    }

    /// Extracts text.
    pub fn into_text(self, key: &str) -> Result<String> {
        match self {
            PropertyValue::Text(s) => Ok(s),
            other => Err(type_mismatch(key, PropertyKind::Text, &other)),
        }
    }

    /// Extracts a vector of reals.
    pub fn into_reals(self, key: &str) -> Result<Vec<f64>> {
        match self {
            PropertyValue::RealVec(v) => Ok(v),
            other => Err(type_mismatch(key, PropertyKind::RealVec, &other)),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<usize> for PropertyValue {
    fn from(v: usize) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Real(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(v: Vec<f64>) -> Self {
        PropertyValue::RealVec(v)
    }
}

/// Describes one property of a [`Configurable`] object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Lookup key.
    pub key: &'static str,
    /// Expected value type.
    pub kind: PropertyKind,
    /// Human readable description.
    pub description: &'static str,
}

impl PropertyDescriptor {
    /// Creates a descriptor.
    pub const fn new(key: &'static str, kind: PropertyKind, description: &'static str) -> Self {
        Self {
            key,
            kind,
            description,
        }
    }
}

/// Objects exposing named properties.
///
/// The default implementation has no properties: every lookup fails with
/// [`MoeaError::UnknownIdentifier`].
///
/// # Examples
///
/// ```
/// use u_moea::operators::PolynomialMutation;
/// use u_moea::property::{Configurable, PropertyValue};
///
/// let mut pm = PolynomialMutation::default();
/// pm.set_property("eta", PropertyValue::Real(30.0)).unwrap();
/// assert_eq!(pm.property("eta").unwrap(), PropertyValue::Real(30.0));
/// assert!(pm.property("nope").is_err());
/// ```
pub trait Configurable {
    /// Lists the available properties.
    fn properties(&self) -> Vec<PropertyDescriptor> {
        Vec::new()
    }

    /// Reads a property.
    fn property(&self, key: &str) -> Result<PropertyValue> {
        Err(unknown_property(key))
    }

    /// Writes a property.
    ///
    /// Fails with [`MoeaError::UnknownIdentifier`] for an unknown key and with
    /// [`MoeaError::Configuration`] for a value of the wrong type or range.
    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        let _ = value;
        Err(unknown_property(key))
    }
}

/// Error for a property key that does not exist.
pub fn unknown_property(key: &str) -> MoeaError {
    MoeaError::UnknownIdentifier {
        kind: "property",
        id: key.to_string(),
    }
}

fn type_mismatch(key: &str, expected: PropertyKind, found: &PropertyValue) -> MoeaError {
    MoeaError::configuration(format!(
        "property `{key}` expects {expected:?}, got {:?}",
        found.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(PropertyValue::Int(3).into_real("k"), Ok(3.0));
        assert_eq!(PropertyValue::Int(3).into_usize("k"), Ok(3));
        assert!(PropertyValue::Int(-1).into_usize("k").is_err());
        assert!(PropertyValue::Real(1.5).into_bool("k").is_err());
        assert_eq!(
            PropertyValue::from(vec![1.0, 2.0]).into_reals("k"),
            Ok(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_default_configurable_has_nothing() {
        struct Bare;
        impl Configurable for Bare {}

        let mut bare = Bare;
        assert!(bare.properties().is_empty());
        assert!(matches!(
            bare.property("x"),
            Err(MoeaError::UnknownIdentifier { kind: "property", .. })
        ));
        assert!(bare.set_property("x", PropertyValue::Bool(true)).is_err());
    }
}
