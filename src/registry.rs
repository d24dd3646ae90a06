//! Factories for functions, dominance relations and indicators.
//!
//! A [`Registry`] is an ordinary value handed to an
//! [`Algorithm`](crate::algorithms::Algorithm) at construction. Two runs
//! with different registries never see each other's entries, so tests can
//! register throwaway functions without global state.
//!
//! # Examples
//!
//! ```
//! use u_moea::registry::Registry;
//!
//! let registry = Registry::default();
//! let zdt1 = registry.create_function("zdt1").unwrap();
//! assert_eq!(zdt1.inputs().len(), 30);
//!
//! let relation = registry.create_relation("epsilon", 2).unwrap();
//! assert_eq!(relation.dimension(), 2);
//!
//! assert!(registry.create_indicator("igd").is_err());
//! ```

use crate::dominance::{
    DominanceRelation, EpsilonDominance, ParetoDominance, Preferability, ReferencePointDominance,
};
use crate::error::{MoeaError, Result};
use crate::functions::{Dtlz, Zdt};
use crate::indicators::{
    ConfidenceIndicator, ExpectationIndicator, Hypervolume, Indicator, ThresholdIndicator,
};
use crate::representation::Function;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type FunctionFactory = Box<dyn Fn() -> Result<Arc<dyn Function>> + Send + Sync>;
type RelationFactory = Box<dyn Fn(usize) -> Box<dyn DominanceRelation> + Send + Sync>;
type IndicatorFactory = Box<dyn Fn() -> Result<Box<dyn Indicator>> + Send + Sync>;

/// Named factories, looked up by identifier.
///
/// [`Registry::default`] holds the built-in entries:
///
/// | Kind | Identifiers |
/// |---|---|
/// | function | `zdt1`, `zdt2`, `zdt3` (30 variables), `dtlz1` (3 objectives, k = 5), `dtlz2` (3 objectives, k = 10) |
/// | relation | `pareto`, `pareto-strong`, `epsilon`, `reference`, `preferability` |
/// | indicator | `hypervolume`, `confidence` (0.9), `threshold` (0), `expectation` |
///
/// [`Registry::new`] starts empty.
pub struct Registry {
    functions: BTreeMap<String, FunctionFactory>,
    relations: BTreeMap<String, RelationFactory>,
    indicators: BTreeMap<String, IndicatorFactory>,
}

fn unknown(kind: &'static str, id: &str) -> MoeaError {
    MoeaError::UnknownIdentifier {
        kind,
        id: id.to_string(),
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
            relations: BTreeMap::new(),
            indicators: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) a function factory.
    pub fn register_function<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn Function>> + Send + Sync + 'static,
    {
        self.functions.insert(id.into(), Box::new(factory));
    }

    /// Registers (or replaces) a relation factory; the factory receives the
    /// number of objectives.
    pub fn register_relation<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(usize) -> Box<dyn DominanceRelation> + Send + Sync + 'static,
    {
        self.relations.insert(id.into(), Box::new(factory));
    }

    /// Registers (or replaces) an indicator factory.
    pub fn register_indicator<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn Indicator>> + Send + Sync + 'static,
    {
        self.indicators.insert(id.into(), Box::new(factory));
    }

    /// A new function instance.
    pub fn create_function(&self, id: &str) -> Result<Arc<dyn Function>> {
        let factory = self.functions.get(id).ok_or_else(|| unknown("function", id))?;
        factory()
    }

    /// A new relation for `dim` objectives.
    pub fn create_relation(&self, id: &str, dim: usize) -> Result<Box<dyn DominanceRelation>> {
        let factory = self.relations.get(id).ok_or_else(|| unknown("dominance relation", id))?;
        Ok(factory(dim))
    }

    /// A new indicator instance.
    pub fn create_indicator(&self, id: &str) -> Result<Box<dyn Indicator>> {
        let factory = self.indicators.get(id).ok_or_else(|| unknown("indicator", id))?;
        factory()
    }

    /// Registered function identifiers, sorted.
    pub fn function_ids(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    /// Registered relation identifiers, sorted.
    pub fn relation_ids(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }

    /// Registered indicator identifiers, sorted.
    pub fn indicator_ids(&self) -> Vec<&str> {
        self.indicators.keys().map(String::as_str).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut r = Self::new();

        r.register_function("zdt1", || Ok(Arc::new(Zdt::zdt1(30)?) as Arc<dyn Function>));
        r.register_function("zdt2", || Ok(Arc::new(Zdt::zdt2(30)?) as Arc<dyn Function>));
        r.register_function("zdt3", || Ok(Arc::new(Zdt::zdt3(30)?) as Arc<dyn Function>));
        r.register_function("dtlz1", || Ok(Arc::new(Dtlz::dtlz1(3, 5)?) as Arc<dyn Function>));
        r.register_function("dtlz2", || Ok(Arc::new(Dtlz::dtlz2(3, 10)?) as Arc<dyn Function>));

        r.register_relation("pareto", |m| Box::new(ParetoDominance::new(m)));
        r.register_relation("pareto-strong", |m| Box::new(ParetoDominance::strong(m)));
        r.register_relation("epsilon", |m| Box::new(EpsilonDominance::new(m)));
        r.register_relation("reference", |m| Box::new(ReferencePointDominance::new(m)));
        r.register_relation("preferability", |m| Box::new(Preferability::new(m)));

        r.register_indicator("hypervolume", || Ok(Box::new(Hypervolume::new())));
        r.register_indicator("confidence", || Ok(Box::new(ConfidenceIndicator::new(0.9)?)));
        r.register_indicator("threshold", || Ok(Box::new(ThresholdIndicator::new(0.0))));
        r.register_indicator("expectation", || Ok(Box::new(ExpectationIndicator)));
        r
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.function_ids())
            .field("relations", &self.relation_ids())
            .field("indicators", &self.indicator_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dominance::Dominance;
    use crate::representation::{Bounds, ElementProperties};

    struct Sphere {
        inputs: Vec<ElementProperties>,
        outputs: Vec<ElementProperties>,
    }

    impl Function for Sphere {
        fn name(&self) -> &str {
            "sphere"
        }
        fn inputs(&self) -> &[ElementProperties] {
            &self.inputs
        }
        fn outputs(&self) -> &[ElementProperties] {
            &self.outputs
        }
        fn compute(&self, x: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![x.iter().map(|v| v * v).sum()])
        }
    }

    #[test]
    fn test_builtins() {
        let r = Registry::default();
        assert_eq!(r.function_ids(), vec!["dtlz1", "dtlz2", "zdt1", "zdt2", "zdt3"]);
        assert_eq!(
            r.relation_ids(),
            vec!["epsilon", "pareto", "pareto-strong", "preferability", "reference"]
        );
        assert_eq!(r.create_function("dtlz2").unwrap().outputs().len(), 3);

        let pareto = r.create_relation("pareto", 2).unwrap();
        assert_eq!(pareto.is_better_than(&[1.0, 1.0], &[2.0, 2.0]).unwrap(), Dominance::Better);

        let hv = r.create_indicator("hypervolume").unwrap();
        assert_eq!(hv.evaluate(&[vec![1.0, 1.0]]).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_identifier() {
        let r = Registry::new();
        assert!(matches!(
            r.create_function("zdt1"),
            Err(MoeaError::UnknownIdentifier { kind: "function", .. })
        ));
        assert!(matches!(
            r.create_relation("pareto", 2),
            Err(MoeaError::UnknownIdentifier { kind: "dominance relation", .. })
        ));
    }

    #[test]
    fn test_registries_are_isolated() {
        let mut a = Registry::default();
        let b = Registry::default();
        a.register_function("sphere", || {
            Ok(Arc::new(Sphere {
                inputs: vec![ElementProperties::new("x").with_bounds(Bounds::UNIT)],
                outputs: vec![ElementProperties::new("f").minimize()],
            }) as Arc<dyn Function>)
        });
        assert!(a.create_function("sphere").is_ok());
        assert!(b.create_function("sphere").is_err());
    }
}
