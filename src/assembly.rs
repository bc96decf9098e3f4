//! Unit assemblies and presentation contexts.
//!
//! An assembly describes how a quantity is presented: an ordered list of
//! `(unit, power)` parts, with at most one *variable* slot whose unit is
//! chosen from a candidate set. Contexts are catalogs of fully expanded
//! assemblies grouped into variants per measurement system.

use std::sync::Arc;

use crate::dimension::Dimensionality;
use crate::registry::UnitRegistry;
use crate::unit::{AtomicUnit, UnitDef};

/// One `(unit, power)` entry of an instantiated assembly.
#[derive(Debug, Clone)]
pub(crate) struct AssemblyPart {
    pub(crate) unit: Arc<UnitDef>,
    pub(crate) power: f64,
}

/// Variable slot of a parsed assembly: the unit is not fixed but ranges
/// over `units`.
#[derive(Debug, Clone)]
pub(crate) struct RawVariablePart {
    pub(crate) units: Vec<Arc<UnitDef>>,
    pub(crate) power: f64,
}

/// Parsed form of an assembly. The parser enforces that at most one part
/// is variable; constant parts after it accumulate into `after`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawAssembly {
    pub(crate) before: Vec<AssemblyPart>,
    pub(crate) variable: Option<RawVariablePart>,
    pub(crate) after: Vec<AssemblyPart>,
}

impl RawAssembly {
    pub(crate) fn is_empty(&self) -> bool {
        self.before.is_empty() && self.variable.is_none() && self.after.is_empty()
    }

    /// Substitutes each candidate of the variable part, yielding one
    /// constant assembly per candidate (or the constant parts as-is when
    /// there is no variable slot).
    pub(crate) fn expand(&self) -> Vec<Vec<AssemblyPart>> {
        match &self.variable {
            Some(variable) => variable
                .units
                .iter()
                .map(|unit| {
                    let mut parts = self.before.clone();
                    parts.push(AssemblyPart {
                        unit: unit.clone(),
                        power: variable.power,
                    });
                    parts.extend(self.after.iter().cloned());
                    parts
                })
                .collect(),
            None => vec![self.before.clone()],
        }
    }
}

/// Composite scale of a constant assembly: `∏ unit.scale ^ power`.
pub(crate) fn assembly_scale(parts: &[AssemblyPart]) -> f64 {
    parts
        .iter()
        .map(|part| part.unit.scale.powf(part.power))
        .product()
}

/// A fully instantiated presentation option with its precomputed scale.
#[derive(Debug, Clone)]
pub struct ContextVariantOption {
    pub(crate) assembly: Vec<AssemblyPart>,
    pub(crate) scale: f64,
}

impl ContextVariantOption {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// `(unit id, power)` pairs of the instantiated assembly.
    pub fn parts(&self) -> impl Iterator<Item = (&str, f64)> {
        self.assembly
            .iter()
            .map(|part| (part.unit.id.as_str(), part.power))
    }
}

/// Context entry bound to one or more measurement systems.
#[derive(Debug, Clone)]
pub struct ContextVariant {
    pub(crate) options: Vec<ContextVariantOption>,
    pub(crate) systems: Vec<String>,
}

impl ContextVariant {
    pub fn options(&self) -> &[ContextVariantOption] {
        &self.options
    }

    pub fn systems(&self) -> &[String] {
        &self.systems
    }
}

/// A named, dimensionality-typed catalog of presentation variants. All
/// options of all variants share the context's dimensionality; the loader
/// enforces this.
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) name: Option<String>,
    pub(crate) dimensionality: Dimensionality,
    pub(crate) variants: Vec<ContextVariant>,
}

impl Context {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dimensionality(&self) -> &Dimensionality {
        &self.dimensionality
    }

    pub fn variants(&self) -> &[ContextVariant] {
        &self.variants
    }
}

/// Constant part of a parsed assembly, as handed to callers.
#[derive(Debug, Clone)]
pub struct UnitAssemblyConstantPart {
    pub unit: AtomicUnit,
    pub power: f64,
}

/// Variable part of a parsed assembly, as handed to callers.
#[derive(Debug, Clone)]
pub struct UnitAssemblyVariablePart {
    pub units: Vec<AtomicUnit>,
    pub power: f64,
}

/// Parsed form of an assembly with registry-bound units.
#[derive(Debug, Clone)]
pub struct UnitAssembly {
    pub before: Vec<UnitAssemblyConstantPart>,
    pub variable: Option<UnitAssemblyVariablePart>,
    pub after: Vec<UnitAssemblyConstantPart>,
}

impl UnitAssembly {
    pub(crate) fn from_raw(raw: &RawAssembly, registry: &UnitRegistry) -> Self {
        let bind = |part: &AssemblyPart| UnitAssemblyConstantPart {
            unit: AtomicUnit {
                def: part.unit.clone(),
                registry: registry.clone(),
            },
            power: part.power,
        };
        Self {
            before: raw.before.iter().map(bind).collect(),
            variable: raw.variable.as_ref().map(|variable| UnitAssemblyVariablePart {
                units: variable
                    .units
                    .iter()
                    .map(|unit| AtomicUnit {
                        def: unit.clone(),
                        registry: registry.clone(),
                    })
                    .collect(),
                power: variable.power,
            }),
            after: raw.after.iter().map(bind).collect(),
        }
    }
}
