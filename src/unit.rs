//! Atomic and composite units.
//!
//! An [`AtomicUnit`] is a single named unit from the registry: label and
//! symbol pairs, a multiplicative scale to the canonical base of its
//! dimensionality, and an optional affine offset. Any algebraic
//! combination of units narrows to a [`CompositeUnit`], which keeps only
//! dimensionality and scale. The offset participates in exactly one
//! operation: scaling an atomic unit by a plain number.

use std::fmt;
use std::ops::Mul;
use std::sync::Arc;

use crate::dimension::Dimensionality;
use crate::error::QuantexError;
use crate::quantity::Quantity;
use crate::registry::UnitRegistry;

/// Registry-internal unit record. Public values pair this with a registry
/// handle.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnitDef {
    pub(crate) id: String,
    pub(crate) label: (String, String),
    pub(crate) symbol: Option<(String, String)>,
    pub(crate) dimensionality: Dimensionality,
    pub(crate) scale: f64,
    pub(crate) offset: f64,
}

impl UnitDef {
    /// Singular and plural display names for the requested style, falling
    /// back to the label when the unit has no symbol.
    pub(crate) fn names(&self, symbol: bool) -> (&str, &str) {
        if symbol {
            if let Some((singular, plural)) = &self.symbol {
                return (singular, plural);
            }
        }
        (&self.label.0, &self.label.1)
    }
}

/// A single named unit bound to its registry.
#[derive(Clone)]
pub struct AtomicUnit {
    pub(crate) def: Arc<UnitDef>,
    pub(crate) registry: UnitRegistry,
}

impl AtomicUnit {
    /// Unique id within the registry: the singular symbol when present,
    /// the singular label otherwise.
    pub fn id(&self) -> &str {
        &self.def.id
    }

    /// `(singular, plural)` label.
    pub fn label(&self) -> (&str, &str) {
        (&self.def.label.0, &self.def.label.1)
    }

    /// `(singular, plural)` symbol, if the unit has one.
    pub fn symbol(&self) -> Option<(&str, &str)> {
        self.def
            .symbol
            .as_ref()
            .map(|(singular, plural)| (singular.as_str(), plural.as_str()))
    }

    pub fn dimensionality(&self) -> &Dimensionality {
        &self.def.dimensionality
    }

    /// Multiplicative factor to the canonical base of the dimensionality.
    pub fn scale(&self) -> f64 {
        self.def.scale
    }

    /// Additive offset from canonical. Only meaningful when the unit is
    /// used on its own; every composite path ignores it.
    pub fn offset(&self) -> f64 {
        self.def.offset
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Materializes a quantity from a number expressed in this unit. This
    /// is the one operation that applies the offset:
    /// `value * scale + offset`.
    pub fn quantity(&self, value: f64) -> Quantity {
        Quantity::raw(
            self.def.dimensionality.clone(),
            value * self.def.scale + self.def.offset,
            self.registry.clone(),
        )
    }

    /// This unit as a plain composite (scale only, no offset).
    pub fn composite(&self) -> CompositeUnit {
        CompositeUnit {
            dimensionality: self.def.dimensionality.clone(),
            scale: self.def.scale,
            registry: self.registry.clone(),
        }
    }

    pub fn try_mul(&self, other: &AtomicUnit) -> Result<CompositeUnit, QuantexError> {
        self.composite().try_mul(&other.composite())
    }

    pub fn try_div(&self, other: &AtomicUnit) -> Result<CompositeUnit, QuantexError> {
        self.composite().try_div(&other.composite())
    }

    pub fn powf(&self, exp: f64) -> CompositeUnit {
        self.composite().powf(exp)
    }
}

impl PartialEq for AtomicUnit {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && self.registry == other.registry
    }
}

impl fmt::Debug for AtomicUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomicUnit({:?})", self.def.id)
    }
}

impl Mul<f64> for &AtomicUnit {
    type Output = Quantity;

    fn mul(self, value: f64) -> Quantity {
        self.quantity(value)
    }
}

impl Mul<&AtomicUnit> for f64 {
    type Output = Quantity;

    fn mul(self, unit: &AtomicUnit) -> Quantity {
        unit.quantity(self)
    }
}

/// Product form of one or more units: dimensionality and scale only.
#[derive(Clone)]
pub struct CompositeUnit {
    pub(crate) dimensionality: Dimensionality,
    pub(crate) scale: f64,
    pub(crate) registry: UnitRegistry,
}

impl CompositeUnit {
    pub fn dimensionality(&self) -> &Dimensionality {
        &self.dimensionality
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// A quantity of `value` in this unit: `value * scale`.
    pub fn quantity(&self, value: f64) -> Quantity {
        Quantity::raw(
            self.dimensionality.clone(),
            value * self.scale,
            self.registry.clone(),
        )
    }

    pub fn try_mul(&self, other: &CompositeUnit) -> Result<CompositeUnit, QuantexError> {
        self.registry.check_same(&other.registry)?;
        Ok(CompositeUnit {
            dimensionality: &self.dimensionality * &other.dimensionality,
            scale: self.scale * other.scale,
            registry: self.registry.clone(),
        })
    }

    pub fn try_div(&self, other: &CompositeUnit) -> Result<CompositeUnit, QuantexError> {
        self.registry.check_same(&other.registry)?;
        Ok(CompositeUnit {
            dimensionality: &self.dimensionality / &other.dimensionality,
            scale: self.scale / other.scale,
            registry: self.registry.clone(),
        })
    }

    pub fn powf(&self, exp: f64) -> CompositeUnit {
        CompositeUnit {
            dimensionality: self.dimensionality.pow(exp),
            scale: self.scale.powf(exp),
            registry: self.registry.clone(),
        }
    }
}

impl PartialEq for CompositeUnit {
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry
            && self.dimensionality == other.dimensionality
            && self.scale == other.scale
    }
}

impl fmt::Debug for CompositeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeUnit")
            .field("dimensionality", &self.dimensionality)
            .field("scale", &self.scale)
            .finish()
    }
}

impl From<&AtomicUnit> for CompositeUnit {
    fn from(unit: &AtomicUnit) -> Self {
        unit.composite()
    }
}

impl Mul<f64> for &CompositeUnit {
    type Output = Quantity;

    fn mul(self, value: f64) -> Quantity {
        self.quantity(value)
    }
}

impl Mul<&CompositeUnit> for f64 {
    type Output = Quantity;

    fn mul(self, unit: &CompositeUnit) -> Quantity {
        unit.quantity(self)
    }
}
