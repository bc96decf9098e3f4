//! Dimensionally checked scalar quantities.
//!
//! A [`Quantity`] stores its magnitude in the canonical base of its
//! dimensionality (whatever the user entered, multiplied by the unit's
//! scale and shifted by its offset when the unit was a lone atomic one).
//! Arithmetic is checked: addition requires matching dimensionalities,
//! every binary operation requires matching registries, and neither ever
//! coerces silently.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};

use crate::dimension::Dimensionality;
use crate::error::QuantexError;
use crate::registry::UnitRegistry;
use crate::unit::{AtomicUnit, CompositeUnit};

#[derive(Clone)]
pub struct Quantity {
    dimensionality: Dimensionality,
    value: f64,
    registry: UnitRegistry,
}

impl Quantity {
    pub(crate) fn raw(
        dimensionality: Dimensionality,
        value: f64,
        registry: UnitRegistry,
    ) -> Self {
        Self {
            dimensionality,
            value,
            registry,
        }
    }

    pub fn dimensionality(&self) -> &Dimensionality {
        &self.dimensionality
    }

    /// Magnitude in the canonical base of the dimensionality.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    fn check_compatible(&self, other: &Quantity) -> Result<(), QuantexError> {
        self.registry.check_same(&other.registry)?;
        if self.dimensionality != other.dimensionality {
            return Err(QuantexError::DimensionalityMismatch);
        }
        Ok(())
    }

    /// Sum of two quantities of the same dimensionality and registry.
    pub fn try_add(&self, other: &Quantity) -> Result<Quantity, QuantexError> {
        self.check_compatible(other)?;
        Ok(Quantity::raw(
            self.dimensionality.clone(),
            self.value + other.value,
            self.registry.clone(),
        ))
    }

    pub fn try_sub(&self, other: &Quantity) -> Result<Quantity, QuantexError> {
        self.check_compatible(other)?;
        Ok(Quantity::raw(
            self.dimensionality.clone(),
            self.value - other.value,
            self.registry.clone(),
        ))
    }

    /// Product; dimensionalities compose, no matching constraint.
    pub fn try_mul(&self, other: &Quantity) -> Result<Quantity, QuantexError> {
        self.registry.check_same(&other.registry)?;
        Ok(Quantity::raw(
            &self.dimensionality * &other.dimensionality,
            self.value * other.value,
            self.registry.clone(),
        ))
    }

    pub fn try_div(&self, other: &Quantity) -> Result<Quantity, QuantexError> {
        self.registry.check_same(&other.registry)?;
        Ok(Quantity::raw(
            &self.dimensionality / &other.dimensionality,
            self.value / other.value,
            self.registry.clone(),
        ))
    }

    /// Rescale by a unit: the value multiplies, the dimensionalities
    /// compose. The unit's offset does not participate here.
    pub fn try_mul_unit(&self, unit: &CompositeUnit) -> Result<Quantity, QuantexError> {
        self.registry.check_same(unit.registry())?;
        Ok(Quantity::raw(
            &self.dimensionality * unit.dimensionality(),
            self.value * unit.scale(),
            self.registry.clone(),
        ))
    }

    pub fn try_div_unit(&self, unit: &CompositeUnit) -> Result<Quantity, QuantexError> {
        self.registry.check_same(unit.registry())?;
        Ok(Quantity::raw(
            &self.dimensionality / unit.dimensionality(),
            self.value / unit.scale(),
            self.registry.clone(),
        ))
    }

    /// Raises value and every exponent to `exp`.
    pub fn powf(&self, exp: f64) -> Quantity {
        Quantity::raw(
            self.dimensionality.pow(exp),
            self.value.powf(exp),
            self.registry.clone(),
        )
    }

    /// The number this quantity reads as in `unit`:
    /// `(value - offset) / scale`. Requires matching dimensionality and
    /// registry.
    pub fn magnitude_as(&self, unit: &AtomicUnit) -> Result<f64, QuantexError> {
        self.registry.check_same(unit.registry())?;
        if self.dimensionality != *unit.dimensionality() {
            return Err(QuantexError::DimensionalityMismatch);
        }
        Ok((self.value - unit.offset()) / unit.scale())
    }

    /// Ordering that reports the failure instead of going silent: quantities
    /// of different dimensionalities or registries cannot be ordered.
    pub fn try_cmp(&self, other: &Quantity) -> Result<Ordering, QuantexError> {
        self.check_compatible(other)?;
        self.value
            .partial_cmp(&other.value)
            .ok_or(QuantexError::DimensionalityMismatch)
    }
}

/// Equality is lenient: quantities of different dimensionalities or
/// registries are simply not equal. Ordering is strict and refuses via
/// `None`.
impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry
            && self.dimensionality == other.dimensionality
            && self.value == other.value
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.registry != other.registry || self.dimensionality != other.dimensionality {
            return None;
        }
        self.value.partial_cmp(&other.value)
    }
}

impl Mul<f64> for &Quantity {
    type Output = Quantity;

    fn mul(self, scalar: f64) -> Quantity {
        Quantity::raw(
            self.dimensionality.clone(),
            self.value * scalar,
            self.registry.clone(),
        )
    }
}

impl Div<f64> for &Quantity {
    type Output = Quantity;

    fn div(self, scalar: f64) -> Quantity {
        Quantity::raw(
            self.dimensionality.clone(),
            self.value / scalar,
            self.registry.clone(),
        )
    }
}

impl Neg for &Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::raw(
            self.dimensionality.clone(),
            -self.value,
            self.registry.clone(),
        )
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quantity")
            .field("value", &self.value)
            .field("dimensionality", &self.dimensionality)
            .finish()
    }
}

/// A parsed `value ± uncertainty` pair. The uncertainty is carried, not
/// propagated through arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub quantity: Quantity,
    pub uncertainty: Option<Quantity>,
}

/// A parsed `low - high` range.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityRange {
    pub low: Quantity,
    pub high: Quantity,
}
