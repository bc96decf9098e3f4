//! Sparse dimensionality vectors and their closed algebra.
//!
//! A [`Dimensionality`] maps free-form dimension names (`length`, `time`,
//! …) to signed, possibly fractional exponents. The canonical form never
//! stores a zero exponent, so equality and hashing are structural.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Div, Mul};

/// Sparse mapping from dimension name to exponent.
///
/// Every constructor prunes zero exponents, which makes the empty value
/// the unique representation of "dimensionless".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimensionality(BTreeMap<String, f64>);

impl Dimensionality {
    /// The empty (dimensionless) value.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single dimension raised to the first power.
    pub fn base(name: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.into(), 1.0);
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn exponent(&self, dimension: &str) -> f64 {
        self.0.get(dimension).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, power)| (name.as_str(), *power))
    }

    /// The sole entry, if there is exactly one.
    pub fn single(&self) -> Option<(&str, f64)> {
        if self.0.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// Exponent-wise combination `self + factor * other`, pruning zeros.
    fn compose(&self, other: &Self, factor: f64) -> Self {
        let mut result = self.0.clone();
        for (dimension, power) in &other.0 {
            let entry = result.entry(dimension.clone()).or_insert(0.0);
            *entry += power * factor;
            if *entry == 0.0 {
                result.remove(dimension);
            }
        }
        Self(result)
    }

    /// Multiplies every exponent by `exp`, pruning zeros.
    pub fn pow(&self, exp: f64) -> Self {
        Self(
            self.0
                .iter()
                .filter_map(|(dimension, power)| {
                    let scaled = power * exp;
                    (scaled != 0.0).then(|| (dimension.clone(), scaled))
                })
                .collect(),
        )
    }
}

impl FromIterator<(String, f64)> for Dimensionality {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter(|(_, power)| *power != 0.0)
                .collect(),
        )
    }
}

impl Mul for &Dimensionality {
    type Output = Dimensionality;

    fn mul(self, other: &Dimensionality) -> Dimensionality {
        self.compose(other, 1.0)
    }
}

impl Div for &Dimensionality {
    type Output = Dimensionality;

    fn div(self, other: &Dimensionality) -> Dimensionality {
        self.compose(other, -1.0)
    }
}

impl Eq for Dimensionality {}

impl Hash for Dimensionality {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // BTreeMap iteration order is canonical; exponents are never NaN.
        for (dimension, power) in &self.0 {
            dimension.hash(state);
            power.to_bits().hash(state);
        }
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for (dimension, power) in &self.0 {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if *power == 1.0 {
                write!(f, "{dimension}")?;
            } else if power.fract() == 0.0 {
                write!(f, "{dimension}^{}", *power as i64)?;
            } else {
                write!(f, "{dimension}^{power}")?;
            }
        }
        Ok(())
    }
}
