//! Units-of-measure engine.
//!
//! This crate loads a declarative registry of physical units, parses
//! textual quantity and unit expressions, performs dimensionally checked
//! arithmetic on scalar quantities, and renders quantities back to
//! human-readable strings chosen from catalogs of unit presentations
//! ("contexts").
//!
//! ```
//! use quantex::load_default;
//!
//! let registry = load_default()?;
//!
//! let speed = registry.parse_quantity("10.8 m/s")?;
//! assert_eq!(speed.format("velocity")?, "10.80 m/s");
//!
//! let km = registry.parse_quantity("3 km")?;
//! let m = registry.parse_quantity("200 m")?;
//! assert_eq!(km.try_add(&m)?.value(), 3200.0);
//! # Ok::<(), quantex::QuantexError>(())
//! ```

mod assembly;
mod dimension;
mod display;
mod error;
mod parser;
mod quantity;
mod registry;
mod serialize;
mod suggestions;
mod unit;

pub use crate::assembly::{
    Context, ContextVariant, ContextVariantOption, UnitAssembly, UnitAssemblyConstantPart,
    UnitAssemblyVariablePart,
};
pub use crate::dimension::Dimensionality;
pub use crate::display::{FormatSpec, UnitStyle};
pub use crate::error::{QuantexError, Span};
pub use crate::quantity::{Measurement, Quantity, QuantityRange};
pub use crate::registry::{Extent, UnitRegistry};
pub use crate::serialize::{
    ContextSnapshot, OptionSnapshot, RegistrySnapshot, UnitSnapshot, VariantSnapshot,
};
pub use crate::unit::{AtomicUnit, CompositeUnit};

/// The registry document bundled with the crate.
pub const DEFAULT_REGISTRY: &str = include_str!("../registry.toml");

/// Loads the bundled SI registry.
pub fn load_default() -> Result<UnitRegistry, QuantexError> {
    UnitRegistry::from_toml_str(DEFAULT_REGISTRY)
}
