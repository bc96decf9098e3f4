//! Stable external form of a registry.
//!
//! The snapshot is the cross-process contract handed to downstream
//! runtimes: contexts with their fully expanded options (as
//! `[unit_id, power]` pairs plus the precomputed option scale) and the
//! enumerated units. Units carry their dimensionality so a snapshot can
//! be reloaded into a registry that still checks dimensionalities when
//! formatting.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assembly::{AssemblyPart, Context, ContextVariant, ContextVariantOption};
use crate::dimension::Dimensionality;
use crate::error::QuantexError;
use crate::registry::{RegistryInner, UnitRegistry};
use crate::unit::UnitDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSnapshot {
    /// `[unit_id, power]` pairs of the instantiated assembly.
    pub assembly: Vec<(String, f64)>,
    /// Composite scale of the assembly.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub options: Vec<OptionSnapshot>,
    pub systems: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub variants: Vec<VariantSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub label: (String, String),
    pub offset: f64,
    /// `null` when the unit has no symbol; the only nullable field.
    pub symbol: Option<(String, String)>,
    pub value: f64,
    pub dimensionality: BTreeMap<String, f64>,
}

/// Serialized registry: stable field names, deterministic ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub contexts: BTreeMap<String, ContextSnapshot>,
    pub units: BTreeMap<String, UnitSnapshot>,
}

fn dimensionality_map(dimensionality: &Dimensionality) -> BTreeMap<String, f64> {
    dimensionality
        .iter()
        .map(|(name, power)| (name.to_string(), power))
        .collect()
}

impl UnitRegistry {
    /// Serializes the registry to its stable external form.
    pub fn serialize(&self) -> RegistrySnapshot {
        let contexts = self
            .inner
            .contexts
            .iter()
            .map(|(name, context)| {
                let variants = context
                    .variants()
                    .iter()
                    .map(|variant| VariantSnapshot {
                        options: variant
                            .options()
                            .iter()
                            .map(|option| OptionSnapshot {
                                assembly: option
                                    .parts()
                                    .map(|(id, power)| (id.to_string(), power))
                                    .collect(),
                                value: option.scale(),
                            })
                            .collect(),
                        systems: variant.systems().to_vec(),
                    })
                    .collect();
                (name.clone(), ContextSnapshot { variants })
            })
            .collect();

        let units = self
            .inner
            .units_by_id
            .iter()
            .map(|(id, unit)| {
                (
                    id.clone(),
                    UnitSnapshot {
                        label: unit.label.clone(),
                        offset: unit.offset,
                        symbol: unit.symbol.clone(),
                        value: unit.scale,
                        dimensionality: dimensionality_map(&unit.dimensionality),
                    },
                )
            })
            .collect();

        RegistrySnapshot { contexts, units }
    }

    /// Reconstructs a registry from a snapshot.
    ///
    /// The result formats identically to the registry the snapshot was
    /// taken from. Only unit ids survive as lookup names, and unit groups
    /// are rebuilt from the recorded dimensionalities.
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Result<Self, QuantexError> {
        let mut units_by_id: HashMap<String, Arc<UnitDef>> = HashMap::new();
        let mut units_by_name = HashMap::new();
        let mut unit_groups: HashMap<String, Vec<Arc<UnitDef>>> = HashMap::new();

        for (id, unit) in &snapshot.units {
            let def = Arc::new(UnitDef {
                id: id.clone(),
                label: unit.label.clone(),
                symbol: unit.symbol.clone(),
                dimensionality: unit
                    .dimensionality
                    .iter()
                    .map(|(name, power)| (name.clone(), *power))
                    .collect(),
                scale: unit.value,
                offset: unit.offset,
            });
            units_by_id.insert(id.clone(), def.clone());
            units_by_name.insert(id.clone(), def.clone());

            if let Some((dimension, power)) = def.dimensionality.single() {
                if power == 1.0 {
                    unit_groups
                        .entry(dimension.to_string())
                        .or_default()
                        .push(def.clone());
                }
            }
            unit_groups.insert(id.clone(), vec![def]);
        }

        let mut contexts = HashMap::new();
        for (name, context) in &snapshot.contexts {
            let mut dimensionality = Dimensionality::new();
            let mut variants = Vec::new();

            for variant in &context.variants {
                let mut options = Vec::new();
                for option in &variant.options {
                    let mut assembly = Vec::new();
                    for (id, power) in &option.assembly {
                        let unit = units_by_id
                            .get(id)
                            .ok_or_else(|| QuantexError::UnknownUnitId(id.clone()))?;
                        assembly.push(AssemblyPart {
                            unit: unit.clone(),
                            power: *power,
                        });
                    }
                    options.push(ContextVariantOption {
                        assembly,
                        scale: option.value,
                    });
                }
                variants.push(ContextVariant {
                    options,
                    systems: variant.systems.clone(),
                });
            }

            // All options share the context dimensionality; recover it
            // from the first one.
            if let Some(option) = variants
                .first()
                .and_then(|variant| variant.options.first())
            {
                for part in &option.assembly {
                    dimensionality = &dimensionality * &part.unit.dimensionality.pow(part.power);
                }
            }

            contexts.insert(
                name.clone(),
                Context {
                    name: Some(name.clone()),
                    dimensionality,
                    variants,
                },
            );
        }

        Ok(Self::from_parts(RegistryInner {
            units_by_id,
            units_by_name,
            unit_groups,
            contexts,
            extents_by_name: HashMap::new(),
            extents_by_dimensionality: HashMap::new(),
        }))
    }
}
