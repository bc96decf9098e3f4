//! Unit registry: declarative TOML loading, prefix expansion, name and
//! group indexes, contexts and named extents.
//!
//! A registry is built once from its declarative source and immutable
//! afterwards. [`UnitRegistry`] is a cheap-clone handle; every quantity,
//! unit and context created from it carries one back, and operations
//! across distinct registries fail rather than coerce.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::assembly::{
    assembly_scale, AssemblyPart, Context, ContextVariant, ContextVariantOption, UnitAssembly,
};
use crate::dimension::Dimensionality;
use crate::error::QuantexError;
use crate::parser::{tokenize, UnitResolver};
use crate::quantity::{Measurement, Quantity, QuantityRange};
use crate::suggestions;
use crate::unit::{AtomicUnit, CompositeUnit, UnitDef};

/// A named dimensionality extent (`velocity`, `flowrate`, …), used by
/// typed downstream facades.
#[derive(Debug, Clone, PartialEq)]
pub struct Extent {
    pub name: String,
    pub value: Dimensionality,
}

pub(crate) struct RegistryInner {
    pub(crate) units_by_id: HashMap<String, Arc<UnitDef>>,
    pub(crate) units_by_name: HashMap<String, Arc<UnitDef>>,
    pub(crate) unit_groups: HashMap<String, Vec<Arc<UnitDef>>>,
    pub(crate) contexts: HashMap<String, Context>,
    pub(crate) extents_by_name: HashMap<String, Extent>,
    pub(crate) extents_by_dimensionality: HashMap<Dimensionality, Extent>,
}

impl UnitResolver for RegistryInner {
    fn resolve_unit(&self, name: &str) -> Option<&Arc<UnitDef>> {
        self.units_by_name.get(name)
    }

    fn resolve_group(&self, key: &str) -> Option<&[Arc<UnitDef>]> {
        self.unit_groups.get(key).map(Vec::as_slice)
    }

    fn similar_unit_names(&self, name: &str) -> Vec<String> {
        suggestions::similar_names(name, self.units_by_name.keys().map(String::as_str))
    }
}

/// Handle to an immutable unit registry.
#[derive(Clone)]
pub struct UnitRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl PartialEq for UnitRegistry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("units", &self.inner.units_by_id.len())
            .field("contexts", &self.inner.contexts.len())
            .finish()
    }
}

impl UnitRegistry {
    /// Builds a registry from a declarative TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, QuantexError> {
        let document: RegistryDocument =
            toml::from_str(source).map_err(|err| QuantexError::Decode(err.to_string()))?;
        Self::from_document(document)
    }

    /// Builds a registry from raw bytes (UTF-8 TOML).
    pub fn from_toml_slice(source: &[u8]) -> Result<Self, QuantexError> {
        let text =
            std::str::from_utf8(source).map_err(|err| QuantexError::Decode(err.to_string()))?;
        Self::from_toml_str(text)
    }

    pub(crate) fn from_parts(inner: RegistryInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn check_same(&self, other: &UnitRegistry) -> Result<(), QuantexError> {
        if self != other {
            return Err(QuantexError::RegistryMismatch);
        }
        Ok(())
    }

    fn bind(&self, def: &Arc<UnitDef>) -> AtomicUnit {
        AtomicUnit {
            def: def.clone(),
            registry: self.clone(),
        }
    }

    /// Looks up a unit under any of its registered names (labels, symbols
    /// and prefixed variants of both).
    pub fn unit(&self, name: &str) -> Result<AtomicUnit, QuantexError> {
        match self.inner.units_by_name.get(name) {
            Some(def) => Ok(self.bind(def)),
            None => Err(QuantexError::InvalidUnitName {
                name: name.to_string(),
                suggestions: self.inner.similar_unit_names(name),
            }),
        }
    }

    /// Looks up a unit by its id.
    pub fn unit_by_id(&self, id: &str) -> Option<AtomicUnit> {
        self.inner.units_by_id.get(id).map(|def| self.bind(def))
    }

    /// All registered units, in unspecified order.
    pub fn units(&self) -> impl Iterator<Item = AtomicUnit> + '_ {
        self.inner.units_by_id.values().map(|def| self.bind(def))
    }

    /// Members of a unit group: either all exponent-one units of a
    /// dimension, or a base unit with its prefixed variants.
    pub fn unit_group(&self, key: &str) -> Option<Vec<AtomicUnit>> {
        self.inner
            .unit_groups
            .get(key)
            .map(|group| group.iter().map(|def| self.bind(def)).collect())
    }

    /// A dimensionless quantity of this registry.
    pub fn dimensionless(&self, value: f64) -> Quantity {
        Quantity::raw(Dimensionality::new(), value, self.clone())
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.inner.contexts.get(name)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.inner.contexts.values()
    }

    pub fn extent(&self, name: &str) -> Option<&Extent> {
        self.inner.extents_by_name.get(name)
    }

    pub fn extent_of(&self, dimensionality: &Dimensionality) -> Option<&Extent> {
        self.inner.extents_by_dimensionality.get(dimensionality)
    }

    /// Parses a quantity expression such as `"10.8 m/s"` or `"0.5"`.
    pub fn parse_quantity(&self, source: &str) -> Result<Quantity, QuantexError> {
        let mut walker = tokenize(source, self.inner.as_ref())?;
        let quantity = walker.accept_quantity()?;
        let quantity = walker.expect_only(quantity)?;
        Ok(Quantity::raw(
            quantity.dimensionality,
            quantity.value,
            self.clone(),
        ))
    }

    /// Parses a `value [± uncertainty]` measurement.
    pub fn parse_measurement(&self, source: &str) -> Result<Measurement, QuantexError> {
        let mut walker = tokenize(source, self.inner.as_ref())?;
        let measurement = walker.accept_measurement()?;
        let (quantity, uncertainty) = walker.expect_only(measurement)?;
        Ok(Measurement {
            quantity: Quantity::raw(quantity.dimensionality, quantity.value, self.clone()),
            uncertainty: uncertainty
                .map(|raw| Quantity::raw(raw.dimensionality, raw.value, self.clone())),
        })
    }

    /// Parses a `low - high` range.
    pub fn parse_range(&self, source: &str) -> Result<QuantityRange, QuantexError> {
        let mut walker = tokenize(source, self.inner.as_ref())?;
        let range = walker.accept_range()?;
        let (low, high) = walker.expect_only(range)?;
        Ok(QuantityRange {
            low: Quantity::raw(low.dimensionality, low.value, self.clone()),
            high: Quantity::raw(high.dimensionality, high.value, self.clone()),
        })
    }

    /// Parses a composite unit expression such as `"kg*m/s**2"`. The
    /// result is a plain composite; any affine offset of a lone unit does
    /// not survive this path.
    pub fn parse_unit(&self, source: &str) -> Result<CompositeUnit, QuantexError> {
        let mut walker = tokenize(source, self.inner.as_ref())?;
        let unit = walker.accept_composite_unit()?;
        let unit = walker.expect_only(unit)?;
        Ok(CompositeUnit {
            dimensionality: unit.dimensionality().clone(),
            scale: unit.scale(),
            registry: self.clone(),
        })
    }

    /// Parses an assembly such as `"~liter/s"` and returns it along with
    /// its dimensionality.
    pub fn parse_assembly(
        &self,
        source: &str,
    ) -> Result<(UnitAssembly, Dimensionality), QuantexError> {
        let mut walker = tokenize(source, self.inner.as_ref())?;
        let assembly = walker.accept_assembly()?;
        let (raw, dimensionality) = walker.expect_only(assembly)?;
        Ok((UnitAssembly::from_raw(&raw, self), dimensionality))
    }

    /// Parses an assembly and instantiates it as an unnamed single-variant
    /// context, expanding the variable part over its candidate units.
    pub fn assembly_context(&self, source: &str) -> Result<Context, QuantexError> {
        let mut walker = tokenize(source, self.inner.as_ref())?;
        let assembly = walker.accept_assembly()?;
        let (raw, dimensionality) = walker.expect_only(assembly)?;
        let options = raw
            .expand()
            .into_iter()
            .map(|parts| ContextVariantOption {
                scale: assembly_scale(&parts),
                assembly: parts,
            })
            .collect();
        Ok(Context {
            name: None,
            dimensionality,
            variants: vec![ContextVariant {
                options,
                systems: vec!["SI".to_string()],
            }],
        })
    }
}

// ---------------------------------------------------------------------------
// Declarative document model
// ---------------------------------------------------------------------------

/// A name given either as one string (used for singular and plural) or as
/// a `[singular, plural]` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NameData {
    Single(String),
    Pair([String; 2]),
}

impl NameData {
    fn into_pair(self) -> (String, String) {
        match self {
            Self::Single(name) => (name.clone(), name),
            Self::Pair([singular, plural]) => (singular, plural),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PrefixData {
    factor: f64,
    label: String,
    symbol: String,
    symbol_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PrefixSystemData {
    name: String,
    #[serde(default)]
    extend: Vec<String>,
    #[serde(default)]
    prefixes: Vec<PrefixData>,
}

#[derive(Debug, Deserialize)]
struct UnitData {
    dimensionality: BTreeMap<String, f64>,
    label: NameData,
    label_names: Option<Vec<String>>,
    symbol: Option<NameData>,
    symbol_names: Option<Vec<String>>,
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(default)]
    offset: f64,
    #[serde(default = "default_unit_value")]
    value: f64,
}

fn default_unit_value() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct VariantData {
    options: Vec<String>,
    systems: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ContextData {
    name: String,
    variants: Vec<VariantData>,
}

#[derive(Debug, Deserialize)]
struct ExtentData {
    name: String,
    value: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    prefix_systems: Vec<PrefixSystemData>,
    #[serde(default)]
    units: Vec<UnitData>,
    #[serde(default)]
    contexts: Vec<ContextData>,
    #[serde(default)]
    dimensionalities: Vec<ExtentData>,
}

fn load_dimensionality(data: BTreeMap<String, f64>) -> Dimensionality {
    data.into_iter().collect()
}

/// In-progress name and group indexes, used to resolve context option
/// assemblies while the registry is still being built.
#[derive(Default)]
struct LoadIndex {
    units_by_id: HashMap<String, Arc<UnitDef>>,
    units_by_name: HashMap<String, Arc<UnitDef>>,
    unit_groups: HashMap<String, Vec<Arc<UnitDef>>>,
}

impl UnitResolver for LoadIndex {
    fn resolve_unit(&self, name: &str) -> Option<&Arc<UnitDef>> {
        self.units_by_name.get(name)
    }

    fn resolve_group(&self, key: &str) -> Option<&[Arc<UnitDef>]> {
        self.unit_groups.get(key).map(Vec::as_slice)
    }
}

impl LoadIndex {
    fn register(&mut self, def: &Arc<UnitDef>, names: impl IntoIterator<Item = String>) {
        self.units_by_id.insert(def.id.clone(), def.clone());
        for name in names {
            self.units_by_name.insert(name, def.clone());
        }
    }
}

impl UnitRegistry {
    fn from_document(document: RegistryDocument) -> Result<Self, QuantexError> {
        let mut index = LoadIndex::default();
        let mut contexts = HashMap::new();

        // The dimensionless unit and context are always present.
        let dimensionless = Arc::new(UnitDef {
            id: "dimensionless".to_string(),
            label: ("dimensionless".to_string(), "dimensionless".to_string()),
            symbol: None,
            dimensionality: Dimensionality::new(),
            scale: 1.0,
            offset: 0.0,
        });
        index.register(&dimensionless, ["dimensionless".to_string()]);
        contexts.insert(
            "dimensionless".to_string(),
            Context {
                name: Some("dimensionless".to_string()),
                dimensionality: Dimensionality::new(),
                variants: vec![ContextVariant {
                    options: vec![ContextVariantOption {
                        assembly: Vec::new(),
                        scale: 1.0,
                    }],
                    systems: vec!["SI".to_string()],
                }],
            },
        );

        let prefix_systems: HashMap<&str, &PrefixSystemData> = document
            .prefix_systems
            .iter()
            .map(|system| (system.name.as_str(), system))
            .collect();

        for data in document.units {
            let label = data.label.clone().into_pair();
            let symbol = data.symbol.clone().map(NameData::into_pair);
            let id = symbol
                .as_ref()
                .map(|(singular, _)| singular.clone())
                .unwrap_or_else(|| label.0.clone());

            let label_names = data
                .label_names
                .clone()
                .unwrap_or_else(|| vec![label.0.clone(), label.1.clone()]);
            let symbol_names = data.symbol_names.clone().unwrap_or_else(|| {
                symbol
                    .as_ref()
                    .map(|(singular, plural)| vec![singular.clone(), plural.clone()])
                    .unwrap_or_default()
            });

            let unit = Arc::new(UnitDef {
                id,
                label: label.clone(),
                symbol: symbol.clone(),
                dimensionality: load_dimensionality(data.dimensionality.clone()),
                scale: data.value,
                offset: data.offset,
            });
            index.register(
                &unit,
                label_names.iter().chain(symbol_names.iter()).cloned(),
            );

            let mut all_units = vec![unit.clone()];

            // Transitive prefix-system expansion; the seen-set keeps
            // `extend` cycles finite.
            let mut pending: Vec<&str> = data.prefixes.iter().map(String::as_str).collect();
            let mut seen: HashSet<&str> = HashSet::new();
            while let Some(system_name) = pending.pop() {
                if !seen.insert(system_name) {
                    continue;
                }
                let system = prefix_systems.get(system_name).ok_or_else(|| {
                    QuantexError::UnknownPrefixSystem(system_name.to_string())
                })?;
                pending.extend(system.extend.iter().map(String::as_str));

                for prefix in &system.prefixes {
                    let prefixed_symbol = symbol.as_ref().map(|(singular, plural)| {
                        (
                            format!("{}{}", prefix.symbol, singular),
                            format!("{}{}", prefix.symbol, plural),
                        )
                    });
                    let prefixed_id = prefixed_symbol
                        .as_ref()
                        .map(|(singular, _)| singular.clone())
                        .unwrap_or_else(|| format!("{}{}", prefix.label, label.0));

                    let prefixed = Arc::new(UnitDef {
                        id: prefixed_id,
                        label: (
                            format!("{}{}", prefix.label, label.0),
                            format!("{}{}", prefix.label, label.1),
                        ),
                        symbol: prefixed_symbol,
                        dimensionality: unit.dimensionality.clone(),
                        scale: prefix.factor * unit.scale,
                        offset: unit.offset,
                    });

                    let prefix_symbol_names = prefix
                        .symbol_names
                        .clone()
                        .unwrap_or_else(|| vec![prefix.symbol.clone()]);
                    let mut names: Vec<String> = label_names
                        .iter()
                        .map(|name| format!("{}{}", prefix.label, name))
                        .collect();
                    for symbol_name in &symbol_names {
                        for prefix_name in &prefix_symbol_names {
                            names.push(format!("{prefix_name}{symbol_name}"));
                        }
                    }

                    index.register(&prefixed, names);
                    all_units.push(prefixed);
                }
            }

            // Group by dimension name for plain single-dimension units,
            // and always under the base unit's own id and singular label,
            // so both `~m` and `~meter` reach the prefixed family.
            if let Some((dimension, power)) = unit.dimensionality.single() {
                if power == 1.0 {
                    index
                        .unit_groups
                        .entry(dimension.to_string())
                        .or_default()
                        .extend(all_units.iter().cloned());
                }
            }
            index.unit_groups.insert(unit.id.clone(), all_units.clone());
            index.unit_groups.insert(label.0.clone(), all_units);
        }

        for data in document.contexts {
            let mut context_dimensionality: Option<Dimensionality> = None;
            let mut variants = Vec::new();

            for variant in data.variants {
                let mut assemblies = Vec::new();

                for option in &variant.options {
                    let mut walker = tokenize(option, &index)?;
                    let assembly = walker.accept_assembly()?;
                    let (assembly, dimensionality) = walker.expect_only(assembly)?;

                    match &context_dimensionality {
                        None => context_dimensionality = Some(dimensionality),
                        Some(expected) if *expected != dimensionality => {
                            return Err(QuantexError::MismatchedOptionDimensionality(
                                data.name.clone(),
                            ));
                        }
                        Some(_) => {}
                    }

                    assemblies.extend(assembly.expand());
                }

                let options = assemblies
                    .into_iter()
                    .map(|parts: Vec<AssemblyPart>| ContextVariantOption {
                        scale: assembly_scale(&parts),
                        assembly: parts,
                    })
                    .collect();

                variants.push(ContextVariant {
                    options,
                    systems: variant
                        .systems
                        .unwrap_or_else(|| vec!["SI".to_string()]),
                });
            }

            let Some(dimensionality) = context_dimensionality else {
                continue;
            };
            contexts.insert(
                data.name.clone(),
                Context {
                    name: Some(data.name),
                    dimensionality,
                    variants,
                },
            );
        }

        let mut extents_by_name = HashMap::new();
        let mut extents_by_dimensionality = HashMap::new();
        for data in document.dimensionalities {
            let value = load_dimensionality(data.value);
            if extents_by_name.contains_key(&data.name) {
                return Err(QuantexError::DuplicateExtentName(data.name));
            }
            if extents_by_dimensionality.contains_key(&value) {
                return Err(QuantexError::DuplicateExtent(value));
            }
            let extent = Extent {
                name: data.name.clone(),
                value: value.clone(),
            };
            extents_by_name.insert(data.name, extent.clone());
            extents_by_dimensionality.insert(value, extent);
        }

        Ok(Self::from_parts(RegistryInner {
            units_by_id: index.units_by_id,
            units_by_name: index.units_by_name,
            unit_groups: index.unit_groups,
            contexts,
            extents_by_name,
            extents_by_dimensionality,
        }))
    }
}
