use approx::assert_relative_eq;
use quantex::{QuantexError, UnitRegistry, load_default};

#[test]
fn units_resolve_under_all_aliases() {
    let registry = load_default().unwrap();
    let meter = registry.unit("m").unwrap();
    assert_eq!(meter.id(), "m");
    assert_eq!(registry.unit("meter").unwrap(), meter);
    assert_eq!(registry.unit("metres").unwrap(), meter);
    assert_eq!(meter.label(), ("meter", "meters"));
    assert_eq!(meter.symbol(), Some(("m", "m")));
}

#[test]
fn prefixed_units_are_materialized() {
    let registry = load_default().unwrap();
    let km = registry.unit("km").unwrap();
    assert_eq!(km.id(), "km");
    assert_relative_eq!(km.scale(), 1000.0);
    assert_eq!(km.label(), ("kilometer", "kilometers"));
    assert_eq!(registry.unit("kilometre").unwrap(), km);

    let microliter = registry.unit("µl").unwrap();
    assert_relative_eq!(microliter.scale(), 1e-9);
    assert_eq!(registry.unit("uL").unwrap(), microliter);
    assert_eq!(registry.unit("microliter").unwrap(), microliter);
}

#[test]
fn prefixed_offset_units_inherit_the_offset() {
    let registry = load_default().unwrap();
    // Offsets are inherited by prefixed variants; scales multiply.
    let millisecond = registry.unit("ms").unwrap();
    assert_relative_eq!(millisecond.scale(), 1e-3);
    assert_relative_eq!(millisecond.offset(), 0.0);
}

#[test]
fn unknown_names_carry_suggestions() {
    let registry = load_default().unwrap();
    let err = registry.unit("metr").unwrap_err();
    match err {
        QuantexError::InvalidUnitName { name, suggestions } => {
            assert_eq!(name, "metr");
            assert!(
                suggestions
                    .iter()
                    .any(|candidate| candidate.contains("met"))
            );
        }
        other => panic!("expected invalid unit name, got {other:?}"),
    }
}

#[test]
fn unit_groups_by_id_label_and_dimension() {
    let registry = load_default().unwrap();

    let by_id = registry.unit_group("m").unwrap();
    assert!(by_id.iter().any(|unit| unit.id() == "km"));

    let by_label = registry.unit_group("meter").unwrap();
    assert_eq!(by_label.len(), by_id.len());

    // The dimension group collects every exponent-one unit of that
    // dimension, prefixed variants included.
    let by_dimension = registry.unit_group("length").unwrap();
    assert!(by_dimension.iter().any(|unit| unit.id() == "ft"));
    assert!(by_dimension.iter().any(|unit| unit.id() == "km"));
}

#[test]
fn derived_dimensions_have_no_dimension_group() {
    let registry = load_default().unwrap();
    // Newtons span three dimensions, so only id/label groups exist.
    assert!(registry.unit_group("N").is_some());
    assert!(registry.unit_group("force").is_none());
}

#[test]
fn builtin_dimensionless_entries() {
    let registry = load_default().unwrap();
    let unit = registry.unit("dimensionless").unwrap();
    assert!(unit.dimensionality().is_empty());
    assert_relative_eq!(unit.scale(), 1.0);

    let context = registry.context("dimensionless").unwrap();
    assert!(context.dimensionality().is_empty());
    assert_eq!(context.variants().len(), 1);
}

#[test]
fn extents_are_indexed_both_ways() {
    let registry = load_default().unwrap();
    let velocity = registry.extent("velocity").unwrap();
    assert_eq!(velocity.value.exponent("length"), 1.0);
    assert_eq!(velocity.value.exponent("time"), -1.0);

    let back = registry.extent_of(&velocity.value).unwrap();
    assert_eq!(back.name, "velocity");
}

#[test]
fn duplicate_extent_name_fails_the_load() {
    let source = r#"
        [[dimensionalities]]
        name = "length"
        value = { length = 1 }

        [[dimensionalities]]
        name = "length"
        value = { mass = 1 }
    "#;
    assert_eq!(
        UnitRegistry::from_toml_str(source).unwrap_err(),
        QuantexError::DuplicateExtentName("length".to_string())
    );
}

#[test]
fn duplicate_extent_dimensionality_fails_the_load() {
    let source = r#"
        [[dimensionalities]]
        name = "length"
        value = { length = 1 }

        [[dimensionalities]]
        name = "distance"
        value = { length = 1 }
    "#;
    assert!(matches!(
        UnitRegistry::from_toml_str(source).unwrap_err(),
        QuantexError::DuplicateExtent(_)
    ));
}

#[test]
fn mismatched_option_dimensionality_fails_the_load() {
    let source = r#"
        [[units]]
        dimensionality = { length = 1 }
        label = ["meter", "meters"]
        symbol = "m"

        [[units]]
        dimensionality = { time = 1 }
        label = ["second", "seconds"]
        symbol = "s"

        [[contexts]]
        name = "broken"

        [[contexts.variants]]
        options = ["m", "s"]
    "#;
    assert_eq!(
        UnitRegistry::from_toml_str(source).unwrap_err(),
        QuantexError::MismatchedOptionDimensionality("broken".to_string())
    );
}

#[test]
fn unknown_prefix_system_fails_the_load() {
    let source = r#"
        [[units]]
        dimensionality = { length = 1 }
        label = ["meter", "meters"]
        symbol = "m"
        prefixes = ["missing"]
    "#;
    assert_eq!(
        UnitRegistry::from_toml_str(source).unwrap_err(),
        QuantexError::UnknownPrefixSystem("missing".to_string())
    );
}

#[test]
fn prefix_system_cycles_terminate() {
    let source = r#"
        [[prefix_systems]]
        name = "a"
        extend = ["b"]

        [[prefix_systems.prefixes]]
        factor = 1e3
        label = "kilo"
        symbol = "k"

        [[prefix_systems]]
        name = "b"
        extend = ["a"]

        [[prefix_systems.prefixes]]
        factor = 1e-3
        label = "milli"
        symbol = "m"

        [[units]]
        dimensionality = { length = 1 }
        label = ["meter", "meters"]
        symbol = "m"
        prefixes = ["a"]
    "#;
    let registry = UnitRegistry::from_toml_str(source).unwrap();
    assert_relative_eq!(registry.unit("km").unwrap().scale(), 1000.0);
    assert_relative_eq!(registry.unit("mm").unwrap().scale(), 1e-3);
    // Each prefix was applied exactly once.
    assert_eq!(registry.unit_group("m").unwrap().len(), 3);
}

#[test]
fn malformed_documents_are_decode_errors() {
    assert!(matches!(
        UnitRegistry::from_toml_str("units = 3").unwrap_err(),
        QuantexError::Decode(_)
    ));
    assert!(matches!(
        UnitRegistry::from_toml_slice(&[0xff, 0xfe]).unwrap_err(),
        QuantexError::Decode(_)
    ));
}

#[test]
fn snapshot_shape_is_stable() {
    let registry = load_default().unwrap();
    let snapshot = registry.serialize();
    let json = serde_json::to_value(&snapshot).unwrap();

    let meter = &json["units"]["m"];
    assert_eq!(meter["label"][0], "meter");
    assert_eq!(meter["label"][1], "meters");
    assert_eq!(meter["value"], 1.0);
    assert_eq!(meter["offset"], 0.0);
    assert_eq!(meter["symbol"][0], "m");
    assert_eq!(meter["dimensionality"]["length"], 1.0);

    // Only `symbol` may be null.
    assert!(json["units"]["dimensionless"]["symbol"].is_null());

    let velocity = &json["contexts"]["velocity"]["variants"][0];
    assert_eq!(velocity["systems"][0], "SI");
    assert_eq!(velocity["options"][0]["assembly"][0][0], "m");
    assert_eq!(velocity["options"][0]["assembly"][0][1], 1.0);
    assert_eq!(velocity["options"][0]["assembly"][1][0], "s");
    assert_eq!(velocity["options"][0]["assembly"][1][1], -1.0);
}

#[test]
fn snapshot_round_trips() {
    let registry = load_default().unwrap();
    let snapshot = registry.serialize();

    let reloaded = UnitRegistry::from_snapshot(&snapshot).unwrap();
    assert_eq!(reloaded.serialize(), snapshot);

    // Formatter outputs are identical for a fixed corpus. Snapshot
    // registries resolve units by id, which is all these inputs use.
    let corpus = [
        ("10.8 m/s", "velocity"),
        ("0.10 µl/s", "flowrate"),
        ("3200 m", "length"),
        ("90 s", "time"),
    ];
    for (input, context) in corpus {
        let original = registry
            .parse_quantity(input)
            .unwrap()
            .format(context)
            .unwrap();
        let reformatted = reloaded
            .parse_quantity(input)
            .unwrap()
            .format(context)
            .unwrap();
        assert_eq!(reformatted, original);
    }

    // Units whose spellable aliases are not ids still format through a
    // direct id lookup.
    let celsius = reloaded.unit_by_id("°C").unwrap();
    assert_eq!(
        celsius.quantity(100.0).format("temperature").unwrap(),
        registry
            .parse_quantity("100 degC")
            .unwrap()
            .format("temperature")
            .unwrap()
    );
}
