use proptest::prelude::*;
use quantex::{Dimensionality, FormatSpec, load_default};

fn dimensionality_strategy() -> impl Strategy<Value = Dimensionality> {
    proptest::collection::btree_map(
        prop_oneof![
            Just("length"),
            Just("mass"),
            Just("time"),
            Just("current"),
            Just("temperature"),
        ],
        -3i32..=3,
        0..4,
    )
    .prop_map(|map| {
        map.into_iter()
            .map(|(name, power)| (name.to_string(), power as f64))
            .collect()
    })
}

proptest! {
    #[test]
    fn dimensionality_multiplication_cancels(
        a in dimensionality_strategy(),
        b in dimensionality_strategy(),
    ) {
        let product = &a * &b;
        prop_assert_eq!(&product / &b, a);
    }

    #[test]
    fn zero_exponents_never_appear(
        a in dimensionality_strategy(),
        exp in -3i32..=3,
    ) {
        let powered = a.pow(exp as f64);
        prop_assert!(powered.iter().all(|(_, power)| power != 0.0));
    }

    #[test]
    fn magnitude_round_trips_through_units(value in -1.0e6..1.0e6f64) {
        let registry = load_default().unwrap();
        for name in ["m", "km", "ms", "degC"] {
            let unit = registry.unit(name).unwrap();
            let quantity = unit.quantity(value);
            // magnitude * scale + offset reproduces the canonical value.
            let magnitude = quantity.magnitude_as(&unit).unwrap();
            let reproduced = magnitude * unit.scale() + unit.offset();
            prop_assert!(
                (reproduced - quantity.value()).abs()
                    <= quantity.value().abs().max(1.0) * 1e-9
            );
            prop_assert!((magnitude - value).abs() <= value.abs().max(1.0) * 1e-6);
        }
    }

    #[test]
    fn format_then_parse_preserves_the_value(value in -1.0e4..1.0e4f64) {
        let registry = load_default().unwrap();
        let quantity = &registry.parse_quantity("1 m/s").unwrap() * value;
        let resolution = registry.parse_quantity("0.001 m/s").unwrap();
        let spec = FormatSpec {
            resolution: Some(&resolution),
            ..FormatSpec::default()
        };

        let formatted = quantity.format_with("velocity", &spec).unwrap();
        let parsed = registry.parse_quantity(&formatted).unwrap();

        prop_assert_eq!(parsed.dimensionality(), quantity.dimensionality());
        prop_assert!((parsed.value() - quantity.value()).abs() <= 1e-3);
    }

    #[test]
    fn cross_dimensional_addition_always_fails(
        a in dimensionality_strategy(),
        b in dimensionality_strategy(),
    ) {
        prop_assume!(a != b);
        let registry = load_default().unwrap();
        let left = build(&registry, &a);
        let right = build(&registry, &b);
        prop_assert!(left.try_add(&right).is_err());
        prop_assert!(left != right);
    }
}

/// Builds a quantity of the given dimensionality out of base units.
fn build(registry: &quantex::UnitRegistry, dimensionality: &Dimensionality) -> quantex::Quantity {
    let mut quantity = registry.dimensionless(1.0);
    let base = [
        ("length", "m"),
        ("mass", "g"),
        ("time", "s"),
        ("current", "A"),
        ("temperature", "K"),
    ];
    for (dimension, unit) in base {
        let power = dimensionality.exponent(dimension);
        if power != 0.0 {
            let unit = registry.unit(unit).unwrap().composite().powf(power);
            quantity = quantity.try_mul_unit(&unit).unwrap();
        }
    }
    quantity
}
