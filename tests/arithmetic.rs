use approx::assert_relative_eq;
use quantex::{QuantexError, load_default};

#[test]
fn addition_within_a_dimensionality() {
    let registry = load_default().unwrap();
    let km = registry.parse_quantity("3 km").unwrap();
    let m = registry.parse_quantity("200 m").unwrap();
    let sum = km.try_add(&m).unwrap();
    assert_relative_eq!(sum.value(), 3200.0);
    assert_eq!(sum.dimensionality(), km.dimensionality());
}

#[test]
fn addition_across_dimensionalities_fails() {
    let registry = load_default().unwrap();
    let km = registry.parse_quantity("3 km").unwrap();
    let s = registry.parse_quantity("5 s").unwrap();
    assert_eq!(
        km.try_add(&s).unwrap_err(),
        QuantexError::DimensionalityMismatch
    );
}

#[test]
fn subtraction() {
    let registry = load_default().unwrap();
    let km = registry.parse_quantity("3 km").unwrap();
    let m = registry.parse_quantity("200 m").unwrap();
    assert_relative_eq!(km.try_sub(&m).unwrap().value(), 2800.0);
}

#[test]
fn multiplication_composes_dimensionalities() {
    let registry = load_default().unwrap();
    let distance = registry.parse_quantity("2 m").unwrap();
    let time = registry.parse_quantity("3 s").unwrap();
    let product = distance.try_mul(&time).unwrap();
    assert_relative_eq!(product.value(), 6.0);
    assert_eq!(product.dimensionality().exponent("length"), 1.0);
    assert_eq!(product.dimensionality().exponent("time"), 1.0);
}

#[test]
fn division_composes_dimensionalities() {
    let registry = load_default().unwrap();
    let distance = registry.parse_quantity("10 m").unwrap();
    let time = registry.parse_quantity("2 s").unwrap();
    let velocity = distance.try_div(&time).unwrap();
    assert_relative_eq!(velocity.value(), 5.0);
    assert_eq!(velocity.dimensionality().exponent("time"), -1.0);
}

#[test]
fn powers_scale_exponents() {
    let registry = load_default().unwrap();
    let side = registry.parse_quantity("2 m").unwrap();
    let area = side.powf(2.0);
    assert_relative_eq!(area.value(), 4.0);
    assert_eq!(area.dimensionality().exponent("length"), 2.0);
}

#[test]
fn scalar_operators() {
    let registry = load_default().unwrap();
    let distance = registry.parse_quantity("10 m").unwrap();
    assert_relative_eq!((&distance * 2.0).value(), 20.0);
    assert_relative_eq!((&distance / 4.0).value(), 2.5);
    assert_relative_eq!((-&distance).value(), -10.0);
}

#[test]
fn scalars_promote_to_dimensionless() {
    let registry = load_default().unwrap();
    let ratio = registry.parse_quantity("10").unwrap();
    let sum = ratio.try_add(&registry.dimensionless(5.0)).unwrap();
    assert_eq!(sum.value(), 15.0);
}

#[test]
fn magnitude_as_inverts_scaling() {
    let registry = load_default().unwrap();
    let sum = registry
        .parse_quantity("3 km")
        .unwrap()
        .try_add(&registry.parse_quantity("200 m").unwrap())
        .unwrap();
    let km = registry.unit("km").unwrap();
    assert_relative_eq!(sum.magnitude_as(&km).unwrap(), 3.2);
}

#[test]
fn magnitude_as_subtracts_offset() {
    let registry = load_default().unwrap();
    let temperature = registry.parse_quantity("100 degC").unwrap();
    let celsius = registry.unit("degC").unwrap();
    let kelvin = registry.unit("K").unwrap();
    assert_relative_eq!(temperature.magnitude_as(&celsius).unwrap(), 100.0);
    assert_relative_eq!(temperature.magnitude_as(&kelvin).unwrap(), 373.15);
}

#[test]
fn magnitude_as_requires_matching_dimensionality() {
    let registry = load_default().unwrap();
    let distance = registry.parse_quantity("3 km").unwrap();
    let second = registry.unit("s").unwrap();
    assert_eq!(
        distance.magnitude_as(&second).unwrap_err(),
        QuantexError::DimensionalityMismatch
    );
}

#[test]
fn ordering_within_a_dimensionality() {
    let registry = load_default().unwrap();
    let km = registry.parse_quantity("1 km").unwrap();
    let m = registry.parse_quantity("500 m").unwrap();
    assert!(km > m);
    assert!(m < km);
}

#[test]
fn cross_dimensional_equality_is_false_not_an_error() {
    let registry = load_default().unwrap();
    let km = registry.parse_quantity("1 km").unwrap();
    let s = registry.parse_quantity("1000 s").unwrap();
    assert!(km != s);
    // Ordering, by contrast, refuses.
    assert_eq!(km.partial_cmp(&s), None);
    assert!(km.try_cmp(&s).is_err());
}

#[test]
fn equal_canonical_values_are_equal() {
    let registry = load_default().unwrap();
    let km = registry.parse_quantity("1 km").unwrap();
    let m = registry.parse_quantity("1000 m").unwrap();
    assert_eq!(km, m);
}

#[test]
fn cross_registry_operations_fail() {
    let first = load_default().unwrap();
    let second = load_default().unwrap();
    let a = first.parse_quantity("1 m").unwrap();
    let b = second.parse_quantity("1 m").unwrap();
    assert_eq!(a.try_add(&b).unwrap_err(), QuantexError::RegistryMismatch);
    assert_eq!(a.try_mul(&b).unwrap_err(), QuantexError::RegistryMismatch);
    assert!(a != b);
    assert_eq!(a.partial_cmp(&b), None);

    let meter = second.unit("m").unwrap();
    assert_eq!(
        a.magnitude_as(&meter).unwrap_err(),
        QuantexError::RegistryMismatch
    );
}

#[test]
fn atomic_unit_times_scalar_applies_offset() {
    let registry = load_default().unwrap();
    let celsius = registry.unit("degC").unwrap();
    let freezing = &celsius * 0.0;
    assert_relative_eq!(freezing.value(), 273.15);
    let boiling = celsius.quantity(100.0);
    assert_relative_eq!(boiling.value(), 373.15);
}

#[test]
fn unit_products_ignore_offsets() {
    let registry = load_default().unwrap();
    let celsius = registry.unit("degC").unwrap();
    let minute = registry.unit("min").unwrap();
    let composite = celsius.try_mul(&minute).unwrap();
    // A composite has no offset; only the scales multiply.
    assert_relative_eq!(composite.scale(), 60.0);
    assert_relative_eq!(composite.quantity(1.0).value(), 60.0);
}

#[test]
fn unit_division_and_powers() {
    let registry = load_default().unwrap();
    let km = registry.unit("km").unwrap();
    let hour = registry.unit("h").unwrap();
    let speed = km.try_div(&hour).unwrap();
    assert_relative_eq!(speed.scale(), 1000.0 / 3600.0);

    let square = km.powf(2.0);
    assert_relative_eq!(square.scale(), 1e6);
    assert_eq!(square.dimensionality().exponent("length"), 2.0);
}

#[test]
fn quantity_times_unit() {
    let registry = load_default().unwrap();
    let distance = registry.parse_quantity("6 m").unwrap();
    let per_second = registry.parse_unit("s**-1").unwrap();
    let speed = distance.try_mul_unit(&per_second).unwrap();
    assert_relative_eq!(speed.value(), 6.0);
    assert_eq!(speed.dimensionality().exponent("time"), -1.0);

    let back = speed.try_div_unit(&per_second).unwrap();
    assert_eq!(back, distance);
}
