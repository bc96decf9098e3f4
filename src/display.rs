//! Quantity formatting: best-option selection within a context variant
//! and rendering of number plus unit assembly.

use crate::assembly::{AssemblyPart, ContextVariant, ContextVariantOption};
use crate::error::QuantexError;
use crate::quantity::Quantity;

/// Whether assemblies render with unit labels or symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitStyle {
    Label,
    #[default]
    Symbol,
}

/// Options for [`Quantity::format_with`].
#[derive(Debug, Clone)]
pub struct FormatSpec<'a> {
    /// Smallest distinguishable quantity; controls the number of decimal
    /// digits. Must share the formatted quantity's dimensionality.
    pub resolution: Option<&'a Quantity>,
    pub style: UnitStyle,
    /// Measurement system selecting the context variant.
    pub system: &'a str,
}

impl Default for FormatSpec<'_> {
    fn default() -> Self {
        Self {
            resolution: None,
            style: UnitStyle::Symbol,
            system: "SI",
        }
    }
}

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Renders an integral power in Unicode superscript digits, with U+207B
/// for the minus sign. Non-integral powers fall back to caret notation.
fn superscript(power: f64) -> String {
    if power.fract() != 0.0 {
        return format!("^{power}");
    }
    let mut output = String::new();
    if power < 0.0 {
        output.push('\u{207B}');
    }
    let digits = format!("{}", power.abs() as i64);
    for digit in digits.chars() {
        let index = digit as usize - '0' as usize;
        output.push(SUPERSCRIPT_DIGITS[index]);
    }
    output
}

/// Renders the unit part of an option: `*`/`/` separators from the sign
/// of each power, plural names only on a leading positive part, and
/// superscript exponents except for an implied `⁻¹` after the first part.
fn render_assembly(parts: &[AssemblyPart], style: UnitStyle) -> String {
    let mut output = String::new();

    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            output.push(if part.power < 0.0 { '/' } else { '*' });
        }

        let plural = index < 1 && part.power > 0.0;
        let (singular, plural_name) = part.unit.names(style == UnitStyle::Symbol);
        output.push_str(if plural { plural_name } else { singular });

        if part.power != 1.0 && (index < 1 || part.power != -1.0) {
            let power = if index > 0 {
                part.power.abs()
            } else {
                part.power
            };
            output.push_str(&superscript(power));
        }
    }

    output
}

/// Selection key: options whose scaled value stays at or above one rank
/// first. Among those the smallest scaled value wins; among sub-one
/// options the largest does — "the largest unit whose value is still at
/// least one".
fn selection_key(value: f64, option: &ContextVariantOption) -> (bool, f64) {
    let scaled = value / option.scale;
    (scaled < 1.0, if scaled > 1.0 { scaled } else { -scaled })
}

fn pick_option<'a>(
    variant: &'a ContextVariant,
    value: f64,
) -> Option<&'a ContextVariantOption> {
    if !value.is_finite() {
        return variant.options.first();
    }
    variant.options.iter().min_by(|a, b| {
        let (a_reducing, a_magnitude) = selection_key(value, a);
        let (b_reducing, b_magnitude) = selection_key(value, b);
        a_reducing
            .cmp(&b_reducing)
            .then(a_magnitude.total_cmp(&b_magnitude))
    })
}

impl Quantity {
    /// Formats this quantity under a named context with default options:
    /// symbol style, SI system, two decimal digits.
    pub fn format(&self, context: &str) -> Result<String, QuantexError> {
        self.format_with(context, &FormatSpec::default())
    }

    /// Formats this quantity under a named context.
    ///
    /// Picks the first variant matching `spec.system`, then the best
    /// option for the magnitude, applies a single-part unit's offset, and
    /// renders number and assembly.
    pub fn format_with(&self, context: &str, spec: &FormatSpec) -> Result<String, QuantexError> {
        let Some(context) = self.registry().context(context).cloned() else {
            return Err(QuantexError::UnknownContext(context.to_string()));
        };
        let context_name = context.name.clone().unwrap_or_default();

        if *self.dimensionality() != context.dimensionality {
            return Err(QuantexError::ContextDimensionality {
                context: context_name,
            });
        }
        if let Some(resolution) = spec.resolution {
            self.registry().check_same(resolution.registry())?;
            if *resolution.dimensionality() != context.dimensionality {
                return Err(QuantexError::ContextDimensionality {
                    context: context_name,
                });
            }
        }

        let Some(variant) = context
            .variants
            .iter()
            .find(|variant| variant.systems.iter().any(|system| system == spec.system))
        else {
            return Err(QuantexError::UnknownSystem {
                context: context_name,
                system: spec.system.to_string(),
            });
        };

        let Some(option) = pick_option(variant, self.value()) else {
            return Err(QuantexError::UnknownSystem {
                context: context_name,
                system: spec.system.to_string(),
            });
        };

        // Affine conversion applies to single-unit presentations only.
        let offset = match option.assembly.as_slice() {
            [part] => part.unit.offset,
            _ => 0.0,
        };
        let displayed = (self.value() - offset) / option.scale;

        let digits = match spec.resolution {
            Some(resolution) if resolution.value() > 0.0 => {
                let step = resolution.value() / option.scale;
                (-step.log10()).ceil().max(0.0) as usize
            }
            _ => 2,
        };

        let mut output = String::new();
        if displayed < 0.0 {
            output.push('-');
        }
        output.push_str(&format!("{:.digits$}", displayed.abs()));

        let assembly = render_assembly(&option.assembly, spec.style);
        if !assembly.is_empty() {
            if !assembly.starts_with('°') {
                output.push(' ');
            }
            output.push_str(&assembly);
        }

        Ok(output)
    }
}
