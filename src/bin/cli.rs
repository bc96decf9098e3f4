use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use quantex::{FormatSpec, UnitRegistry, UnitStyle};

/// Command-line interface for the quantex units engine.
#[derive(Parser, Debug)]
#[command(name = "quantex", version, about = "Units-of-measure tools")]
struct Cli {
    /// Load a registry document instead of the bundled one.
    #[arg(short, long, global = true)]
    registry: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Style {
    Label,
    Symbol,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the registry's JSON snapshot to stdout.
    Dump {
        /// Pretty-print the JSON output.
        #[arg(short, long)]
        pretty: bool,
    },
    /// Parse a quantity and show its canonical value and dimensionality.
    Parse {
        /// Quantity expression, e.g. "10.8 m/s"
        input: String,
    },
    /// Parse a quantity and format it under a context.
    Format {
        /// Quantity expression, e.g. "10.8 m/s"
        input: String,
        /// Context name, e.g. "velocity"
        context: String,
        /// Render labels or symbols.
        #[arg(short, long, value_enum, default_value = "symbol")]
        style: Style,
        /// Measurement system selecting the variant.
        #[arg(long, default_value = "SI")]
        system: String,
        /// Resolution quantity, e.g. "0.01 m/s"
        #[arg(long)]
        resolution: Option<String>,
    },
    /// List registered units.
    Units {
        /// Case-insensitive substring filter on ids and labels.
        #[arg(short, long)]
        filter: Option<String>,
    },
}

fn load_registry(cli: &Cli) -> anyhow::Result<UnitRegistry> {
    match &cli.registry {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(UnitRegistry::from_toml_str(&text)?)
        }
        None => Ok(quantex::load_default()?),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let registry = load_registry(&cli)?;

    match &cli.command {
        Commands::Dump { pretty } => {
            let snapshot = registry.serialize();
            let output = if *pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            println!("{output}");
        }
        Commands::Parse { input } => {
            let quantity = match registry.parse_quantity(input) {
                Ok(quantity) => quantity,
                Err(err) => match err.diagnostic() {
                    Some(diagnostic) => bail!("{diagnostic}"),
                    None => return Err(err.into()),
                },
            };
            println!("value: {}", quantity.value());
            println!("dimensionality: {}", quantity.dimensionality());
        }
        Commands::Format {
            input,
            context,
            style,
            system,
            resolution,
        } => {
            let quantity = registry.parse_quantity(input)?;
            let resolution = resolution
                .as_ref()
                .map(|text| registry.parse_quantity(text))
                .transpose()?;
            let spec = FormatSpec {
                resolution: resolution.as_ref(),
                style: match style {
                    Style::Label => UnitStyle::Label,
                    Style::Symbol => UnitStyle::Symbol,
                },
                system: system.as_str(),
            };
            println!("{}", quantity.format_with(context, &spec)?);
        }
        Commands::Units { filter } => {
            let mut units: Vec<_> = registry.units().collect();
            units.sort_by(|a, b| a.id().cmp(b.id()));
            for unit in units {
                let (label, _) = unit.label();
                if let Some(filter) = filter {
                    let needle = filter.to_lowercase();
                    if !unit.id().to_lowercase().contains(&needle)
                        && !label.to_lowercase().contains(&needle)
                    {
                        continue;
                    }
                }
                println!("{}\t{}\t{}", unit.id(), label, unit.dimensionality());
            }
        }
    }

    Ok(())
}
