use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use permscan::analysis::{RiskTier, RouteFilter};
use permscan::capability::{AccessLevel, CapabilityHierarchy, Tier};
use permscan::config::Config;
use permscan::error::ScanError;
use permscan::output::OutputFormat;
use permscan::InspectOptions;

#[derive(Parser)]
#[command(
    name = "permscan",
    about = "Permission-callback auditor for REST route registries",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List plugin namespaces found in a route snapshot
    Plugins {
        /// Path to the route snapshot (JSON)
        snapshot: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,
    },

    /// Analyze the permission callbacks of selected namespaces
    Inspect {
        /// Path to the route snapshot (JSON)
        snapshot: PathBuf,

        /// Namespace to analyze (repeatable)
        #[arg(long = "namespace", short = 'n')]
        namespaces: Vec<String>,

        /// Analyze every plugin namespace
        #[arg(long, conflicts_with = "namespaces")]
        all: bool,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json, sarif)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Minimum risk to fail (low, medium, high)
        #[arg(long)]
        fail_on: Option<String>,

        /// Only show routes with this risk (low, medium, high)
        #[arg(long)]
        risk: Option<String>,

        /// Only show routes with this access level
        #[arg(long)]
        access: Option<String>,

        /// Only show routes accepting this HTTP method
        #[arg(long)]
        method: Option<String>,

        /// Only show routes whose path, plugin or callback contains TEXT
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show the effective capability hierarchy
    Hierarchy {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .permscan.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plugins {
            snapshot,
            config,
            format,
        } => cmd_plugins(snapshot, config, format),
        Commands::Inspect {
            snapshot,
            namespaces,
            all,
            config,
            format,
            fail_on,
            risk,
            access,
            method,
            search,
            output,
        } => {
            let filter = RouteFilter {
                risk: risk.as_deref().and_then(|s| parse_or_warn(s, "risk", RiskTier::from_str_lenient)),
                access: access
                    .as_deref()
                    .and_then(|s| parse_or_warn(s, "access level", AccessLevel::from_str_lenient)),
                method,
                search,
            };
            cmd_inspect(snapshot, namespaces, all, config, format, fail_on, filter, output)
        }
        Commands::Hierarchy { config, format } => cmd_hierarchy(config, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn parse_or_warn<T>(s: &str, what: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(s);
    if parsed.is_none() {
        eprintln!("Warning: unknown {} '{}', ignoring", what, s);
    }
    parsed
}

fn parse_format(format_str: &str) -> OutputFormat {
    OutputFormat::from_str_lenient(format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    })
}

fn cmd_plugins(
    snapshot: PathBuf,
    config: Option<PathBuf>,
    format_str: String,
) -> Result<i32, ScanError> {
    let format = parse_format(&format_str);
    let groups = permscan::discover_plugins(&snapshot, config.as_deref())?;
    print!("{}", permscan::output::render_groups(&groups, format)?);
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
fn cmd_inspect(
    snapshot: PathBuf,
    namespaces: Vec<String>,
    all: bool,
    config: Option<PathBuf>,
    format_str: String,
    fail_on_str: Option<String>,
    filter: RouteFilter,
    output_path: Option<PathBuf>,
) -> Result<i32, ScanError> {
    let format = parse_format(&format_str);

    let fail_on = fail_on_str.and_then(|s| {
        let risk = RiskTier::from_str_lenient(&s);
        if risk.is_none() {
            eprintln!("Warning: unknown risk '{}', using config default", s);
        }
        risk
    });

    let options = InspectOptions {
        config_path: config,
        format,
        fail_on_override: fail_on,
        namespaces,
        all_namespaces: all,
        filter,
    };

    let report = permscan::inspect(&snapshot, &options)?;
    let rendered = permscan::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = pass, 1 = routes at or above threshold
    Ok(if report.verdict.pass { 0 } else { 1 })
}

#[derive(Serialize)]
struct TierRow {
    tier: Tier,
    capabilities: Vec<String>,
}

fn cmd_hierarchy(config: Option<PathBuf>, format_str: String) -> Result<i32, ScanError> {
    let config = match config {
        Some(path) => Config::load(&path)?,
        None => Config::load(&PathBuf::from(".permscan.toml"))?,
    };
    let hierarchy: CapabilityHierarchy = config.capability_hierarchy()?;
    let rows: Vec<TierRow> = Tier::ALL
        .iter()
        .map(|&tier| TierRow {
            tier,
            capabilities: hierarchy.capabilities(tier),
        })
        .collect();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rows)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<12} CAPABILITIES", "TIER");
            println!("{}", "-".repeat(80));
            for row in &rows {
                println!("{:<12} {}", row.tier.to_string(), row.capabilities.join(", "));
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, ScanError> {
    let path = PathBuf::from(".permscan.toml");

    if path.exists() && !force {
        eprintln!(".permscan.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .permscan.toml");

    Ok(0)
}
