//! CLI binary for bom-explode: validate BOM tables and explode materials into
//! raw-material requirements.

use anyhow::{Context, Result};
use bom_core::aggregate::RawRequirement;
use bom_core::config::BomConfig;
use bom_core::error::LoadError;
use bom_core::explode::{Explosion, ExplosionOptions};
use bom_core::graph::BomGraph;
use bom_core::guard;
use bom_core::storage::{self, TableFormat};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bom-explode", about = "Multi-level bill-of-materials explosion")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Edge list file, CSV or JSON (overrides config)
    #[arg(long, global = true)]
    edges: Option<PathBuf>,

    /// Material catalog file, CSV or JSON (overrides config)
    #[arg(long, global = true)]
    materials: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explode a material into cumulative raw-material requirements
    Resolve {
        /// Material number (e.g. FG0001)
        material: String,

        /// Number of units of the material to explode
        #[arg(short, long, default_value = "1")]
        qty: i64,

        /// Maximum edges expanded before giving up (overrides config)
        #[arg(long)]
        budget: Option<usize>,

        /// Output format: table, json, csv
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Aggregate raw-material requirements for a production order book
    Requirements {
        /// Production orders file (MaterialNumber, PlannedQty)
        orders: PathBuf,

        /// Output format: table, json, csv
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Also save the result to this file (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the direct parents that consume a material
    WhereUsed {
        /// Material number
        material: String,
    },

    /// Load the tables and report every problem found
    Validate,

    /// Show graph statistics
    Info,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

/// Resolved input locations and limits for one invocation.
struct Inputs {
    edges: PathBuf,
    materials: PathBuf,
    options: ExplosionOptions,
}

impl Inputs {
    fn new(cli: &Cli, project_root: &Path, config: &BomConfig) -> Self {
        Self {
            edges: cli
                .edges
                .clone()
                .unwrap_or_else(|| config.edges_path(project_root)),
            materials: cli
                .materials
                .clone()
                .unwrap_or_else(|| config.materials_path(project_root)),
            options: config.explosion_options(),
        }
    }

    fn load(&self) -> Result<BomGraph> {
        storage::load_graph(&self.edges, &self.materials)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = BomConfig::load(&project_root)?;
    let inputs = Inputs::new(&cli, &project_root, &config);

    match cli.command {
        Commands::Resolve {
            material,
            qty,
            budget,
            format,
        } => cmd_resolve(&inputs, &material, qty, budget, &format),
        Commands::Requirements {
            orders,
            format,
            output,
        } => cmd_requirements(&inputs, &orders, &format, output.as_deref()),
        Commands::WhereUsed { material } => cmd_where_used(&inputs, &material),
        Commands::Validate => cmd_validate(&inputs),
        Commands::Info => cmd_info(&inputs),
    }
}

fn print_requirements(rows: &[RawRequirement], format: &str) -> Result<()> {
    match format {
        "table" => {
            if rows.is_empty() {
                eprintln!("No raw materials: the material has no components.");
                return Ok(());
            }
            let width = rows
                .iter()
                .map(|r| r.raw_material.len())
                .max()
                .unwrap_or(0)
                .max("RawMaterial".len());
            println!("{:<width$}  {:>12}", "RawMaterial", "TotalQty");
            for row in rows {
                println!("{:<width$}  {:>12}", row.raw_material, row.total_qty);
            }
        }
        "json" => {
            storage::write_requirements(std::io::stdout().lock(), rows, TableFormat::Json)?;
            println!();
        }
        "csv" => storage::write_requirements(std::io::stdout().lock(), rows, TableFormat::Csv)?,
        _ => anyhow::bail!("Unknown format: {}. Use 'table', 'json' or 'csv'.", format),
    }
    Ok(())
}

fn cmd_resolve(
    inputs: &Inputs,
    material: &str,
    qty: i64,
    budget: Option<usize>,
    format: &str,
) -> Result<()> {
    if budget == Some(0) {
        anyhow::bail!("--budget must be positive");
    }
    let graph = inputs.load()?;
    let options = ExplosionOptions {
        budget: budget.or(inputs.options.budget),
    };
    let rows = Explosion::with_options(&graph, options)
        .resolve_quantity(material, qty)
        .with_context(|| format!("failed to explode {}", material))?;
    print_requirements(&rows, format)
}

fn cmd_requirements(
    inputs: &Inputs,
    orders_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let graph = inputs.load()?;
    let orders = storage::load_orders(orders_path)?;
    let rows = Explosion::with_options(&graph, inputs.options)
        .resolve_orders(&orders)
        .with_context(|| format!("failed to explode orders in {}", orders_path.display()))?;

    eprintln!(
        "Exploded {} order(s) into {} raw material(s).",
        orders.len(),
        rows.len()
    );
    if let Some(path) = output {
        storage::save_requirements(path, &rows)?;
        eprintln!("Saved to: {}", path.display());
    }
    print_requirements(&rows, format)
}

fn cmd_where_used(inputs: &Inputs, material: &str) -> Result<()> {
    let graph = inputs.load()?;
    if !graph.contains(material) {
        anyhow::bail!("Unknown material: {}", material);
    }
    let parents = graph.parents_of(material);
    if parents.is_empty() {
        eprintln!("{} is not used by any other material.", material);
        return Ok(());
    }
    println!("{} is used by:", material);
    for parent in parents {
        println!("  {} (qty {})", parent.id, parent.quantity);
    }
    Ok(())
}

fn cmd_validate(inputs: &Inputs) -> Result<()> {
    match inputs.load() {
        Ok(graph) => {
            let cycles = guard::find_cycles(&graph);
            if !cycles.is_empty() {
                println!("{} cycle(s) found:", cycles.len());
                for path in &cycles {
                    println!("  - cycle detected: {}", path.join(" -> "));
                }
                anyhow::bail!("BOM validation failed with {} cycle(s)", cycles.len());
            }

            let mismatches = graph.type_mismatches();
            println!(
                "BOM is valid: {} materials, {} edges.",
                graph.metadata().total_materials,
                graph.metadata().total_edges
            );
            if !mismatches.is_empty() {
                println!("{} type hint(s) ignored:", mismatches.len());
                for m in &mismatches {
                    println!("  ~ {}", m);
                }
            }
            Ok(())
        }
        Err(err) => {
            let Some(load_err) = err.downcast_ref::<LoadError>() else {
                return Err(err);
            };
            let problems = load_err.problems();
            println!("{} problem(s) found:", problems.len());
            for problem in problems {
                println!("  - {}", problem);
            }
            anyhow::bail!("BOM validation failed with {} problem(s)", problems.len())
        }
    }
}

fn cmd_info(inputs: &Inputs) -> Result<()> {
    let graph = inputs.load()?;
    let meta = graph.metadata();
    println!("Edges file: {}", inputs.edges.display());
    println!("Materials file: {}", inputs.materials.display());
    println!("Materials: {}", meta.total_materials);
    println!("Edges: {} ({} input rows)", meta.total_edges, meta.input_edges);
    println!("Terminal materials: {}", meta.terminal_materials);
    println!("Top-level materials: {}", meta.root_materials);
    println!("Loaded at: {}", meta.loaded_at.to_rfc3339());
    if let Some(budget) = inputs.options.budget {
        println!("Work budget: {}", budget);
    }
    Ok(())
}
