//! # Plugline CLI
//!
//! Command-line front end for the BOM engine: compute material quantities and
//! manage the BOM rows of a collection file.
//!
//! ```text
//! bom_cli init
//! bom_cli calc "Core PVC" --strands 7 --copper 0.5 --core-od 3.0 --length 100
//! bom_cli create --spec new_bom.json
//! bom_cli list
//! bom_cli quick-add BOM-0427-C
//! bom_cli delete BOM-0427-M
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bom_core::file_io::FileStore;
use bom_core::formula::{self, MaterialRule};
use bom_core::product::{parse_decimal, SpecSnapshot};
use bom_core::store::BomStore;
use bom_core::{BomError, BomForm, BomLifecycle, BomResult, EngineSettings};

#[derive(Parser)]
#[command(name = "bom_cli")]
#[command(author, version, about = "Cable and moulding BOM calculator")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Collection file
    #[arg(long, global = true, env = "PLUGLINE_STORE", default_value = "company_bom.json")]
    store: PathBuf,

    /// User recorded in lock files
    #[arg(long, global = true, env = "USER", default_value = "planner")]
    user: String,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty collection file
    Init {
        /// Prefix for generated BOM ids
        #[arg(long, default_value = "BOM")]
        id_prefix: String,
    },

    /// Compute the quantity per piece of a material
    Calc {
        /// Raw material name (e.g. "Copper", "Core PVC", "Sheath PVC")
        material: String,
        #[arg(long, default_value = "0")]
        strands: String,
        #[arg(long, default_value = "0")]
        copper: String,
        #[arg(long, default_value = "0")]
        cores: String,
        #[arg(long, default_value = "0")]
        length: String,
        #[arg(long, default_value = "0")]
        core_od: String,
        #[arg(long, default_value = "0")]
        sheath_od: String,
    },

    /// Create a Cable/Moulding pair from a form JSON file
    Create {
        /// Form JSON file
        #[arg(long = "spec", value_name = "FILE")]
        form: PathBuf,
    },

    /// List BOM records
    List,

    /// Duplicate a BOM and save the copy as a new pair
    QuickAdd { id: String },

    /// Delete a BOM record
    Delete { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_recoverable() {
                eprintln!("Nothing was saved; correct the input or retry.");
            }
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> BomResult<()> {
    match &cli.command {
        Commands::Init { id_prefix } => {
            let settings = EngineSettings {
                id_prefix: id_prefix.clone(),
                ..EngineSettings::default()
            };
            let store = FileStore::create(&cli.store, cli.user.clone(), settings)?;
            println!("Created '{}' at {}", store.collection(), cli.store.display());
            Ok(())
        }
        Commands::Calc {
            material,
            strands,
            copper,
            cores,
            length,
            core_od,
            sheath_od,
        } => {
            let snapshot = SpecSnapshot {
                length: parse_decimal(length),
                copper: parse_decimal(copper),
                strands: parse_decimal(strands),
                cores: parse_decimal(cores),
                core_od: parse_decimal(core_od),
                sheath_od: parse_decimal(sheath_od),
            };
            match MaterialRule::classify(material).and_then(|rule| Some((rule, rule.evaluate(&snapshot)?))) {
                Some((rule, qty)) => println!("{}: {} per pc ({})", material, formula::format_qty(qty), rule.display_name()),
                None => println!("{}: manual entry required", material),
            }
            Ok(())
        }
        Commands::Create { form } => {
            let json = std::fs::read_to_string(form)
                .map_err(|e| BomError::file_error("read", form.display().to_string(), e.to_string()))?;
            let mut form: BomForm = serde_json::from_str(&json)?;
            // quantities in the file may be stale
            form.recalculate();
            let mut bom = open_lifecycle(cli)?;
            let pair = bom.create(&form)?;
            println!("Created {} and {}", pair.cable.id, pair.moulding.id);
            Ok(())
        }
        Commands::List => {
            let bom = open_lifecycle(cli)?;
            if let Some(holder) = bom.store().lock_holder() {
                println!(
                    "Note: being written by {} on {} since {}",
                    holder.user_id,
                    holder.machine,
                    holder.locked_at.to_rfc3339()
                );
            }
            let records = bom.list()?;
            println!("{:<16} {:<9} {:<32} {:>8} {:>6}", "ID", "CATEGORY", "DESCRIPTION", "PLAN", "LINES");
            for record in &records {
                println!(
                    "{:<16} {:<9} {:<32} {:>8} {:>6}",
                    record.id,
                    record.category.to_string(),
                    truncate(&record.spec.product_description, 32),
                    record.plan,
                    record.own_materials().len()
                );
            }
            println!("{} record(s)", records.len());
            Ok(())
        }
        Commands::QuickAdd { id } => {
            let mut bom = open_lifecycle(cli)?;
            let source = bom.find(id)?;
            let draft = bom.quick_add(&source)?;
            let pair = bom.create(&draft)?;
            println!("Duplicated {} as {} / {}", id, pair.cable.id, pair.moulding.id);
            Ok(())
        }
        Commands::Delete { id } => {
            let mut bom = open_lifecycle(cli)?;
            let removed = bom.delete(id)?;
            println!("Deleted {}", removed.id);
            Ok(())
        }
    }
}

fn open_lifecycle(cli: &Cli) -> BomResult<BomLifecycle<FileStore>> {
    let store = FileStore::open(&cli.store, cli.user.clone())?;
    let settings = store.settings().clone();
    tracing::debug!(path = %cli.store.display(), collection = store.collection(), "opened BOM collection");
    Ok(BomLifecycle::new(store, settings))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
