//! VHDLGen CLI - structural VHDL generation from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use vhdlgen::{load_document, Catalog, HdlError, SourceType};

#[derive(Parser)]
#[command(name = "vhdlgen")]
#[command(about = "Structural VHDL generation from circuit description files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the VHDL module and signal descriptor for a circuit
    Generate {
        /// Path to a circuit description (.json) file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory for the generated files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out: PathBuf,

        /// Additional component library (JSON), may be repeated
        #[arg(short, long, value_name = "FILE")]
        catalog: Vec<PathBuf>,

        /// Output format for the run summary
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Resolve a circuit without writing anything, reporting problems
    Check {
        /// Path to a circuit description (.json) file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Additional component library (JSON), may be repeated
        #[arg(short, long, value_name = "FILE")]
        catalog: Vec<PathBuf>,
    },

    /// List the components available in the catalog
    Libraries {
        /// Additional component library (JSON), may be repeated
        #[arg(short, long, value_name = "FILE")]
        catalog: Vec<PathBuf>,

        /// Show pin details for each component
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for build pipelines
    Json,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Generate {
            file,
            out,
            catalog,
            format,
        } => handle_generate(&file, &out, &catalog, format),
        Commands::Check { file, catalog } => handle_check(&file, &catalog),
        Commands::Libraries { catalog, verbose } => handle_libraries(&catalog, verbose),
    };

    process::exit(exit_code);
}

fn build_catalog(extra: &[PathBuf]) -> Result<Catalog, HdlError> {
    let mut catalog = Catalog::builtin();
    for path in extra {
        catalog.add_library_file(path)?;
    }
    Ok(catalog)
}

fn handle_generate(
    file: &PathBuf,
    out: &PathBuf,
    extra_catalogs: &[PathBuf],
    format: OutputFormat,
) -> i32 {
    let result = build_catalog(extra_catalogs)
        .and_then(|catalog| load_document(file, &catalog))
        .and_then(|mut document| document.generate(out));

    match result {
        Ok(generated) => {
            match format {
                OutputFormat::Human => {
                    println!("Generated: {}", generated.vhdl_path.display());
                    println!("Generated: {}", generated.signals_path.display());
                    println!(
                        "  {} ports, {} internal signals, {} component dependencies",
                        generated.ports, generated.internal_signals, generated.dependencies
                    );
                }
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "vhdl": generated.vhdl_path.display().to_string(),
                        "signals": generated.signals_path.display().to_string(),
                        "ports": generated.ports,
                        "internal_signals": generated.internal_signals,
                        "dependencies": generated.dependencies,
                    });
                    match serde_json::to_string_pretty(&output) {
                        Ok(text) => println!("{}", text),
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            return 1;
                        }
                    }
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_check(file: &PathBuf, extra_catalogs: &[PathBuf]) -> i32 {
    let result = build_catalog(extra_catalogs)
        .and_then(|catalog| load_document(file, &catalog))
        .and_then(|mut document| {
            document.resolve()?;
            document.build_vhdl()?;
            Ok(document)
        });

    match result {
        Ok(document) => {
            println!(
                "OK: entity '{}' resolves with {} ports",
                document.entity_name(),
                document.generator().ports().len()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_libraries(extra_catalogs: &[PathBuf], verbose: bool) -> i32 {
    let catalog = match build_catalog(extra_catalogs) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    for library in catalog.libraries() {
        let solving = match library.source {
            SourceType::Hdl => "internal (HDL)",
            SourceType::Plugin | SourceType::Free => "external",
        };
        println!("{} ({})", library.name, solving);
        for component in &library.components {
            println!("  {}:{}", library.name, component.name);
            if verbose {
                for pin in &component.pins {
                    println!("    {} [{:?}]", pin.name, pin.access);
                }
            }
        }
        println!();
    }
    0
}
