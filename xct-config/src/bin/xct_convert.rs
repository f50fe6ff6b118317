//! Convert CT scan configurations between formats.
//!
//! Subcommands:
//! - `detect`: report which format a file is in
//! - `convert`: import a file and export it in another format
//! - `script`: generate a standalone Python simulation script
//! - `export-name`: print the default download name for a format
//!
//! Usage:
//! ```text
//! xct_convert convert scan.xtekct --to diondo --output scan.xml
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, warn};
use xct_config::{
    convert, import, render_full, ConfigFull, ConfigSubset, ConverterSettings, ExportFormat,
    SettingsStore,
};

/// X-ray CT configuration converter
#[derive(Parser, Debug)]
#[command(name = "xct_convert")]
#[command(about = "Convert X-ray CT scan configurations between formats")]
#[command(version)]
struct Args {
    /// Settings directory (defaults to ~/.xct_config)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected format of a configuration file
    Detect {
        /// Configuration file
        file: PathBuf,
    },

    /// Import a configuration and export it in another format
    Convert {
        /// Configuration file in any recognised format
        file: PathBuf,

        /// Target format (json, gvxr, xtek, python, diondo)
        #[arg(short, long)]
        to: ExportFormat,

        /// Keep material library references instead of inlining materials
        #[arg(long)]
        materials_as_id: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a standalone simulation script from a canonical configuration
    Script {
        /// Canonical JSON configuration
        file: PathBuf,

        /// Include the simulation stage
        #[arg(long)]
        scan: bool,

        /// Include the reconstruction stage
        #[arg(long)]
        recon: bool,

        /// Directory holding the sample models
        #[arg(long)]
        models: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default file name for an export format
    ExportName {
        format: ExportFormat,
    },
}

fn store(settings: Option<PathBuf>) -> std::io::Result<SettingsStore> {
    match settings {
        Some(path) => Ok(SettingsStore::with_path(path)),
        None => SettingsStore::new(),
    }
}

fn write_output(text: &str, output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let store = store(args.settings)?;
    let settings: ConverterSettings = store.load_settings()?;
    let library = store.load_material_library(&settings)?;

    match args.command {
        Command::Detect { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let kind = xct_config::detect(&raw)?;
            println!("{}: {} ({kind})", file.display(), kind.codec_name());
        }

        Command::Convert {
            file,
            to,
            materials_as_id,
            output,
        } => {
            let raw = std::fs::read_to_string(&file)?;
            let imported = import(&raw)?;
            for warning in &imported.warnings {
                warn!("{warning}");
            }

            let mut options = settings.export.clone();
            options.materials_as_id |= materials_as_id;

            let models = store.model_directory(&settings);
            let text = convert(to, imported.subset, &options, &library, &models)?;
            write_output(&text, output.as_deref())?;
        }

        Command::Script {
            file,
            scan,
            recon,
            models,
            output,
        } => {
            let raw = std::fs::read_to_string(&file)?;
            let config = ConfigFull::try_from(ConfigSubset::from_json_str(&raw)?)?;

            let mut options = settings.export.clone();
            options.include_scan = scan;
            options.include_reconstruction = recon;

            let models = match models {
                Some(dir) => xct_config::ModelDirectory::new(dir),
                None => store.model_directory(&settings),
            };
            let text = render_full(ExportFormat::Python, &config, &options, &library, &models)?;
            write_output(&text, output.as_deref())?;
        }

        Command::ExportName { format } => {
            println!("{}", format.default_file_name());
        }
    }

    Ok(())
}
