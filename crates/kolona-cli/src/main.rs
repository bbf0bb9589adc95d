mod commands;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kolona_core::error::KolonaError;
use kolona_core::matching::ExtractionMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kolona",
    version,
    about = "Recover line-item tables from invoices and price lists, and add computed columns"
)]
struct Cli {
    /// Log progress to stderr (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the line-item table from a PDF (or XLSX) and optionally add a computed column
    Extract {
        /// Path to a PDF or XLSX file
        input_file: PathBuf,

        /// How lines are obtained and matched: text, columns, tables, loose or ocr
        #[arg(short, long, default_value = "text")]
        mode: ExtractionMode,

        /// Drop the first row of every page (repeated column headings)
        #[arg(long)]
        skip_header: bool,

        /// Tesseract languages for the ocr mode
        #[arg(long, default_value = kolona_core::extraction::ocr::DEFAULT_OCR_LANG)]
        ocr_lang: String,

        /// Render resolution for the ocr mode
        #[arg(long, default_value_t = kolona_core::extraction::ocr::DEFAULT_DPI)]
        dpi: u32,

        /// First PDF page to read (1-based)
        #[arg(long, value_name = "N")]
        first_page: Option<usize>,

        /// Last PDF page to read
        #[arg(long, value_name = "N")]
        last_page: Option<usize>,

        /// Worksheet to read from an XLSX input (default: the first one)
        #[arg(long, value_name = "NAME")]
        sheet: Option<String>,

        #[command(flatten)]
        transform: TransformArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Add a computed column to a table previously saved as JSON
    Transform {
        /// Table JSON written by `extract --output json` or `--export FILE.json`
        table_file: PathBuf,

        #[command(flatten)]
        transform: TransformArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Manage and inspect transform presets
    Presets {
        #[command(subcommand)]
        action: PresetsAction,
    },
}

#[derive(Args, Debug, Default)]
pub struct TransformArgs {
    /// Source field counted from the right edge of each row (1 = last)
    #[arg(short, long, conflicts_with = "column")]
    pub position: Option<usize>,

    /// Source column by name
    #[arg(short, long)]
    pub column: Option<String>,

    /// Arithmetic formula over x, e.g. "x / 1.95583"
    #[arg(short, long)]
    pub formula: Option<String>,

    /// Name of the new column
    #[arg(short, long)]
    pub name: Option<String>,

    /// Built-in preset name (bgn-eur, eur-bgn)
    #[arg(long, value_name = "NAME", conflicts_with = "preset_file")]
    pub preset: Option<String>,

    /// Preset JSON file
    #[arg(long, value_name = "FILE")]
    pub preset_file: Option<PathBuf>,

    /// Overwrite the column if it already exists
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format on stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Also write the result to FILE (.txt page layout, .csv sheet, .json table)
    #[arg(short = 'E', long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Field delimiter for .csv exports
    #[arg(long, default_value = ",")]
    pub delimiter: char,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum PresetsAction {
    /// List built-in presets
    List,
    /// Print a built-in preset as JSON
    Show {
        /// Preset name (e.g., "bgn-eur")
        preset: String,
    },
    /// Validate a custom preset file
    Validate {
        /// Path to JSON preset file
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "kolona_core=warn",
        1 => "kolona_core=info",
        _ => "kolona_core=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input_file,
            mode,
            skip_header,
            ocr_lang,
            dpi,
            first_page,
            last_page,
            sheet,
            transform,
            output,
        } => commands::extract::run(commands::extract::ExtractArgs {
            input_file,
            mode,
            skip_header,
            ocr_lang,
            dpi,
            first_page,
            last_page,
            sheet,
            transform,
            output,
        }),
        Commands::Transform {
            table_file,
            transform,
            output,
        } => commands::transform::run(table_file, transform, output),
        Commands::Presets { action } => match action {
            PresetsAction::List => commands::presets::list(),
            PresetsAction::Show { preset } => commands::presets::show(&preset),
            PresetsAction::Validate { file } => commands::presets::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let code = match e {
            KolonaError::EmptyExtraction | KolonaError::EmptyTable { .. } => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}
