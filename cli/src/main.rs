//! xlsx-extract CLI - spreadsheet rows to JSON lines or delimited text
//!
//! A command-line tool for listing the sheets of XLSX files and streaming
//! their rows.

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xlsx_extract::render::{write_events, write_json_lines};
use xlsx_extract::{
    EventFormat, ExtractOptions, SheetSelector, TsvOptions, Workbook, XmlBackend,
};

/// Streaming extraction of spreadsheet rows
#[derive(Parser)]
#[command(
    name = "xlsx-extract",
    author = "iyulab",
    version,
    about = "Extract rows from XLSX spreadsheets",
    long_about = "xlsx-extract - streaming spreadsheet extraction tool.\n\n\
                  Lists sheets and writes their rows as JSON lines or delimited text."
)]
struct Cli {
    /// Log library activity to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    #[command(visible_alias = "ls")]
    Sheets {
        /// Input file path
        input: PathBuf,

        /// XML parser
        #[arg(long, value_enum, default_value = "quick-xml")]
        parser: ParserKind,
    },

    /// Stream sheet and row events as JSON lines
    Extract {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Row shape [default: object, or the value given in --options]
        #[arg(long, value_enum)]
        format: Option<FormatKind>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Convert sheets to delimited text
    #[command(visible_alias = "tsv")]
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cell separator; escapes such as \t are recognized
        #[arg(long)]
        delimiter: Option<String>,

        /// Row terminator; escapes such as \r\n are recognized
        #[arg(long)]
        eol: Option<String>,

        /// Render numbers with a decimal comma
        #[arg(long)]
        float_comma: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show version information
    Version,
}

/// Sheet selection; at most one may be given
#[derive(Args)]
#[group(multiple = false)]
struct SelectorArgs {
    /// Extract every sheet
    #[arg(long)]
    all: bool,

    /// Sheet by 1-based position
    #[arg(long, value_name = "N")]
    sheet_nr: Option<usize>,

    /// Sheet by name
    #[arg(long, value_name = "NAME")]
    sheet_name: Option<String>,

    /// Sheet by relationship id
    #[arg(long, value_name = "RID")]
    sheet_id: Option<String>,
}

impl SelectorArgs {
    fn selector(&self) -> Option<SheetSelector> {
        if self.all {
            Some(SheetSelector::All)
        } else if let Some(n) = self.sheet_nr {
            Some(SheetSelector::Number(n))
        } else if let Some(ref name) = self.sheet_name {
            Some(SheetSelector::Name(name.clone()))
        } else {
            self.sheet_id.clone().map(SheetSelector::Id)
        }
    }
}

#[derive(Args)]
struct ExtractArgs {
    #[command(flatten)]
    selector: SelectorArgs,

    /// Rows to skip at the start of each sheet (after empty rows are dropped)
    #[arg(long, value_name = "N")]
    ignore_header: Option<usize>,

    /// Keep rows that have no cells
    #[arg(long)]
    include_empty_rows: bool,

    /// Keep literal cell content (shared strings are still resolved)
    #[arg(long)]
    raw_values: bool,

    /// XML parser
    #[arg(long, value_enum)]
    parser: Option<ParserKind>,

    /// Options as a flat JSON object, e.g. '{"sheet_all":true}'; flags override it
    #[arg(long, value_name = "JSON")]
    options: Option<String>,
}

impl ExtractArgs {
    fn to_options(&self) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
        let mut options = match self.options {
            Some(ref json) => ExtractOptions::from_json(json)?,
            None => ExtractOptions::default(),
        };
        if let Some(selector) = self.selector.selector() {
            if selector == SheetSelector::Number(0) {
                return Err("--sheet-nr starts at 1".into());
            }
            options = options.with_sheet(selector);
        }
        if let Some(rows) = self.ignore_header {
            options = options.with_ignore_header(rows);
        }
        if self.include_empty_rows {
            options = options.with_include_empty_rows(true);
        }
        if self.raw_values {
            options = options.with_raw_values(true);
        }
        if let Some(parser) = self.parser {
            options = options.with_parser(parser.into());
        }
        tracing::debug!(?options, "extraction options");
        Ok(options)
    }
}

/// XML parser
#[derive(Clone, Copy, ValueEnum)]
enum ParserKind {
    /// Streaming pull parser
    #[value(name = "quick-xml")]
    QuickXml,
    /// Tree parser
    Roxmltree,
}

impl From<ParserKind> for XmlBackend {
    fn from(kind: ParserKind) -> Self {
        match kind {
            ParserKind::QuickXml => XmlBackend::QuickXml,
            ParserKind::Roxmltree => XmlBackend::RoxmlTree,
        }
    }
}

/// Row shape for JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatKind {
    /// Objects with address, raw and value per cell
    Object,
    /// Arrays of values
    Array,
}

impl From<FormatKind> for EventFormat {
    fn from(kind: FormatKind) -> Self {
        match kind {
            FormatKind::Object => EventFormat::Object,
            FormatKind::Array => EventFormat::Array,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("xlsx_extract=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sheets { input, parser } => {
            let pb = create_spinner("Reading workbook...");
            let workbook = Workbook::open_with(&input, parser.into())?;
            pb.finish_and_clear();

            println!("{}", "Workbook Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), workbook.kind());
            println!("{}: {:?}", "Date system".bold(), workbook.date_system());
            println!("{}: {}", "Shared strings".bold(), workbook.shared_strings().len());

            println!("\n{}", "Sheets".cyan().bold());
            println!("{}", "─".repeat(40));
            for sheet in workbook.sheets() {
                println!(
                    "{:>3}  {}  {}  {}",
                    sheet.number.to_string().bold(),
                    sheet.name,
                    sheet.relationship_id.dimmed(),
                    sheet.part.dimmed()
                );
            }
        }

        Commands::Extract {
            input,
            output,
            format,
            extract,
        } => {
            let mut options = extract.to_options()?;
            if let Some(format) = format {
                options = options.with_format(format.into());
            }
            let events = xlsx_extract::extract_file(&input, &options);

            match output {
                Some(path) => {
                    let pb = create_spinner("Extracting rows...");
                    let file = BufWriter::new(File::create(&path)?);
                    let result = write_json_lines(events, file, options.format);
                    pb.finish_and_clear();
                    let rows = result?;
                    println!(
                        "{} Extracted {} rows: {}",
                        "✓".green().bold(),
                        rows,
                        path.display()
                    );
                }
                None => {
                    let stdout = io::stdout();
                    write_json_lines(events, stdout.lock(), options.format)?;
                }
            }
        }

        Commands::Convert {
            input,
            output,
            delimiter,
            eol,
            float_comma,
            extract,
        } => {
            let options = extract.to_options()?;
            let mut tsv = TsvOptions::new().with_float_comma(float_comma);
            if let Some(ref json) = extract.options {
                tsv = TsvOptions::from_json(json)?;
                tsv.float_comma |= float_comma;
            }
            if let Some(delimiter) = delimiter {
                tsv = tsv.with_delimiter(unescape(&delimiter));
            }
            if let Some(eol) = eol {
                tsv = tsv.with_end_of_line(unescape(&eol));
            }

            match output {
                Some(path) => {
                    let pb = create_spinner("Converting...");
                    let result = xlsx_extract::convert(&input, &path, &options, &tsv);
                    pb.finish_and_clear();
                    let rows = result?;
                    println!(
                        "{} Converted {} rows: {}",
                        "✓".green().bold(),
                        rows,
                        path.display()
                    );
                }
                None => {
                    let events = xlsx_extract::extract_file(&input, &options);
                    let stdout = io::stdout();
                    write_events(events, stdout.lock(), &tsv)?;
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// Expand `\t`, `\n`, `\r` and `\\` in a separator argument.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn print_version() {
    println!("{} {}", "xlsx-extract".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Streaming extraction of rows from XLSX spreadsheets");
    println!();
    println!("Supported formats: XLSX, XLSM, XLTX, XLTM");
    println!("Outputs: JSON lines, delimited text");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
