use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use outfilter_log::{Document, ParseOptions, Severity};
use std::fs;
use std::path::{Path, PathBuf};

mod report;

#[derive(Parser)]
#[command(name = "outfilter")]
#[command(about = "Classify AMD/Xilinx Vivado log files", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Path to the log file
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Fail on the first unknown construct instead of degrading its scope
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct MessageFilter {
    /// Print info messages
    #[arg(long)]
    info: bool,
    /// Print warning messages
    #[arg(long)]
    warning: bool,
    /// Print critical warning messages
    #[arg(long)]
    critical: bool,
    /// Print error messages
    #[arg(long)]
    error: bool,
}

impl MessageFilter {
    fn selected(&self) -> impl Iterator<Item = Severity> + '_ {
        Severity::ALL.into_iter().filter(|severity| match severity {
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::CriticalWarning => self.critical,
            Severity::Error => self.error,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a synthesis log (*.vds)
    Synth {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        filter: MessageFilter,
        /// Print statistics in InfluxDB line protocol
        #[arg(long)]
        influxdb: bool,
        /// Branch tag of the InfluxDB records
        #[arg(long, default_value = "main")]
        branch: String,
        /// Design tag of the InfluxDB records; defaults to the file stem
        #[arg(long)]
        design: Option<String>,
    },
    /// Parse an implementation log (*.vdi)
    Impl {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        filter: MessageFilter,
    },
    /// Print every line with its classification
    Classify {
        #[command(flatten)]
        input: Input,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the reconstructed command, section, task and phase tree
    Outline {
        #[command(flatten)]
        input: Input,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Synth {
            input,
            filter,
            influxdb,
            branch,
            design,
        } => {
            let document = load(input)?;
            print_messages(&document, filter);
            if *influxdb {
                let design = match design {
                    Some(design) => design.clone(),
                    None => file_stem(&input.path),
                };
                let tags = report::Tags {
                    version: document.tool_version(),
                    branch,
                    design: &design,
                };
                println!("{}", report::synthesis_overview(&document, &tags));
                println!("{}", report::synthesis_cells(&document, &tags));
            }
            print_summary(&document);
        }
        Commands::Impl { input, filter } => {
            let document = load(input)?;
            print_messages(&document, filter);
            for command in document.commands() {
                let elapsed = command
                    .timing()
                    .map_or_else(|| "-".to_string(), |timing| format!("{:.1} s", timing.elapsed.as_secs_f64()));
                println!("{:<24} {:>10}  {}", command.kind().name(), elapsed, report::status(command.success()));
            }
            print_summary(&document);
        }
        Commands::Classify { input, json } => {
            let document = load(input)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(document.lines())?);
            } else {
                for line in document.lines() {
                    println!("{:>6} {:<48} {}", line.number(), line.kind().to_string(), line.text());
                }
            }
        }
        Commands::Outline { input, json } => {
            let document = load(input)?;
            let outlines: Vec<_> = document.commands().iter().map(|command| command.outline()).collect();
            if *json {
                println!("{}", serde_json::to_string_pretty(&outlines)?);
            } else {
                for outline in &outlines {
                    print!("{outline}");
                }
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load(input: &Input) -> anyhow::Result<Document> {
    let path = &input.path;
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let options = ParseOptions { strict: input.strict };
    let document = Document::parse_with(&text, options)
        .with_context(|| format!("Failed to classify {}", path.display()))?;
    log::info!("{}: {} lines in {:?}", path.display(), document.lines().len(), document.processing_duration());
    Ok(document)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "design".to_string())
}

fn print_messages(document: &Document, filter: &MessageFilter) {
    for severity in filter.selected() {
        let messages = document.messages().of_severity(severity);
        println!("{severity} messages: {}", messages.len());
        for message in messages {
            println!("  {message}");
        }
    }
}

fn print_summary(document: &Document) {
    let counts = document.messages().counts();
    println!("Summary:");
    println!("  Processing duration: {:.3} s", document.processing_duration().as_secs_f64());
    println!(
        "  Info: {}  Warning: {}  Critical Warning: {}  Error: {}",
        counts.info, counts.warning, counts.critical_warning, counts.error
    );
    if !document.diagnostics().is_empty() {
        println!("  Diagnostics: {}", document.diagnostics().len());
        for diagnostic in document.diagnostics() {
            println!("    {diagnostic}");
        }
    }
}
