use std::fs;
use std::io::{self, Write};
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flowshark_core::{DecodeConfig, RecordMode, Report, SchemeKind};
use glob::glob;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FLOWSHARK_BUILD_COMMIT"),
    " ",
    env!("FLOWSHARK_BUILD_DATE"),
    ")"
);

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Largest payload a UDP datagram can carry.
const MAX_DATAGRAM_LEN: usize = 65_535;

const EXAMPLES: &str = "Examples:\n  flowshark pcap decode export.pcapng -o report.json\n  flowshark pcap analyze 'captures/*.pcap' --stdout --records all\n  flowshark listen --bind 0.0.0.0:2055 --count 10";

#[derive(Parser, Debug)]
#[command(name = "flowshark")]
#[command(version = VERSION)]
#[command(
    about = "Template-driven NetFlow v9 decoder for captures and live exports.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (default: warn)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs (offline).
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Decode NetFlow v9 exports received on a UDP socket.
    Listen(ListenArgs),
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode every NetFlow v9 export in a capture into a JSON report.
    #[command(alias = "analyze", alias = "analyse")]
    #[command(after_help = EXAMPLES)]
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Path (or glob matching one file) to a .pcap or .pcapng file
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if violations or decode failures are present
    #[arg(long)]
    strict: bool,

    /// List violations after decoding
    #[arg(long)]
    list_violations: bool,

    /// UDP destination port carrying exports (repeatable; default: sniff version 9)
    #[arg(long = "port", value_name = "PORT")]
    ports: Vec<u16>,

    #[command(flatten)]
    options: InterpretOptions,
}

#[derive(Args, Debug)]
struct ListenArgs {
    /// Local address to receive exports on
    #[arg(long, value_name = "ADDR")]
    bind: SocketAddr,

    /// Stop after this many datagrams
    #[arg(long, value_name = "N")]
    count: Option<u64>,

    #[command(flatten)]
    options: InterpretOptions,
}

#[derive(Args, Debug)]
struct InterpretOptions {
    /// JSON decode configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Field scheme: cisco or cisco-lengths
    #[arg(long)]
    scheme: Option<SchemeKind>,

    /// Records to interpret per data flowset: none, first or all
    #[arg(long)]
    records: Option<RecordMode>,
}

impl InterpretOptions {
    fn load(&self) -> Result<DecodeConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => DecodeConfig::from_json_file(path).map_err(|err| {
                CliError::new(
                    err.to_string(),
                    Some("see DecodeConfig fields: scheme, ports, records, max_examples".into()),
                )
            })?,
            None => DecodeConfig::default(),
        };
        if let Some(scheme) = self.scheme {
            config.scheme = scheme;
        }
        if let Some(records) = self.records {
            config.records = records;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Decode(args) => cmd_pcap_decode(args),
        },
        Commands::Listen(args) => cmd_listen(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let default = log_level.unwrap_or(DEFAULT_LOG_LEVEL);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_pcap_decode(args: DecodeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;

    let report_path = match (args.stdout, args.report) {
        (true, _) => None,
        (false, Some(path)) => {
            ensure_distinct_output(&resolved_input, &path)?;
            Some(path)
        }
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };

    let mut config = args.options.load()?;
    if !args.ports.is_empty() {
        config.ports = args.ports;
    }

    let rep = flowshark_core::analyze_pcap_file(&resolved_input, &config)
        .context("PCAP/PCAPNG decoding failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match &report_path {
        None => print!("{json}"),
        Some(path) => write_report(path, &json)?,
    }

    if args.list_violations && !args.quiet {
        print_violations(&rep);
    }
    if let Some(path) = report_path.as_ref().filter(|_| !args.quiet) {
        eprintln!("OK: report written -> {}", path.display());
    }
    if args.strict && has_violations(&rep) {
        return Err(CliError::new(
            "NetFlow violations detected",
            Some("use --list-violations to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_listen(args: ListenArgs) -> Result<(), CliError> {
    let config = args.options.load()?;
    let socket = UdpSocket::bind(args.bind).map_err(|err| {
        CliError::new(
            format!("cannot bind {}: {err}", args.bind),
            Some("check the address and that the port is free".to_string()),
        )
    })?;
    let local = socket.local_addr().context("failed to read bound address")?;
    info!(%local, "listening for NetFlow v9 exports");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    let mut received = 0u64;

    while args.count.is_none_or(|count| received < count) {
        let (len, sender) = socket
            .recv_from(&mut buf)
            .context("failed to receive datagram")?;
        received += 1;

        let decoded = match flowshark_core::decode_datagram(&buf[..len], sender, local) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => {
                debug!(%sender, "empty datagram");
                continue;
            }
            Err(err) => {
                warn!(%sender, code = err.code(), "{err}");
                continue;
            }
        };

        let interpreted = flowshark_core::interpret_message(&decoded.message, &config);
        let line = flowshark_core::message_report(&decoded.message, interpreted.records, None);
        serde_json::to_writer(&mut out, &line).context("JSON serialization failed")?;
        writeln!(out)
            .and_then(|()| out.flush())
            .context("failed to write to stdout")?;
    }
    Ok(())
}

fn ensure_distinct_output(input: &Path, report: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let parent = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A missing output directory cannot hold the input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn write_report(path: &Path, json: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    Ok(json.context("JSON serialization failed")?)
}

fn has_violations(rep: &Report) -> bool {
    !rep.violations.is_empty() || !rep.failures.is_empty()
}

fn print_violations(rep: &Report) {
    eprintln!("NetFlow violations:");
    for violation in &rep.violations {
        eprintln!(
            "  {} {} ({})",
            violation.id, violation.severity, violation.count
        );
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let pattern_error = |detail: String| {
        CliError::new(
            format!("invalid input pattern '{pattern}'"),
            Some(format!("pattern error: {detail}")),
        )
    };
    let mut matches = Vec::new();
    for entry in glob(&pattern).map_err(|err| pattern_error(err.msg.to_string()))? {
        let path = entry.map_err(|err| pattern_error(err.to_string()))?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{pattern}'"),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        total => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if total > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({total} matches); matches: {listed}"),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
