use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codewarden::config::Config;
use codewarden::output::{self, OutputFormat};
use codewarden::{audit, RuleCatalog, ScanOptions, ScanRequest, Scanner, Severity, WardenError};

#[derive(Parser)]
#[command(
    name = "codewarden",
    about = "Pattern-based static security scanner",
    version,
    author
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project directory for security issues
    Scan {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Language for extension filtering (typescript, javascript, python, ...)
        #[arg(long, short = 'l')]
        language: Option<String>,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json, sarif)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Minimum severity to fail (info, low, medium, high, critical)
        #[arg(long)]
        fail_on: Option<String>,

        /// Only run these rule IDs
        #[arg(long, value_delimiter = ',')]
        rules: Vec<String>,

        /// Only run rules of these severities
        #[arg(long, value_delimiter = ',')]
        severity: Vec<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Scan only the lines a unified diff adds
    ScanDiff {
        /// Diff file; reads stdin when omitted
        diff_file: Option<PathBuf>,

        /// Language label for the report
        #[arg(long, short = 'l')]
        language: Option<String>,

        /// Output format (console, json, sarif)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Audit dependencies via `npm audit` (best-effort)
    Audit {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,
    },

    /// List all available rules
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .codewarden.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let result = match cli.command {
        Commands::Scan {
            path,
            language,
            config,
            format,
            fail_on,
            rules,
            severity,
            output,
        } => cmd_scan(path, language, config, format, fail_on, rules, severity, output),
        Commands::ScanDiff {
            diff_file,
            language,
            format,
            output,
        } => cmd_scan_diff(diff_file, language, format, output),
        Commands::Audit { path, format } => cmd_audit(path, format),
        Commands::ListRules { format } => cmd_list_rules(format),
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

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "codewarden=warn" } else { "codewarden=info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .expect("valid default filter directives");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn parse_format(format_str: &str) -> OutputFormat {
    OutputFormat::from_str_lenient(format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    })
}

fn parse_severities(raw: &[String]) -> Vec<Severity> {
    raw.iter()
        .filter_map(|s| {
            let sev = Severity::from_str_lenient(s);
            if sev.is_none() {
                eprintln!("Warning: unknown severity '{}', ignoring", s);
            }
            sev
        })
        .collect()
}

/// Resolve the include-list the scanner runs with: the CLI's explicit
/// rules when given, otherwise the full catalog, in both cases minus the
/// config's ignore set.
fn effective_rule_ids(catalog: &RuleCatalog, cli_rules: &[String], config: &Config) -> Vec<String> {
    if config.ignore_rules.is_empty() {
        return cli_rules.to_vec();
    }
    let base: Vec<String> = if cli_rules.is_empty() {
        catalog.list().into_iter().map(|r| r.id).collect()
    } else {
        cli_rules.to_vec()
    };
    base.into_iter()
        .filter(|id| !config.ignore_rules.contains(id))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn cmd_scan(
    path: PathBuf,
    language: Option<String>,
    config_path: Option<PathBuf>,
    format_str: String,
    fail_on_str: Option<String>,
    rules: Vec<String>,
    severity: Vec<String>,
    output_path: Option<PathBuf>,
) -> Result<i32, WardenError> {
    let format = parse_format(&format_str);
    let config_path = config_path.unwrap_or_else(|| path.join(".codewarden.toml"));
    let mut config = Config::load(&config_path)?;

    if let Some(fail_on) = fail_on_str.and_then(|s| {
        let sev = Severity::from_str_lenient(&s);
        if sev.is_none() {
            eprintln!("Warning: unknown severity '{}', using config default", s);
        }
        sev
    }) {
        config.fail_on = fail_on;
    }

    let scanner = Scanner::new().with_options(ScanOptions {
        threads: config.threads,
    });
    let request = ScanRequest {
        project_path: Some(path),
        language: language.or_else(|| config.language.clone()),
        rule_ids: effective_rule_ids(scanner.catalog(), &rules, &config),
        severities: parse_severities(&severity),
        ..Default::default()
    };

    let report = scanner.scan(&request)?;
    let rendered = output::render(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(if config.fails(&report.findings) { 1 } else { 0 })
}

fn cmd_scan_diff(
    diff_file: Option<PathBuf>,
    language: Option<String>,
    format_str: String,
    output_path: Option<PathBuf>,
) -> Result<i32, WardenError> {
    let format = parse_format(&format_str);

    let diff_text = match diff_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let scanner = Scanner::new();
    let report = scanner.scan_diff(&diff_text, language.as_deref().unwrap_or("unknown"))?;
    let rendered = output::render(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(if report.findings.is_empty() { 0 } else { 1 })
}

fn cmd_audit(path: PathBuf, format_str: String) -> Result<i32, WardenError> {
    let config = Config::load(&path.join(".codewarden.toml"))?;
    let result =
        audit::audit_with_timeout(&path, Duration::from_secs(config.audit.timeout_secs));

    match format_str.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            if result.findings.is_empty() {
                println!("No known vulnerable dependencies.");
            } else {
                for finding in &result.findings {
                    println!(
                        "[{}] {} {}",
                        finding.severity, finding.code_snippet, finding.description
                    );
                    if let Some(fix) = &finding.fix {
                        println!("        fix: {}", fix);
                    }
                }
                println!(
                    "Summary: {} critical, {} high, {} medium, {} low",
                    result.summary.critical,
                    result.summary.high,
                    result.summary.medium,
                    result.summary.low,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_list_rules(format_str: String) -> Result<i32, WardenError> {
    let rules = codewarden::list_rules();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<24} {:<30} {:<10} CATEGORY", "ID", "NAME", "SEVERITY");
            println!("{}", "-".repeat(80));
            for rule in &rules {
                println!(
                    "{:<24} {:<30} {:<10} {}",
                    rule.id,
                    rule.name,
                    rule.severity.to_string(),
                    rule.category,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, WardenError> {
    let path = PathBuf::from(".codewarden.toml");

    if path.exists() && !force {
        eprintln!(".codewarden.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .codewarden.toml");

    Ok(0)
}
