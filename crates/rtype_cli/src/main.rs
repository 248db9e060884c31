//! rtc: The rtype checker CLI.
//!
//! Usage:
//!   rtc [options] [file...]
//!
//! Checks JSON program files and prints tsc-style diagnostics.

use clap::Parser as ClapParser;
use miette::{bail, IntoDiagnostic, WrapErr};
use rtype_binder::{parse_source_file, Binder, SourceFile};
use rtype_diagnostics::{Diagnostic, DiagnosticCollection};
use rtype_options::{CheckerOptions, RtConfig};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

const CONFIG_FILE_NAME: &str = "rtconfig.json";

#[derive(ClapParser, Debug)]
#[command(name = "rtc", about = "rtype - A static type checker for literal values", disable_version_flag = true)]
struct Cli {
    /// Program files to check.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to rtconfig.json.
    #[arg(short = 'p', long = "project")]
    project: Option<PathBuf>,

    /// Enable all strict checking options.
    #[arg(long)]
    strict: bool,

    /// Reject properties a record type does not declare.
    #[arg(long = "closedRecords")]
    closed_records: bool,

    /// Initialize an rtconfig.json file.
    #[arg(long)]
    init: bool,

    /// Print the checker version.
    #[arg(short = 'v', long)]
    version: bool,

    /// Print every top-level binding with its type after checking.
    #[arg(long = "listBindings")]
    list_bindings: bool,

    /// Enable pretty printing for diagnostics.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pretty: bool,
}

impl Cli {
    /// Options set on the command line. Unset flags leave the config file's
    /// value in place; `--strict` also overrides the file's `noImplicitAny`.
    fn checker_options(&self) -> CheckerOptions {
        CheckerOptions {
            strict: self.strict.then_some(true),
            no_implicit_any: self.strict.then_some(true),
            closed_records: self.closed_records.then_some(true),
        }
    }
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("rtc Version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = if cli.init { run_init().map(|()| 0) } else { run_check(&cli) };
    match result {
        Ok(code) => process::exit(code),
        Err(report) => {
            eprintln!("{:?}", report);
            process::exit(1);
        }
    }
}

fn run_check(cli: &Cli) -> miette::Result<i32> {
    let start = Instant::now();

    let (files, config) = resolve_input_files(cli)?;
    if files.is_empty() {
        print_error("No input files found.");
        return Ok(1);
    }

    // CLI options override rtconfig.json
    let options = config
        .as_ref()
        .map(RtConfig::options)
        .unwrap_or_default()
        .merge(&cli.checker_options());

    let mut diagnostics = DiagnosticCollection::new();
    for file in &files {
        let source = load_source_file(file)?;
        let mut binder = Binder::new(&options).with_file_name(file.display().to_string());
        binder.bind_source_file(&source);
        if cli.list_bindings {
            print_bindings(&binder);
        }
        diagnostics.extend(binder.take_diagnostics());
    }
    diagnostics.sort();

    let use_color = cli.pretty && std::io::stderr().is_terminal();
    for diag in diagnostics.diagnostics() {
        print_diagnostic(diag, use_color);
    }

    if diagnostics.has_errors() {
        let count = diagnostics.error_count();
        let plural = if count == 1 { "" } else { "s" };
        if use_color {
            eprintln!("\n{}Found {} error{}.{}", RED, count, plural, RESET);
        } else {
            eprintln!("\nFound {} error{}.", count, plural);
        }
        return Ok(2);
    }

    if use_color {
        eprintln!("{}Checked {} file(s) in {:.2}s.{}", GRAY, files.len(), start.elapsed().as_secs_f64(), RESET);
    }
    Ok(0)
}

fn run_init() -> miette::Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        bail!("An {} file already exists in the current directory.", CONFIG_FILE_NAME);
    }
    std::fs::write(config_path, rtype_options::DEFAULT_CONFIG)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to create {}", CONFIG_FILE_NAME))?;
    println!("Successfully created an {} file.", CONFIG_FILE_NAME);
    Ok(())
}

/// Files named on the command line are checked alongside those listed in
/// the project config. Without `--project`, an rtconfig.json in the current
/// directory is used only when no files are given.
fn resolve_input_files(cli: &Cli) -> miette::Result<(Vec<PathBuf>, Option<RtConfig>)> {
    let project = match &cli.project {
        Some(project) => Some(project.clone()),
        None if cli.files.is_empty() && Path::new(CONFIG_FILE_NAME).exists() => Some(PathBuf::from(CONFIG_FILE_NAME)),
        None => None,
    };

    let Some(project) = project else {
        return Ok((cli.files.clone(), None));
    };
    let config = rtype_options::parse_rtconfig_file(&project)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read project '{}'", project.display()))?;
    let mut files = config.resolve_files(&project);
    files.extend(cli.files.iter().cloned());
    Ok((files, Some(config)))
}

fn load_source_file(path: &Path) -> miette::Result<SourceFile> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read '{}'", path.display()))?;
    parse_source_file(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("'{}' is not a valid program file", path.display()))
}

fn print_bindings(binder: &Binder) {
    for binding in binder.global_bindings() {
        println!(
            "{} {}: {}",
            binding.mutability.keyword(),
            binding.name,
            binder.checker().type_to_string(binding.declared_type())
        );
    }
}

fn print_diagnostic(diag: &Diagnostic, use_color: bool) {
    if use_color {
        let color = if diag.is_error() { RED } else { YELLOW };
        if let Some(ref file) = diag.file {
            eprint!("{}{}{}", CYAN, file, RESET);
            if let Some(statement) = diag.statement {
                eprint!("(statement {})", statement);
            }
            eprint!(": ");
        }
        eprintln!(
            "{}{}{}{} {}TS{}{}: {}",
            BOLD, color, diag.category, RESET, CYAN, diag.code, RESET, diag.message_text
        );
        for related in &diag.related_information {
            eprintln!("  {}{}{}", GRAY, related.message_text, RESET);
        }
    } else {
        eprintln!("{}", diag);
        for related in &diag.related_information {
            eprintln!("  {}", related.message_text);
        }
    }
}

fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}{}error{}: {}", BOLD, RED, RESET, msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["rtc", "--strict", "--closedRecords", "a.json"]);
        assert_eq!(cli.files, vec![PathBuf::from("a.json")]);
        let file_options = CheckerOptions { closed_records: Some(false), no_implicit_any: Some(false), ..Default::default() };
        let options = file_options.merge(&cli.checker_options());
        assert!(options.closed_records());
        assert!(options.no_implicit_any());
    }

    #[test]
    fn test_unset_flags_keep_config_values() {
        let cli = Cli::parse_from(["rtc", "a.json"]);
        let file_options = CheckerOptions { closed_records: Some(true), ..Default::default() };
        assert!(file_options.merge(&cli.checker_options()).closed_records());
        assert!(cli.pretty);
    }

    #[test]
    fn test_pretty_can_be_disabled() {
        let cli = Cli::parse_from(["rtc", "--pretty", "false", "a.json"]);
        assert!(!cli.pretty);
    }

    #[test]
    fn test_files_without_project() {
        let cli = Cli::parse_from(["rtc", "a.json", "b.json"]);
        let (files, config) = resolve_input_files(&cli).unwrap();
        assert_eq!(files.len(), 2);
        assert!(config.is_none());
    }

    #[test]
    fn test_missing_project_is_an_error() {
        let cli = Cli::parse_from(["rtc", "-p", "/nonexistent/rtconfig.json"]);
        assert!(resolve_input_files(&cli).is_err());
    }
}
