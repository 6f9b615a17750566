//! logsift - filter a log file with a pattern or boolean keyword expression.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use logsift::{FilterOptions, FilterSpec, LogsiftError, ScanCoordinator, ScanReport, ViewerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

fn cli() -> Command {
    let command = Command::new("logsift")
        .version(logsift::VERSION)
        .about("Filter a log file down to the lines matching an expression")
        .long_about(
            "logsift prints the lines of FILE that match EXPRESSION. By default EXPRESSION \
             is a single case-insensitive literal; with --boolean it combines quoted \
             keywords, e.g. '\"timeout\" and (\"db\" or \"cache\")'.",
        )
        .arg(
            Arg::new("file")
                .help("Path to the log file to filter")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("expression")
                .help("Search pattern or boolean keyword expression")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("case-sensitive")
                .short('c')
                .long("case-sensitive")
                .help("Match case exactly")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("whole-word")
                .short('w')
                .long("whole-word")
                .help("Only match whole words")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("regex")
                .short('r')
                .long("regex")
                .help("Treat the expression as a regular expression")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("boolean")
                .short('b')
                .long("boolean")
                .help("Treat the expression as quoted keywords joined by and/or")
                .action(ArgAction::SetTrue)
                .conflicts_with("regex"),
        )
        .arg(
            Arg::new("line-numbers")
                .short('n')
                .long("line-numbers")
                .help("Prefix each line with its original line number")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .help("Only print the number of matching lines and matches")
                .action(ArgAction::SetTrue),
        );

    #[cfg(feature = "config")]
    let command = command.arg(
        Arg::new("config")
            .long("config")
            .value_name("PATH")
            .help("Configuration file (defaults to <config dir>/logsift/config.toml)"),
    );

    command
}

#[cfg(feature = "config")]
fn load_config(matches: &ArgMatches) -> Result<ViewerConfig> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => ViewerConfig::load(Path::new(path))?,
        None => ViewerConfig::load_or_default()?,
    };
    Ok(config)
}

#[cfg(not(feature = "config"))]
fn load_config(_matches: &ArgMatches) -> Result<ViewerConfig> {
    Ok(ViewerConfig::default())
}

fn build_spec(matches: &ArgMatches, config: &ViewerConfig, expression: &str) -> FilterSpec {
    if matches.get_flag("boolean") {
        return FilterSpec::boolean(expression);
    }
    let defaults = config.default_options;
    let options = FilterOptions {
        case_sensitive: defaults.case_sensitive || matches.get_flag("case-sensitive"),
        whole_word: defaults.whole_word || matches.get_flag("whole-word"),
        use_regex: defaults.use_regex || matches.get_flag("regex"),
    };
    FilterSpec::new(expression, options)
}

fn read_document(path: &Path) -> Result<Arc<str>> {
    let bytes = std::fs::read(path)
        .map_err(|err| LogsiftError::file_error(format!("cannot read {}", path.display()), err))?;
    Ok(Arc::from(String::from_utf8_lossy(&bytes)))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let matches = cli().get_matches();

    // Both positionals are required, so clap has already rejected their absence.
    let file_path = PathBuf::from(
        matches
            .get_one::<String>("file")
            .context("missing file argument")?,
    );
    let expression = matches
        .get_one::<String>("expression")
        .context("missing expression argument")?
        .clone();

    if !file_path.is_file() {
        anyhow::bail!("Path is not a regular file: {}", file_path.display());
    }

    let config = load_config(&matches)?;
    let spec = build_spec(&matches, &config, &expression);
    let text = read_document(&file_path)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<std::result::Result<ScanReport, LogsiftError>>();
    let error_tx = tx.clone();

    let mut coordinator = ScanCoordinator::with_config(tokio::runtime::Handle::current(), config);
    coordinator
        .start_scan(
            text,
            spec,
            move |report| {
                let _ = tx.send(Ok(report));
            },
            move |err| {
                let _ = error_tx.send(Err(err));
            },
        )
        .await;

    let outcome = rx.recv().await.context("scan ended without a result")?;
    coordinator.shutdown().await;
    let report = outcome?;

    if matches.get_flag("count") {
        println!(
            "{} lines, {} matches",
            report.line_mapping.len(),
            report.total_count
        );
        return Ok(());
    }

    let numbered = matches.get_flag("line-numbers");
    for (line, line_number) in report.filtered_lines.iter().zip(&report.line_mapping) {
        if numbered {
            println!("{:>6}: {}", line_number + 1, line);
        } else {
            println!("{}", line);
        }
    }

    Ok(())
}
