// Main CLI entry point for Canary
// Uses clap for argument parsing

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use canary::config::Settings;
use canary::engine::InjectionEngine;
use canary::error::CanaryResult;
use canary::injector::CanaryInjector;
use canary::models::LogFormat;
use canary::sink::OutputSink;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, BufWriter};
use tracing_subscriber::EnvFilter;

type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;
type BoxedReader = Box<dyn AsyncBufRead + Unpin + Send>;

fn build_cli() -> Command {
    Command::new("canary")
        .version(clap::crate_version!())
        .about("Canary token injector for URL query parameters")
        .after_help("EXAMPLES:\n  cat urls.txt | canary --oast .oast.me -c timestamp -o output.txt\n  canary -f requests.txt -r -c mytoken -a -k -l changes.log\n  canary -f urls.txt -c 1-100 -t id,user --ordered")
        .arg(Arg::new("config")
            .long("config")
            .num_args(1)
            .help("TOML settings file; command-line flags take precedence"))
        .arg(Arg::new("canary")
            .short('c')
            .long("canary")
            .num_args(1)
            .help("Canary mode: timestamp, a custom string, or a range such as 1-100"))
        .arg(Arg::new("oast")
            .long("oast")
            .visible_alias("oa")
            .num_args(1)
            .help("Embed an OAST link (e.g. .example.oast.online)"))
        .arg(Arg::new("prefix")
            .short('p')
            .long("prefix")
            .num_args(1)
            .allow_hyphen_values(true)
            .help("Prefix to add before the token"))
        .arg(Arg::new("suffix")
            .short('s')
            .long("suffix")
            .num_args(1)
            .allow_hyphen_values(true)
            .help("Suffix to add after the token"))
        .arg(Arg::new("delimiter")
            .short('d')
            .long("delimiter")
            .num_args(1)
            .allow_hyphen_values(true)
            .help("Delimiter between token and OAST domain"))
        .arg(Arg::new("keep")
            .short('k')
            .long("keep")
            .action(ArgAction::SetTrue)
            .help("Keep the original parameter value and append the token"))
        .arg(Arg::new("all")
            .short('a')
            .long("all")
            .action(ArgAction::SetTrue)
            .help("Replace all matching parameters, not just the first"))
        .arg(Arg::new("target")
            .short('t')
            .long("target")
            .num_args(1)
            .help("Comma-separated list of parameters to target"))
        .arg(Arg::new("file")
            .short('f')
            .long("file")
            .num_args(1)
            .help("Read input from a file instead of stdin"))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .num_args(1)
            .help("Output file (default: requests.dreq)"))
        .arg(Arg::new("raw")
            .short('r')
            .long("raw")
            .action(ArgAction::SetTrue)
            .help("Parse raw HTTP request lines"))
        .arg(Arg::new("log")
            .short('l')
            .long("log")
            .num_args(1)
            .help("Log replaced lines to a file"))
        .arg(Arg::new("log_format")
            .long("log-format")
            .num_args(1)
            .value_parser(clap::value_parser!(LogFormat))
            .help("Change log format: text or json"))
        .arg(Arg::new("concurrency")
            .short('n')
            .long("concurrency")
            .num_args(1)
            .value_parser(clap::value_parser!(usize))
            .help("Number of lines processed concurrently (default: 20)"))
        .arg(Arg::new("ordered")
            .long("ordered")
            .action(ArgAction::SetTrue)
            .help("Write results in input order"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Print a status line for every injected or skipped line"))
        .arg(Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .help("Suppress the final summary"))
}

/// Command-line values win over whatever the config file said
fn apply_cli_overrides(settings: &mut Settings, matches: &ArgMatches) {
    let string = |id: &str| matches.get_one::<String>(id).cloned();

    if let Some(canary) = string("canary") {
        settings.canary = canary;
    }
    if let Some(oast) = string("oast") {
        settings.oast = Some(oast);
    }
    if let Some(prefix) = string("prefix") {
        settings.prefix = prefix;
    }
    if let Some(suffix) = string("suffix") {
        settings.suffix = suffix;
    }
    if let Some(delimiter) = string("delimiter") {
        settings.delimiter = delimiter;
    }
    if let Some(target) = string("target") {
        settings.targets = target.split(',').map(str::to_string).collect();
    }
    if let Some(output) = string("output") {
        settings.output = PathBuf::from(output);
    }
    if let Some(log) = string("log") {
        settings.log = Some(PathBuf::from(log));
    }
    if let Some(format) = matches.get_one::<LogFormat>("log_format") {
        settings.log_format = *format;
    }
    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        settings.concurrency = *concurrency;
    }

    settings.keep_original |= matches.get_flag("keep");
    settings.replace_all |= matches.get_flag("all");
    settings.raw |= matches.get_flag("raw");
    settings.ordered |= matches.get_flag("ordered");
    settings.verbose |= matches.get_flag("verbose");
    settings.quiet |= matches.get_flag("quiet");
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "canary=debug" } else { "canary=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()),
        )
        .init();
}

async fn open_input(file: Option<&String>) -> CanaryResult<BoxedReader> {
    match file {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

async fn create_writer(path: &Path) -> CanaryResult<BoxedWriter> {
    let file = tokio::fs::File::create(path).await?;
    Ok(Box::new(BufWriter::new(file)))
}

async fn run(settings: Settings, input: Option<&String>) -> CanaryResult<()> {
    settings.validate()?;

    let reader = open_input(input).await?;

    let mut sink: OutputSink<BoxedWriter> = OutputSink::new(create_writer(&settings.output).await?)
        .with_order(settings.output_order());
    if let Some(log_path) = &settings.log {
        sink = sink.with_log(create_writer(log_path).await?, settings.log_format);
    }
    if settings.verbose {
        sink = sink.with_status(Box::new(tokio::io::stdout()));
    }
    let sink = Arc::new(sink);

    let injector = CanaryInjector::new(settings.injector_config());
    let engine = InjectionEngine::new(injector, settings.concurrency);
    let summary = engine.run(reader, sink).await?;

    if !settings.quiet {
        println!(
            "[+] Processed {} lines: {} injected, {} skipped",
            summary.lines_read, summary.injected, summary.skipped
        );
        println!("[+] Done. Output written to {}", settings.output.display());
        if let Some(log_path) = &settings.log {
            println!("[+] Log written to {}", log_path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let mut settings = match matches.get_one::<String>("config") {
        Some(path) => Settings::from_file(path).unwrap_or_else(|e| {
            eprintln!("[!] Failed to load config {}: {}", path, e);
            std::process::exit(1);
        }),
        None => Settings::default(),
    };
    apply_cli_overrides(&mut settings, &matches);
    init_tracing(settings.verbose);

    let input = matches.get_one::<String>("file");
    if input.is_none() && std::io::stdin().is_terminal() {
        eprintln!("[!] No input supplied. Please provide input via pipe or -f flag.");
        std::process::exit(0);
    }

    if let Err(e) = run(settings, input).await {
        eprintln!("[!] {}", e);
        std::process::exit(1);
    }
}
