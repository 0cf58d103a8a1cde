use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use luatrace_cli::{batch, instrument, log_filter, AnalyzerOverrides, CliConfig, InstrumentArgs};
use luatrace_core::{init_tracing_with_default, Instrumenter, ProcessAnalyzer};

fn cli() -> Command {
    Command::new("luatrace")
        .version(luatrace_core::VERSION)
        .about("Instrument Luau sources with debugger hooks")
        .subcommand_required(true)
        .arg(
            Arg::new("analyzer")
                .long("analyzer")
                .value_name("PROGRAM")
                .global(true)
                .help("Syntax analyzer to run (default: luau-ast)"),
        )
        .arg(
            Arg::new("analyzer-arg")
                .long("analyzer-arg")
                .value_name("ARG")
                .global(true)
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Extra argument for the analyzer, repeatable"),
        )
        .arg(
            Arg::new("stdin")
                .long("stdin")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Pipe the source to the analyzer instead of a temporary file"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("instrument")
                .about("Instrument a single file")
                .arg(Arg::new("file").value_name("FILE").required(true).index(1))
                .arg(hook_lib_arg())
                .arg(
                    Arg::new("hook-name")
                        .long("hook-name")
                        .value_name("NAME")
                        .help("Hook variable name (default: random)"),
                )
                .arg(
                    Arg::new("source-path")
                        .long("source-path")
                        .value_name("PATH")
                        .help("Path reported to _register (default: FILE)"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("OUT")
                        .help("Write instrumented source here instead of stdout"),
                )
                .arg(
                    Arg::new("breakpoints")
                        .long("breakpoints")
                        .value_name("OUT.json")
                        .help("Write the breakpoint listing here"),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Instrument every .lua/.luau file under a directory")
                .arg(Arg::new("source").value_name("SRC_DIR").required(true).index(1))
                .arg(Arg::new("output").value_name("OUT_DIR").required(true).index(2))
                .arg(hook_lib_arg()),
        )
}

fn hook_lib_arg() -> Arg {
    Arg::new("hook-lib")
        .long("hook-lib")
        .value_name("EXPR")
        .help("Lua expression passed to require() in the header")
}

fn load_config(matches: &ArgMatches) -> Result<CliConfig> {
    let path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = CliConfig::load_or_default(path.as_deref())?;
    config.apply_analyzer_overrides(AnalyzerOverrides {
        program: matches.get_one::<String>("analyzer").cloned(),
        args: matches
            .get_many::<String>("analyzer-arg")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        stdin: matches.get_flag("stdin"),
    });
    Ok(config)
}

async fn run(matches: ArgMatches) -> Result<ExitCode> {
    let config = load_config(&matches)?;
    let instrumenter = Instrumenter::new(ProcessAnalyzer::new(config.analyzer.clone()))
        .with_config(config.instrument.clone());

    match matches.subcommand() {
        Some(("instrument", sub)) => {
            let args = InstrumentArgs {
                input: sub
                    .get_one::<String>("file")
                    .map(PathBuf::from)
                    .context("missing FILE")?,
                hook_library: config
                    .resolve_hook_library(sub.get_one::<String>("hook-lib").map(String::as_str))?,
                hook_variable: sub.get_one::<String>("hook-name").cloned(),
                source_path: sub.get_one::<String>("source-path").cloned(),
                output: sub.get_one::<String>("output").map(PathBuf::from),
                breakpoints: sub.get_one::<String>("breakpoints").map(PathBuf::from),
            };
            instrument(&instrumenter, &args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("batch", sub)) => {
            let hook_library =
                config.resolve_hook_library(sub.get_one::<String>("hook-lib").map(String::as_str))?;
            let source = sub.get_one::<String>("source").context("missing SRC_DIR")?;
            let output = sub.get_one::<String>("output").context("missing OUT_DIR")?;

            let summary = batch(instrumenter, &hook_library, Path::new(source), Path::new(output)).await?;
            for error in &summary.errors {
                eprintln!("{error}");
            }
            println!(
                "{} of {} files instrumented, {} breakpoints",
                summary.files_instrumented, summary.files_processed, summary.breakpoints
            );
            Ok(if summary.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();

    init_tracing_with_default(log_filter(matches.get_flag("debug")));

    run(matches).await
}
