//! dashctl: migrate, inspect and check dashboard documents

mod input;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dash_model::{Dashboard, DashboardConfig, MetaOverrides, CURRENT_SCHEMA_VERSION};
use tracing_subscriber::EnvFilter;

use crate::report::{render_violations, Summary};

fn input_arg() -> Arg {
    Arg::new("input")
        .long("input")
        .short('i')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Dashboard document (.json, .yaml)")
}

fn cli() -> Command {
    Command::new("dashctl")
        .version(dash_model::VERSION)
        .about("Migrate, inspect and check dashboard documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Model configuration (.toml, .yaml, .json)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("readonly")
                .long("readonly")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Load as a viewer without edit, save or delete rights"),
        )
        .subcommand(
            Command::new("migrate")
                .about(format!("Upgrade a document to schema version {CURRENT_SCHEMA_VERSION}"))
                .arg(input_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the save model here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize rows, panels and queries")
                .arg(input_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Report panel id, refId and layout violations")
                .arg(input_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(args: &ArgMatches, config: &DashboardConfig) -> Result<Dashboard> {
    let path = args
        .get_one::<PathBuf>("input")
        .context("missing --input")?;
    let raw = input::read_document(path)?;
    let overrides = if args.get_flag("readonly") {
        MetaOverrides::read_only()
    } else {
        MetaOverrides::new()
    };
    Dashboard::with_config(raw, overrides, config)
        .with_context(|| format!("loading dashboard {}", path.display()))
}

/// Run the selected subcommand; `Ok(false)` means the document failed `check`
fn run(matches: &ArgMatches) -> Result<bool> {
    let Some((name, args)) = matches.subcommand() else {
        bail!("no subcommand given");
    };
    let config = input::load_config(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match (name, args) {
        ("migrate", args) => {
            let dashboard = load(args, &config)?;
            if let Some(report) = dashboard.migration() {
                tracing::info!(
                    from = report.from,
                    to = report.to,
                    steps = report.steps_applied.len(),
                    "migrated"
                );
            }
            let json = dashboard.to_save_json()?;
            input::write_output(args.get_one::<PathBuf>("output").map(PathBuf::as_path), &json)?;
            Ok(true)
        }
        ("inspect", args) => {
            let dashboard = load(args, &config)?;
            let summary = Summary::of(&dashboard);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary.render_text());
            }
            Ok(true)
        }
        ("check", args) => {
            let dashboard = load(args, &config)?;
            let violations = dashboard.violations();
            if violations.is_empty() {
                println!("ok: schema version {}", dashboard.schema_version());
                Ok(true)
            } else {
                print!("{}", render_violations(&violations));
                tracing::warn!(count = violations.len(), "dashboard violates invariants");
                Ok(false)
            }
        }
        (other, _) => bail!("unknown subcommand `{other}`"),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let log_json = matches.get_flag("log-json")
        || matches
            .subcommand()
            .is_some_and(|(_, args)| args.get_flag("log-json"));
    init_tracing(log_json);

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "dashctl failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
