//! Main CLI application

use crate::config::{self, File};
use crate::doctor::{self, Severity};
use crate::error::{ConfigError, Result};
use crate::runner::{graph, scheduler::Runner};
use crate::update;
use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::Colorize;
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::process;

/// Build the clap command tree
fn build_cli() -> Command {
    Command::new("remake")
        .version(crate_version!())
        .about("A YAML-based task runner with timestamp-based skipping and parallel execution")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to remake.yml config file")
                .global(true),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .long("define")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Override a variable declaration")
                .global(true),
        )
        .subcommand(
            Command::new("run")
                .about("Run a target and its dependencies")
                .arg(
                    Arg::new("target")
                        .value_name("TARGET")
                        .help("Task to run (the default target if omitted)"),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .help("Maximum number of tasks run in parallel (default: CPU count)"),
                ),
        )
        .subcommand(Command::new("list").about("List tasks with their descriptions"))
        .subcommand(
            Command::new("graph")
                .about("Print the dependency tree of a target")
                .arg(
                    Arg::new("target")
                        .value_name("TARGET")
                        .help("Task to inspect (the default target if omitted)"),
                ),
        )
        .subcommand(
            Command::new("init")
                .about("Write a starter remake.yml")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite an existing file"),
                ),
        )
        .subcommand(Command::new("doctor").about("Check environment and remake file health"))
        .subcommand(
            Command::new("fmt")
                .about("Rewrite the remake file in canonical form")
                .arg(
                    Arg::new("check")
                        .long("check")
                        .action(ArgAction::SetTrue)
                        .help("Exit non-zero when the file is not canonical, without writing"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .value_name("SHELL")
                        .required(true)
                        .value_parser(clap::value_parser!(Shell)),
                ),
        )
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub)) => cmd_run(sub),
        Some(("list", sub)) => cmd_list(sub),
        Some(("graph", sub)) => cmd_graph(sub),
        Some(("init", sub)) => cmd_init(sub),
        Some(("doctor", sub)) => cmd_doctor(sub),
        Some(("fmt", sub)) => cmd_fmt(sub),
        Some(("completions", sub)) => cmd_completions(sub),
        _ => {
            let mut cli = build_cli();
            cli.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Locate the config file, honoring -f
fn config_path(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<String>("file") {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config::find_config_file()?),
    }
}

/// Load the model: .env from the config directory first so that environment
/// fallback during variable resolution sees it, then parse and apply -D
/// overrides.
fn load_file(matches: &ArgMatches) -> Result<File> {
    let path = config_path(matches)?;
    if let Some(dir) = path.parent() {
        let _ = dotenvy::from_path(dir.join(".env"));
    }
    let mut file = config::load_file(&path)?;
    file.apply_overrides(&parse_defines(matches)?)?;
    Ok(file)
}

/// Parse repeated -D KEY=VALUE flags
fn parse_defines(matches: &ArgMatches) -> Result<Vec<(String, String)>> {
    let mut overrides = Vec::new();
    if let Some(values) = matches.get_many::<String>("define") {
        for value in values {
            let Some((key, val)) = value.split_once('=') else {
                return Err(ConfigError::Invalid(format!(
                    "-D expects KEY=VALUE, got '{}'",
                    value
                ))
                .into());
            };
            overrides.push((key.trim().to_string(), val.to_string()));
        }
    }
    Ok(overrides)
}

fn cmd_run(matches: &ArgMatches) -> Result<()> {
    let file = load_file(matches)?;
    let jobs = matches.get_one::<usize>("jobs").copied().unwrap_or(0);
    let target = matches.get_one::<String>("target").map(String::as_str);

    let runner = Runner { file, jobs };
    runner.run(target)?;

    if let Some(notice) = update::check_latest(crate::VERSION, None) {
        eprintln!("{}", notice);
    }
    Ok(())
}

fn cmd_list(matches: &ArgMatches) -> Result<()> {
    let file = load_file(matches)?;
    let default = file.default_target();

    let width = file.order.iter().map(String::len).max().unwrap_or(0);
    for name in &file.order {
        let Some(task) = file.tasks.get(name) else {
            continue;
        };
        let marker = if *name == default { "*" } else { " " };
        let desc = task.desc.as_deref().unwrap_or("");
        let padded = format!("{:<width$}", name);
        println!("{} {}  {}", marker, padded.bold(), desc);
    }
    Ok(())
}

fn cmd_graph(matches: &ArgMatches) -> Result<()> {
    let file = load_file(matches)?;
    let target = match matches.get_one::<String>("target") {
        Some(t) => file.expand(t),
        None => file.default_target(),
    };
    if !file.tasks.contains_key(&target) {
        return Err(ConfigError::UnknownTarget(target).into());
    }

    // surfaces cycles and undefined references before printing
    graph::collect_subset(&file, &target)?;
    print_tree(&file, &target, 0, &mut HashSet::new());
    Ok(())
}

/// Print the dependency tree; repeated subtrees are elided with `...`
fn print_tree(file: &File, name: &str, depth: usize, printed: &mut HashSet<String>) {
    let indent = "  ".repeat(depth);
    let Some(task) = file.tasks.get(name) else {
        return;
    };
    let deps = file.expand_list(&task.deps);

    if !printed.insert(name.to_string()) && !deps.is_empty() {
        println!("{}{} ...", indent, name);
        return;
    }
    println!("{}{}", indent, name);
    for dep in deps {
        print_tree(file, &dep, depth + 1, printed);
    }
}

const STARTER: &str = r#"default: build

vars:
  APP_NAME: app
  VERSION: "${VERSION:-dev}"
  RELEASE_FLAGS: --release

tasks:
  gen:
    desc: Generate sources
    cmds:
      - echo generating

  build:
    desc: Build the project binary
    deps: [gen]
    inputs: ["src/**/*.rs", "Cargo.toml"]
    outputs: ["target/debug/${APP_NAME}"]
    cmds:
      - cargo build

  test:
    desc: Run the test suite
    deps: [build]
    cmds:
      - cargo test

  release:
    desc: Build an optimized binary
    deps: [test]
    outputs: ["target/release/${APP_NAME}"]
    cmds:
      - cargo build ${RELEASE_FLAGS}
"#;

fn cmd_init(matches: &ArgMatches) -> Result<()> {
    let path = match matches.get_one::<String>("file") {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from("remake.yml"),
    };
    let force = matches.get_flag("force");

    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force)",
            path.display()
        ))
        .into());
    }

    std::fs::write(&path, STARTER)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_doctor(matches: &ArgMatches) -> Result<()> {
    let path = match matches.get_one::<String>("file") {
        Some(p) => PathBuf::from(p),
        None => config::find_config_file()
            .unwrap_or_else(|_| PathBuf::from(config::CONFIG_FILE_NAMES[0])),
    };

    let report = doctor::run(crate::VERSION, &path);
    for check in &report.checks {
        let tag = match check.severity {
            Severity::Ok => "  ok".green(),
            Severity::Warn => "warn".yellow(),
            Severity::Fail => "FAIL".red(),
        };
        println!("{} {:<10} {}", tag, check.name, check.detail);
    }

    let (ok, warn, fail) = report.counts();
    println!("{} ok, {} warnings, {} failures", ok, warn, fail);
    if fail > 0 {
        process::exit(1);
    }
    Ok(())
}

fn cmd_fmt(matches: &ArgMatches) -> Result<()> {
    let path = config_path(matches)?;
    let file = config::load_file(&path)?;
    let canonical = config::format::render(&file)?;

    let current = std::fs::read_to_string(&path)?;
    if matches.get_flag("check") {
        if current != canonical {
            eprintln!("{} is not in canonical form", path.display());
            process::exit(1);
        }
        return Ok(());
    }

    if current != canonical {
        std::fs::write(&path, canonical)?;
        println!("Rewrote {}", path.display());
    }
    Ok(())
}

fn cmd_completions(matches: &ArgMatches) -> Result<()> {
    let Some(shell) = matches.get_one::<Shell>("shell").copied() else {
        return Err(ConfigError::Invalid("missing shell argument".to_string()).into());
    };
    let mut cli = build_cli();
    clap_complete::generate(shell, &mut cli, "remake", &mut io::stdout());
    Ok(())
}
