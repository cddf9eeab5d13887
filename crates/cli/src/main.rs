// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use console::style;
use pagemark_catalog::source_from_config;
use pagemark_config::{Config, ConfigManager};
use pagemark_library::{JsonFileStore, Library, LibraryOptions};
use std::path::PathBuf;

mod commands;
mod reading;

fn book_id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_name("BOOK_ID")
        .help("Book ID or a unique prefix of it")
}

fn force_arg() -> Arg {
    Arg::new("force")
        .short('f')
        .long("force")
        .help("Skip confirmation prompt")
        .action(ArgAction::SetTrue)
}

pub(crate) fn build_cli() -> Command {
    Command::new("pagemark")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Track the books you read: pages, progress and reading time")
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .value_name("FILE")
                .help("Path to the library data file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("add")
                .about("Look up a book by ISBN and add it to the library")
                .arg(Arg::new("isbn").required(true).value_name("ISBN").help("ISBN-10 or ISBN-13, hyphens allowed")),
        )
        .subcommand(
            Command::new("list")
                .about("List all books in the library")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the entries as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Show detailed information about a book")
                .arg(book_id_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a book from the library")
                .arg(book_id_arg())
                .arg(force_arg()),
        )
        .subcommand(
            Command::new("page")
                .about("Set the current page of a book")
                .arg(book_id_arg())
                .arg(
                    Arg::new("page")
                        .required(true)
                        .value_name("PAGE")
                        .help("Page number; clamped to the book's page count")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true),
                ),
        )
        .subcommand(
            Command::new("read")
                .about("Time a reading session; press Enter to stop")
                .arg(book_id_arg()),
        )
        .subcommand(
            Command::new("reset")
                .about("Reset the reading time of a book to zero")
                .arg(book_id_arg())
                .arg(force_arg()),
        )
        .subcommand(Command::new("stats").about("Show library statistics"))
        .subcommand(
            Command::new("export")
                .about("Export library data as JSON")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output file path")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("pagemark_export.json"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config and data file locations")),
        )
}

fn init_logging(config: &Config) {
    let default_filter = config.app.log_level.as_str();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<PathBuf>("config-dir") {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate the configuration directory")
}

fn open_library(config: &Config, data_path: PathBuf) -> Result<Library<JsonFileStore>> {
    let catalog =
        source_from_config(&config.catalog).context("Failed to set up the catalog client")?;
    let options = LibraryOptions {
        tick_interval: config.timer.tick_interval(),
        ..LibraryOptions::default()
    };

    let mut library = Library::with_options(JsonFileStore::new(data_path), catalog, options);
    library.load_books().context("Failed to load the library")?;
    Ok(library)
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let manager = config_manager(matches)?;
    let (config, problems) = match manager.load_with_env_overrides() {
        Ok((config, replaced)) => {
            let problems = replaced
                .iter()
                .map(|e| format!("Config {}, using the default", e))
                .collect();
            (config, problems)
        }
        Err(e) => (
            Config::default(),
            vec![format!("Failed to load config: {}, using defaults", e)],
        ),
    };

    init_logging(&config);
    for problem in &problems {
        log::warn!("{}", problem);
    }

    let data_path = matches
        .get_one::<PathBuf>("data")
        .cloned()
        .unwrap_or_else(|| manager.resolve_data_file(&config));
    let confirm = config.app.confirm_destructive;

    let Some((name, sub_matches)) = matches.subcommand() else {
        build_cli().print_help()?;
        return Ok(());
    };

    if name == "config" {
        return commands::config_command(&manager, &config, &data_path, sub_matches);
    }

    let mut library = open_library(&config, data_path)?;

    match name {
        "add" => commands::add_book(&mut library, sub_matches).await,
        "list" => commands::list_books(&library, sub_matches),
        "info" => commands::show_book_info(&library, sub_matches),
        "remove" => commands::remove_book(&mut library, sub_matches, confirm),
        "page" => commands::set_page(&mut library, sub_matches),
        "read" => commands::read_book(&mut library, sub_matches),
        "reset" => commands::reset_reading_time(&mut library, sub_matches, confirm),
        "stats" => commands::show_stats(&library),
        "export" => commands::export_library(&library, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = run(&matches).await {
        eprintln!("{} {}", style("✗").red().bold(), commands::describe_error(&e));
        std::process::exit(1);
    }
}
