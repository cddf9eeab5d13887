// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use console::style;
use pagemark_config::{Config, ConfigManager};
use pagemark_core::{format_clock, BookId};
use pagemark_library::{BookStore, BookView, Library, LibraryError};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};


/// Look up a book and add it to the library
pub async fn add_book<S: BookStore>(library: &mut Library<S>, matches: &ArgMatches) -> Result<()> {
    let isbn = required(matches, "isbn")?;

    let book = library
        .add_book(isbn)
        .await
        .with_context(|| format!("Failed to add {}", isbn))?;
    let view = BookView::from(book);

    println!("{} Book added!", style("✓").green().bold());
    print_book_summary(&view);

    Ok(())
}

/// List all books in the library
pub fn list_books<S: BookStore>(library: &Library<S>, matches: &ArgMatches) -> Result<()> {
    let views = library.snapshot();

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&views).context("Failed to serialize books")?;
        println!("{}", json);
        return Ok(());
    }

    if views.is_empty() {
        println!("No books in library. Use 'add <ISBN>' to add one.");
        return Ok(());
    }

    println!("\n{} Books in Library", style(views.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for view in &views {
        print_book_summary(view);
    }

    Ok(())
}

/// Show detailed information about a book
pub fn show_book_info<S: BookStore>(library: &Library<S>, matches: &ArgMatches) -> Result<()> {
    let book = library.find_by_prefix(required(matches, "id")?)?;
    let view = BookView::from(book);

    println!("\n{}", style("Book Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", view.id);
    println!("ISBN: {}", view.isbn);
    println!("Title: {}", style(&view.title).bold());
    if !view.author.is_empty() {
        println!("Author: {}", view.author);
    }
    if let Some(publisher) = &view.publisher {
        println!("Publisher: {}", publisher);
    }
    if let Some(published) = &view.published {
        println!("Published: {}", published);
    }
    println!("Cover: {}", view.cover_display());

    println!("\nProgress:");
    println!("  Page: {}", page_display(&view));
    println!("  {}", progress_bar(view.progress_percent, 40));
    println!("  Reading Time: {}", view.reading_time_display);
    if view.is_completed {
        println!("  {}", style("✓ Finished").green());
    }

    Ok(())
}

/// Remove a book from the library
pub fn remove_book<S: BookStore>(
    library: &mut Library<S>,
    matches: &ArgMatches,
    confirm_destructive: bool,
) -> Result<()> {
    let (id, title) = resolve(library, matches)?;

    if confirm_destructive && !matches.get_flag("force") {
        let prompt = format!("Are you sure you want to remove '{}'?", title);
        if !confirm(&prompt, &mut io::stdin().lock())? {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    library
        .remove_book(&id)
        .context("Failed to remove book")?;

    println!("{} Book removed: {}", style("✓").green().bold(), title);

    Ok(())
}

/// Set the reading position of a book
pub fn set_page<S: BookStore>(library: &mut Library<S>, matches: &ArgMatches) -> Result<()> {
    let (id, title) = resolve(library, matches)?;
    let page = matches
        .get_one::<i64>("page")
        .copied()
        .ok_or_else(|| anyhow!("Page is required"))?;

    library
        .set_current_page(&id, page)
        .context("Failed to update page")?;

    let view = library
        .get(&id)
        .map(BookView::from)
        .ok_or_else(|| anyhow!("Book disappeared after update"))?;

    println!("{} {}: page {}", style("✓").green().bold(), title, page_display(&view));
    if view.is_completed {
        println!("{}", style("Finished! ✓").green().bold());
    }

    Ok(())
}

/// Run an interactive reading session
pub fn read_book<S: BookStore>(library: &mut Library<S>, matches: &ArgMatches) -> Result<()> {
    let (id, title) = resolve(library, matches)?;

    println!("\n{} {}", style("▶").green().bold(), style(&title).bold());
    println!("Reading timer running. Press Enter to stop.\n");

    let total = crate::reading::run_session(library, &id)?;

    println!(
        "{} Session saved. Total reading time: {}",
        style("✓").green().bold(),
        format_clock(total)
    );

    Ok(())
}

/// Reset the reading time of a book
pub fn reset_reading_time<S: BookStore>(
    library: &mut Library<S>,
    matches: &ArgMatches,
    confirm_destructive: bool,
) -> Result<()> {
    let (id, title) = resolve(library, matches)?;

    if confirm_destructive && !matches.get_flag("force") {
        let prompt = format!("Reset the reading time of '{}'?", title);
        if !confirm(&prompt, &mut io::stdin().lock())? {
            println!("Reset cancelled.");
            return Ok(());
        }
    }

    library
        .reset_timer(&id)
        .context("Failed to reset reading time")?;

    println!("{} Reading time reset: {}", style("✓").green().bold(), title);

    Ok(())
}

/// Show library statistics
pub fn show_stats<S: BookStore>(library: &Library<S>) -> Result<()> {
    let stats = library.stats();

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Total Books: {}", style(stats.total_books).bold());
    println!("Finished: {}", style(stats.completed_books).bold());
    println!("In Progress: {}", style(stats.in_progress_books()).bold());
    println!("Pages Read: {} / {}", stats.pages_read, stats.total_pages);
    println!(
        "Total Reading Time: {} ({})",
        format_duration(stats.total_reading_time),
        stats.total_reading_time_display()
    );
    println!(
        "Average Reading Time: {}",
        format_duration(stats.average_reading_time())
    );

    Ok(())
}

/// Export library data in its stored JSON shape
pub fn export_library<S: BookStore>(library: &Library<S>, matches: &ArgMatches) -> Result<()> {
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("pagemark_export.json"));

    let records: Vec<_> = library.books().iter().map(|b| b.to_stored()).collect();
    let json = serde_json::to_string_pretty(&records).context("Failed to serialize to JSON")?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write export file {}", output.display()))?;

    println!(
        "{} Exported {} books to {}",
        style("✓").green().bold(),
        records.len(),
        output.display()
    );

    Ok(())
}

/// Handle `config init|show|path`
pub fn config_command(
    manager: &ConfigManager,
    config: &Config,
    data_path: &Path,
    matches: &ArgMatches,
) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            let created = manager
                .initialize()
                .context("Failed to write default config")?;
            if created {
                println!(
                    "{} Created {}",
                    style("✓").green().bold(),
                    manager.config_path().display()
                );
            } else {
                println!("Config already exists at {}", manager.config_path().display());
            }
        }
        Some(("show", _)) => {
            let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
            print!("{}", rendered);
        }
        Some(("path", _)) => {
            println!("Config: {}", manager.config_path().display());
            println!("Data:   {}", data_path.display());
        }
        _ => return Err(anyhow!("Unknown config command")),
    }

    Ok(())
}

/// Message shown for a failed command
pub fn describe_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<LibraryError>() {
        Some(library_error) => library_error.user_message(),
        None => format!("{:#}", error),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("Argument <{}> is required", name))
}

fn resolve<S: BookStore>(library: &Library<S>, matches: &ArgMatches) -> Result<(BookId, String)> {
    let book = library.find_by_prefix(required(matches, "id")?)?;
    Ok((book.id().clone(), book.title().to_string()))
}

/// Asks a yes/no question; anything but `y` or `yes` declines
fn confirm<R: BufRead>(prompt: &str, input: &mut R) -> Result<bool> {
    print!("{} (y/N) ", prompt);
    io::stdout().flush().context("Failed to write prompt")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read input")?;

    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn print_book_summary(view: &BookView) {
    println!("\n{}", style(&view.title).bold());
    if !view.author.is_empty() {
        println!("  by {}", view.author);
    }
    println!(
        "  ID: {} | ISBN: {} | Page: {} | Time: {}",
        truncate(&view.id, 8),
        view.isbn,
        page_display(view),
        view.reading_time_display
    );
    print!("  {}", progress_bar(view.progress_percent, 30));
    if view.is_completed {
        print!("  {}", style("✓ Finished").green());
    }
    println!();
}

fn page_display(view: &BookView) -> String {
    if view.total_pages == 0 {
        format!("{} / ?", view.current_page)
    } else {
        format!(
            "{} / {} ({}%)",
            view.current_page, view.total_pages, view.progress_percent
        )
    }
}

fn progress_bar(percent: u8, width: usize) -> String {
    let percent = usize::from(percent.min(100));
    let filled = (percent * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
