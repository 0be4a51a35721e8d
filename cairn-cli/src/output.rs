//! Styled terminal output utilities.

use cairn_migrate::{MigrationState, TerseMigration};
use owo_colors::OwoColorize;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a step indicator
pub fn step(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text to stderr
pub fn dim_err(text: &str) {
    eprintln!("{}", text.dimmed());
}

/// Style a migration state
pub fn style_state(state: MigrationState) -> String {
    match state {
        MigrationState::Applied => state.to_string().green().to_string(),
        MigrationState::Pending => state.to_string().yellow().to_string(),
        MigrationState::Missing => state.to_string().red().to_string(),
    }
}

/// Print reconciled migrations as an aligned table
pub fn migration_table(migrations: &[TerseMigration]) {
    let rows: Vec<[String; 5]> = migrations
        .iter()
        .map(|m| {
            [
                m.migration_type.to_string(),
                m.version.clone().unwrap_or_default(),
                m.description.clone(),
                m.installed_on
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                m.state.to_string(),
            ]
        })
        .collect();

    let headers = ["Type", "Version", "Description", "Installed on", "State"];
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header_line = headers
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{:<w$}", h, w = w))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header_line.bold());

    for (row, migration) in rows.iter().zip(migrations) {
        let state_padding = " ".repeat(widths[4].saturating_sub(row[4].chars().count()));
        println!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  {}{}",
            row[0],
            row[1],
            row[2],
            row[3],
            style_state(migration.state),
            state_padding,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
    }
}
