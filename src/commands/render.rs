//! Terminal output: toasts and the item list.

use clap::ValueEnum;

use itemsync::{Config, Item, Notice, NoticeSink};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints notices as timestamped one-liners. Failures go to stderr.
#[derive(Default)]
pub struct ToastPrinter;

impl NoticeSink for ToastPrinter {
    fn notify(&mut self, notice: Notice) {
        let time = chrono::Local::now().format("%H:%M:%S");
        if notice.is_error() {
            eprintln!("[{}] {}", time, notice);
        } else {
            println!("[{}] {}", time, notice);
        }
    }
}

/// Full listing with ids, for `list`.
pub fn print_table(items: &[Item], format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No items found");
                return Ok(());
            }
            println!("{:<12}  NAME", "ID");
            println!("{}", "-".repeat(40));
            for item in items {
                println!("{:<12}  {}", item.id, item.name);
            }
            println!("\nTotal: {} item(s)", items.len());
        }
    }
    Ok(())
}

/// The list screen: one numbered row per item, label only.
pub fn print_screen(items: &[Item]) {
    println!();
    println!("Items");
    println!("=====");
    if items.is_empty() {
        println!("  (empty)");
    }
    for (position, item) in items.iter().enumerate() {
        println!("  {:>3}. {}", position + 1, item);
    }
    println!();
}

/// `(key, value, source)` for each setting, in display order.
fn config_rows(config: &Config) -> [(&'static str, &str, String); 2] {
    [
        (
            "server_url",
            config.server_url.value.as_str(),
            config.server_url.source.to_string(),
        ),
        (
            "collection",
            config.collection.value.as_str(),
            config.collection.source.to_string(),
        ),
    ]
}

/// Effective settings for `config show`.
pub fn print_config(config: &Config, format: OutputFormat) -> Result<(), serde_json::Error> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        ),
    }
    println!();
    println!("{:<12}  {:<32}  SOURCE", "KEY", "VALUE");
    for (key, value, source) in config_rows(config) {
        println!("{:<12}  {:<32}  {}", key, value, source);
    }
    Ok(())
}
