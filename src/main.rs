use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing::{warn, Level};
use xql::ast::{check_query, AdapterRegistry, DSLAdapter, FormatOptions};
use xql::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// SQL, pretty-printed unless disabled in the config
    Sql,
    /// Single-line SQL
    Compact,
    /// Normalized builder text
    Text,
}

/// Compile XQL builder text to SQL
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// File containing builder text (reads stdin when omitted)
    file: Option<PathBuf>,

    /// What to print
    #[arg(long, value_enum, default_value_t = Emit::Sql)]
    emit: Emit,

    /// Also run the SQL syntax check on the result
    #[arg(long)]
    check: bool,

    /// Spaces per indentation level (overrides the config file)
    #[arg(long)]
    indent: Option<usize>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries the rendered output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable config file");
        Config::default()
    });
    let options = match cli.indent {
        Some(indent) => FormatOptions::with_indent(indent),
        None => config.format.options(),
    };

    let (source_name, text) = match cli.file {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (path.display().to_string(), text)
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            ("<stdin>".to_string(), text)
        }
    };

    let registry = AdapterRegistry::new();
    let adapter = select_adapter(&registry, cli.file.as_ref())?;
    let query = adapter
        .compile_to_ast(&text)
        .with_context(|| format!("failed to evaluate {}", source_name))?;

    if cli.check {
        check_query(&query).context("generated SQL failed the syntax check")?;
    }

    let output = match cli.emit {
        Emit::Sql if config.format.pretty => query.to_sql_with(&options),
        Emit::Sql | Emit::Compact => query.to_compact_sql(),
        Emit::Text => query.to_text_with(&options),
    };
    println!("{}", output);

    Ok(())
}

fn select_adapter<'a>(
    registry: &'a AdapterRegistry,
    file: Option<&PathBuf>,
) -> Result<&'a dyn DSLAdapter> {
    let by_extension = file
        .and_then(|path| path.extension())
        .and_then(|ext| ext.to_str())
        .and_then(|ext| registry.for_extension(ext));
    by_extension
        .or_else(|| registry.default_adapter())
        .context("no input language adapter registered")
}
