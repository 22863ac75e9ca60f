//! xmldb CLI
//!
//! Command-line tools for xmldb XML document databases.
//!
//! # Commands
//!
//! - `size` - Print the number of documents
//! - `get` - Print a document
//! - `put` / `put-xml` - Store documents from files or inline
//! - `remove` - Delete documents
//! - `list` - List every document
//! - `query` - List documents matching an XPath expression
//! - `merge` - Copy documents from another database

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// xmldb command-line database tools.
#[derive(Parser)]
#[command(name = "xmldb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the number of documents
    Size,

    /// Print the content of a document
    Get {
        /// Document name
        name: String,
    },

    /// Store XML files; each document is named by its path
    Put {
        /// Files to store
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Replace documents that already exist
        #[arg(short, long)]
        replace: bool,
    },

    /// Store an inline XML document
    PutXml {
        /// Document name
        name: String,

        /// XML content
        content: String,

        /// Replace the document if it already exists
        #[arg(short, long)]
        replace: bool,
    },

    /// Delete documents
    Remove {
        /// Document names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List every document
    List {
        /// Include document content
        #[arg(short, long)]
        content: bool,
    },

    /// List documents matching an XPath expression, e.g. "//book[@lang = 'en']"
    Query {
        /// Expression appended to collection('xmldb')
        expr: String,

        /// Include document content
        #[arg(short, long)]
        content: bool,
    },

    /// Copy every document from another database
    Merge {
        /// Path of the source database
        source: PathBuf,

        /// Replace documents that already exist
        #[arg(short, long)]
        replace: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("xmldb CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("xmldb native v{}", xmldb::native_version());
        return Ok(());
    }

    let path = cli.path.ok_or("Database path required (--path)")?;
    let db = commands::open(&path)?;
    let format = cli.format;

    match cli.command {
        Commands::Size => commands::documents::size(&db, format)?,
        Commands::Get { name } => commands::documents::get(&db, &name, format)?,
        Commands::Put { files, replace } => commands::documents::put(&db, &files, replace, format)?,
        Commands::PutXml {
            name,
            content,
            replace,
        } => commands::documents::put_xml(&db, &name, &content, replace, format)?,
        Commands::Remove { names } => commands::documents::remove(&db, &names, format)?,
        Commands::List { content } => commands::listing::list(&db, content, format)?,
        Commands::Query { expr, content } => commands::listing::query(&db, &expr, content, format)?,
        Commands::Merge { source, replace } => commands::merge::run(&db, &source, replace, format)?,
        Commands::Version => {}
    }

    db.close();
    Ok(())
}
