//! cite - command-line front end for quarto-citation-sync

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use quarto_citation_sync::AggregateKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{DocArgs, GlobalArgs};

#[derive(Parser)]
#[command(name = "cite")]
#[command(version)]
#[command(about = "Insert and refresh citations backed by a citation service", long_about = None)]
struct Cli {
    /// Citation service URL (overrides the settings file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Path to the settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DocOptions {
    /// Document snapshot (JSON); created if it does not exist
    #[arg(long)]
    doc: PathBuf,

    /// Title for a newly created document
    #[arg(long)]
    title: Option<String>,
}

impl From<DocOptions> for DocArgs {
    fn from(opts: DocOptions) -> Self {
        DocArgs {
            path: opts.doc,
            title: opts.title,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the citation service is reachable
    Health,

    /// Show or change client settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List citation styles
    Styles,

    /// Search sources
    Search {
        /// Search text
        query: String,

        /// Maximum number of results (1-100)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Insert a citation at the document's selection
    Insert {
        #[command(flatten)]
        doc: DocOptions,

        /// Source to cite
        source_id: String,

        /// Pinpoint locator, e.g. "p. 12"
        #[arg(long)]
        locator: Option<String>,

        /// Note type passed to the service (e.g. footnote)
        #[arg(long)]
        note_type: Option<String>,
    },

    /// Re-render every citation in the document
    Refresh {
        #[command(flatten)]
        doc: DocOptions,
    },

    /// Create or update the bibliography
    Bibliography {
        #[command(flatten)]
        doc: DocOptions,
    },

    /// Create or update the list of primary sources
    Sources {
        #[command(flatten)]
        doc: DocOptions,
    },

    /// Check the document's citations against the service
    Validate {
        #[command(flatten)]
        doc: DocOptions,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective settings
    Show,

    /// Set and persist the citation service URL
    SetServer {
        /// Base URL, e.g. http://localhost:8000
        url: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarto_citation_client=info,quarto_citation_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let global = GlobalArgs {
        server: cli.server,
        settings: cli.settings,
    };

    match cli.command {
        Commands::Health => commands::health::execute(global),
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show(global),
            ConfigCommands::SetServer { url } => commands::config::set_server(global, url),
        },
        Commands::Styles => commands::styles::execute(global),
        Commands::Search { query, limit } => commands::search::execute(global, query, limit),
        Commands::Insert {
            doc,
            source_id,
            locator,
            note_type,
        } => commands::insert::execute(
            global,
            commands::insert::InsertArgs {
                doc: doc.into(),
                source_id,
                locator,
                note_type,
            },
        ),
        Commands::Refresh { doc } => commands::refresh::execute(global, doc.into()),
        Commands::Bibliography { doc } => {
            commands::aggregate::execute(global, doc.into(), AggregateKind::Bibliography)
        }
        Commands::Sources { doc } => {
            commands::aggregate::execute(global, doc.into(), AggregateKind::SourcesList)
        }
        Commands::Validate { doc } => commands::validate::execute(global, doc.into()),
    }
}
