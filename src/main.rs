use std::path::PathBuf;

use clap::{Parser, Subcommand};

use studybuddy::cli::{self, GlobalArgs};
use studybuddy::utils;

#[derive(Parser)]
#[command(name = "studybuddy")]
#[command(about = "StudyBuddy AI - Ask questions about your PDFs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive terminal UI (default)
    Tui {
        /// PDF files to add to the upload list
        files: Vec<PathBuf>,
    },

    /// Process PDFs and answer a single question
    Ask {
        /// PDF file to process (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Question to answer
        #[arg(short, long)]
        question: String,
    },

    /// Process PDFs and show the passages retrieved for a query
    Search {
        /// PDF file to process (repeatable)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Query text; the number of results follows --top-k
        #[arg(short, long)]
        query: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Tui { files: Vec::new() }) {
        Commands::Tui { files } => {
            let log_path = utils::init_file_logging()?;
            tracing::info!("StudyBuddy TUI started, logging to {:?}", log_path);
            cli::tui(&cli.global, files)?;
        }

        Commands::Ask { files, question } => {
            utils::init_stderr_logging();
            cli::ask(&cli.global, files, question)?;
        }

        Commands::Search { files, query } => {
            utils::init_stderr_logging();
            cli::search(&cli.global, files, query)?;
        }
    }

    Ok(())
}
