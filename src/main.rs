mod agent;
mod config;
mod llm;
mod prompts;
mod splitter;
mod tools;
mod types;
mod update;
mod vfs;

use crate::agent::WriteAgent;
use crate::llm::OpenAiClient;
use crate::types::WriteAgentUpdate;
use crate::update::ChannelSink;
use crate::vfs::{FileStore, Vfs};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "write-assistant")]
#[command(about = "Agentic document workspace: a write agent over a per-workspace virtual file system")]
struct Cli {
    /// Directory holding workspace state (defaults to the user data dir)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the write agent against a workspace
    Run {
        /// Workspace identifier
        #[arg(long)]
        workspace: String,
        /// Path to a markdown task list
        #[arg(long)]
        tasks: PathBuf,
        /// Context documents to inline into the prompt, as name=path pairs
        #[arg(long = "context", value_parser = parse_context_arg)]
        context: Vec<(String, PathBuf)>,
        /// Model name passed to the completion endpoint
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,
        /// OpenAI-compatible API base URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Export a workspace as a zip archive
    Export {
        #[arg(long)]
        workspace: String,
        /// Output file path
        #[arg(long)]
        output: PathBuf,
    },
    /// List the children of a workspace folder
    Ls {
        #[arg(long)]
        workspace: String,
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a document
    Cat {
        #[arg(long)]
        workspace: String,
        path: String,
    },
    /// Delete all content in a workspace
    Reset {
        #[arg(long)]
        workspace: String,
    },
}

fn parse_context_arg(s: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=path, got '{}'", s))?;
    Ok((name.to_string(), PathBuf::from(path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let state_dir = match cli.state_dir {
        Some(dir) => dir,
        None => config::default_state_dir()?,
    };
    let vfs = Vfs::new(Arc::new(FileStore::new(state_dir)?));

    match cli.command {
        Commands::Run {
            workspace,
            tasks,
            context,
            model,
            base_url,
        } => {
            let task_list = std::fs::read_to_string(&tasks)?;
            let mut context_documents = HashMap::new();
            for (name, path) in context {
                context_documents.insert(name, std::fs::read_to_string(&path)?);
            }

            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
            let mut provider = OpenAiClient::new(api_key, model);
            if let Some(base_url) = base_url {
                provider = provider.with_base_url(base_url);
            }

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(update) = rx.recv().await {
                    match update {
                        WriteAgentUpdate::Status(message) => println!("{}", message),
                        WriteAgentUpdate::Error(message) => eprintln!("error: {}", message),
                        WriteAgentUpdate::FileSystemChanged => println!("(workspace changed)"),
                        WriteAgentUpdate::TodoCompleted(item) => println!("done: {}", item),
                    }
                }
            });

            let mut agent = WriteAgent::new(
                Box::new(provider),
                vfs,
                workspace,
                task_list,
                context_documents,
                Box::new(ChannelSink::new(tx)),
            );
            agent.start().await;

            // Close the channel so the printer drains and exits
            drop(agent);
            printer.await?;
        }

        Commands::Export { workspace, output } => {
            let bytes = vfs.export_archive(&workspace)?;
            std::fs::write(&output, bytes)?;
            println!("Exported workspace {} to {}", workspace, output.display());
        }

        Commands::Ls { workspace, path } => match vfs.list(&workspace, &path)? {
            Some(mut names) => {
                names.sort();
                for name in names {
                    println!("{}", name);
                }
            }
            None => anyhow::bail!("{} is not a folder in workspace {}", path, workspace),
        },

        Commands::Cat { workspace, path } => match vfs.read(&workspace, &path)? {
            Some(content) => print!("{}", content),
            None => anyhow::bail!("{} not found or is a folder in workspace {}", path, workspace),
        },

        Commands::Reset { workspace } => {
            vfs.delete_all(&workspace)?;
            println!("Workspace {} reset", workspace);
        }
    }

    Ok(())
}
