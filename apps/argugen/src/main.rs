use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpDocumentService, UploadOutcome, WorkflowController};
use shared::domain::DocumentId;
use tracing_subscriber::EnvFilter;

mod config;
mod controller;

use config::load_settings;
use controller::{
    events::{render_documents, render_result},
    orchestration::{load_pdf, run_shell},
};

#[derive(Parser, Debug)]
#[command(about = "Upload research papers and generate their arguments")]
struct Args {
    /// Document service base URL; overrides argugen.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List uploaded documents.
    List,
    /// Upload a PDF, then list documents.
    Upload { path: PathBuf },
    /// Generate arguments for an uploaded document.
    Generate { filename: String },
    /// Show the raw leading lines extracted from an uploaded document.
    Extract { filename: String },
    /// Interactive session (default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let service =
        HttpDocumentService::with_timeout(&settings.server_url, settings.request_timeout())
            .context("failed to configure document service client")?;
    tracing::info!(server_url = service.server_url(), "using document service");
    let service = Arc::new(service);

    match args.command.unwrap_or(Command::Shell) {
        Command::List => {
            let controller = WorkflowController::new(service);
            let documents = controller
                .refresh_list()
                .await
                .context("failed to list documents")?;
            println!("{}", render_documents(&documents));
        }
        Command::Upload { path } => {
            let controller = WorkflowController::new(service);
            controller.select_file(load_pdf(&path).await?).await;
            match controller.upload().await.context("upload failed")? {
                UploadOutcome::Uploaded(response) => println!("{}", response.message),
                UploadOutcome::NoFileSelected => {
                    println!("{}", controller.snapshot().await.status)
                }
            }
            println!("{}", render_documents(&controller.snapshot().await.documents));
        }
        Command::Generate { filename } => {
            let controller = WorkflowController::new(service);
            let document = DocumentId::new(filename);
            let result = controller
                .generate(document.clone())
                .await
                .with_context(|| format!("failed to generate arguments for {document}"))?;
            println!("{}", render_result(&document, &result));
        }
        Command::Extract { filename } => {
            let controller = WorkflowController::new(service);
            let document = DocumentId::new(filename);
            let lines = controller
                .extract_arguments(&document)
                .await
                .with_context(|| format!("failed to extract lines from {document}"))?;
            for line in lines {
                println!("{line}");
            }
        }
        Command::Shell => {
            let controller = WorkflowController::mount(service).await;
            run_shell(controller).await?;
        }
    }

    Ok(())
}
