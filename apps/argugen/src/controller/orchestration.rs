//! Routes shell commands onto the workflow controller.

use std::{path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use client_core::{SelectedFile, WorkflowController, WorkflowEvent};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::{JoinHandle, JoinSet},
};

use crate::controller::{
    commands::{parse_command, ShellCommand, HELP_TEXT},
    events::{render_documents, render_event, render_snapshot},
};

/// Reads `path` as an upload candidate, accepting PDFs only.
pub async fn load_pdf(path: &Path) -> Result<SelectedFile> {
    let file = SelectedFile::from_path(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    if !file.is_pdf() {
        bail!(
            "'{}' is not a PDF (detected {})",
            path.display(),
            file.mime_type()
        );
    }
    Ok(file)
}

/// What the shell loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies one command. Network operations run as background tasks in
/// `pending` so the shell keeps accepting input; their outcome arrives as
/// controller events.
pub async fn dispatch_shell_command(
    controller: &Arc<WorkflowController>,
    cmd: ShellCommand,
    pending: &mut JoinSet<()>,
) -> Flow {
    tracing::debug!(command = cmd.name(), "dispatching shell command");
    match cmd {
        ShellCommand::Select { path } => match load_pdf(&path).await {
            Ok(file) => controller.select_file(file).await,
            Err(err) => println!("{err:#}"),
        },
        ShellCommand::Upload => {
            let controller = controller.clone();
            pending.spawn(async move {
                let _ = controller.upload().await;
            });
        }
        ShellCommand::List => {
            let controller = controller.clone();
            pending.spawn(async move {
                let _ = controller.refresh_list().await;
            });
        }
        ShellCommand::Generate { document } => {
            let controller = controller.clone();
            pending.spawn(async move {
                let _ = controller.generate(document).await;
            });
        }
        ShellCommand::Extract { document } => {
            let controller = controller.clone();
            pending.spawn(async move {
                match controller.extract_arguments(&document).await {
                    Ok(lines) => println!("raw lines from {document}:\n{}", lines.join("\n")),
                    Err(err) => println!("extraction failed for {document}: {err}"),
                }
            });
        }
        ShellCommand::Status => {
            let snapshot = controller.snapshot().await;
            println!("{}", render_snapshot(&snapshot));
            println!("{}", render_documents(&snapshot.documents));
        }
        ShellCommand::Result => match controller.snapshot().await.generation_result {
            Some(result) => println!("{result}"),
            None => println!("no generated arguments yet"),
        },
        ShellCommand::Help => println!("{HELP_TEXT}"),
        ShellCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn spawn_event_printer(
    mut events: broadcast::Receiver<WorkflowEvent>,
    mut emit: impl FnMut(String) + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render_event(&event) {
                        emit(line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Waits for in-flight requests, then closes the event stream and lets the
/// printer drain every event those requests emitted.
///
/// `controller` must be the last handle outside `pending`; the printer only
/// stops once every sender is gone.
pub async fn finish_shell(
    controller: Arc<WorkflowController>,
    printer: JoinHandle<()>,
    mut pending: JoinSet<()>,
) {
    if !pending.is_empty() {
        println!("waiting for {} pending request(s)...", pending.len());
    }
    while pending.join_next().await.is_some() {}
    drop(controller);
    if let Err(err) = printer.await {
        tracing::warn!("event printer stopped abnormally: {err}");
    }
}

/// Runs the interactive shell until `quit` or end of input, then waits for
/// requests still in flight.
pub async fn run_shell(controller: Arc<WorkflowController>) -> Result<()> {
    let printer = spawn_event_printer(controller.subscribe_events(), |line| println!("{line}"));
    println!("{}", render_documents(&controller.snapshot().await.documents));
    println!("type 'help' for commands");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = JoinSet::new();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        // Reap finished tasks so the set does not grow for the whole session.
        while pending.try_join_next().is_some() {}

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(cmd)) => {
                if dispatch_shell_command(&controller, cmd, &mut pending).await == Flow::Quit {
                    break;
                }
            }
            Err(err) => println!("{err}"),
        }
    }

    finish_shell(controller, printer, pending).await;
    Ok(())
}
