//! Terminal rendering of workflow events and snapshots.

use client_core::{GenerationPhase, WorkflowEvent, WorkflowSnapshot};
use shared::domain::DocumentId;

pub const PROCESSING_LINE: &str = "Processing...";

/// Text printed for an event; `None` for events the shell stays quiet about.
pub fn render_event(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::StatusChanged(status) if status.is_empty() => None,
        WorkflowEvent::StatusChanged(status) => Some(format!("status: {status}")),
        WorkflowEvent::SelectionChanged(Some(filename)) => Some(format!("selected: {filename}")),
        WorkflowEvent::SelectionChanged(None) => None,
        WorkflowEvent::DocumentsUpdated(documents) => Some(render_documents(documents)),
        WorkflowEvent::BusyChanged(true) => Some(PROCESSING_LINE.to_string()),
        WorkflowEvent::BusyChanged(false) => None,
        WorkflowEvent::GenerationStarted { .. } => None,
        WorkflowEvent::GenerationCompleted { document, result } => {
            Some(render_result(document, result))
        }
        WorkflowEvent::GenerationFailed { document, reason } => {
            tracing::debug!(%document, "generation failure detail: {reason}");
            None
        }
    }
}

pub fn render_documents(documents: &[DocumentId]) -> String {
    if documents.is_empty() {
        return "uploaded files: (none)".to_string();
    }
    let mut out = String::from("uploaded files:");
    for (index, document) in documents.iter().enumerate() {
        out.push_str(&format!("\n  {}. {document}", index + 1));
    }
    out
}

pub fn render_result(document: &DocumentId, result: &str) -> String {
    format!("extracted arguments for {document}:\n{result}")
}

pub fn render_snapshot(snapshot: &WorkflowSnapshot) -> String {
    let selected = snapshot
        .selected_file
        .as_ref()
        .map(|file| format!("{} ({} bytes)", file.filename(), file.len()))
        .unwrap_or_else(|| "(none)".to_string());
    let phase = match snapshot.phase() {
        GenerationPhase::Idle => "idle",
        GenerationPhase::Generating => "generating",
    };
    let result = if snapshot.generation_result.is_some() {
        "available"
    } else {
        "(none)"
    };
    format!(
        "selected: {selected}\nstatus: {}\ndocuments: {}\ngeneration: {phase}\nresult: {result}",
        if snapshot.status.is_empty() {
            "(none)"
        } else {
            snapshot.status.as_str()
        },
        snapshot.documents.len(),
    )
}
