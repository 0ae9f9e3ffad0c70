use crate::chat::ImageResult;
use crate::ontology::OntologyGraph;
use std::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    ImageAnalysis,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    ChatReplied {
        reply: String,
        gallery: Vec<ImageResult>,
    },
    ImageAnalyzed(String),
    RequestFailed {
        kind: RequestKind,
        message: String,
    },
    OntologyLoaded(OntologyGraph),
    OntologyFailed(String),
}

/// Sender half of the UI event channel. Every send wakes the UI so the event
/// is drained on the next frame.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<AppEvent>,
    ctx: egui::Context,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<AppEvent>, ctx: egui::Context) -> Self {
        Self { tx, ctx }
    }

    pub fn send(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event dropped, UI receiver is gone");
        }
        self.ctx.request_repaint();
    }
}
