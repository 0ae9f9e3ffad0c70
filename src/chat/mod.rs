use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod status;

pub const GREETING: &str = "Hi! I'm Bella. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl MessageId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bella,
}

impl Sender {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Bella => "Bella",
        }
    }
}

/// Image attached by the user. Bytes are shared so the transcript and the
/// in-flight request can hold the same buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let media_type = media_type_for(&file_name).to_string();
        Self {
            file_name,
            media_type,
            bytes: Arc::from(bytes),
        }
    }
}

fn media_type_for(file_name: &str) -> &'static str {
    let lowered = file_name.to_ascii_lowercase();
    if lowered.ends_with(".png") {
        "image/png"
    } else if lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

/// One hit from the backend's image search, shown as a gallery entry under a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub similarity_score: f64,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub image: Option<ImagePayload>,
    pub gallery: Vec<ImageResult>,
}

/// Append-only, arrival-ordered message thread for the current session.
#[derive(Debug)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        let mut transcript = Self {
            messages: Vec::new(),
            next_id: 0,
        };
        transcript.push_bella(GREETING, Vec::new());
        transcript
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push_user(&mut self, text: impl Into<String>, image: Option<ImagePayload>) -> MessageId {
        self.push(Sender::User, text.into(), image, Vec::new())
    }

    pub fn push_bella(&mut self, text: impl Into<String>, gallery: Vec<ImageResult>) -> MessageId {
        self.push(Sender::Bella, text.into(), None, gallery)
    }

    fn push(
        &mut self,
        sender: Sender,
        text: String,
        image: Option<ImagePayload>,
        gallery: Vec<ImageResult>,
    ) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            text,
            sender,
            image,
            gallery,
        });
        id
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
