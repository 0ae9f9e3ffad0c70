use thiserror::Error;

pub const GENERIC_FAILURE: &str = "Network response was not ok.";

/// Failures of a round trip to the Bella backend. The `Display` text is what
/// ends up in the chat bubble.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to reach Bella: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("Unexpected response from Bella: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Sorry, I had trouble responding. Please try again.")]
    EmptyReply,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ontology(#[from] OntologyError),
}

#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("ontology document must be a JSON-LD array or an object with @graph")]
    Shape,

    #[error("invalid ontology JSON: {0}")]
    Json(#[from] serde_json::Error),
}
