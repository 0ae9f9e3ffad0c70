use crate::chat::ImagePayload;
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::event::{AppEvent, EventSink, RequestKind};
use crate::ontology::jsonld::{graph_from_document, parse_graph};
use crate::ontology::OntologyGraph;
use std::path::PathBuf;
use std::time::Instant;
use tokio::runtime::Handle;

pub mod api;

use api::{AnalyzeImageRequest, ChatRequest, ANALYZE_IMAGE_PATH, CHAT_PATH};

#[derive(Debug, Clone)]
enum OntologySource {
    Url(String),
    File(PathBuf),
}

/// Fire-and-forget front for the Bella HTTP API. Each call runs as its own
/// task and reports back through the event sink exactly once.
#[derive(Clone)]
pub struct BellaClient {
    http: reqwest::Client,
    chat_url: String,
    analyze_url: String,
    ontology: OntologySource,
    sink: EventSink,
    runtime_handle: Handle,
}

impl BellaClient {
    pub fn new(config: &AppConfig, sink: EventSink, runtime_handle: Handle) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("bella/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let ontology = match &config.ontology_file {
            Some(path) => OntologySource::File(path.clone()),
            None => OntologySource::Url(config.endpoint(&config.ontology_path)),
        };

        Ok(Self {
            http,
            chat_url: config.endpoint(CHAT_PATH),
            analyze_url: config.endpoint(ANALYZE_IMAGE_PATH),
            ontology,
            sink,
            runtime_handle,
        })
    }

    pub fn send_chat(&self, message: String, focused_entities: Vec<String>) {
        let http = self.http.clone();
        let url = self.chat_url.clone();
        let sink = self.sink.clone();
        let request = ChatRequest {
            message,
            focused_entities,
        };

        self.runtime_handle.spawn(async move {
            let started = Instant::now();
            let event = match api::post_chat(&http, &url, &request).await {
                Ok((reply, gallery)) => {
                    tracing::info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        gallery = gallery.len(),
                        "chat reply received"
                    );
                    AppEvent::ChatReplied { reply, gallery }
                }
                Err(err) => {
                    log_failure("chat request", &err);
                    AppEvent::RequestFailed {
                        kind: RequestKind::Chat,
                        message: err.to_string(),
                    }
                }
            };
            sink.send(event);
        });
    }

    pub fn analyze_image(&self, image: &ImagePayload, prompt: String) {
        let http = self.http.clone();
        let url = self.analyze_url.clone();
        let sink = self.sink.clone();
        let bytes = image.bytes.clone();
        let file_name = image.file_name.clone();

        self.runtime_handle.spawn(async move {
            let request = AnalyzeImageRequest::new(&bytes, prompt);
            let event = match api::post_analyze_image(&http, &url, &request).await {
                Ok(analysis) => {
                    tracing::info!(file = %file_name, "image analysis received");
                    AppEvent::ImageAnalyzed(analysis)
                }
                Err(err) => {
                    tracing::debug!(file = %file_name, "image analysis did not complete");
                    log_failure("image analysis", &err);
                    AppEvent::RequestFailed {
                        kind: RequestKind::ImageAnalysis,
                        message: err.to_string(),
                    }
                }
            };
            sink.send(event);
        });
    }

    pub fn load_ontology(&self) {
        let http = self.http.clone();
        let source = self.ontology.clone();
        let sink = self.sink.clone();

        self.runtime_handle.spawn(async move {
            let event = match fetch_ontology(&http, &source).await {
                Ok(graph) => {
                    tracing::info!(
                        nodes = graph.nodes.len(),
                        links = graph.links.len(),
                        "ontology loaded"
                    );
                    AppEvent::OntologyLoaded(graph)
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to load ontology");
                    AppEvent::OntologyFailed(err.to_string())
                }
            };
            sink.send(event);
        });
    }
}

fn log_failure(what: &str, err: &ClientError) {
    match err {
        ClientError::Status { status, detail } => {
            tracing::warn!(status, %detail, "{what} rejected by backend");
        }
        other => tracing::warn!(error = %other, "{what} failed"),
    }
}

async fn fetch_ontology(http: &reqwest::Client, source: &OntologySource) -> Result<OntologyGraph, ClientError> {
    match source {
        OntologySource::Url(url) => {
            let document = api::fetch_json(http, url).await?;
            Ok(graph_from_document(&document)?)
        }
        OntologySource::File(path) => {
            let raw = tokio::fs::read_to_string(path).await.map_err(|source| ClientError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Ok(parse_graph(&raw)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fetch_ontology, BellaClient, OntologySource};
    use crate::config::AppConfig;
    use crate::event::{AppEvent, EventSink, RequestKind};
    use serde_json::json;
    use std::sync::mpsc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ontology_document() -> serde_json::Value {
        json!([
            {
                "@id": "http://skypad.ai/ontology#HotelAurora",
                "@type": "http://skypad.ai/ontology#Project",
                "http://skypad.ai/ontology#designedBy": { "@id": "http://skypad.ai/ontology#JaneDoe" }
            },
            { "@id": "http://skypad.ai/ontology#JaneDoe", "@type": "http://skypad.ai/ontology#Designer" }
        ])
    }

    #[tokio::test]
    async fn fetches_ontology_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lattice/skypad_ontology_mvp.jsonld"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ontology_document()))
            .mount(&server)
            .await;

        let url = format!("{}/lattice/skypad_ontology_mvp.jsonld", server.uri());
        let graph = fetch_ontology(&reqwest::Client::new(), &OntologySource::Url(url))
            .await
            .expect("ontology should load");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links.len(), 1);
    }

    #[tokio::test]
    async fn reads_ontology_from_local_file() {
        let path = std::env::temp_dir().join(format!(
            "bella_ontology_{}.jsonld",
            std::process::id()
        ));
        std::fs::write(&path, ontology_document().to_string()).expect("fixture should write");

        let graph = fetch_ontology(&reqwest::Client::new(), &OntologySource::File(path.clone()))
            .await
            .expect("local ontology should load");
        assert_eq!(graph.nodes[1].name, "JaneDoe");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_local_file_is_an_io_error() {
        let path = std::env::temp_dir().join("bella_ontology_does_not_exist.jsonld");
        let error = fetch_ontology(&reqwest::Client::new(), &OntologySource::File(path))
            .await
            .expect_err("missing file should fail");
        assert!(error.to_string().starts_with("Failed to read"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_chat_is_reported_as_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        let (tx, rx) = mpsc::channel();
        let sink = EventSink::new(tx, egui::Context::default());
        let client = BellaClient::new(&config, sink, tokio::runtime::Handle::current())
            .expect("client should build");

        client.send_chat("hello".to_string(), Vec::new());

        let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .expect("join should succeed")
            .expect("event should arrive");
        match event {
            AppEvent::RequestFailed { kind, message } => {
                assert_eq!(kind, RequestKind::Chat);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
