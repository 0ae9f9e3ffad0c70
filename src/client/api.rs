use crate::chat::ImageResult;
use crate::error::{ClientError, GENERIC_FAILURE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHAT_PATH: &str = "/api/chat";
pub const ANALYZE_IMAGE_PATH: &str = "/api/analyze-image";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub focused_entities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageResult>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzeImageRequest {
    pub image: String,
    pub prompt: String,
}

impl AnalyzeImageRequest {
    pub fn new(bytes: &[u8], prompt: impl Into<String>) -> Self {
        Self {
            image: STANDARD.encode(bytes),
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalyzeImageReply {
    #[serde(default)]
    pub analysis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

pub async fn post_chat(
    http: &Client,
    url: &str,
    request: &ChatRequest,
) -> Result<(String, Vec<ImageResult>), ClientError> {
    let response = http.post(url).json(request).send().await?;
    let reply: ChatReply = read_json(response).await?;
    match reply.reply {
        Some(text) if !text.trim().is_empty() => Ok((text, reply.images)),
        _ => Err(ClientError::EmptyReply),
    }
}

pub async fn post_analyze_image(
    http: &Client,
    url: &str,
    request: &AnalyzeImageRequest,
) -> Result<String, ClientError> {
    let response = http.post(url).json(request).send().await?;
    let reply: AnalyzeImageReply = read_json(response).await?;
    match reply.analysis {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ClientError::EmptyReply),
    }
}

pub async fn fetch_json(http: &Client, url: &str) -> Result<Value, ClientError> {
    let response = http.get(url).send().await?;
    read_json(response).await
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            detail: error_detail(&body, status.canonical_reason()),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Text for a non-2xx response: the JSON `detail` when present, else the
/// reason phrase, else a generic line.
pub fn error_detail(body: &str, reason: Option<&str>) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => match parsed.detail {
            Some(Value::String(detail)) if !detail.trim().is_empty() => detail,
            Some(Value::String(_)) | Some(Value::Null) | None => GENERIC_FAILURE.to_string(),
            Some(other) => other.to_string(),
        },
        Err(_) => reason
            .filter(|reason| !reason.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        error_detail, post_analyze_image, post_chat, AnalyzeImageRequest, ChatRequest,
    };
    use crate::error::{ClientError, GENERIC_FAILURE};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_request(message: &str, entities: &[&str]) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            focused_entities: entities.iter().map(|entity| entity.to_string()).collect(),
        }
    }

    #[test]
    fn chat_request_omits_empty_focus_list() {
        let value = serde_json::to_value(chat_request("hello", &[])).expect("serializes");
        assert_eq!(value, json!({ "message": "hello" }));

        let value = serde_json::to_value(chat_request("projects", &["Project"])).expect("serializes");
        assert_eq!(
            value,
            json!({ "message": "projects", "focused_entities": ["Project"] })
        );
    }

    #[test]
    fn analyze_request_base64_encodes_image() {
        let request = AnalyzeImageRequest::new(b"abc", "what is it?");
        assert_eq!(request.image, "YWJj");
        assert_eq!(request.prompt, "what is it?");
    }

    #[test]
    fn error_detail_prefers_json_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"OpenAI API key not configured."}"#, Some("Internal Server Error")),
            "OpenAI API key not configured."
        );
    }

    #[test]
    fn error_detail_falls_back_to_reason_then_generic() {
        assert_eq!(error_detail("<html>oops</html>", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(error_detail("", None), GENERIC_FAILURE);
        assert_eq!(error_detail(r#"{"other":1}"#, Some("Bad Gateway")), GENERIC_FAILURE);
    }

    #[test]
    fn error_detail_renders_structured_detail() {
        let detail = error_detail(r#"{"detail":[{"msg":"field required"}]}"#, None);
        assert!(detail.contains("field required"));
    }

    #[tokio::test]
    async fn post_chat_returns_reply_and_gallery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({ "message": "modern sofa", "focused_entities": ["FurnitureItem"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reply": "Here are some sofas.",
                "images": [
                    { "path": "images/sofa.jpg", "description": "Modern sofa", "similarity_score": 0.91 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/api/chat", server.uri());
        let (reply, images) = post_chat(&http, &url, &chat_request("modern sofa", &["FurnitureItem"]))
            .await
            .expect("chat should succeed");

        assert_eq!(reply, "Here are some sofas.");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].path, "images/sofa.jpg");
    }

    #[tokio::test]
    async fn post_chat_surfaces_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "detail": "OpenAI API key not configured." })),
            )
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/api/chat", server.uri());
        let error = post_chat(&http, &url, &chat_request("hi", &[]))
            .await
            .expect_err("500 should fail");

        assert!(matches!(error, ClientError::Status { status: 500, .. }));
        assert_eq!(error.to_string(), "OpenAI API key not configured.");
    }

    #[tokio::test]
    async fn post_chat_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/api/chat", server.uri());
        let error = post_chat(&http, &url, &chat_request("hi", &[]))
            .await
            .expect_err("malformed body should fail");
        assert!(matches!(error, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn post_chat_treats_missing_reply_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/api/chat", server.uri());
        let error = post_chat(&http, &url, &chat_request("hi", &[]))
            .await
            .expect_err("missing reply should fail");
        assert!(matches!(error, ClientError::EmptyReply));
    }

    #[tokio::test]
    async fn post_analyze_image_returns_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze-image"))
            .and(body_json(json!({ "image": "YWJj", "prompt": "describe" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "analysis": "A walnut side table." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/api/analyze-image", server.uri());
        let analysis = post_analyze_image(&http, &url, &AnalyzeImageRequest::new(b"abc", "describe"))
            .await
            .expect("analysis should succeed");
        assert_eq!(analysis, "A walnut side table.");
    }
}
