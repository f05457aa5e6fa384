//! Gateway routes
//!
//! `/proxy` (and `/api/proxy`, the path deployed clients call) accepts a
//! content list, forwards it upstream with the memory function declarations
//! and relays text and function calls back. Nothing is kept between requests.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::conversation::{ChatHistory, Content, Part, ProxyReply, ProxyRequest};
use crate::plugins::memory;
use crate::providers::{GeminiConfig, GeminiProvider, ProviderError};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Every non-success answer of the proxy endpoint
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Missing \"contents\" in request body")]
    MissingContents,

    #[error("Invalid JSON in request body")]
    InvalidJson,

    #[error("Malformed \"{field}\" in request body")]
    Malformed { field: &'static str, details: String },

    #[error("API key not configured")]
    NotConfigured,

    #[error("An error occurred while communicating with the Gemini API.")]
    Upstream(#[from] ProviderError),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::MissingContents
            | GatewayError::InvalidJson
            | GatewayError::Malformed { .. } => StatusCode::BAD_REQUEST,
            GatewayError::NotConfigured | GatewayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            GatewayError::Malformed { details, .. } => Some(details.clone()),
            GatewayError::Upstream(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = match self.details() {
            Some(details) => json!({ "error": self.to_string(), "details": details }),
            None => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn parse_request(body: &[u8]) -> Result<ProxyRequest, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(GatewayError::MissingContents);
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| GatewayError::InvalidJson)?;

    let contents = match value.get("contents") {
        None | Some(Value::Null) => return Err(GatewayError::MissingContents),
        Some(contents) => serde_json::from_value::<ChatHistory>(contents.clone()).map_err(|e| {
            GatewayError::Malformed {
                field: "contents",
                details: e.to_string(),
            }
        })?,
    };

    let function_responses = match value.get("function_responses") {
        None | Some(Value::Null) => None,
        Some(parts) => Some(serde_json::from_value::<Vec<Part>>(parts.clone()).map_err(|e| {
            GatewayError::Malformed {
                field: "function_responses",
                details: e.to_string(),
            }
        })?),
    };

    Ok(ProxyRequest {
        contents,
        function_responses,
    })
}

/// Content sequence sent upstream: the client's history, plus a synthetic
/// `function` turn when function results ride alongside it
fn assemble(request: ProxyRequest) -> ChatHistory {
    let mut contents = request.contents;
    if let Some(parts) = request.function_responses.filter(|p| !p.is_empty()) {
        contents.push(Content::function(parts));
    }
    contents
}

async fn proxy(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Response, GatewayError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }
    if method != Method::POST {
        return Err(GatewayError::MethodNotAllowed);
    }

    let request = parse_request(&body)?;

    let gemini = GeminiConfig::from_config(&state.config).map_err(|_| GatewayError::NotConfigured)?;
    let provider = GeminiProvider::new(state.http.clone(), gemini);

    let contents = assemble(request);
    let tools = memory::tools();

    match provider.generate(&contents, &tools).await {
        Ok(generation) => Ok(Json(ProxyReply {
            text: generation.text,
            function_calls: generation.function_calls,
        })
        .into_response()),
        Err(e) => {
            tracing::error!(
                request_body = %String::from_utf8_lossy(&body),
                error = ?e,
                "Error in Gemini proxy"
            );
            Err(GatewayError::Upstream(e))
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/proxy", any(proxy))
        .route("/api/proxy", any(proxy))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use mockito::Matcher;
    use tower::ServiceExt;

    const GEMINI_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn app(api_key: Option<&str>, gemini_url: &str) -> Router {
        let state = AppState {
            config: Config {
                api_key: api_key.map(str::to_string),
                gemini_url: gemini_url.to_string(),
                ..Config::default()
            },
            http: reqwest::Client::new(),
        };
        router().with_state(state)
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn read_body(response: Response) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn read_json(response: Response) -> Value {
        serde_json::from_slice(&read_body(response).await).unwrap()
    }

    fn assert_cors(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/proxy")
            .body(Body::from("definitely not json"))
            .unwrap();

        let response = app(None, "http://unused").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/proxy")
            .body(Body::empty())
            .unwrap();

        let response = app(Some("abc"), "http://unused").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_cors(&response);
        assert_eq!(read_json(response).await, json!({ "error": "Method Not Allowed" }));
    }

    #[tokio::test]
    async fn test_missing_contents() {
        let response = app(Some("abc"), "http://unused")
            .oneshot(post("/proxy", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({ "error": "Missing \"contents\" in request body" })
        );
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let response = app(Some("abc"), "http://unused")
            .oneshot(post("/proxy", "{oops"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn test_malformed_contents() {
        let response = app(Some("abc"), "http://unused")
            .oneshot(post("/proxy", r#"{"contents": "hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Malformed \"contents\" in request body");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let body = json!({ "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }] });
        let response = app(None, "http://unused")
            .oneshot(post("/proxy", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await, json!({ "error": "API key not configured" }));
    }

    #[tokio::test]
    async fn test_relays_function_calls() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", GEMINI_PATH)
            .match_header("x-goog-api-key", "abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "role": "model", "parts": [
                        { "functionCall": { "name": "saveUserData", "args": { "key": "اسم", "value": "أحمد" } } }
                    ] } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let body = json!({ "contents": [{ "role": "user", "parts": [{ "text": "احفظ اسمي أحمد" }] }] });
        let response = app(Some("abc"), &server.url())
            .oneshot(post("/proxy", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(
            read_json(response).await,
            json!({ "functionCalls": [{ "name": "saveUserData", "args": { "key": "اسم", "value": "أحمد" } }] })
        );
    }

    #[tokio::test]
    async fn test_appends_function_turn_before_forwarding() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GEMINI_PATH)
            .match_body(Matcher::PartialJson(json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "ما اسمي؟" }] },
                    { "role": "model", "parts": [{ "functionCall": { "name": "getUserData", "args": { "key": "اسم" } } }] },
                    { "role": "function", "parts": [{ "functionResponse": {
                        "name": "getUserData",
                        "response": { "result": "المعلومة التي وجدتها لـ اسم هي: أحمد" }
                    } }] }
                ]
            })))
            .with_status(200)
            .with_body(
                json!({ "candidates": [{ "content": { "parts": [{ "text": "اسمك أحمد" }] } }] }).to_string(),
            )
            .create_async()
            .await;

        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "ما اسمي؟" }] },
                { "role": "model", "parts": [{ "functionCall": { "name": "getUserData", "args": { "key": "اسم" } } }] }
            ],
            "function_responses": [{ "functionResponse": {
                "name": "getUserData",
                "response": { "result": "المعلومة التي وجدتها لـ اسم هي: أحمد" }
            } }]
        });
        let response = app(Some("abc"), &server.url())
            .oneshot(post("/api/proxy", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({ "text": "اسمك أحمد" }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_failure_envelope() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", GEMINI_PATH)
            .with_status(503)
            .with_body(json!({ "error": { "code": 503, "message": "The model is overloaded." } }).to_string())
            .create_async()
            .await;

        let body = json!({ "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }] });
        let response = app(Some("abc"), &server.url())
            .oneshot(post("/proxy", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json(response).await,
            json!({
                "error": "An error occurred while communicating with the Gemini API.",
                "details": "Invalid response: API error: The model is overloaded."
            })
        );
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(None, "http://unused").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ok");
    }
}
