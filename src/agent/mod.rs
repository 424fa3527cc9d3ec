mod outcome;
mod prompt;

pub use outcome::{Outcome, OutcomeKind};
pub use prompt::{build_prompt, RequestContext};

use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::config::{Config, EmptyResponsePolicy};
use crate::errors::AppError;
use crate::models::{GenerateRequest, GenerateResponse};

/// Client for a single-shot completion endpoint.
///
/// Every call is one POST with `stream: false`; nothing is retried. All
/// failures are folded into an [`Outcome`], so `complete` and `generate`
/// never return an error.
#[derive(Clone)]
pub struct ModelClient {
    client: reqwest::Client,
    api_url: Url,
    empty_response: EmptyResponsePolicy,
}

impl ModelClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AppError::HttpClient)?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            empty_response: config.empty_response,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Builds the prompt for `ctx` and sends it.
    pub async fn complete(&self, ctx: &RequestContext<'_>) -> Outcome {
        let prompt = ctx.prompt();
        debug!(
            "Built prompt from {} prior turns ({} bytes)",
            ctx.history.len(),
            prompt.len()
        );
        self.generate(ctx.model, &prompt).await
    }

    /// Sends an already-built prompt to the server.
    pub async fn generate(&self, model: &str, prompt: &str) -> Outcome {
        info!("Sending generate request to {} with model {model}", self.api_url);

        let response = match self
            .client
            .post(self.api_url.clone())
            .json(&GenerateRequest::new(model, prompt))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return classify_transport_error(&e, model),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return classify_transport_error(&e, model),
        };

        if !status.is_success() {
            warn!("Model server returned {status} for model {model}");
            return Outcome::ServerError { status: status.as_u16(), body };
        }

        let parsed = match GenerateResponse::from_json(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Failed to decode generate response for model {model}: {e}");
                return Outcome::Generic {
                    message: format!("invalid response from server: {e}"),
                    model: model.to_string(),
                };
            }
        };

        let text = parsed.response.trim().to_string();
        if text.is_empty() && self.empty_response == EmptyResponsePolicy::Reject {
            warn!("Model {model} returned an empty response");
            return Outcome::Generic {
                message: "model returned an empty response".to_string(),
                model: model.to_string(),
            };
        }

        info!("Model {model} responded ({} bytes)", text.len());
        Outcome::Success { text }
    }
}

/// Connect errors are checked before timeouts, so a connect timeout reports
/// the server as unreachable.
fn classify_transport_error(e: &reqwest::Error, model: &str) -> Outcome {
    if e.is_connect() {
        warn!("Could not connect to model server: {e}");
        Outcome::ConnectionFailed { model: model.to_string() }
    } else if e.is_timeout() {
        warn!("Request to model server timed out: {e}");
        Outcome::Timeout
    } else {
        error!("Request to model server failed: {e}");
        Outcome::Generic { message: e.to_string(), model: model.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::{Speaker, Turn, TurnId, TurnKind};

    fn client_for(uri: &str, timeout: Duration, empty: EmptyResponsePolicy) -> ModelClient {
        let config = Config {
            api_url: Url::parse(&format!("{uri}/api/generate")).unwrap(),
            timeout,
            empty_response: empty,
            ..Config::default()
        };
        ModelClient::new(&config).unwrap()
    }

    fn client(server: &MockServer) -> ModelClient {
        client_for(&server.uri(), Duration::from_secs(5), EmptyResponsePolicy::Accept)
    }

    async fn mount_json(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_success_is_trimmed() {
        let server = MockServer::start().await;
        mount_json(&server, 200, serde_json::json!({"response": " Fine, thanks! "})).await;

        let outcome = client(&server).generate("phi", "How are you?").await;
        assert_eq!(outcome, Outcome::Success { text: "Fine, thanks!".to_string() });
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "mistral",
                "prompt": "User: Hi\nAssistant: Hello!\nUser: How are you?\nAssistant:",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                serde_json::json!({"response": "ok"}).to_string(),
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![
            Turn::new(TurnId(0), Speaker::User, TurnKind::Message, "Hi".to_string()),
            Turn::new(TurnId(1), Speaker::Assistant, TurnKind::Message, "Hello!".to_string()),
        ];
        let ctx = RequestContext::new("mistral", "How are you?", &history);
        let outcome = client(&server).complete(&ctx).await;
        assert_eq!(outcome, Outcome::Success { text: "ok".to_string() });
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let outcome = client(&server).generate("phi", "Hello").await;
        assert_eq!(outcome, Outcome::ServerError { status: 500, body: "boom".to_string() });
        assert!(outcome.render().contains("```\nError: 500 - boom\n```"));
    }

    #[tokio::test]
    async fn test_not_found_model_is_server_error() {
        let server = MockServer::start().await;
        mount_json(&server, 404, serde_json::json!({"error": "model 'nope' not found"})).await;

        let outcome = client(&server).generate("nope", "Hello").await;
        match outcome {
            Outcome::ServerError { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("expected ServerError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(
            &format!("http://{addr}"),
            Duration::from_secs(5),
            EmptyResponsePolicy::Accept,
        );
        let outcome = client.generate("llama3.1", "Hello").await;
        assert_eq!(outcome.kind(), OutcomeKind::ConnectionFailed);
        assert!(outcome.render().contains("ollama run llama3.1"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(
                        serde_json::json!({"response": "late"}).to_string(),
                        "application/json",
                    )
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(
            &server.uri(),
            Duration::from_millis(200),
            EmptyResponsePolicy::Accept,
        );
        let outcome = client.generate("phi", "Hello").await;
        assert_eq!(outcome, Outcome::Timeout);
    }

    #[tokio::test]
    async fn test_malformed_body_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let outcome = client(&server).generate("phi", "Hello").await;
        assert_eq!(outcome.kind(), OutcomeKind::Generic);
        assert!(outcome.render().contains("invalid response from server"));
    }

    #[tokio::test]
    async fn test_missing_response_field_policy() {
        let server = MockServer::start().await;
        mount_json(&server, 200, serde_json::json!({"done": true})).await;

        let accept = client(&server).generate("phi", "Hello").await;
        assert_eq!(accept, Outcome::Success { text: String::new() });

        let reject = client_for(&server.uri(), Duration::from_secs(5), EmptyResponsePolicy::Reject)
            .generate("phi", "Hello")
            .await;
        assert_eq!(reject.kind(), OutcomeKind::Generic);
    }

    #[tokio::test]
    async fn test_null_or_array_body_is_generic() {
        for body in [serde_json::json!({"response": null}), serde_json::json!(["hi"])] {
            let server = MockServer::start().await;
            mount_json(&server, 200, body).await;

            let outcome = client(&server).generate("phi", "Hello").await;
            assert_eq!(outcome.kind(), OutcomeKind::Generic);
            assert!(outcome.render().contains("invalid response from server"));
        }
    }

    #[tokio::test]
    async fn test_whitespace_only_response_is_empty() {
        let server = MockServer::start().await;
        mount_json(&server, 200, serde_json::json!({"response": "  \n "})).await;

        let outcome = client(&server).generate("phi", "Hello").await;
        assert_eq!(outcome, Outcome::Success { text: String::new() });
    }
}
