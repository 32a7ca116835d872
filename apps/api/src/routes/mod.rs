pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::chat::handlers as chat;
use crate::coaching::handlers as coaching;
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        // Resume analysis
        .route("/api/analyze-resume", post(analysis::handle_analyze_upload))
        .route("/api/analyze-resume/text", post(analysis::handle_analyze_text))
        .route("/api/extract", post(analysis::handle_extract))
        // Assistant
        .route("/api/chat", post(chat::handle_chat))
        // Coaching
        .route(
            "/api/interview/questions",
            post(coaching::handle_interview_questions),
        )
        .route(
            "/api/interview/feedback",
            post(coaching::handle_interview_feedback),
        )
        .route("/api/templates", post(coaching::handle_message_template))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::{AnalysisProvider, ResumeAnalysis};
    use crate::chat::FALLBACK_RESPONSE;
    use crate::config::Config;
    use crate::extraction::{ExtractionLimits, ExtractionOrchestrator};
    use crate::llm_client::LlmError;

    const BOUNDARY: &str = "careerboost-test-boundary";
    const RESUME_TEXT: &str = "Jane Doe\nSoftware Engineer\nBuilt payment APIs in Rust serving 2M requests a day.";

    /// Echoes the text length back as the score so tests can see what was analyzed.
    struct StubAnalyzer {
        rate_limited: bool,
    }

    #[async_trait]
    impl AnalysisProvider for StubAnalyzer {
        async fn analyze(&self, text: &str, file_name: &str) -> Result<ResumeAnalysis, LlmError> {
            if self.rate_limited {
                return Err(LlmError::RateLimited { retries: 3 });
            }
            Ok(ResumeAnalysis {
                file_name: file_name.to_string(),
                analysis_id: "stub-analysis".to_string(),
                overall_score: text.len().min(100) as u8,
                ..Default::default()
            })
        }

        fn backend(&self) -> &'static str {
            "stub"
        }
    }

    fn app_with(config: Config, rate_limited: bool) -> Router {
        let extractor = Arc::new(ExtractionOrchestrator::new(ExtractionLimits::default()));
        build_router(AppState {
            config,
            llm: None,
            analyzer: Arc::new(StubAnalyzer { rate_limited }),
            extractor,
        })
    }

    fn app() -> Router {
        app_with(Config::for_tests(), false)
    }

    fn multipart_request(uri: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_missing_key() {
        for uri in ["/health", "/api/health"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = body_json(response).await;
            assert_eq!(body["status"], "ok");
            assert_eq!(body["geminiApiKey"], "missing");
            assert_eq!(body["service"], "careerboost-api");
            assert!(body["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn test_extract_plain_text_upload() {
        let request = multipart_request("/api/extract", "resume.txt", "text/plain", RESUME_TEXT.as_bytes());
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["text"], RESUME_TEXT);
        assert_eq!(body["strategy"], "plain_text");
        assert_eq!(body["characterCount"], RESUME_TEXT.chars().count());
        assert_eq!(body["truncated"], false);
    }

    #[tokio::test]
    async fn test_analyze_upload_returns_analysis_and_extraction() {
        let request = multipart_request(
            "/api/analyze-resume",
            "jane.txt",
            "text/plain; charset=utf-8",
            RESUME_TEXT.as_bytes(),
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["analysis"]["fileName"], "jane.txt");
        assert_eq!(body["analysis"]["analysisId"], "stub-analysis");
        assert_eq!(body["extraction"]["strategy"], "plain_text");
        assert_eq!(body["extraction"]["attempts"][0]["succeeded"], true);
    }

    #[tokio::test]
    async fn test_analyze_upload_docx() {
        let docx = crate::extraction::office::tests::make_docx(
            &crate::extraction::office::tests::paragraphs_xml(&[
                "Jane Doe",
                "Senior Software Engineer with six years of backend experience",
            ]),
        );
        let request = multipart_request(
            "/api/analyze-resume",
            "jane.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            &docx,
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["extraction"]["strategy"], "office_document");
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_415() {
        let request = multipart_request("/api/analyze-resume", "photo.png", "image/png", b"\x89PNG\r\n");
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
        assert!(body["error"]["message"].as_str().unwrap().contains(".docx"));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_422_with_attempts() {
        let request = multipart_request(
            "/api/analyze-resume",
            "scan.pdf",
            "application/pdf",
            b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n1 0 obj << /Length 0 >> stream\nendstream endobj\n%%EOF",
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let attempts = body["error"]["attempts"].as_array().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0]["strategy"], "raw_pattern");
        assert_eq!(attempts[1]["strategy"], "structured_pdf");
        assert!(body["error"]["message"].as_str().unwrap().contains("What we tried"));
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let config = Config {
            max_upload_bytes: 100,
            ..Config::for_tests()
        };
        let request = multipart_request("/api/extract", "big.txt", "text/plain", &[b'a'; 500]);
        let response = app_with(config, false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"]["code"], "FILE_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/extract")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
            )))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_text_analysis_validation() {
        let response = app()
            .oneshot(json_request("/api/analyze-resume/text", json!({ "fileName": "cv.pdf" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Resume text and file name are required"
        );
    }

    #[tokio::test]
    async fn test_text_analysis_rejects_placeholder() {
        let response = app()
            .oneshot(json_request(
                "/api/analyze-resume/text",
                json!({ "resumeText": "Sample Resume Content\nJohn Smith", "fileName": "cv.pdf" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "PDF_EXTRACTION_FAILED");
    }

    #[tokio::test]
    async fn test_text_analysis_success() {
        let response = app()
            .oneshot(json_request(
                "/api/analyze-resume/text",
                json!({ "resumeText": RESUME_TEXT, "fileName": "pasted.txt" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["fileName"], "pasted.txt");
        assert_eq!(body["overallScore"], RESUME_TEXT.len().min(100));
    }

    #[tokio::test]
    async fn test_provider_rate_limit_is_429() {
        let response = app_with(Config::for_tests(), true)
            .oneshot(json_request(
                "/api/analyze-resume/text",
                json!({ "resumeText": RESUME_TEXT, "fileName": "cv.txt" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "RATE_LIMIT");
        assert_eq!(body["error"]["retry_after"], 300);
    }

    #[tokio::test]
    async fn test_chat_requires_message() {
        let response = app()
            .oneshot(json_request("/api/chat", json!({ "message": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["message"], "Message is required");
    }

    #[tokio::test]
    async fn test_chat_without_key_returns_fallback() {
        let response = app()
            .oneshot(json_request(
                "/api/chat",
                json!({
                    "message": "How do I prepare for a first interview?",
                    "context": [{ "role": "user", "content": "Hi" }],
                    "userInfo": { "industry": "Tech" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_coaching_validates_before_needing_key() {
        let response = app()
            .oneshot(json_request(
                "/api/interview/questions",
                json!({ "industry": "Tech", "role": "", "experience": "entry" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app()
            .oneshot(json_request(
                "/api/interview/questions",
                json!({ "industry": "Tech", "role": "Backend Engineer", "experience": "entry" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["code"], "API_KEY_ERROR");
    }

    #[tokio::test]
    async fn test_template_and_feedback_without_key() {
        let response = app()
            .oneshot(json_request(
                "/api/templates",
                json!({ "type": "networking", "context": "Reaching out to an alumna" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app()
            .oneshot(json_request(
                "/api/interview/feedback",
                json!({ "question": "Why us?", "answer": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_bodies_are_validation_errors() {
        let cases = [
            ("/api/templates", json!({ "type": "cover-letter", "context": "Alumni outreach" })),
            (
                "/api/interview/questions",
                json!({ "industry": "Tech", "role": "SRE", "experience": "senior", "count": -3 }),
            ),
            ("/api/interview/feedback", json!({ "question": 7, "answer": ["yes"] })),
            ("/api/chat", json!({ "message": { "text": "hi" } })),
            ("/api/analyze-resume/text", json!({ "resumeText": 42, "fileName": "cv.txt" })),
        ];
        for (uri, body) in cases {
            let response = app().oneshot(json_request(uri, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR", "{uri}");
        }

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"message\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }
}
