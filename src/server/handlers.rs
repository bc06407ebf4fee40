use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, info};

use crate::agent::pipeline::EventLog;
use crate::errors::{GenerationError, PipelineError};
use crate::server::models::*;
use crate::server::AppState;

/// Request failure rendered as a JSON error body
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Pipeline(PipelineError),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Generation(GenerationError::EmptyQuestion) => {
                ApiError::BadRequest(e.to_string())
            }
            e => ApiError::Pipeline(e),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        ApiError::from(PipelineError::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Pipeline(e) => {
                error!("Turn failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn require_question(question: &str) -> Result<&str, ApiError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }
    Ok(question)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Answer a question, with optional prior turns supplied by the caller
pub async fn ask(
    Extension(state): Extension<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = require_question(&req.question)?;
    info!("Received ask request: {}", question);

    let log = EventLog::default();
    let outcome = state.pipeline.run(question, &req.history, &log).await?;

    Ok(Json(AskResponse::new(outcome, log.into_events())))
}

/// Generate Cypher for a question without executing it
pub async fn cypher(
    Extension(state): Extension<AppState>,
    Json(req): Json<CypherRequest>,
) -> Result<Json<CypherResponse>, ApiError> {
    let question = require_question(&req.question)?;
    info!("Received cypher request: {}", question);

    let queries = state
        .pipeline
        .translator()
        .generate(question, &[], None)
        .await?;

    Ok(Json(CypherResponse { queries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::agent::pipeline::{PipelineOptions, RagPipeline};
    use crate::agent::responder::{AnswerGenerator, AnswerSettings};
    use crate::query::formatter::EvidenceState;
    use crate::query::nl_translator::{CypherTranslator, GenerationSettings};
    use crate::schema::Schema;
    use crate::server::app;
    use crate::testing::{record, ScriptedExecutor, ScriptedModel};

    fn pipeline(model: ScriptedModel, executor: ScriptedExecutor) -> Arc<RagPipeline> {
        let model = Arc::new(model);
        let schema = Arc::new(Schema::new("Player {name: STRING}"));
        Arc::new(RagPipeline::new(
            CypherTranslator::new(model.clone(), schema.clone(), GenerationSettings::default()),
            Arc::new(executor),
            AnswerGenerator::new(model, schema, AnswerSettings::default()),
            PipelineOptions::default(),
        ))
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(pipeline(ScriptedModel::new(vec![]), ScriptedExecutor::new(vec![])));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ask_route_ok() {
        let app = app(pipeline(
            ScriptedModel::new(vec!["MATCH (p:Player) RETURN p.name AS name", "Alice is playing."]),
            ScriptedExecutor::new(vec![Ok(vec![record(json!({"name": "Alice"}))])]),
        ));
        let response = app
            .oneshot(post("/api/ask", json!({"question": "Who is playing?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ask_blank_question_is_bad_request() {
        let app = app(pipeline(ScriptedModel::new(vec![]), ScriptedExecutor::new(vec![])));
        let response = app
            .oneshot(post("/api/ask", json!({"question": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_model_failure_is_bad_gateway() {
        let app = app(pipeline(
            ScriptedModel::failing(crate::errors::ModelError::Http {
                status: 401,
                body: "unauthorized".to_string(),
            }),
            ScriptedExecutor::new(vec![]),
        ));
        let response = app
            .oneshot(post("/api/ask", json!({"question": "Who is playing?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_ask_handler_reports_retries_and_events() {
        let state = AppState {
            pipeline: pipeline(
                ScriptedModel::new(vec![
                    "MATCH (p:Player) RETRUN p",
                    "MATCH (p:Player) RETURN p.name AS name",
                ]),
                ScriptedExecutor::new(vec![
                    Err(crate::errors::ExecutionError::Query("Invalid input 'RETRUN'".to_string())),
                    Ok(vec![]),
                ]),
            ),
        };
        let req = AskRequest {
            question: "Who is playing?".to_string(),
            history: vec![],
        };

        let Json(response) = ask(Extension(state), Json(req)).await.unwrap();
        assert_eq!(response.attempts, 2);
        assert_eq!(response.evidence_state, EvidenceState::Empty);
        assert!(response.last_error.unwrap().contains("RETRUN"));
        assert_eq!(response.queries.len(), 1);
        assert!(!response.events.is_empty());
    }

    #[tokio::test]
    async fn test_cypher_handler() {
        let state = AppState {
            pipeline: pipeline(
                ScriptedModel::new(vec!["```cypher\nMATCH (p:Player) RETURN p;\nMATCH (r:Resource) RETURN r\n```"]),
                ScriptedExecutor::new(vec![]),
            ),
        };
        let req = CypherRequest {
            question: "Players and resources".to_string(),
        };

        let Json(response) = cypher(Extension(state), Json(req)).await.unwrap();
        assert_eq!(response.queries.len(), 2);
    }
}
