use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use estately_agents::{HandlerError, TurnError, TURN_FAILURE_REPLY};
use estately_core::{ApplicationError, InterfaceError};

use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub correlation_id: String,
}

/// One conversational turn. Handler failures come back as a generic
/// user-safe reply; the turn is already recorded in the episodic log.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    let correlation_id = Uuid::new_v4().to_string();
    let user_id = request.user_id.trim();
    let message = request.message.trim();

    if user_id.is_empty() || message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatResponse {
                response: "user_id and message must not be empty.".to_string(),
                correlation_id,
            }),
        );
    }

    let chatbot = state.sessions.checkout(user_id).await;
    info!(
        event_name = "server.chat.turn_started",
        correlation_id = %correlation_id,
        user_id,
        "chat turn accepted"
    );

    match chatbot.handle_turn(message).await {
        Ok(response) => {
            info!(
                event_name = "server.chat.turn_completed",
                correlation_id = %correlation_id,
                user_id,
                response_chars = response.len(),
                "chat turn completed"
            );
            (StatusCode::OK, Json(ChatResponse { response, correlation_id }))
        }
        Err(turn_error) => {
            let interface_error =
                classify_failure(turn_error).into_interface(correlation_id.clone());
            error!(
                event_name = "server.chat.turn_failed",
                correlation_id = %correlation_id,
                user_id,
                error = %interface_error,
                "chat turn failed"
            );
            // The episodic log already holds the same user-safe reply.
            (
                status_for(&interface_error),
                Json(ChatResponse {
                    response: TURN_FAILURE_REPLY.to_string(),
                    correlation_id,
                }),
            )
        }
    }
}

fn classify_failure(error: TurnError) -> ApplicationError {
    match error {
        TurnError::Handler(HandlerError::Memory(inner)) => {
            ApplicationError::Persistence(inner.to_string())
        }
        TurnError::Handler(HandlerError::Repository(inner)) => {
            ApplicationError::Persistence(inner.to_string())
        }
        TurnError::Handler(HandlerError::Completion(inner)) => {
            ApplicationError::Integration(inner.to_string())
        }
        TurnError::Handler(HandlerError::Template(inner)) => {
            ApplicationError::Configuration(inner.to_string())
        }
        TurnError::Memory(inner) => ApplicationError::Persistence(inner.to_string()),
    }
}

fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
