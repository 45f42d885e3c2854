//! Assistant tool dispatch.

use api_types::assistant::ToolRequest;
use axum::{Extension, Json, extract::State};
use chrono::Utc;
use engine::{ToolCall, ToolOutput, User};

use crate::{ServerError, server::ServerState};

/// Execute one tool call emitted by the assistant on behalf of the caller.
pub async fn run_tool(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ToolRequest>,
) -> Result<Json<ToolOutput>, ServerError> {
    let call = ToolCall::from_parts(&payload.name, payload.arguments)?;
    let today = Utc::now().date_naive();
    let output = state.engine.run_tool(user.id, call, today).await?;
    Ok(Json(output))
}
