use crate::error::Result;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub gateway: String,
}

/// GET /tools - List the tools the gateway currently exposes.
pub async fn list_tools_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ToolInfo>>> {
    let entry = state.executor.list_tools().await?;

    let tools = entry
        .tools
        .iter()
        .map(|t| ToolInfo {
            name: t.name.clone(),
            description: t.description.clone(),
            gateway: t.gateway.clone(),
        })
        .collect();

    Ok(Json(tools))
}
