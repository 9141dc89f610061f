/// Report dispatch endpoints
use crate::api::RESPONSE_CODE_OK;
use crate::context::ApiContext;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use reportflow_core::models::{BatchItem, BatchSummary, MailSendResult, ReportKind, Token};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Batch submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(rename = "type", default)]
    pub kind: ReportKind,
    pub details: Vec<BatchItem>,
}

impl ReportRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.details.is_empty() {
            return Err(ApiError::BadRequest(
                "details must contain at least one item".to_string(),
            ));
        }
        if let Some(index) = self
            .details
            .iter()
            .position(|item| item.transfer_id.trim().is_empty())
        {
            return Err(ApiError::BadRequest(format!(
                "details[{}].transfer_id must not be empty",
                index
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub response_code: String,
    pub summary: BatchSummary,
    pub results: Vec<MailSendResult>,
}

impl DispatchResponse {
    fn from_results(results: Vec<MailSendResult>) -> Self {
        Self {
            response_code: RESPONSE_CODE_OK.to_string(),
            summary: BatchSummary::from_results(&results),
            results,
        }
    }
}

/// POST /v1/reports
pub async fn dispatch(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    info!(kind = ?request.kind, items = request.details.len(), "Report batch received");

    let results = ctx.pipeline.run(request.kind, request.details).await;
    Ok(Json(DispatchResponse::from_results(results)))
}

/// POST /v1/reports/tokens
///
/// Entries with an empty token are reported as failed without contacting any service.
pub async fn dispatch_tokens(
    State(ctx): State<Arc<ApiContext>>,
    payload: Result<Json<Vec<Token>>, JsonRejection>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let Json(tokens) = payload?;
    if tokens.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one token is required".to_string(),
        ));
    }

    info!(items = tokens.len(), "Pre-issued token batch received");

    let results = ctx
        .pipeline
        .run_with_tokens(ReportKind::Transfer, tokens)
        .await;
    Ok(Json(DispatchResponse::from_results(results)))
}
