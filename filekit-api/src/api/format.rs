use crate::error::AppError;
use axum::{extract::rejection::JsonRejection, Json};
use filekit::format::{format_text, Language};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct FormatRequest {
    /// `json`, `xml` or `sql`
    pub language: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormatResponse {
    pub formatted: String,
}

/// Pretty-print developer text. Answered inline, nothing is stored.
pub async fn format(
    payload: Result<Json<FormatRequest>, JsonRejection>,
) -> Result<Json<FormatResponse>, AppError> {
    let Json(request) = payload?;
    let language: Language = request.language.parse()?;
    let formatted = format_text(language, &request.text)?;
    Ok(Json(FormatResponse { formatted }))
}
