use super::upload::UploadForm;
use super::{blocking, AppState, ToolResponse};
use crate::error::AppError;
use axum::{
    extract::State,
    Json,
};
use filekit::compose::{images_to_pdf, text_to_pdf, TextLayout};
use filekit::docx::extract_paragraphs;
use filekit::storage::extension_of;
use std::path::PathBuf;
use tracing::info;

/// Lay out the paragraphs of a `.docx` file as a PDF.
pub async fn word_to_pdf(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    if extension_of(&file.file_name).as_deref() != Some("docx") {
        return Err(AppError::bad_request("only .docx files are supported"));
    }

    let upload = state
        .storage
        .persist_upload(&file.file_name, &file.bytes)
        .await?;
    let source = upload.path().to_path_buf();
    let bytes = blocking(move || {
        let paragraphs = extract_paragraphs(&std::fs::read(source)?)?;
        Ok(text_to_pdf(&paragraphs, TextLayout::default())?)
    })
    .await?;

    let output = state
        .storage
        .output_path(upload.original_name(), "document", "pdf");
    tokio::fs::write(&output, bytes).await?;
    info!(file = %file.file_name, "converted word document");
    Ok(ToolResponse::for_path(&output))
}

/// One page per uploaded image, in upload order.
pub async fn image_to_pdf(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let files = form.files("files");
    if files.is_empty() {
        return Err(AppError::bad_request("files is required"));
    }

    let mut uploads = Vec::with_capacity(files.len());
    for file in &files {
        uploads.push(
            state
                .storage
                .persist_upload(&file.file_name, &file.bytes)
                .await?,
        );
    }
    let sources: Vec<PathBuf> = uploads.iter().map(|u| u.path().to_path_buf()).collect();

    let bytes = blocking(move || {
        let images = sources
            .iter()
            .map(std::fs::read)
            .collect::<Result<Vec<_>, _>>()?;
        images_to_pdf(&images)
    })
    .await?;

    let output = state
        .storage
        .output_path(uploads[0].original_name(), "images", "pdf");
    tokio::fs::write(&output, bytes).await?;
    info!(images = uploads.len(), "combined images");
    Ok(ToolResponse::for_path(&output))
}
