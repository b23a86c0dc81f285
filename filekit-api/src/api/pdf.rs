use super::upload::{UploadForm, UploadedFile};
use super::{blocking, AppState, ToolResponse};
use crate::error::AppError;
use axum::{
    extract::State,
    Json,
};
use filekit::archive::archive_bytes;
use filekit::pdf::{
    self, parse_page_ranges, PageSpec, PdfFile, WatermarkOptions, WatermarkPosition,
};
use filekit::storage::sanitize_stem;
use filekit::StoredUpload;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// One PDF per range group; several groups are bundled into a ZIP.
pub async fn split(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let ranges = form.required_text("ranges")?.to_string();

    let upload = persist(&state, file).await?;
    let source = upload.path().to_path_buf();
    let stem = sanitize_stem(upload.original_name());

    let (bytes, extension, parts) = blocking(move || {
        let pdf = PdfFile::load(&std::fs::read(source)?)?;
        let groups = parse_page_ranges(&ranges, pdf.page_count())?;

        let mut parts = Vec::with_capacity(groups.len());
        for group in &groups {
            parts.push(pdf.extract_pages(group)?);
        }
        if parts.len() == 1 {
            return Ok((parts.remove(0), "pdf", 1));
        }

        let entries: Vec<(String, Vec<u8>)> = parts
            .into_iter()
            .enumerate()
            .map(|(n, part)| (format!("{stem}_range{}.pdf", n + 1), part))
            .collect();
        Ok((archive_bytes(&entries)?, "zip", entries.len()))
    })
    .await?;

    let output = save_output(&state, &upload, "split", extension, bytes).await?;
    info!(file = %file.file_name, parts, "split pdf");
    Ok(ToolResponse::for_path(&output))
}

/// Add quarter turns to the pages named in `rotations`.
pub async fn rotate(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let rotations = parse_rotations(form.required_text("rotations")?)?;

    let upload = persist(&state, file).await?;
    let source = upload.path().to_path_buf();
    let bytes = blocking(move || {
        let pdf = PdfFile::load(&std::fs::read(source)?)?;
        Ok(pdf.rotate(&rotations)?)
    })
    .await?;

    let output = save_output(&state, &upload, "rotated", "pdf", bytes).await?;
    info!(file = %file.file_name, "rotated pdf");
    Ok(ToolResponse::for_path(&output))
}

/// Rebuild the document from `pageOrder`.
pub async fn organize(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let order: Vec<PageSpec> = serde_json::from_str(form.required_text("pageOrder")?)
        .map_err(|e| AppError::bad_request(format!("invalid pageOrder: {e}")))?;
    if order.is_empty() {
        return Err(AppError::bad_request("pageOrder must not be empty"));
    }

    let upload = persist(&state, file).await?;
    let source = upload.path().to_path_buf();
    let pages = order.len();
    let bytes = blocking(move || {
        let pdf = PdfFile::load(&std::fs::read(source)?)?;
        Ok(pdf.assemble(&order)?)
    })
    .await?;

    let output = save_output(&state, &upload, "organized", "pdf", bytes).await?;
    info!(file = %file.file_name, pages, "organized pdf");
    Ok(ToolResponse::for_path(&output))
}

/// Concatenate every uploaded PDF in submission order.
pub async fn merge(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let files = form.files("files");
    if files.len() < 2 {
        return Err(AppError::bad_request("at least 2 PDF files are required"));
    }

    let mut uploads = Vec::with_capacity(files.len());
    for file in &files {
        uploads.push(persist(&state, file).await?);
    }
    let sources: Vec<PathBuf> = uploads.iter().map(|u| u.path().to_path_buf()).collect();

    let bytes = blocking(move || {
        let mut documents = Vec::with_capacity(sources.len());
        for source in sources {
            documents.push(PdfFile::load(&std::fs::read(source)?)?);
        }
        Ok(pdf::merge(documents)?)
    })
    .await?;

    let output = save_output(&state, &uploads[0], "merged", "pdf", bytes).await?;
    info!(files = uploads.len(), "merged pdfs");
    Ok(ToolResponse::for_path(&output))
}

/// Stamp `text` on every page.
pub async fn watermark(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let position: WatermarkPosition = form.required_text("position")?.parse()?;
    let mut options = WatermarkOptions::new(form.required_text("text")?, position);
    if let Some(size) = form.text("fontSize") {
        options.font_size = parse_number("fontSize", size)?;
    }
    if let Some(opacity) = form.text("opacity") {
        options.opacity = parse_number("opacity", opacity)?;
    }
    options.validate()?;

    let upload = persist(&state, file).await?;
    let source = upload.path().to_path_buf();
    let bytes = blocking(move || {
        let pdf = PdfFile::load(&std::fs::read(source)?)?;
        Ok(pdf.watermark(&options)?)
    })
    .await?;

    let output = save_output(&state, &upload, "watermarked", "pdf", bytes).await?;
    info!(file = %file.file_name, "watermarked pdf");
    Ok(ToolResponse::for_path(&output))
}

/// `{"<0-based page>": degrees}`.
fn parse_rotations(text: &str) -> Result<BTreeMap<usize, i64>, AppError> {
    let raw: BTreeMap<String, i64> = serde_json::from_str(text)
        .map_err(|e| AppError::bad_request(format!("invalid rotations: {e}")))?;

    raw.into_iter()
        .map(|(key, degrees)| {
            let index = key.trim().parse::<usize>().map_err(|_| {
                AppError::bad_request(format!("invalid rotations: '{key}' is not a page index"))
            })?;
            Ok((index, degrees))
        })
        .collect()
}

fn parse_number(name: &str, value: &str) -> Result<f32, AppError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::bad_request(format!("{name} must be a number")))
}

async fn persist(state: &AppState, file: &UploadedFile) -> Result<StoredUpload, AppError> {
    Ok(state
        .storage
        .persist_upload(&file.file_name, &file.bytes)
        .await?)
}

async fn save_output(
    state: &AppState,
    upload: &StoredUpload,
    task: &str,
    extension: &str,
    bytes: Vec<u8>,
) -> Result<PathBuf, AppError> {
    let output = state
        .storage
        .output_path(upload.original_name(), task, extension);
    tokio::fs::write(&output, bytes).await?;
    Ok(output)
}
