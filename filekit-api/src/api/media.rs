use super::upload::UploadForm;
use super::{blocking, discard, AppState, ToolResponse};
use crate::error::AppError;
use axum::{
    extract::State,
    Json,
};
use filekit::archive::{bundle_files, ArchiveEntry};
use filekit::media::{compression_flags, segment_flags, CompressionLevel, SegmentPlan, TargetFormat};
use std::path::Path;
use tracing::{info, warn};

/// Transcode `file` into `format`.
pub async fn convert(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let format: TargetFormat = form.required_text("format")?.parse()?;

    let upload = state.storage.persist_upload(&file.file_name, &file.bytes).await?;
    let output = state
        .storage
        .output_path(upload.original_name(), "converted", format.extension());

    run_tool(&state, upload.path(), &output, &format.flags()).await?;
    info!(file = %file.file_name, format = format.extension(), "converted");
    Ok(ToolResponse::for_path(&output))
}

/// Re-encode `file` at the requested `level`.
pub async fn compress(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let level: CompressionLevel = form.required_text("level")?.parse()?;

    let upload = state.storage.persist_upload(&file.file_name, &file.bytes).await?;
    let (flags, extension) = compression_flags(level, upload.extension());
    let output = state
        .storage
        .output_path(upload.original_name(), "compressed", &extension);

    run_tool(&state, upload.path(), &output, &flags).await?;
    info!(file = %file.file_name, %level, "compressed");
    Ok(ToolResponse::for_path(&output))
}

/// Cut `file` into stream-copied segments of `minutes` each.
pub async fn chop(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ToolResponse>, AppError> {
    let file = form.required_file("file")?;
    let minutes: u32 = form
        .required_text("minutes")?
        .parse()
        .map_err(|_| AppError::bad_request("minutes must be a positive integer"))?;
    let flags = segment_flags(minutes)?;

    let upload = state.storage.persist_upload(&file.file_name, &file.bytes).await?;
    let plan = SegmentPlan::new(
        state.storage.processed_dir(),
        upload.original_name(),
        upload.extension(),
    );
    if let Err(err) = state.invoker.run(upload.path(), &plan.pattern(), &flags).await {
        discard_segments(&plan).await;
        return Err(err.into());
    }

    let output = blocking(move || {
        let segments = plan.collect_segments()?;
        match segments.len() {
            0 => Err(std::io::Error::other("the tool produced no segments").into()),
            1 => Ok(segments[0].clone()),
            _ => {
                let entries: Vec<ArchiveEntry> = segments
                    .iter()
                    .enumerate()
                    .map(|(i, path)| ArchiveEntry::new(plan.entry_name(i), path))
                    .collect();
                let archive = plan.archive_path();
                bundle_files(&archive, &entries)?;
                Ok(archive)
            }
        }
    })
    .await?;

    info!(file = %file.file_name, minutes, "chopped");
    Ok(ToolResponse::for_path(&output))
}

/// Remove whatever segments a failed run left behind.
async fn discard_segments(plan: &SegmentPlan) {
    match plan.collect_segments() {
        Ok(segments) => {
            for segment in segments {
                discard(&segment).await;
            }
        }
        Err(err) => warn!(error = %err, "could not list partial segments"),
    }
}

async fn run_tool(
    state: &AppState,
    input: &Path,
    output: &Path,
    flags: &[String],
) -> Result<(), AppError> {
    if let Err(err) = state.invoker.run(input, output, flags).await {
        discard(output).await;
        return Err(err.into());
    }
    Ok(())
}
