use crate::invoker::ToolExecutionError;
use crate::pdf::PdfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilekitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request parameter is missing, malformed or out of its allowed set.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Tool(#[from] ToolExecutionError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Document error: {0}")]
    Document(String),

    #[error("XML error: {0}")]
    Xml(String),
}

impl FilekitError {
    pub fn invalid(message: impl Into<String>) -> Self {
        FilekitError::InvalidInput(message.into())
    }

    /// Whether the failure was caused by the caller's input rather than by
    /// the service or one of its collaborators.
    pub fn is_client_error(&self) -> bool {
        match self {
            FilekitError::InvalidInput(_) | FilekitError::Image(_) => true,
            FilekitError::Pdf(err) => err.is_client_error(),
            _ => false,
        }
    }
}

impl From<quick_xml::Error> for FilekitError {
    fn from(err: quick_xml::Error) -> Self {
        FilekitError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilekitError>;
