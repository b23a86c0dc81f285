//! # filekit
//!
//! Building blocks for a catalog of file-conversion tools. Every tool follows
//! the same lifecycle: an input is persisted to transient storage, handed to an
//! external process or an in-process library, and the output is written back
//! to storage where it can be downloaded.
//!
//! ## Modules
//!
//! - [`storage`]: the `uploads` / `processed` directories and file naming
//! - [`invoker`]: bounded `ffmpeg`-style process invocation
//! - [`media`]: argument builders for conversion, compression and chopping
//! - [`pdf`]: page ranges, rotation, split/organize/merge and watermarking
//! - [`compose`]: text and image to PDF composition
//! - [`docx`]: paragraph extraction from Word documents
//! - [`archive`]: ZIP bundling of multi-file outputs
//! - [`format`]: JSON, XML and SQL pretty printers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filekit::pdf::{parse_page_ranges, PdfFile};
//!
//! # fn main() -> filekit::Result<()> {
//! let bytes = std::fs::read("report.pdf")?;
//! let pdf = PdfFile::load(&bytes)?;
//! let groups = parse_page_ranges("1-3, 5", pdf.page_count())?;
//! for group in groups {
//!     let part = pdf.extract_pages(&group)?;
//!     println!("{} bytes", part.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod compose;
pub mod docx;
pub mod error;
pub mod format;
pub mod invoker;
pub mod media;
pub mod pdf;
pub mod storage;

pub use error::{FilekitError, Result};
pub use invoker::{InvokerConfig, ToolExecutionError, ToolInvoker, ToolOutput};
pub use pdf::{PdfError, PdfFile};
pub use storage::{StoredUpload, TransientStorage};
