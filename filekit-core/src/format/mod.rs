//! Pretty printers for developer text.
//!
//! Every formatter is idempotent: formatting already formatted text returns
//! it unchanged.

mod json;
mod sql;
mod xml;

pub use json::format_json;
pub use sql::format_sql;
pub use xml::format_xml;

use crate::{FilekitError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Json,
    Xml,
    Sql,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Json => "json",
            Language::Xml => "xml",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = FilekitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Language::Json),
            "xml" => Ok(Language::Xml),
            "sql" => Ok(Language::Sql),
            other => Err(FilekitError::invalid(format!(
                "unsupported language '{other}'"
            ))),
        }
    }
}

/// Format `text` as `language`.
pub fn format_text(language: Language, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(FilekitError::invalid("nothing to format"));
    }
    match language {
        Language::Json => format_json(text),
        Language::Xml => format_xml(text),
        Language::Sql => format_sql(text),
    }
}
