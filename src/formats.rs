//! Export formats supported for Google Docs.

use std::fmt;

use crate::error::{GdocError, Result};

/// Target content type and filename suffix for one export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    pub key: &'static str,
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Format table, keyed by lowercase format name.
static EXPORT_FORMATS: &[ExportFormat] = &[
    ExportFormat {
        key: "pdf",
        mime_type: "application/pdf",
        extension: ".pdf",
    },
    ExportFormat {
        key: "docx",
        mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        extension: ".docx",
    },
    ExportFormat {
        key: "odt",
        mime_type: "application/vnd.oasis.opendocument.text",
        extension: ".odt",
    },
    ExportFormat {
        key: "rtf",
        mime_type: "application/rtf",
        extension: ".rtf",
    },
    ExportFormat {
        key: "txt",
        mime_type: "text/plain",
        extension: ".txt",
    },
    ExportFormat {
        key: "html",
        mime_type: "text/html",
        extension: ".html",
    },
    ExportFormat {
        key: "epub",
        mime_type: "application/epub+zip",
        extension: ".epub",
    },
    ExportFormat {
        key: "md",
        mime_type: "text/markdown",
        extension: ".md",
    },
    ExportFormat {
        key: "markdown",
        mime_type: "text/markdown",
        extension: ".md",
    },
];

/// Format names shown in help and error messages.
pub const SUPPORTED_FORMATS: &str = "pdf, docx, odt, rtf, txt, html, epub, md";

impl ExportFormat {
    /// Look up a format by name, ignoring case.
    pub fn lookup(name: &str) -> Result<Self> {
        EXPORT_FORMATS
            .iter()
            .find(|format| format.key.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| GdocError::UnsupportedFormat(name.to_string()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key)
    }
}
