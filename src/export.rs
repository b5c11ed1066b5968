//! Writing exported documents to the local filesystem.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::client::DriveClient;
use crate::error::Result;
use crate::formats::ExportFormat;
use crate::models::{format_size, Document};

/// Characters that are invalid in filenames on common filesystems.
const INVALID_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replace each filesystem-invalid character with an underscore.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Destination path for `document` inside `output_dir`.
///
/// An empty or `.` directory places the file in the working directory.
pub fn output_path(output_dir: &Path, document: &Document, format: &ExportFormat) -> PathBuf {
    let filename = format!("{}{}", sanitize_filename(&document.name), format.extension);
    if output_dir.as_os_str().is_empty() || output_dir == Path::new(".") {
        PathBuf::from(filename)
    } else {
        output_dir.join(filename)
    }
}

/// Outcome of a batch export.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub exported: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Exports documents through a DriveClient into one output directory.
pub struct Exporter<'a> {
    client: &'a DriveClient,
    output_dir: PathBuf,
    format: ExportFormat,
}

impl<'a> Exporter<'a> {
    pub fn new(client: &'a DriveClient, output_dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Export a single document and return the path written.
    pub async fn export(&self, document: &Document) -> Result<PathBuf> {
        let path = output_path(&self.output_dir, document, &self.format);
        println!("\nExporting: {} -> {}", document.name, path.display());

        let bytes_written = self
            .client
            .export_document(&document.id, &self.format, &path)
            .await?;

        println!(
            "Exported {} bytes ({}) to {}",
            bytes_written,
            format_size(bytes_written),
            path.display()
        );
        println!("Export complete!");
        Ok(path)
    }

    /// Export every document in order. A failure is reported and the loop
    /// moves on to the next document.
    pub async fn export_all(&self, documents: &[Document]) -> ExportSummary {
        let mut summary = ExportSummary::default();

        for document in documents {
            match self.export(document).await {
                Ok(path) => summary.exported.push(path),
                Err(e) => {
                    warn!(document = %document.name, error = %e, "export failed");
                    eprintln!("Error exporting {}: {}", document.name, e);
                    summary.failed.push(document.name.clone());
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Document {
        Document {
            id: "id".to_string(),
            name: name.to_string(),
            description: None,
            modified_time: None,
            created_time: None,
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Report: Q1/Q2?"), "Report_ Q1_Q2_");
        assert_eq!(sanitize_filename(r#"a\b*c"d<e>f|g"#), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_filename("Plain name"), "Plain name");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("Café: menu"), "Café_ menu");
    }

    #[test]
    fn test_output_path_in_directory() {
        let pdf = ExportFormat::lookup("pdf").unwrap();
        let path = output_path(Path::new("downloads"), &doc("Report: Q1/Q2?"), &pdf);
        assert_eq!(path, Path::new("downloads").join("Report_ Q1_Q2_.pdf"));
    }

    #[test]
    fn test_output_path_current_directory() {
        let md = ExportFormat::lookup("markdown").unwrap();
        assert_eq!(
            output_path(Path::new("."), &doc("Notes"), &md),
            PathBuf::from("Notes.md")
        );
        assert_eq!(
            output_path(Path::new(""), &doc("Notes"), &md),
            PathBuf::from("Notes.md")
        );
    }
}
