//! Pre-upload checks for file-like values.

use serde::{Deserialize, Serialize};

use crate::payload::FileUpload;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Limits applied to an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRules {
    pub max_size_mb: f64,
    pub allowed_types: Vec<String>,
    /// Extensions with their leading dot, lower-case.
    pub allowed_extensions: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            max_size_mb: 10.0,
            allowed_types: vec!["application/pdf".to_string()],
            allowed_extensions: vec![".pdf".to_string()],
        }
    }
}

impl FileRules {
    pub fn max_size_bytes(&self) -> f64 {
        self.max_size_mb * BYTES_PER_MB
    }
}

/// Outcome of [`validate_file`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check `file` against `rules`, collecting every violation.
pub fn validate_file(file: &FileUpload, rules: &FileRules) -> FileValidation {
    let mut errors = Vec::new();

    if !rules.allowed_types.iter().any(|t| t == &file.mime_type) {
        errors.push(format!("MIME type not allowed: {}", file.mime_type));
    }

    let extension = file.extension();
    if !rules
        .allowed_extensions
        .iter()
        .any(|e| e.to_lowercase() == extension)
    {
        errors.push(format!("Extension not allowed: {}", extension));
    }

    let size = file.size() as f64;
    if size > rules.max_size_bytes() {
        errors.push(format!(
            "File too large ({:.2}MB > {}MB)",
            size / BYTES_PER_MB,
            rules.max_size_mb
        ));
    }

    FileValidation {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_pdf_passes_defaults() {
        let file = FileUpload::new("memoire.PDF", "application/pdf", vec![0; 1024]);
        let result = validate_file(&file, &FileRules::default());
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn every_violation_is_reported() {
        let file = FileUpload::new("notes.docx", "application/msword", vec![0; 2 * 1024 * 1024]);
        let rules = FileRules {
            max_size_mb: 1.0,
            ..FileRules::default()
        };

        let result = validate_file(&file, &rules);

        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "MIME type not allowed: application/msword".to_string(),
                "Extension not allowed: .docx".to_string(),
                "File too large (2.00MB > 1MB)".to_string(),
            ]
        );
    }

    #[test]
    fn exact_limit_is_allowed() {
        let rules = FileRules {
            max_size_mb: 1.0,
            ..FileRules::default()
        };
        let file = FileUpload::new("a.pdf", "application/pdf", vec![0; 1024 * 1024]);
        assert!(validate_file(&file, &rules).valid);

        let file = FileUpload::new("a.pdf", "application/pdf", vec![0; 1024 * 1024 + 1]);
        assert!(!validate_file(&file, &rules).valid);
    }
}
