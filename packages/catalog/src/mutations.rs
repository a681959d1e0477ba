//! Create and delete operations.
//!
//! Mutations go through the plain [`memoires_http::ApiClient`] and leave
//! the caches alone; call [`Catalog::refresh_all_data`] to see the result.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use memoires_http::{validate_file, ApiResponse, FileRules, FileUpload, Payload, RequestBody};

use crate::accessors::Catalog;
use crate::error::{Error, Result};
use crate::paths;

/// One failed deletion in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteFailure {
    pub id: u64,
    pub error: String,
}

/// Outcome of [`Catalog::delete_memoires`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchDeleteReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<DeleteFailure>,
}

impl BatchDeleteReport {
    fn record(&mut self, id: u64, outcome: Result<ApiResponse>) {
        match outcome {
            Ok(_) => self.success += 1,
            Err(error) => {
                self.failed += 1;
                self.errors.push(DeleteFailure {
                    id,
                    error: error.message(),
                });
            }
        }
    }
}

impl Catalog {
    /// Upload a thesis record. Always sent as multipart form data.
    pub async fn create_memoire(&self, payload: Payload) -> Result<ApiResponse> {
        let form = payload.to_form_data();
        debug!(fields = form.len(), "creating memoire");
        Ok(self
            .client
            .post(paths::MEMORIES_CREATE, RequestBody::Form(form))
            .await?)
    }

    /// Validate `file` against `rules`, then upload it with `fields`.
    ///
    /// Nothing is sent when the file is rejected.
    pub async fn create_memoire_with_file(
        &self,
        fields: Payload,
        field_name: &str,
        file: FileUpload,
        rules: &FileRules,
    ) -> Result<ApiResponse> {
        let validation = validate_file(&file, rules);
        if !validation.valid {
            warn!(file = %file.file_name, errors = ?validation.errors, "upload rejected");
            return Err(Error::InvalidFile {
                errors: validation.errors,
            });
        }

        self.create_memoire(fields.with(field_name, file)).await
    }

    pub async fn create_filiere(&self, data: Value) -> Result<ApiResponse> {
        Ok(self.client.post(paths::TRACKS, RequestBody::Json(data)).await?)
    }

    pub async fn create_encadreur(&self, data: Value) -> Result<ApiResponse> {
        Ok(self
            .client
            .post(paths::SUPERVISORS, RequestBody::Json(data))
            .await?)
    }

    pub async fn delete_memoire(&self, id: u64) -> Result<ApiResponse> {
        let response = self.client.delete(&paths::memoire_delete(id)).await?;
        info!(id, "memoire deleted");
        Ok(response)
    }

    /// Delete each id in turn, paced by the configured batch throttle.
    ///
    /// Individual failures are collected in the report; the batch itself
    /// never fails.
    pub async fn delete_memoires(&self, ids: &[u64]) -> BatchDeleteReport {
        let mut report = BatchDeleteReport {
            total: ids.len(),
            ..Default::default()
        };
        if ids.is_empty() {
            return report;
        }

        let outcomes = self
            .config
            .batch
            .run(ids.iter().copied(), |id| async move {
                (id, self.delete_memoire(id).await)
            })
            .await;

        for (id, outcome) in outcomes {
            if let Err(error) = &outcome {
                warn!(id, %error, "delete failed");
            }
            report.record(id, outcome);
        }

        info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            "batch delete finished"
        );
        report
    }
}
