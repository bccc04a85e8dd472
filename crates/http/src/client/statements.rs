//! Bank statement upload

use super::{ClientError, TrackerClient};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracker_core::ValidationError;
use tracker_core::types::TransactionSummary;
use tracker_core::validation::validators;

/// Content type sent for a statement file, by extension
fn statement_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv") => "text/csv",
        Some("pdf") => "application/pdf",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

impl TrackerClient {
    /// Upload a bank statement and get back the transactions parsed from it
    pub async fn upload_statement(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<TransactionSummary, ClientError> {
        validators::validate_not_empty(file_name, "file_name")?;
        if contents.is_empty() {
            return Err(ValidationError::new("file", "statement file is empty").into());
        }

        // Multipart bodies are streamed and cannot be cloned; rebuild the
        // form for the post-refresh retry instead
        let mime = statement_mime(file_name);
        let make = || -> Result<reqwest::Request, ClientError> {
            let part = Part::bytes(contents.clone())
                .file_name(file_name.to_string())
                .mime_str(mime)?;
            let form = Form::new().part("file", part);
            Ok(self.request(Method::POST, "/upload/").multipart(form).build()?)
        };

        let response = self.dispatch(make).await?;
        Ok(response.json().await?)
    }
}
