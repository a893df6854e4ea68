//! `POST /submit`: store a complaint and queue a reference to it.

use crate::server::AppState;
use axum::{Json, extract::State, http::StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use complaints_core::{Attachment, ComplaintMessage, RecordId, SubmittedRecord};
use complaints_web::{AppError, WebResult};
use serde::{Deserialize, Serialize};

/// Largest accepted attachment, after decoding.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Largest accepted `POST /submit` body. Leaves room for a maximal
/// attachment after base64 expansion plus the text fields.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Warning returned when the record was saved but not queued.
pub const QUEUE_WARNING: &str = "Message not queued to Kafka.";

const MAX_NAME_LEN: usize = 100;
const MAX_SUBJECT_LEN: usize = 255;

/// Submission body. Absent text fields deserialize as empty and are
/// rejected by [`SubmitRequest::into_record`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRequest {
    /// Submitter-supplied identifier.
    pub email_id: String,
    /// First name, at most 100 characters.
    pub first_name: String,
    /// Last name, at most 100 characters.
    pub last_name: String,
    /// Contact address.
    pub email: String,
    /// Subject, at most 255 characters.
    pub subject: String,
    /// Complaint text.
    pub body: String,
    /// Optional file.
    pub attachment: Option<AttachmentUpload>,
}

/// A file uploaded as base64.
#[derive(Debug, Deserialize)]
pub struct AttachmentUpload {
    /// Original file name.
    pub name: String,
    /// Standard base64 of the file contents.
    pub content_base64: String,
}

/// Response of `POST /submit`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// New record id.
    pub id: String,
    /// Always `"saved"`.
    pub status: &'static str,
    /// Set when the record could not be queued.
    pub warning: Option<&'static str>,
}

impl SubmitRequest {
    /// Validate and turn the request into a new record with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns a 422 [`AppError`] naming the first invalid field.
    pub fn into_record(self) -> Result<SubmittedRecord, AppError> {
        let email_id = required("email_id", self.email_id, None)?;
        let first_name = required("first_name", self.first_name, Some(MAX_NAME_LEN))?;
        let last_name = required("last_name", self.last_name, Some(MAX_NAME_LEN))?;
        let email = required("email", self.email, None)?;
        let subject = required("subject", self.subject, Some(MAX_SUBJECT_LEN))?;
        let body = required("body", self.body, None)?;

        if !email.contains('@') {
            return Err(AppError::validation("email must be a valid email address"));
        }

        let attachment = self.attachment.map(decode_attachment).transpose()?;

        Ok(SubmittedRecord {
            id: RecordId::generate(),
            email_id,
            first_name,
            last_name,
            email,
            subject,
            body,
            attachment,
            submitted_at: Utc::now(),
        })
    }
}

fn required(field: &str, value: String, max_len: Option<usize>) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if let Some(max) = max_len {
        if trimmed.chars().count() > max {
            return Err(AppError::validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(trimmed.to_string())
}

fn decode_attachment(upload: AttachmentUpload) -> Result<Attachment, AppError> {
    let name = required("attachment.name", upload.name, None)?;
    let data = STANDARD
        .decode(upload.content_base64.trim())
        .map_err(|e| AppError::validation(format!("attachment is not valid base64: {e}")))?;
    if data.len() > MAX_ATTACHMENT_BYTES {
        return Err(AppError::validation(format!(
            "attachment exceeds {MAX_ATTACHMENT_BYTES} bytes"
        )));
    }
    Ok(Attachment::new(name, data))
}

/// Store the complaint, then publish its reference.
///
/// A failed insert is a 500. A failed publish is not: the record is saved,
/// so the response is still 201 and carries [`QUEUE_WARNING`].
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> WebResult<(StatusCode, Json<SubmitResponse>)> {
    let record = request.into_record()?;
    let id = state.store.insert(&record).await?;

    let warning = match state
        .publisher
        .publish(&ComplaintMessage::for_record(&record))
        .await
    {
        Ok(()) => {
            tracing::info!(id = %id, "Complaint saved and queued");
            None
        }
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "Complaint saved but not queued");
            Some(QUEUE_WARNING)
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: id.to_string(),
            status: "saved",
            warning,
        }),
    ))
}
