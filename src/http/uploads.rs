use actix_multipart::Field;
use chrono::Utc;
use error_stack::Report;
use futures::TryStreamExt;
use std::path::Path;
use thiserror::Error as ThisError;
use tokio::io::AsyncWriteExt;

use crate::types::Error as ErrorType;

use super::Error;

#[derive(Debug, ThisError)]
#[error("Failed to store uploaded file")]
struct StoreError;

// actix's multipart error is not Send + Sync, so failures are
// carried as printable attachments instead of report contexts.
fn store_error(e: impl std::fmt::Display) -> Error {
    Error::from_report(
        ErrorType::Internal,
        Report::new(StoreError).attach_printable(e.to_string()),
    )
}

/// Streams an uploaded profile photo into the uploads directory and
/// returns the stored file name. Names follow the upload timestamp
/// so they never collide with the previous photo.
#[tracing::instrument(skip_all)]
pub async fn save_profile_photo(dir: &Path, field: &mut Field) -> Result<String, Error> {
    if !field
        .content_type()
        .is_some_and(|m| m.type_() == mime::IMAGE)
    {
        return Err(Error::from(validation_error()));
    }

    let extension = field
        .content_disposition()
        .get_filename()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .unwrap_or("bin")
        .to_ascii_lowercase();

    let file_name = format!("{}.{extension}", Utc::now().timestamp_millis());
    let path = dir.join(&file_name);

    let mut file = tokio::fs::File::create(&path).await.map_err(store_error)?;

    while let Some(chunk) = field.try_next().await.map_err(store_error)? {
        file.write_all(&chunk).await.map_err(store_error)?;
    }

    file.flush().await.map_err(store_error)?;

    Ok(file_name)
}

fn validation_error() -> validator::ValidationErrors {
    let mut errors = validator::ValidationErrors::new();
    let mut error = validator::ValidationError::new("content_type");
    error.message = Some("Profile photo must be an image".into());
    errors.add("profilePhoto", error);
    errors
}
