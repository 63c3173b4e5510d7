/// Multipart form reading
///
/// Buffers text fields and file parts of a `multipart/form-data` body.
/// Parts are size-capped; empty file inputs are treated as absent.

use actix_multipart::Multipart;
use futures::StreamExt;
use std::collections::HashMap;

use crate::error::{AppError, ValidationError};
use crate::media::MediaFile;

const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
const MAX_TEXT_BYTES: usize = 16 * 1024;

#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, MediaFile>,
}

fn malformed(err: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(ValidationError::MalformedBody(err.to_string()))
}

pub async fn read_form(mut payload: Multipart) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;

        let disposition = field.content_disposition().clone();
        let name = match disposition.get_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let file_name = disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let limit = if file_name.is_some() {
            MAX_FILE_BYTES
        } else {
            MAX_TEXT_BYTES
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(malformed)?;
            if bytes.len() + chunk.len() > limit {
                return Err(ValidationError::TooLong(format!("{} (bytes)", name), limit).into());
            }
            bytes.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) if !bytes.is_empty() => {
                form.files.insert(
                    name,
                    MediaFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            }
            Some(_) => {}
            None => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| ValidationError::InvalidFormat(name.clone()))?;
                form.fields.insert(name, text);
            }
        }
    }

    Ok(form)
}
