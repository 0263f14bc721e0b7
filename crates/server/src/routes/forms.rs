//! Multipart form parsing shared by the business and product routes.
//!
//! Both create/update endpoints accept `multipart/form-data` with text
//! fields plus at most one image file. This module flattens a request into
//! text fields and the optional file, so handlers only deal with typed
//! validation.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;

/// An uploaded file pulled out of a multipart request.
pub struct UploadedFile {
    /// Client-supplied filename, used only for its extension.
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// All text fields of a form plus the optional file under `file_field`.
pub struct ParsedForm {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl ParsedForm {
    /// Drain a multipart request, treating `file_field` as the single file
    /// input and everything else as text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the body is malformed.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == file_field {
                let file_name = field.file_name().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                if !data.is_empty() {
                    file = Some(UploadedFile {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid field '{name}': {e}")))?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, file })
    }

    /// A trimmed optional text field; empty strings count as absent.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    }

    /// A required text field.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the missing field.
    pub fn required_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::Validation(format!("missing required field '{name}'")))
    }

    /// A typed field parsed with `FromStr`, if present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the unparseable field.
    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| AppError::Validation(format!("invalid value for '{name}'")))
            })
            .transpose()
    }

    /// A required typed field parsed with `FromStr`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the field is missing or unparseable.
    pub fn required_parsed<T: std::str::FromStr>(&self, name: &str) -> Result<T, AppError> {
        self.parsed(name)?
            .ok_or_else(|| AppError::Validation(format!("missing required field '{name}'")))
    }
}
