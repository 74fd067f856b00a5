use crate::{
    config::AttachmentConfig,
    domain::AttachmentUpload,
    error::{AppError, Result},
};

/// Checks an announcement attachment before it is relayed to the backend.
pub fn validate_upload(upload: &AttachmentUpload, config: &AttachmentConfig) -> Result<()> {
    if upload.data.is_empty() {
        return Err(AppError::Validation("Attached file is empty".to_string()));
    }

    if upload.data.len() > config.max_bytes {
        return Err(AppError::Validation(format!(
            "File too large (max {} MB)",
            config.max_bytes / (1024 * 1024)
        )));
    }

    let extension = file_extension(&upload.file_name)
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    if !config
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            config.allowed_extensions.join(", ")
        )));
    }

    Ok(())
}

/// Lower-cased extension, if the name has one.
fn file_extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_lowercase())
}
