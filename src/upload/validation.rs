use super::error::UploadError;
use super::types::SelectedFile;

pub const MAX_FILE_MIB: u64 = 50;
pub const MAX_FILE_BYTES: u64 = MAX_FILE_MIB * 1024 * 1024;

const ACCEPTED_MIME_TYPES: [&str; 3] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
];

const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".csv"];

/// Size first, then type. Either a matching MIME type or extension is enough.
pub fn validate_file(file: &SelectedFile) -> Result<(), UploadError> {
    if file.size > MAX_FILE_BYTES {
        return Err(UploadError::FileTooLarge { size: file.size });
    }

    if !is_supported_file(&file.name, file.content_type.as_deref()) {
        return Err(UploadError::UnsupportedType {
            name: file.name.clone(),
        });
    }

    Ok(())
}

pub fn is_supported_file(name: &str, content_type: Option<&str>) -> bool {
    if let Some(content_type) = content_type {
        if ACCEPTED_MIME_TYPES.contains(&content_type) {
            return true;
        }
    }

    let name = name.to_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
