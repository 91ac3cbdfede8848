use chrono::Utc;

/// Extension used when the uploaded file name has none.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Lower-cased extension of `file_name`, or [`DEFAULT_EXTENSION`].
pub fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
