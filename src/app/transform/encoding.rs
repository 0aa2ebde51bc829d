//! Text decoding of raw dataset inputs

use std::path::Path;

use crate::errors::{TransformError, TransformResult};

/// Decode `bytes` using the manifest-declared `encoding` (UTF-8 if absent)
pub fn decode(bytes: Vec<u8>, encoding: Option<&str>, path: &Path) -> TransformResult<String> {
    let normalized = encoding.map(|e| e.trim().to_ascii_lowercase());
    match normalized.as_deref() {
        None | Some("utf-8") | Some("utf8") => {
            let text = String::from_utf8(bytes).map_err(|_| TransformError::Decode {
                path: path.to_path_buf(),
                encoding: "utf-8".to_string(),
            })?;
            // BOM
            Ok(match text.strip_prefix('\u{feff}') {
                Some(stripped) => stripped.to_string(),
                None => text,
            })
        }
        Some("latin1") | Some("latin-1") | Some("iso-8859-1") | Some("iso8859-1") => {
            Ok(bytes.into_iter().map(char::from).collect())
        }
        Some(_) => Err(TransformError::UnsupportedEncoding {
            encoding: encoding.unwrap_or_default().to_string(),
        }),
    }
}
