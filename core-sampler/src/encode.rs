use base64::{engine::general_purpose::STANDARD, Engine as _};

/// MIME type used when the provider did not report one.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Render bytes as a `data:` URI with a padded standard-alphabet payload.
///
/// ```
/// assert_eq!(
///     core_sampler::encode_data_uri(Some("image/jpeg"), b"hi"),
///     "data:image/jpeg;base64,aGk="
/// );
/// ```
pub fn encode_data_uri(mime_type: Option<&str>, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type.unwrap_or(FALLBACK_MIME_TYPE),
        STANDARD.encode(bytes)
    )
}
