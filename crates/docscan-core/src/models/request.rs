//! Extraction request and its wire form.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// A single extraction request: either the full file content or a path.
///
/// Input arriving as a one-shot stream must be read to the end first; the
/// PDF-then-image fallback re-reads the same buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRequest {
    /// Complete file content, format undeclared.
    Bytes(Vec<u8>),
    /// File on disk, format declared by its extension.
    Path(PathBuf),
}

impl ExtractionRequest {
    /// Build a request from the two optional inputs.
    ///
    /// Empty buffers and empty strings count as unset. Exactly one input
    /// must remain.
    pub fn from_parts(
        file_content: Option<Vec<u8>>,
        file_path: Option<String>,
    ) -> Result<Self, ExtractionError> {
        let content = file_content.filter(|c| !c.is_empty());
        let path = file_path.filter(|p| !p.is_empty());

        match (content, path) {
            (Some(bytes), None) => Ok(ExtractionRequest::Bytes(bytes)),
            (None, Some(path)) => Ok(ExtractionRequest::Path(PathBuf::from(path))),
            (None, None) => Err(ExtractionError::InvalidRequest(
                "either filePath or fileContent must be provided".to_string(),
            )),
            (Some(_), Some(_)) => Err(ExtractionError::InvalidRequest(
                "only one of filePath or fileContent may be provided".to_string(),
            )),
        }
    }
}

/// JSON form of a request: `{ "fileContent": "<base64>", "filePath": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrInput {
    /// Base64-encoded file content.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub file_content: Option<Vec<u8>>,

    /// Path to a file on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl TryFrom<OcrInput> for ExtractionRequest {
    type Error = ExtractionError;

    fn try_from(input: OcrInput) -> Result<Self, Self::Error> {
        ExtractionRequest::from_parts(input.file_content, input.file_path)
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|s| STANDARD.decode(s.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_both_unset_is_invalid() {
        let err = ExtractionRequest::from_parts(None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_empty_inputs_count_as_unset() {
        let err = ExtractionRequest::from_parts(Some(vec![]), Some(String::new())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let request = ExtractionRequest::from_parts(Some(vec![]), Some("a.png".into())).unwrap();
        assert_eq!(request, ExtractionRequest::Path(PathBuf::from("a.png")));
    }

    #[test]
    fn test_both_set_is_invalid() {
        let err = ExtractionRequest::from_parts(Some(vec![1]), Some("a.png".into())).unwrap_err();
        assert!(err.to_string().contains("only one"));
    }

    #[test]
    fn test_wire_form_decodes_base64() {
        let input: OcrInput = serde_json::from_str(r#"{ "fileContent": "JVBERi0=" }"#).unwrap();
        let request = ExtractionRequest::try_from(input).unwrap();
        assert_eq!(request, ExtractionRequest::Bytes(b"%PDF-".to_vec()));
    }

    #[test]
    fn test_wire_form_rejects_bad_base64() {
        let parsed = serde_json::from_str::<OcrInput>(r#"{ "fileContent": "***" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_wire_form_path_only() {
        let input: OcrInput = serde_json::from_str(r#"{ "filePath": "scan.pdf" }"#).unwrap();
        assert_eq!(input.file_content, None);
        let request = ExtractionRequest::try_from(input).unwrap();
        assert_eq!(request, ExtractionRequest::Path(PathBuf::from("scan.pdf")));
    }
}
