//! Content-type driven body decoding.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Result, XhrError};

/// Opaque binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub data: Bytes,
}

impl Blob {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Blob(Blob),
}

impl ResponseBody {
    /// Decode `data` by `content_type`:
    /// - `application/json` parses to a JSON value
    /// - `text/*` and any `xml` type become text
    /// - everything else stays binary
    ///
    /// # Errors
    ///
    /// Returns [`XhrError::Decode`] when a JSON body does not parse.
    pub fn decode(content_type: &str, data: Bytes) -> Result<Self> {
        let lowered = content_type.trim().to_ascii_lowercase();

        if lowered.contains("application/json") {
            return serde_json::from_slice(&data)
                .map(ResponseBody::Json)
                .map_err(|e| XhrError::Decode {
                    content_type: content_type.to_string(),
                    message: e.to_string(),
                });
        }

        if lowered.starts_with("text/") || lowered.contains("xml") {
            return Ok(ResponseBody::Text(
                String::from_utf8_lossy(&data).into_owned(),
            ));
        }

        Ok(ResponseBody::Blob(Blob {
            mime_type: content_type.to_string(),
            data,
        }))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            ResponseBody::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// The text itself for textual bodies, otherwise the JSON-stringified
    /// value. A JSON string is already text and is returned unquoted. A blob
    /// has no enumerable fields and stringifies to `{}`.
    pub fn to_response_text(&self) -> String {
        match self {
            ResponseBody::Text(text) => text.clone(),
            ResponseBody::Json(Value::String(text)) => text.clone(),
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Blob(_) => "{}".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body() {
        let body = ResponseBody::decode("application/json", Bytes::from(r#"{"a":1}"#)).unwrap();

        assert_eq!(body.as_json(), Some(&json!({"a": 1})));
        assert_eq!(body.to_response_text(), r#"{"a":1}"#);
    }

    #[test]
    fn test_json_keeps_key_order() {
        let body =
            ResponseBody::decode("application/json", Bytes::from(r#"{"b":1,"a":2,"c":[3]}"#))
                .unwrap();

        assert_eq!(body.to_response_text(), r#"{"b":1,"a":2,"c":[3]}"#);
    }

    #[test]
    fn test_json_string_is_unquoted() {
        let body = ResponseBody::decode("application/json", Bytes::from(r#""hello""#)).unwrap();

        assert_eq!(body.as_json(), Some(&json!("hello")));
        assert_eq!(body.to_response_text(), "hello");
    }

    #[test]
    fn test_json_with_charset_parameter() {
        let body = ResponseBody::decode(
            "Application/JSON; charset=utf-8",
            Bytes::from("[1,2]"),
        )
        .unwrap();
        assert_eq!(body.as_json(), Some(&json!([1, 2])));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = ResponseBody::decode("application/json", Bytes::from("{nope")).unwrap_err();
        assert!(matches!(err, XhrError::Decode { .. }));

        // An empty JSON body does not parse either
        assert!(ResponseBody::decode("application/json", Bytes::new()).is_err());
    }

    #[test]
    fn test_textual_types() {
        for content_type in [
            "text/html; charset=utf-8",
            "text/plain",
            "application/xml",
            "application/xhtml+xml",
            "image/svg+xml",
        ] {
            let body = ResponseBody::decode(content_type, Bytes::from("<b>hi</b>")).unwrap();
            assert_eq!(body.as_text(), Some("<b>hi</b>"), "{}", content_type);
            assert_eq!(body.to_response_text(), "<b>hi</b>");
        }
    }

    #[test]
    fn test_other_types_are_blobs() {
        let data = Bytes::from(vec![0x89, 0x50, 0x4e, 0x47]);
        let body = ResponseBody::decode("image/png", data.clone()).unwrap();

        let blob = body.as_blob().unwrap();
        assert_eq!(blob.data, data);
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.size(), 4);
        assert_eq!(body.to_response_text(), "{}");
    }

    #[test]
    fn test_missing_content_type_is_blob() {
        let body = ResponseBody::decode("", Bytes::from("plain words")).unwrap();
        assert!(body.as_blob().is_some());
    }
}
