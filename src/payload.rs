//! Hand-off payload between the generation step and the checklist.
//!
//! The generated roadmap travels as `{"roadmap": "..."}`, percent-encoded
//! into a `data` URL parameter. Decoding tolerates raw (unencoded) JSON and a
//! bare JSON string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the URL parameter carrying the payload.
pub const DATA_PARAM: &str = "data";

pub const INVALID_SHAPE: &str = "Invalid payload. Expected { roadmap: string }.";
pub const INVALID_JSON: &str = "Failed to parse ?data JSON.";
pub const NO_DATA: &str = "No roadmap data found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapPayload {
    pub roadmap: String,
}

/// Outcome of decoding a `data` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "value")]
pub enum PayloadDecode {
    /// The roadmap text.
    Valid(String),
    /// No parameter was supplied.
    Missing,
    /// Why the parameter could not be used, as shown to the user.
    Invalid(String),
}

impl PayloadDecode {
    pub fn roadmap(&self) -> Option<&str> {
        match self {
            PayloadDecode::Valid(raw) => Some(raw),
            _ => None,
        }
    }

    /// User-facing message for the non-valid cases.
    pub fn message(&self) -> Option<&str> {
        match self {
            PayloadDecode::Valid(_) => None,
            PayloadDecode::Missing => Some(NO_DATA),
            PayloadDecode::Invalid(reason) => Some(reason),
        }
    }
}

/// Encodes a roadmap as a percent-encoded `{"roadmap": ...}` parameter value.
pub fn encode_payload(roadmap: &str) -> String {
    let payload = RoadmapPayload {
        roadmap: roadmap.to_string(),
    };
    // Serializing a struct of one String cannot fail.
    let json = serde_json::to_string(&payload).unwrap_or_default();
    urlencoding::encode(&json).into_owned()
}

/// Builds a link to `base` carrying the encoded roadmap.
pub fn payload_link(base: &str, roadmap: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{DATA_PARAM}={}", encode_payload(roadmap))
}

/// Decodes a `data` parameter value.
///
/// Percent-decoding is attempted first; if it fails the value is used as-is.
pub fn decode_payload(param: Option<&str>) -> PayloadDecode {
    let Some(param) = param.filter(|p| !p.is_empty()) else {
        return PayloadDecode::Missing;
    };
    let decoded = urlencoding::decode(param)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| param.to_string());

    match serde_json::from_str::<Value>(&decoded) {
        Ok(Value::Object(mut map)) => match map.remove("roadmap") {
            Some(Value::String(roadmap)) => PayloadDecode::Valid(roadmap),
            _ => PayloadDecode::Invalid(INVALID_SHAPE.to_string()),
        },
        Ok(Value::String(roadmap)) => PayloadDecode::Valid(roadmap),
        Ok(_) => PayloadDecode::Invalid(INVALID_SHAPE.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "payload is not JSON");
            PayloadDecode::Invalid(INVALID_JSON.to_string())
        }
    }
}

/// Pulls the `data` parameter out of a full URL or query string.
///
/// Returns `None` when `input` has no query or no `data` parameter. The value
/// is URL-decoded once (including `+` as space), as a browser would.
pub fn data_param_from_url(input: &str) -> Option<String> {
    let (_, query) = input.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        (name == DATA_PARAM).then(|| {
            let value = value.replace('+', " ");
            urlencoding::decode(&value)
                .map(|v| v.into_owned())
                .unwrap_or(value)
        })
    })
}

/// Whether `input` is a link (absolute URL, path or bare query) rather than a
/// parameter value. Raw JSON payloads may contain `?` and `://` in the text.
pub fn looks_like_url(input: &str) -> bool {
    let input = input.trim_start();
    if input.starts_with('{') || input.starts_with('"') {
        return false;
    }
    let before_query = input.split('?').next().unwrap_or_default();
    input.starts_with('?') || input.starts_with('/') || before_query.contains("://")
}

/// Resolves CLI-style input that is either a URL containing `?data=` or the
/// parameter value itself. A URL without a `data` parameter is `Missing`.
pub fn decode_input(input: &str) -> PayloadDecode {
    match data_param_from_url(input) {
        Some(param) => decode_payload(Some(&param)),
        None if looks_like_url(input) => PayloadDecode::Missing,
        None => decode_payload(Some(input)),
    }
}
