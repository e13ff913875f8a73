use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataUrlError {
    #[error("data URL must start with `data:`")]
    MissingScheme,
    #[error("data URL must carry a `;base64,` payload")]
    NotBase64,
    #[error("invalid MIME type `{0}`")]
    InvalidMimeType(String),
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// A `data:<mime-type>;base64,<payload>` string.
///
/// Only base64 data URLs are representable; the payload always uses the standard alphabet with
/// padding so the value can be embedded verbatim in JSON requests.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DataUrl {
    url: String,
    /// Byte offset where the payload starts (just past `;base64,`).
    payload_start: usize,
}

impl DataUrl {
    /// Encode `bytes` as a data URL of the given MIME type.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Result<Self, DataUrlError> {
        validate_mime_type(mime_type)?;
        let prefix = format!("{SCHEME}{mime_type}{BASE64_MARKER}");
        let payload_start = prefix.len();
        let mut url = prefix;
        BASE64_STANDARD.encode_string(bytes, &mut url);
        Ok(Self { url, payload_start })
    }

    /// Parse and validate an existing data URL.
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let rest = input
            .strip_prefix(SCHEME)
            .ok_or(DataUrlError::MissingScheme)?;
        let (mime_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or(DataUrlError::NotBase64)?;
        validate_mime_type(mime_type)?;
        BASE64_STANDARD.decode(payload)?;
        Ok(Self {
            url: input.to_string(),
            payload_start: input.len() - payload.len(),
        })
    }

    /// The declared MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.url[SCHEME.len()..self.payload_start - BASE64_MARKER.len()]
    }

    pub fn is_image(&self) -> bool {
        self.mime_type().starts_with("image/")
    }

    /// The base64 payload without the `data:...;base64,` prefix.
    pub fn payload(&self) -> &str {
        &self.url[self.payload_start..]
    }

    pub fn decode_payload(&self) -> Result<Vec<u8>, DataUrlError> {
        Ok(BASE64_STANDARD.decode(self.payload())?)
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

/// Accepts `<type>/<subtype>` with no parameters; parameters would collide with the `;base64`
/// marker.
fn validate_mime_type(mime_type: &str) -> Result<(), DataUrlError> {
    let invalid = || DataUrlError::InvalidMimeType(mime_type.to_string());
    let (kind, subtype) = mime_type.split_once('/').ok_or_else(invalid)?;
    let is_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.' | '_'))
    };
    if is_token(kind) && is_token(subtype) {
        Ok(())
    } else {
        Err(invalid())
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

// Data URLs can be megabytes long; keep `{:?}` output readable in logs.
impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUrl")
            .field("mime_type", &self.mime_type())
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

impl FromStr for DataUrl {
    type Err = DataUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for DataUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl From<DataUrl> for String {
    fn from(value: DataUrl) -> Self {
        value.url
    }
}

impl Serialize for DataUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for DataUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
