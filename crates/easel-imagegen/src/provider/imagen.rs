//! Shared vocabulary and wire format for the Imagen `:predict` backends
//!
//! Both Gemini-family providers (direct Generative Language API and
//! Vertex AI) speak this format; they differ only in endpoint and
//! authentication.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Size tokens accepted on input: DALL-E compatible pixel dimensions
/// plus native aspect ratios
pub(crate) const SIZES: &[&str] = &[
    "1024x1024",
    "1792x1024",
    "1024x1792",
    "1:1",
    "16:9",
    "9:16",
    "4:3",
    "3:4",
];

pub(crate) const STYLES: &[&str] = &["vivid", "natural"];

/// Map an input size token onto the backend aspect-ratio vocabulary
///
/// Unrecognized tokens fall back to "1:1". Validation has already
/// checked membership in [`SIZES`]; the fallback keeps this a total
/// function regardless.
pub(crate) fn aspect_ratio_for(size: &str) -> &'static str {
    match size {
        "1792x1024" | "16:9" => "16:9",
        "1024x1792" | "9:16" => "9:16",
        "4:3" => "4:3",
        "3:4" => "3:4",
        _ => "1:1",
    }
}

/// Descriptive phrase appended to the prompt for a style token
///
/// Imagen has no native style parameter, so style is folded into the
/// prompt text itself.
pub(crate) fn style_phrase(style: &str) -> Option<&'static str> {
    match style {
        "vivid" => Some("vibrant colors, high contrast, dynamic composition"),
        "natural" => Some("natural lighting, realistic tones, soft composition"),
        _ => None,
    }
}

/// Append the style phrase to the prompt, preserving the prompt as prefix
pub(crate) fn fold_style_into_prompt(prompt: &str, style: &str) -> String {
    style_phrase(style).map_or_else(|| prompt.to_string(), |phrase| format!("{prompt}, {phrase}"))
}

/// Build the `:predict` request body
///
/// Caller-supplied `extra` entries are merged into the parameters
/// object and may override the safety defaults.
pub(crate) fn predict_body(prompt: &str, aspect_ratio: &str, extra: &Map<String, Value>) -> Value {
    let mut parameters = serde_json::json!({
        "sampleCount": 1,
        "aspectRatio": aspect_ratio,
        "safetyFilterLevel": "BLOCK_LOW_AND_ABOVE",
        "personGeneration": "ALLOW_ADULT",
    });

    if let Value::Object(ref mut map) = parameters {
        for (key, value) in extra {
            map.insert(key.clone(), value.clone());
        }
    }

    serde_json::json!({
        "instances": [{ "prompt": prompt }],
        "parameters": parameters,
    })
}

/// Wire format for the `:predict` response
#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<ImagenPrediction>,
}

/// The known prediction shapes, plus an explicit catch-all
///
/// The backend returns the base64 payload either at the top level of a
/// prediction or nested under an `image` wrapper, depending on the
/// response-wrapper version. Anything else decodes as `Unrecognized`
/// and is reported as a failure by the caller.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ImagenPrediction {
    Inline {
        #[serde(rename = "bytesBase64Encoded")]
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: Option<String>,
    },
    Wrapped {
        image: WrappedImage,
    },
    Unrecognized(Value),
}

#[derive(Debug, Deserialize)]
pub(crate) struct WrappedImage {
    #[serde(rename = "imageBytes")]
    data: String,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

impl ImagenPrediction {
    /// Render the prediction as a `data:` URI
    ///
    /// Returns `None` for the unrecognized shape or an invalid base64
    /// payload. The MIME type is sniffed from the decoded bytes when
    /// the backend omits it.
    pub(crate) fn to_data_url(&self) -> Option<String> {
        let (data, mime_type) = match self {
            Self::Inline { data, mime_type } => (data, mime_type.as_deref()),
            Self::Wrapped { image } => (&image.data, image.mime_type.as_deref()),
            Self::Unrecognized(value) => {
                tracing::warn!(shape = %value, "unrecognized prediction shape");
                return None;
            }
        };

        let bytes = BASE64.decode(data).ok()?;
        let mime = mime_type.unwrap_or_else(|| sniff_mime(&bytes));
        Some(format!("data:{mime};base64,{data}"))
    }
}

/// Send a prepared `:predict` request and normalize the first prediction
///
/// The caller supplies a fully-built request (endpoint, auth, JSON
/// body); this half owns status triage, wire parsing, and payload
/// decoding. Every failure is a message for the caller to fold into a
/// failed result.
pub(crate) async fn send_predict(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> std::result::Result<String, String> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(provider, error = %e, "image generation request failed");
        format!("failed to send request to image backend: {e}")
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
        tracing::error!(provider, status = %status, "image backend returned an error");
        return Err(format!("backend returned {status}: {error_text}"));
    }

    let wire: PredictResponse = response
        .json()
        .await
        .map_err(|e| format!("failed to parse backend response: {e}"))?;

    let Some(prediction) = wire.predictions.first() else {
        return Err("image generation returned no result".to_string());
    };

    prediction
        .to_data_url()
        .ok_or_else(|| "unrecognized response format".to_string())
}

/// Identify the image format from its magic bytes
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}
