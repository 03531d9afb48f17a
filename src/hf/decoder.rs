use crate::{
    config::ProviderConfig,
    error::{GenerationError, Result},
    models::{ImageArtifact, LocalOutput, RawResponse},
    presenter,
};
use base64::{engine::general_purpose, Engine};
use serde_json::Value;

/// Turns whatever a provider or local library returned into one artifact.
#[derive(Debug, Clone)]
pub struct ResponseDecoder {
    image_fields: Vec<String>,
}

impl ResponseDecoder {
    pub fn new<I, S>(image_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image_fields: image_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.image_fields.iter().cloned())
    }

    pub fn image_fields(&self) -> &[String] {
        &self.image_fields
    }

    pub fn decode(&self, raw: RawResponse) -> Result<ImageArtifact> {
        match raw {
            RawResponse::Http {
                content_type,
                status,
                body,
            } => self.decode_http(&content_type, status, body),
            RawResponse::Local(output) => decode_local(output),
        }
    }

    fn decode_http(&self, content_type: &str, status: u16, body: Vec<u8>) -> Result<ImageArtifact> {
        if content_type.trim().to_ascii_lowercase().starts_with("image") {
            log::debug!("Binary image payload ({}, {} bytes)", content_type, body.len());
            return presenter::from_encoded(body);
        }

        let payload: Value = serde_json::from_slice(&body).map_err(|_| {
            GenerationError::UnexpectedContentType {
                content_type: content_type.to_string(),
                status,
            }
        })?;

        if let Some(error) = payload.get("error").filter(|v| is_truthy(v)) {
            return Err(GenerationError::ProviderError {
                status,
                message: value_text(error),
            });
        }

        let (field, encoded) = self.find_encoded_image(&payload).ok_or_else(|| {
            GenerationError::UndecodableResponse(format!(
                "none of [{}] holds an image",
                self.image_fields.join(", ")
            ))
        })?;
        log::debug!("Decoding base64 image from '{}' field", field);

        let bytes = decode_base64_image(encoded)?;
        presenter::from_encoded(bytes)
    }

    /// First alias holding a non-empty list whose head is a string, or a
    /// bare non-empty string.
    fn find_encoded_image<'a>(&'a self, payload: &'a Value) -> Option<(&'a str, &'a str)> {
        self.image_fields.iter().find_map(|field| {
            let encoded = match payload.get(field.as_str())? {
                Value::Array(items) => items.first()?.as_str()?,
                Value::String(s) => s.as_str(),
                _ => return None,
            };
            Some((field.as_str(), encoded)).filter(|(_, s)| !s.trim().is_empty())
        })
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

fn decode_local(output: LocalOutput) -> Result<ImageArtifact> {
    let image = output.images.into_iter().next().ok_or_else(|| {
        GenerationError::UndecodableResponse("local model returned no images".into())
    })?;
    presenter::present(image)
}

fn decode_base64_image(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    let data = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    // wrapped payloads carry line breaks
    let compact: Vec<u8> = data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    general_purpose::STANDARD
        .decode(&compact)
        .map_err(|e| GenerationError::UndecodableResponse(format!("invalid base64 image: {}", e)))
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::tests::red_square_png;
    use image::{DynamicImage, Rgb, RgbImage};
    use serde_json::json;

    fn http(content_type: &str, status: u16, body: impl Into<Vec<u8>>) -> RawResponse {
        RawResponse::Http {
            content_type: content_type.to_string(),
            status,
            body: body.into(),
        }
    }

    fn b64(bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn image_content_type_decodes_body_directly() {
        let png = red_square_png();
        let artifact = ResponseDecoder::default()
            .decode(http("image/png", 200, png.clone()))
            .unwrap();
        assert_eq!(artifact.png, png);
        assert_eq!(
            artifact.image.to_rgb8(),
            image::load_from_memory(&png).unwrap().to_rgb8()
        );
    }

    #[test]
    fn image_content_type_wins_even_if_body_claims_error() {
        // a JSON-looking body under an image type is still treated as image bytes
        let err = ResponseDecoder::default()
            .decode(http("image/jpeg", 200, br#"{"error":"nope"}"#.to_vec()))
            .unwrap_err();
        assert!(matches!(err, GenerationError::UndecodableResponse(_)));
    }

    #[test]
    fn error_field_precedes_field_scan() {
        let body = json!({ "error": "X", "images": [b64(&red_square_png())] });
        let err = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap_err();
        match err {
            GenerationError::ProviderError { message, .. } => assert_eq!(message, "X"),
            other => panic!("expected ProviderError, got {:?}", other),
        }
    }

    #[test]
    fn structured_error_is_reported_verbatim() {
        let body = json!({ "error": { "code": 42 } });
        let err = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap_err();
        match err {
            GenerationError::ProviderError { message, .. } => assert_eq!(message, r#"{"code":42}"#),
            other => panic!("expected ProviderError, got {:?}", other),
        }
    }

    #[test]
    fn empty_error_field_is_ignored() {
        let png = red_square_png();
        let body = json!({ "error": "", "images": [b64(&png)] });
        let artifact = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap();
        assert_eq!(artifact.png, png);
    }

    #[test]
    fn images_field_base64_is_decoded() {
        let png = red_square_png();
        let body = json!({ "images": [b64(&png)] });
        let artifact = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap();
        assert_eq!(artifact.png, png);
    }

    #[test]
    fn aliases_are_scanned_in_order() {
        let png = red_square_png();
        let body = json!({ "images": [], "generated_images": [b64(&png)] });
        let artifact = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap();
        assert_eq!(artifact.png, png);

        let body = json!({ "image": format!("data:image/png;base64,{}", b64(&png)) });
        let artifact = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap();
        assert_eq!(artifact.png, png);
    }

    #[test]
    fn configured_aliases_replace_defaults() {
        let png = red_square_png();
        let body = json!({ "images": [b64(&png)], "output": [b64(&png)] });
        let decoder = ResponseDecoder::new(["output"]);
        assert!(decoder
            .decode(http("application/json", 200, body.to_string()))
            .is_ok());

        let decoder = ResponseDecoder::new(["artifacts"]);
        let err = decoder
            .decode(http("application/json", 200, body.to_string()))
            .unwrap_err();
        assert!(matches!(err, GenerationError::UndecodableResponse(_)));
    }

    #[test]
    fn missing_or_empty_fields_are_undecodable() {
        for body in [
            json!({}),
            json!({ "images": [] }),
            json!({ "images": [], "generated_images": [], "image": "" }),
            json!({ "images": [123] }),
            json!(["not", "an", "object"]),
        ] {
            let err = ResponseDecoder::default()
                .decode(http("application/json", 200, body.to_string()))
                .unwrap_err();
            assert!(
                matches!(err, GenerationError::UndecodableResponse(_)),
                "body {} gave {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn line_wrapped_base64_is_accepted() {
        let png = red_square_png();
        let encoded = b64(&png);
        let wrapped = encoded
            .as_bytes()
            .chunks(20)
            .map(|chunk| std::str::from_utf8(chunk).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        let body = json!({ "images": [wrapped] });
        let artifact = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap();
        assert_eq!(artifact.png, png);
    }

    #[test]
    fn bad_base64_is_undecodable() {
        let body = json!({ "images": ["***not base64***"] });
        let err = ResponseDecoder::default()
            .decode(http("application/json", 200, body.to_string()))
            .unwrap_err();
        assert!(matches!(err, GenerationError::UndecodableResponse(_)));
    }

    #[test]
    fn non_json_non_image_reports_content_type_and_status() {
        let err = ResponseDecoder::default()
            .decode(http("text/html; charset=utf-8", 202, "<html>busy</html>"))
            .unwrap_err();
        match err {
            GenerationError::UnexpectedContentType {
                content_type,
                status,
            } => {
                assert_eq!(content_type, "text/html; charset=utf-8");
                assert_eq!(status, 202);
            }
            other => panic!("expected UnexpectedContentType, got {:?}", other),
        }
    }

    #[test]
    fn local_output_takes_first_image() {
        let first = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 3, Rgb([0, 255, 0])));
        let second = DynamicImage::ImageRgb8(RgbImage::from_pixel(9, 9, Rgb([0, 0, 255])));
        let artifact = ResponseDecoder::default()
            .decode(RawResponse::Local(LocalOutput {
                images: vec![first, second],
            }))
            .unwrap();
        assert_eq!((artifact.width(), artifact.height()), (2, 3));
    }

    #[test]
    fn local_output_without_images_is_an_error() {
        let err = ResponseDecoder::default()
            .decode(RawResponse::Local(LocalOutput::default()))
            .unwrap_err();
        assert!(matches!(err, GenerationError::UndecodableResponse(_)));
    }
}
