use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::attendance::error::BiometricError;

/// Confirms that a captured face belongs to the employee.
#[async_trait]
pub trait BiometricVerifier: Send + Sync {
    async fn verify(&self, employee_id: u64, image: &[u8]) -> Result<bool, BiometricError>;
}

/// Used when no face service is configured; accepts everyone.
pub struct DisabledVerifier;

#[async_trait]
impl BiometricVerifier for DisabledVerifier {
    async fn verify(&self, _employee_id: u64, _image: &[u8]) -> Result<bool, BiometricError> {
        Ok(true)
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    employee_id: u64,
    image_base64: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(rename = "match")]
    matched: bool,
}

/// Face matching service reached over HTTP.
///
/// POSTs `{"employee_id", "image_base64"}` and expects `{"match": bool}`.
pub struct RemoteFaceVerifier {
    http_client: Client,
    url: String,
}

impl RemoteFaceVerifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BiometricError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl BiometricVerifier for RemoteFaceVerifier {
    async fn verify(&self, employee_id: u64, image: &[u8]) -> Result<bool, BiometricError> {
        let encoded = BASE64_STANDARD.encode(image);

        let response = self
            .http_client
            .post(&self.url)
            .json(&VerifyRequest {
                employee_id,
                image_base64: &encoded,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BiometricError::Status(status.as_u16()));
        }

        let body: VerifyResponse = response.json().await?;
        tracing::debug!(employee_id, matched = body.matched, "Face verification answered");

        Ok(body.matched)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn disabled_verifier_accepts() {
        assert!(DisabledVerifier.verify(1, b"").await.unwrap());
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(VerifyRequest {
            employee_id: 7,
            image_base64: "aGk=",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"employee_id": 7, "image_base64": "aGk="}));

        let parsed: VerifyResponse = serde_json::from_str(r#"{"match": true, "score": 0.31}"#).unwrap();
        assert!(parsed.matched);
    }

    #[actix_web::test]
    async fn unreachable_service_is_an_error() {
        let verifier =
            RemoteFaceVerifier::new("http://127.0.0.1:9/verify", Duration::from_millis(200)).unwrap();
        assert!(verifier.verify(1, b"jpeg").await.is_err());
    }
}
