use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use super::{
    check_status, http_client, http_error, ProviderError, ProviderResult, UploadProvider,
    UploadRequest, UploadedMedia,
};
use crate::config::UploadConfig;

const PROVIDER: &str = "upload service";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    resource_type: String,
}

/// Signed uploads to the media host
pub struct CloudinaryUploads {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryUploads {
    pub fn new(config: &UploadConfig) -> ProviderResult<Self> {
        Url::parse(&config.api_base)?;
        Ok(Self {
            client: http_client(60),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// SHA-256 over the alphabetically sorted `key=value` pairs joined with `&`,
/// followed by the API secret
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl UploadProvider for CloudinaryUploads {
    async fn upload(&self, request: UploadRequest) -> ProviderResult<UploadedMedia> {
        if !self.configured() {
            return Err(ProviderError::NotConfigured { provider: PROVIDER });
        }

        let endpoint = Url::parse(&format!(
            "{}/{}/{}/upload",
            self.api_base,
            self.cloud_name,
            request.resource_type.as_str()
        ))?;

        let params = vec![
            ("folder", request.folder.clone()),
            ("public_id", request.public_id.clone()),
            ("tags", request.tags.join(",")),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = sign_params(&params, &self.api_secret);

        let file = Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(&request.content_type)
            .map_err(http_error(PROVIDER))?;

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(http_error(PROVIDER))?;

        let uploaded: UploadResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        tracing::info!(public_id = %uploaded.public_id, "Uploaded media");

        Ok(UploadedMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            resource_type: uploaded.resource_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_ignores_param_order_and_empty_values() {
        let a = sign_params(
            &[("timestamp", "1".to_string()), ("folder", "clientflow/acme".to_string())],
            "secret",
        );
        let b = sign_params(
            &[
                ("folder", "clientflow/acme".to_string()),
                ("tags", String::new()),
                ("timestamp", "1".to_string()),
            ],
            "secret",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, sign_params(&[("timestamp", "1".to_string())], "secret"));
    }
}
