use bytes::Bytes;
use serde::Deserialize;

use crate::config::ImageCdnConfig;

/// Client for the image CDN's direct-upload API. Files are posted as
/// multipart under the `file` field; the CDN answers with the stored id and
/// one URL per delivery variant.
pub struct ImageUploader {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    variant: String,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub id: String,
    pub url: String,
}

#[derive(Deserialize)]
struct UploadApiResponse {
    success: bool,
    result: Option<UploadApiResult>,
}

#[derive(Deserialize)]
struct UploadApiResult {
    id: String,
    variants: Vec<String>,
}

impl ImageUploader {
    pub fn new(config: &ImageCdnConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build upload client: {e}"))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            variant: config.variant.clone(),
        })
    }

    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<UploadedImage, String> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| format!("Invalid content type: {e}"))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Upload request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(1024)
                .collect::<String>();
            return Err(format!("Upload rejected with status {status}: {body}"));
        }

        let parsed: UploadApiResponse = resp
            .json()
            .await
            .map_err(|e| format!("Invalid upload response: {e}"))?;

        if !parsed.success {
            return Err("Upload reported failure".to_string());
        }

        let result = parsed
            .result
            .ok_or_else(|| "Upload response missing result".to_string())?;

        let url = select_variant(&result.variants, &self.variant)
            .ok_or_else(|| "Upload response contained no variants".to_string())?;

        Ok(UploadedImage {
            id: result.id,
            url,
        })
    }
}

/// Picks the delivery URL for the configured variant, falling back to the
/// first variant when no name matches.
fn select_variant(variants: &[String], variant: &str) -> Option<String> {
    let suffix = format!("/{variant}");
    variants
        .iter()
        .find(|v| v.ends_with(&suffix))
        .or_else(|| variants.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_matching_variant() {
        let variants = vec![
            "https://cdn.example.com/abc/thumbnail".to_string(),
            "https://cdn.example.com/abc/public".to_string(),
        ];
        assert_eq!(
            select_variant(&variants, "public").as_deref(),
            Some("https://cdn.example.com/abc/public")
        );
    }

    #[test]
    fn falls_back_to_first_variant() {
        let variants = vec!["https://cdn.example.com/abc/thumbnail".to_string()];
        assert_eq!(
            select_variant(&variants, "public").as_deref(),
            Some("https://cdn.example.com/abc/thumbnail")
        );
    }

    #[test]
    fn empty_variants_yield_none() {
        assert_eq!(select_variant(&[], "public"), None);
    }
}
