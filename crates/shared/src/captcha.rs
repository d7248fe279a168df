//! CAPTCHA verification against a `siteverify`-style endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::CaptchaConfig;

/// CAPTCHA verification errors.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The verification endpoint could not be reached or answered garbage.
    #[error("CAPTCHA verification failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The verification endpoint answered with an error status.
    #[error("CAPTCHA verification returned status {0}")]
    Status(u16),
}

#[derive(Deserialize)]
struct VerifyResponse {
    success: bool,
}

/// Verifies CAPTCHA responses submitted with the public issue form.
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    http: Client,
    config: CaptchaConfig,
}

impl CaptchaVerifier {
    /// Creates a new verifier.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Request` if the HTTP client cannot be built.
    pub fn new(config: CaptchaConfig) -> Result<Self, CaptchaError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Site key to embed in the form.
    #[must_use]
    pub fn site_key(&self) -> &str {
        &self.config.site_key
    }

    /// Checks a visitor's CAPTCHA response.
    ///
    /// A configured override short-circuits the remote call. A blank
    /// response never verifies.
    ///
    /// # Errors
    ///
    /// Returns an error if the verification endpoint is unreachable or fails.
    pub async fn verify(
        &self,
        response: &str,
        remote_ip: Option<&str>,
    ) -> Result<bool, CaptchaError> {
        if let Some(pinned) = self.config.override_result {
            debug!(pinned, "CAPTCHA outcome pinned by configuration");
            return Ok(pinned);
        }

        if response.trim().is_empty() {
            return Ok(false);
        }

        let mut form = vec![
            ("secret", self.config.secret.as_str()),
            ("response", response),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let reply = self
            .http
            .post(&self.config.verify_url)
            .form(&form)
            .send()
            .await?;

        if !reply.status().is_success() {
            return Err(CaptchaError::Status(reply.status().as_u16()));
        }

        let body: VerifyResponse = reply.json().await?;
        Ok(body.success)
    }
}
