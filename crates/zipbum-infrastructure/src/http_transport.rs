//! HttpTransport - reqwest implementation of the backend transport.
//!
//! The backend authenticates with a session cookie set by its form login, so
//! the client keeps a cookie store for its whole lifetime.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use zipbum_core::api::endpoints;
use zipbum_core::config::ClientConfig;
use zipbum_core::transport::{FormRequest, Method, Transport, TransportError, parse_body};
use zipbum_core::{Result, ZipbumError};

const UNAUTHORIZED: u16 = 401;

/// Transport that talks to the chat backend over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds a client for `config.base_url`, applying the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder().cookie_store(true);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| ZipbumError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Signs in through the backend's login form.
    ///
    /// The backend redirects to the chat page on success and re-renders the
    /// login page otherwise.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        tracing::debug!(%email, "Logging in");

        let request = FormRequest::post(endpoints::LOGIN)
            .field("email", email)
            .field("password", password);
        let (status, final_path) = self.send_form(&request).await?;
        classify_login(status, &final_path)?;

        tracing::info!(%email, "Logged in");
        Ok(())
    }

    /// Sends a form and follows its redirects, returning the final status and path.
    async fn send_form(
        &self,
        request: &FormRequest,
    ) -> std::result::Result<(u16, String), TransportError> {
        let url = self.url(&request.endpoint);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url).form(&request.fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::network(err.to_string()))?;
        Ok((response.status().as_u16(), response.url().path().to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> std::result::Result<Value, TransportError> {
        tracing::debug!(%method, %endpoint, "Backend request");

        let url = self.url(endpoint);
        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|err| {
            tracing::debug!(%endpoint, error = %err, "Request did not complete");
            TransportError::network(err.to_string())
        })?;

        let status = response.status().as_u16();
        let final_path = response.url().path().to_string();
        let text = response.text().await.map_err(|err| {
            TransportError::network(format!("Failed to read response body: {err}"))
        })?;

        let result = classify_response(status, &final_path, endpoint, &text);
        if let Err(err) = &result {
            tracing::debug!(%endpoint, error = %err, "Backend request failed");
        }
        result
    }

    async fn submit(
        &self,
        request: FormRequest,
    ) -> std::result::Result<String, TransportError> {
        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            "Form submission"
        );

        let (status, final_path) = self.send_form(&request).await?;
        let final_path = classify_landing(status, final_path)?;
        tracing::debug!(endpoint = %request.endpoint, landed = %final_path, "Form submitted");
        Ok(final_path)
    }
}

/// Maps the end of a form's redirect chain to the landing page path.
fn classify_landing(
    status: u16,
    final_path: String,
) -> std::result::Result<String, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::Http {
            status,
            body: String::new(),
        });
    }
    Ok(final_path)
}

/// Decides a login from where its redirect chain ended.
///
/// Landing back on the login page means the credentials were rejected.
fn classify_login(status: u16, final_path: &str) -> Result<()> {
    let final_path = classify_landing(status, final_path.to_string())?;
    if final_path == endpoints::LOGIN {
        return Err(ZipbumError::auth("Invalid email or password"));
    }
    Ok(())
}

/// Maps a completed HTTP exchange to the transport contract.
///
/// A protected route that was redirected to the login page counts as
/// `401` even though the final page answered `200`.
fn classify_response(
    status: u16,
    final_path: &str,
    endpoint: &str,
    text: &str,
) -> std::result::Result<Value, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::Http {
            status,
            body: text.to_string(),
        });
    }

    if final_path == endpoints::LOGIN && endpoint != endpoints::LOGIN {
        return Err(TransportError::Http {
            status: UNAUTHORIZED,
            body: "Login required".to_string(),
        });
    }

    parse_body(text)
}
