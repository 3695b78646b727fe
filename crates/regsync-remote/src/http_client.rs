use std::time::Duration;

use ureq::{
    http::header::{ACCEPT, AUTHORIZATION},
    typestate::{WithBody, WithoutBody},
    Agent, RequestBuilder,
};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// A client without credentials using the `regsync/<version>` user agent.
    ///
    /// # Examples
    ///
    /// ```
    /// use regsync_remote::http_client::ClientConfig;
    ///
    /// let cfg = ClientConfig::default();
    /// assert!(cfg.user_agent.starts_with("regsync/"));
    /// assert!(cfg.token.is_none());
    /// ```
    fn default() -> Self {
        Self {
            user_agent: format!("regsync/{}", env!("CARGO_PKG_VERSION")),
            token: None,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP client from this config.
    ///
    /// Non-2xx statuses are returned as responses rather than errors so callers can map
    /// them onto [`crate::error::ErrorKind`] themselves.
    pub fn build(&self) -> HttpClient {
        let agent: Agent = Agent::config_builder()
            .timeout_global(self.timeout)
            .http_status_as_error(false)
            .user_agent(&self.user_agent)
            .build()
            .into();

        HttpClient {
            agent,
            token: self.token.clone(),
        }
    }
}

/// A `ureq` agent that attaches the bearer credential to every request.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
    token: Option<String>,
}

impl HttpClient {
    pub fn get(&self, url: &str) -> RequestBuilder<WithoutBody> {
        let req = self.agent.get(url);
        match &self.token {
            Some(token) => req.header(AUTHORIZATION, &format!("Bearer {token}")),
            None => req,
        }
    }

    pub fn post(&self, url: &str) -> RequestBuilder<WithBody> {
        let req = self.agent.post(url).header(ACCEPT, "application/json");
        match &self.token {
            Some(token) => req.header(AUTHORIZATION, &format!("Bearer {token}")),
            None => req,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_token() {
        let client = ClientConfig {
            token: Some("secret".into()),
            ..ClientConfig::default()
        }
        .build();
        assert!(client.has_token());
        let _req = client.get("https://example.com");
        let _req = client.post("https://example.com");
    }

    #[test]
    fn test_build_without_token() {
        let client = ClientConfig::default().build();
        assert!(!client.has_token());
    }
}
