//! Explicit session handle carrying the API root, credentials and tenant.
//!
//! # Design
//! A `Session` is built once by the caller and passed by reference into
//! every facade call. The facade never mutates it. `authorize` is the only
//! place credentials touch a request, so the `build_*` functions stay free
//! of auth concerns and their output can be compared verbatim in tests.

use std::env;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ApiError;
use crate::http::HttpRequest;

/// Header selecting the SiteWhere tenant.
pub const TENANT_HEADER: &str = "x-sitewhere-tenant";

#[derive(Clone, PartialEq, Eq)]
enum Credentials {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

/// Authentication context for the SiteWhere API.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    credentials: Credentials,
    tenant: Option<String>,
}

impl Session {
    /// `base_url` is the API root, e.g. `http://localhost:8080/sitewhere/api`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Credentials::None,
            tenant: None,
        }
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.credentials = Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        };
        self
    }

    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.credentials = Credentials::Bearer(token.to_string());
        self
    }

    pub fn with_tenant(mut self, tenant_token: &str) -> Self {
        self.tenant = Some(tenant_token.to_string());
        self
    }

    /// Build a session from `SITEWHERE_URL`, `SITEWHERE_USERNAME`,
    /// `SITEWHERE_PASSWORD`, `SITEWHERE_TOKEN` and `SITEWHERE_TENANT`.
    ///
    /// A bearer token takes precedence over basic credentials.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let base_url = lookup("SITEWHERE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::Config("SITEWHERE_URL is not set".to_string()))?;
        let mut session = Session::new(base_url.trim());

        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = set("SITEWHERE_TOKEN") {
            session = session.with_bearer_token(&token);
        } else if let Some(username) = set("SITEWHERE_USERNAME") {
            let password = lookup("SITEWHERE_PASSWORD").unwrap_or_default();
            session = session.with_basic_auth(&username, &password);
        }
        if let Some(tenant) = lookup("SITEWHERE_TENANT") {
            session = session.with_tenant(&tenant);
        }
        Ok(session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// Join the API root and a relative endpoint path with exactly one `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Resolve `request` against the API root and attach credentials,
    /// tenant and content type.
    pub fn authorize(&self, mut request: HttpRequest) -> HttpRequest {
        request.path = self.url(&request.path);
        if let Some(value) = self.authorization() {
            request.headers.push(("authorization".to_string(), value));
        }
        if let Some(tenant) = &self.tenant {
            request
                .headers
                .push((TENANT_HEADER.to_string(), tenant.clone()));
        }
        if request.body.is_some() {
            request
                .headers
                .push(("content-type".to_string(), "application/json".to_string()));
        }
        request
    }

    fn authorization(&self) -> Option<String> {
        match &self.credentials {
            Credentials::None => None,
            Credentials::Basic { username, password } => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{username}:{password}"))
            )),
            Credentials::Bearer(token) => Some(format!("Bearer {token}")),
        }
    }
}

// Credentials stay out of logs and panic messages.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match self.credentials {
            Credentials::None => "none",
            Credentials::Basic { .. } => "basic",
            Credentials::Bearer(_) => "bearer",
        };
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("auth", &auth)
            .field("tenant", &self.tenant)
            .finish()
    }
}
