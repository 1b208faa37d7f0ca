//! Remote artifact descriptor helper
//!
//! Pure construction of access descriptors for artifacts whose payload
//! lives behind a backend HTTP endpoint. No network I/O here; the store
//! proxies the access URL at consumption time.

use crate::types::{ApiCredential, ArtifactSpec};

/// A backend data endpoint that remote artifacts point at.
///
/// Holds the base URL once and stamps out descriptors for individual
/// routes. The credential, if any, is attached to every descriptor
/// built from this endpoint.
#[derive(Clone, Debug)]
pub struct BackendEndpoint {
    base_url: String,
    credential: Option<ApiCredential>,
}

impl BackendEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: None,
        }
    }

    /// Attach a bearer token sent as an `Authorization` header.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(ApiCredential::authorization(format!(
            "Bearer {}",
            token.into()
        )));
        self
    }

    /// Attach an arbitrary header credential.
    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a remote artifact descriptor for `route` under this endpoint.
    pub fn artifact(&self, route: &str, title: impl Into<String>) -> ArtifactSpec {
        ArtifactSpec::Remote {
            title: title.into(),
            access_url: join_url(&self.base_url, route),
            credential: self.credential.clone(),
        }
    }
}

/// Join a base URL and a route without doubling or dropping the slash
/// between them. Purely textual; does not normalize anything else.
pub fn join_url(base: &str, route: &str) -> String {
    let base = base.trim_end_matches('/');
    let route = route.trim_start_matches('/');
    if route.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{route}")
    }
}
