//! Shared-secret authentication for admin commands.

use async_trait::async_trait;

use super::{AuthError, Authenticator, Caller, Credentials};

/// Accepts `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn presented_key<'a>(&self, creds: &'a Credentials) -> Option<&'a str> {
        let bearer = creds.header("authorization").and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        });
        bearer.or_else(|| creds.header("x-api-key"))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, creds: &Credentials) -> Result<Caller, AuthError> {
        let presented = self.presented_key(creds).ok_or(AuthError::MissingCredentials)?;

        if keys_match(presented.as_bytes(), self.key.as_bytes()) {
            Ok(Caller {
                name: "admin".to_string(),
                method: "api_key",
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Compare without short-circuiting on the first differing byte.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
