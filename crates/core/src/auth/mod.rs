//! Admin command authentication.

mod api_key;
mod types;

pub use api_key::ApiKeyAuthenticator;
pub use types::{Caller, Credentials};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("Invalid API key")]
    InvalidCredentials,

    #[error("Auth configuration error: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, creds: &Credentials) -> Result<Caller, AuthError>;

    fn method_name(&self) -> &'static str;
}

/// Lets every caller through. Only used when `auth.method = "none"`.
#[derive(Debug, Default)]
pub struct OpenAuthenticator;

#[async_trait]
impl Authenticator for OpenAuthenticator {
    async fn authenticate(&self, _creds: &Credentials) -> Result<Caller, AuthError> {
        Ok(Caller::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(OpenAuthenticator)),
        AuthMethod::ApiKey => match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(Box::new(ApiKeyAuthenticator::new(key))),
            _ => Err(AuthError::Misconfigured(
                "auth.api_key is required for the api_key method".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_authenticator_allows_anyone() {
        let caller = OpenAuthenticator
            .authenticate(&Credentials::default())
            .await
            .unwrap();
        assert_eq!(caller, Caller::anonymous());
    }

    #[test]
    fn test_factory_selects_method() {
        let open = create_authenticator(&AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        })
        .unwrap();
        assert_eq!(open.method_name(), "none");

        let keyed = create_authenticator(&AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("k".to_string()),
        })
        .unwrap();
        assert_eq!(keyed.method_name(), "api_key");
    }

    #[test]
    fn test_factory_rejects_missing_key() {
        let result = create_authenticator(&AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some(String::new()),
        });
        assert!(matches!(result, Err(AuthError::Misconfigured(_))));
    }
}
