use serde::Serialize;
use std::collections::HashMap;

/// Header view of an incoming admin request. Keys are lowercase.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub headers: HashMap<String, String>,
}

impl Credentials {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            headers: pairs
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Who issued an admin command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub name: String,
    pub method: &'static str,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            method: "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_lowercases_names() {
        let creds = Credentials::from_pairs([("X-API-Key", "abc")]);
        assert_eq!(creds.header("x-api-key"), Some("abc"));
        assert_eq!(creds.header("X-API-Key"), None);
    }

    #[test]
    fn test_anonymous_caller() {
        let caller = Caller::anonymous();
        assert_eq!(caller.name, "anonymous");
        assert_eq!(caller.method, "none");
    }
}
