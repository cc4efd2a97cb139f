use crate::common::*;
use std::collections::HashMap;

/// A mailbox taken from a MAIL FROM / RCPT TO command together with any
/// ESMTP parameters that followed it.
///
/// `params == None` means no parameter region was present at all, which is
/// distinct from an empty map. Keys are stored uppercased, values verbatim;
/// a key given without `=` maps to the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub address: String,
    pub params: Option<HashMap<String, String>>,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Address {
            address: address.into(),
            params: None,
        }
    }
    pub fn with_params(address: impl Into<String>, params: HashMap<String, String>) -> Self {
        Address {
            address: address.into(),
            params: Some(params),
        }
    }
    /// The null sender `<>` of bounce messages.
    pub fn is_null(&self) -> bool {
        self.address.is_empty()
    }
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get(key))
            .map(String::as_str)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.address)?;
        if let Some(params) = &self.params {
            let mut keys: Vec<_> = params.keys().collect();
            keys.sort();
            for key in keys {
                match params[key].as_str() {
                    "" => write!(f, " {}", key)?,
                    value => write!(f, " {}={}", key, value)?,
                }
            }
        }
        Ok(())
    }
}
