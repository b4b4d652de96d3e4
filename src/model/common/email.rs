use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A normalised (trimmed, lower-cased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalise an address without applying any acceptance policy.
    /// Used for lookups, where an unknown address is simply not found.
    pub fn normalise(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Accept an address only if its host is `domain` or one of its subdomains.
    pub fn institutional(raw: &str, domain: &str) -> Result<Self> {
        let email = Self::normalise(raw);
        let domain = domain.trim().trim_start_matches('@').to_lowercase();

        let accepted = match email.0.rsplit_once('@') {
            Some((local, host)) => {
                !local.is_empty()
                    && !local.contains(char::is_whitespace)
                    && (host == domain || host.ends_with(&format!(".{domain}")))
            }
            None => false,
        };

        if accepted {
            Ok(email)
        } else {
            Err(Error::InvalidEmailDomain(domain))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
