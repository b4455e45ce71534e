use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopDomainError {
    #[error("Invalid shop name: '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid shop domain format: '{0}'")]
    InvalidDomainFormat(String),
}

/// Canonical shop domain, always `{name}.myshopify.com` in lower case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Accepts loose user input: `Acme`, `acme.myshopify.com`, `https://acme.myshopify.com/`.
    pub fn normalize(raw: &str) -> Result<Self, ShopDomainError> {
        let lowered = raw.trim().to_lowercase();
        let without_scheme = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);
        let host = without_scheme.split(['/', '?', '#']).next().unwrap_or_default();
        let name = host.strip_suffix(SHOP_DOMAIN_SUFFIX).unwrap_or(host);

        if !is_valid_shop_name(name) {
            return Err(ShopDomainError::InvalidIdentifier(name.to_string()));
        }
        Ok(Self(format!("{name}{SHOP_DOMAIN_SUFFIX}")))
    }

    /// Accepts only a full domain, as sent back by the platform on the OAuth callback.
    pub fn parse_strict(raw: &str) -> Result<Self, ShopDomainError> {
        let lowered = raw.trim().to_lowercase();
        match lowered.strip_suffix(SHOP_DOMAIN_SUFFIX) {
            Some(name) if is_valid_shop_name(name) => Ok(Self(lowered)),
            _ => Err(ShopDomainError::InvalidDomainFormat(raw.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The shop name without the platform suffix, e.g. `acme`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.strip_suffix(SHOP_DOMAIN_SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// The name becomes part of a URL host.
fn is_valid_shop_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
