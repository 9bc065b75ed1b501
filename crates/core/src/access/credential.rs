//! Authentication mechanism selection.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::asset::Visibility;
use crate::storage::{AuthMode, StorageAccountConfig};

/// Shared-key secret of a storage account, kept in its base64 form.
///
/// Holders can sign requests and issue signed-access tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountKey(Arc<str>);

impl AccountKey {
    /// Accept a base64 account key.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the key is not valid base64.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        let encoded = encoded.trim();
        BASE64.decode(encoded)?;
        Ok(Self(encoded.into()))
    }

    /// The key as configured, for handing to the storage client.
    #[must_use]
    pub fn as_base64(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccountKey(<redacted>)")
    }
}

/// Pre-issued, account-scoped access token in query-string form.
///
/// Stored without the leading `?`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token, dropping surrounding whitespace and a leading `?`.
    ///
    /// Returns `None` for a blank token.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().trim_start_matches('?');
        (!token.is_empty()).then(|| Self(token.to_string()))
    }

    /// Query string without the leading `?`.
    #[must_use]
    pub fn as_query(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// How a client authenticates against the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCredential {
    /// Anonymous client; every request is scoped by the pre-issued token.
    AccessToken(AccessToken),
    /// Requests signed with the account's shared key.
    SharedKey {
        /// Storage account name.
        account: String,
        /// Shared-key secret.
        key: AccountKey,
    },
    /// Bearer token from the platform identity service.
    ManagedIdentity {
        /// Specific identity to use; the default identity when `None`.
        client_id: Option<String>,
    },
}

impl ClientCredential {
    /// Secret able to issue signed-access tokens, if this credential has one.
    #[must_use]
    pub fn signing_key(&self) -> Option<&AccountKey> {
        match self {
            Self::SharedKey { key, .. } => Some(key),
            Self::AccessToken(_) | Self::ManagedIdentity { .. } => None,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessToken(_) => "access_token",
            Self::SharedKey { .. } => "shared_key",
            Self::ManagedIdentity { client_id: Some(_) } => "managed_identity",
            Self::ManagedIdentity { client_id: None } => "default_identity",
        }
    }
}

/// Picks the authentication mechanism for one operation.
pub struct CredentialResolver;

impl CredentialResolver {
    /// Select the credential for an asset of the given visibility.
    ///
    /// First match wins:
    /// 1. shared key with a pre-issued token, private asset: the token
    /// 2. shared key otherwise: the account key
    /// 3. managed identity with a client id: that identity
    /// 4. managed identity otherwise: the default identity
    #[must_use]
    pub fn resolve(config: &StorageAccountConfig, visibility: Visibility) -> ClientCredential {
        match &config.auth {
            AuthMode::SharedKey {
                pre_signed_access_token: Some(token),
                ..
            } if !visibility.is_public() => ClientCredential::AccessToken(token.clone()),
            AuthMode::SharedKey { secret, .. } => ClientCredential::SharedKey {
                account: config.account.clone(),
                key: secret.clone(),
            },
            AuthMode::ManagedIdentity { client_id } => ClientCredential::ManagedIdentity {
                client_id: client_id.clone(),
            },
        }
    }
}
