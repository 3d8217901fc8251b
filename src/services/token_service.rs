//! Credential issuing and verification.
//!
//! Credentials are HS256 JSON Web Tokens carrying the account number they
//! were issued for and an expiry. They are not stored anywhere; verification
//! only needs the process-wide secret.
//!
//! # Algorithm pinning
//!
//! The verifier accepts HS256 and nothing else. The algorithm named in the
//! token header is never used to choose how to verify, so `none`, other HMAC
//! widths and asymmetric algorithms are all rejected.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::account::Account};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Payload of an issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Number of the account this credential grants access to
    #[serde(rename = "accountNumber")]
    pub account_number: i64,

    /// Expiry as a Unix timestamp in seconds
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// Mints and checks credentials with one symmetric secret.
///
/// Built once at startup from configuration and shared read-only between
/// requests.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a credential for `account`, valid for the configured lifetime.
    pub fn issue(&self, account: &Account) -> Result<String, AppError> {
        self.issue_at(account, Utc::now())
    }

    /// Issue a credential as if the current time were `issued_at`.
    pub fn issue_at(&self, account: &Account, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            account_number: account.number,
            expires_at: (issued_at + self.ttl).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Check signature, algorithm and expiry, and return the claims.
    ///
    /// Every failure collapses into [`AppError::PermissionDenied`]; the
    /// reason is only logged.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(reason = ?err.kind(), "credential rejected");
                AppError::PermissionDenied
            })
    }
}
