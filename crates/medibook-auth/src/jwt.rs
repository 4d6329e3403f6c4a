//! Bearer token issuance and verification

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use medibook_db::{Principal, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, TokenError};

/// Default token lifetime in days
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (principal ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Signs and verifies HS256 bearer tokens with one process-wide secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service; an empty secret is refused
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::Configuration(
                "token signing secret must not be empty".to_string(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(AuthError::Configuration(
                "token lifetime must be positive".to_string(),
            ));
        }

        // Expiry is checked against an injectable clock in `verify_at`
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a principal
    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue_at(principal, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        debug!("Issuing token for principal {}", principal.id);

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    ///
    /// The signature is checked before any claim is read; expiry is checked
    /// only on claims that verified.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!("Token rejected: {}", e);
                TokenError::InvalidSignature
            })?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn principal(role: Role) -> Principal {
        Principal {
            id: 42,
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            name: "A".to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> TokenService {
        TokenService::new("test-secret-key", Duration::days(DEFAULT_TOKEN_TTL_DAYS)).unwrap()
    }

    /// Replace one character in the middle of `segment` (0 = header, 1 = payload, 2 = signature)
    fn tamper(token: &str, segment: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let target = &mut parts[segment];
        let mid = target.len() / 2;
        let original = target.as_bytes()[mid];
        let replacement = if original == b'A' { 'B' } else { 'A' };
        target.replace_range(mid..mid + 1, &replacement.to_string());
        parts.join(".")
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = service();
        let p = principal(Role::Doctor);

        let claims = tokens.verify(&tokens.issue(&p).unwrap()).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_altered_payload_or_signature_is_invalid() {
        let tokens = service();
        let token = tokens.issue(&principal(Role::Patient)).unwrap();

        for segment in [1, 2] {
            assert_eq!(
                tokens.verify(&tamper(&token, segment)),
                Err(TokenError::InvalidSignature),
                "segment {segment}"
            );
        }
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let other = TokenService::new("another-secret", Duration::days(7)).unwrap();
        let token = other.issue(&principal(Role::Admin)).unwrap();

        assert_eq!(service().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(service().verify("invalid-token"), Err(TokenError::InvalidSignature));
        assert_eq!(service().verify(""), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = service();
        let issued = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let token = tokens.issue_at(&principal(Role::Patient), issued).unwrap();

        let just_before = issued + Duration::days(7) - Duration::seconds(1);
        let just_after = issued + Duration::days(7) + Duration::seconds(1);

        assert!(tokens.verify_at(&token, just_before).is_ok());
        assert_eq!(tokens.verify_at(&token, just_after), Err(TokenError::Expired));
    }

    #[test]
    fn test_forged_signature_is_checked_before_expiry() {
        let tokens = service();
        let issued = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let stale = tokens.issue_at(&principal(Role::Patient), issued).unwrap();

        assert_eq!(tokens.verify(&stale), Err(TokenError::Expired));
        assert_eq!(
            tokens.verify(&tamper(&stale, 2)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_empty_secret_is_refused() {
        assert!(matches!(
            TokenService::new("  ", Duration::days(7)),
            Err(AuthError::Configuration(_))
        ));
    }
}
