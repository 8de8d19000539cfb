//! Session tokens - HS256 JWTs with a fixed lifetime

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::UserId;

/// Every token expires this long after it was issued
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Shortest accepted signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    iat: i64,
    exp: i64,
}

/// Stateless issuer and verifier of session tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "token secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked against our own clock in verify_at
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn issue(&self, owner: UserId) -> Result<String> {
        self.issue_at(owner, Utc::now())
    }

    pub fn issue_at(&self, owner: UserId, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            user_id: owner.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Token(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<UserId> {
        self.verify_at(token, Utc::now())
    }

    /// Any signature, algorithm, structure, claim or expiry problem is
    /// reported as `InvalidToken` with no further detail.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(reason = %e, "token rejected");
            Error::InvalidToken
        })?;

        if now.timestamp() >= data.claims.exp {
            tracing::debug!("token expired");
            return Err(Error::InvalidToken);
        }

        UserId::parse(&data.claims.user_id).map_err(|_| Error::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(SECRET).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let svc = service();
        let owner = UserId::new();
        let token = svc.issue(owner).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), owner);
    }

    #[test]
    fn test_expiry_is_exactly_24_hours() {
        let svc = service();
        let owner = UserId::new();
        let issued = Utc::now();
        let token = svc.issue_at(owner, issued).unwrap();

        let just_before = issued + Duration::hours(24) - Duration::seconds(1);
        assert_eq!(svc.verify_at(&token, just_before).unwrap(), owner);

        let at_expiry = issued + Duration::hours(24);
        assert!(matches!(svc.verify_at(&token, at_expiry), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected_by_wall_clock() {
        let svc = service();
        let token = svc
            .issue_at(UserId::new(), Utc::now() - Duration::hours(25))
            .unwrap();
        assert!(matches!(svc.verify(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = service().issue(UserId::new()).unwrap();
        let other = TokenService::new(b"ffffffffffffffffffffffffffffffff").unwrap();
        assert!(matches!(other.verify(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let now = Utc::now();
        let claims = Claims {
            user_id: UserId::new().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(service().verify(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"user_id":"{}","iat":0,"exp":{}}}"#,
            UserId::new(),
            exp
        ));
        let token = format!("{}.{}.", header, payload);
        assert!(matches!(service().verify(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_malformed_and_bad_subject_rejected() {
        let svc = service();
        assert!(matches!(svc.verify(""), Err(Error::InvalidToken)));
        assert!(matches!(svc.verify("a.b.c"), Err(Error::InvalidToken)));

        let now = Utc::now();
        let claims = Claims {
            user_id: "not-a-uuid".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(svc.verify(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_short_secret_is_config_error() {
        assert!(matches!(TokenService::new(b"short"), Err(Error::Config(_))));
    }
}
