use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::user::{Claims, UserId};

/// Tokens expire exactly one hour after issuance.
pub const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    /// Bad signature, malformed structure and expiry all collapse here.
    InvalidToken,
}

/// Issues and checks HS256 session tokens with a secret fixed for the
/// lifetime of the process.
#[derive(Clone)]
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let issued_at = now.timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn verify(&self, token: Option<&str>) -> Result<UserId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims.sub)
    }

    /// Resolves the caller of a protected route from its `Authorization` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<UserId, AuthError> {
        self.verify(bearer_token(headers))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn fresh_token_round_trips_user_id() {
        let auth = Authenticator::new("secret");
        let token = auth.issue("user-1").unwrap();
        assert_eq!(auth.verify(Some(&token)).unwrap(), "user-1");
    }

    #[test]
    fn expires_exactly_one_hour_after_issue() {
        let auth = Authenticator::new("secret");
        let issued = Utc::now();
        let token = auth.issue_at("user-1", issued).unwrap();

        let just_before = issued + Duration::seconds(TOKEN_LIFETIME_SECS - 1);
        assert_eq!(auth.verify_at(Some(&token), just_before).unwrap(), "user-1");

        let at_expiry = issued + Duration::seconds(TOKEN_LIFETIME_SECS);
        assert_eq!(
            auth.verify_at(Some(&token), at_expiry),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn token_issued_two_hours_ago_is_rejected_now() {
        let auth = Authenticator::new("secret");
        let token = auth
            .issue_at("user-1", Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(auth.verify(Some(&token)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn missing_token_is_distinct_from_invalid() {
        let auth = Authenticator::new("secret");
        assert_eq!(auth.verify(None), Err(AuthError::MissingToken));
        assert_eq!(auth.verify(Some("garbage")), Err(AuthError::InvalidToken));
        assert_eq!(auth.verify(Some("a.b.c")), Err(AuthError::InvalidToken));
    }

    #[test]
    fn foreign_secret_and_spliced_signature_rejected() {
        let auth = Authenticator::new("secret");
        let other = Authenticator::new("another-secret");

        let forged = other.issue("user-1").unwrap();
        assert_eq!(auth.verify(Some(&forged)), Err(AuthError::InvalidToken));

        let alice = auth.issue("alice").unwrap();
        let bob = auth.issue("bob").unwrap();
        let alice_sig = alice.rsplit('.').next().unwrap();
        let (bob_body, _) = bob.rsplit_once('.').unwrap();
        let spliced = format!("{}.{}", bob_body, alice_sig);
        assert_eq!(auth.verify(Some(&spliced)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearerabc")), None);
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("BEARER  abc")), Some("abc"));

        let auth = Authenticator::new("secret");
        let token = auth.issue("user-1").unwrap();
        let headers = headers_with(&format!("bearer {}", token));
        assert_eq!(auth.authenticate(&headers).unwrap(), "user-1");
    }

    #[test]
    fn authenticate_reads_authorization_header() {
        let auth = Authenticator::new("secret");
        let token = auth.issue("user-1").unwrap();

        let headers = headers_with(&format!("Bearer {}", token));
        assert_eq!(auth.authenticate(&headers).unwrap(), "user-1");
        assert_eq!(
            auth.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            auth.authenticate(&headers_with("Bearer nonsense")),
            Err(AuthError::InvalidToken)
        );
    }
}
