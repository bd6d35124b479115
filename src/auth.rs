/// Authentication extractors and utilities
use crate::{api::middleware::extract_bearer_token, context::AppContext, error::ServiceError};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

/// Verified submitter identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// HS256 bearer token verifier
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Allow some clock skew (5 minutes)
        validation.leeway = 300;
        // Tokens without `exp` never expire; reject them
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a JWT token and extract the submitter identity.
    ///
    /// The identity comes from the `username` claim, falling back to `sub`.
    pub fn verify(&self, token: &str) -> Result<Identity, ServiceError> {
        let token_data = decode::<Value>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::warn!("JWT verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ServiceError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ServiceError::Authentication("Invalid token signature".to_string())
                }
                _ => ServiceError::Authentication(format!("Invalid token: {}", e)),
            }
        })?;

        let claims = &token_data.claims;
        let username = claims
            .get("username")
            .or_else(|| claims.get("sub"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ServiceError::Authentication("Token carries no username claim".to_string())
            })?;

        Ok(Identity {
            username: username.to_string(),
        })
    }
}

/// Authenticated context - extracts and validates the bearer token from the request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or_else(|| {
            ServiceError::Authentication("Missing authorization header".to_string())
        })?;

        let identity = state.token_verifier.verify(&token)?;
        Ok(AuthContext { identity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{token_for, TEST_JWT_SECRET};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn sign(claims: Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_username_claim() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        let identity = verifier.verify(&token_for("alice")).unwrap();
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn test_verify_falls_back_to_sub() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        let token = sign(json!({"sub": "bob", "exp": 4_102_444_800u64}), TEST_JWT_SECRET);
        assert_eq!(verifier.verify(&token).unwrap().username, "bob");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        let token = sign(
            json!({"username": "mallory", "exp": 4_102_444_800u64}),
            "another-secret-that-is-at-least-32-chars",
        );
        assert!(matches!(
            verifier.verify(&token),
            Err(ServiceError::Authentication(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        let token = sign(json!({"username": "alice", "exp": 1_000_000u64}), TEST_JWT_SECRET);
        let err = verifier.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_token_without_identity_rejected() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        let token = sign(json!({"exp": 4_102_444_800u64}), TEST_JWT_SECRET);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_token_without_exp_rejected() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        let token = sign(json!({"username": "alice"}), TEST_JWT_SECRET);
        assert!(matches!(
            verifier.verify(&token),
            Err(ServiceError::Authentication(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let verifier = TokenVerifier::new(TEST_JWT_SECRET);
        assert!(verifier.verify("not.a.jwt").is_err());
    }
}
