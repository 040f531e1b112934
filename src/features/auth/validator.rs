use super::model::{AuthenticatedUser, CustomClaims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "iss")]
    _iss: String,
    #[serde(rename = "exp")]
    _exp: u64,

    // School directory claims (user id + roles)
    #[serde(rename = "https://schoolreports.app/claims", default)]
    school: Option<CustomClaims>,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        // Without the directory claims we cannot map the token to a school user
        let school = claims.school.ok_or_else(|| {
            AppError::Auth("Token carries no school user claims".to_string())
        })?;

        Ok(AuthenticatedUser {
            user_id: school.user_id,
            sub: claims.sub,
            roles: school.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn validator() -> JwtValidator {
        JwtValidator::new(
            Arc::new(JwksClient::new(
                "https://id.school.test",
                Duration::from_secs(60),
            )),
            "https://id.school.test".to_string(),
            "report-assignments".to_string(),
            Duration::from_secs(0),
        )
    }

    #[tokio::test]
    async fn test_rejects_malformed_token() {
        let result = validator().validate_token("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_rejects_symmetric_algorithm() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": "u1", "iss": "https://id.school.test", "exp": 4_102_444_800u64 }),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let result = validator().validate_token(&token).await;

        match result {
            Err(AppError::Auth(msg)) => assert!(msg.contains("Unsupported algorithm")),
            other => panic!("expected auth error, got {:?}", other.map(|u| u.user_id)),
        }
    }

    #[tokio::test]
    async fn test_rejects_token_without_kid() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": "u1" }),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        // Re-label the header as RS256 so the kid check is reached
        let header = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &header;

        let result = validator().validate_token(&parts.join(".")).await;

        match result {
            Err(AppError::Auth(msg)) => assert!(msg.contains("kid")),
            other => panic!("expected auth error, got {:?}", other.map(|u| u.user_id)),
        }
    }
}
