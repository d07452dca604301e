use super::model::AuthenticatedUser;
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
    // iss/aud/exp/nbf are checked by jsonwebtoken
    sub: String,
    #[serde(rename = "accountId", default)]
    account_id: Option<String>,
    #[serde(rename = "sid", default)]
    session_uid: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        // Service tokens have no account id; fall back to the subject
        let account_id = claims.account_id.unwrap_or_else(|| claims.sub.clone());

        AuthenticatedUser {
            account_id,
            sub: claims.sub,
            session_uid: claims.session_uid,
            roles: claims.roles,
        }
    }
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

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_to_user_prefers_account_id() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "user-sub",
            "accountId": "acc-1",
            "sid": "session-1",
            "roles": ["admin"]
        }))
        .unwrap();

        let user: AuthenticatedUser = claims.into();
        assert_eq!(user.account_id, "acc-1");
        assert_eq!(user.sub, "user-sub");
        assert_eq!(user.session_uid.as_deref(), Some("session-1"));
        assert!(user.has_admin_access());
    }

    #[test]
    fn test_claims_to_user_defaults() {
        let claims: Claims =
            serde_json::from_value(serde_json::json!({ "sub": "service-sub" })).unwrap();

        let user: AuthenticatedUser = claims.into();
        assert_eq!(user.account_id, "service-sub");
        assert!(user.session_uid.is_none());
        assert!(user.roles.is_empty());
    }

    #[tokio::test]
    async fn test_validate_token_rejects_garbage() {
        let validator = JwtValidator::new(
            Arc::new(JwksClient::new(
                "http://127.0.0.1:1/jwks",
                Duration::from_secs(60),
            )),
            "issuer".to_string(),
            "audience".to_string(),
            Duration::from_secs(0),
        );

        let result = validator.validate_token("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }
}
