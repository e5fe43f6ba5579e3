//! Bearerトークンによる認証
//!
//! ハンドラーは生の資格情報を扱わない。[`Caller`] エクストラクターが
//! `Authorization: Bearer` トークンを [`TokenVerifier`] で検証し、
//! 得られた [`Identity`] をアプリケーション層に渡す。

use crate::config::AuthSettings;
use crate::domain::{Identity, Role};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use super::{error::ApiError, handlers::AppState};

/// 資格情報の検証エラー
#[derive(Debug, Error)]
pub enum AuthError {
    /// Authorizationヘッダーがない、またはBearerトークンがない
    #[error("missing bearer token")]
    MissingToken,

    /// JWTとして読めない
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// 署名の検証に失敗
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("invalid token audience")]
    InvalidAudience,

    #[error("invalid token issuer")]
    InvalidIssuer,

    /// `sub` も `email` も持たない
    #[error("token has no subject or email claim")]
    MissingSubject,
}

/// Bearerトークンを検証済みのクレームセットに変換する
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// `scope` / `scp` は空白区切りの文字列か配列
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScopeClaim {
    Joined(String),
    List(Vec<String>),
}

impl ScopeClaim {
    fn entries(&self) -> Vec<&str> {
        match self {
            ScopeClaim::Joined(s) => s.split_whitespace().collect(),
            ScopeClaim::List(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    email: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    scope: Option<ScopeClaim>,
    scp: Option<ScopeClaim>,
}

impl Claims {
    fn into_identity(self) -> Result<Identity, AuthError> {
        let roles: Vec<Role> = self
            .roles
            .iter()
            .map(String::as_str)
            .chain(self.scope.iter().flat_map(ScopeClaim::entries))
            .chain(self.scp.iter().flat_map(ScopeClaim::entries))
            .filter_map(Role::from_claim)
            .collect();

        let subject = self
            .sub
            .or_else(|| self.email.clone())
            .ok_or(AuthError::MissingSubject)?;

        Ok(Identity::new(subject, self.email, roles))
    }
}

/// `jsonwebtoken` によるHS256 JWT検証
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidFormat(e.to_string()),
            }
        })?;

        data.claims.into_identity()
    }
}

/// AuthorizationヘッダーからBearerトークンを取り出す
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 認証済みの呼び出し元
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;

        let identity = state.token_verifier.verify(token).await.map_err(|e| {
            tracing::warn!("authentication failed: {}", e);
            e
        })?;

        Ok(Caller(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        }
    }

    fn exp_in(seconds: i64) -> i64 {
        chrono::Utc::now().timestamp() + seconds
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_verify_reads_email_and_scopes() {
        let verifier = JwtVerifier::new(&settings());
        let token = sign(
            json!({
                "sub": "bwayne",
                "email": "bruce.wayne@example.com",
                "scope": "openid library_user",
                "exp": exp_in(60),
            }),
            SECRET,
        );

        let identity = verifier.verify(&token).await.unwrap();

        assert_eq!(identity.subject, "bwayne");
        assert_eq!(identity.email.as_deref(), Some("bruce.wayne@example.com"));
        assert!(identity.has_role(Role::LibraryUser));
        assert!(!identity.has_role(Role::LibraryCurator));
    }

    #[tokio::test]
    async fn test_verify_reads_roles_claim() {
        let verifier = JwtVerifier::new(&settings());
        let token = sign(
            json!({
                "sub": "alfred",
                "roles": ["ROLE_LIBRARY_CURATOR"],
                "scp": ["library_user"],
                "exp": exp_in(60),
            }),
            SECRET,
        );

        let identity = verifier.verify(&token).await.unwrap();

        assert!(identity.has_role(Role::LibraryCurator));
        assert!(identity.has_role(Role::LibraryUser));
        assert_eq!(identity.borrower_name(), "alfred");
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_secret() {
        let verifier = JwtVerifier::new(&settings());
        let token = sign(json!({"sub": "joker", "exp": exp_in(60)}), "other-secret");

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_expired_token() {
        let verifier = JwtVerifier::new(&settings());
        let token = sign(json!({"sub": "bwayne", "exp": exp_in(-3600)}), SECRET);

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let verifier = JwtVerifier::new(&settings());
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_requires_subject_or_email() {
        let verifier = JwtVerifier::new(&settings());
        let token = sign(json!({"scope": "library_user", "exp": exp_in(60)}), SECRET);

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::MissingSubject)
        ));
    }

    #[tokio::test]
    async fn test_verify_checks_audience_when_configured() {
        let verifier = JwtVerifier::new(&AuthSettings {
            audience: Some("library-server".to_string()),
            ..settings()
        });
        let token = sign(
            json!({"sub": "bwayne", "aud": "someone-else", "exp": exp_in(60)}),
            SECRET,
        );

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidAudience)
        ));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let (parts, _) = axum::http::Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let (parts, _) = axum::http::Request::builder()
            .header("Authorization", "Basic dXNlcjpzZWNyZXQ=")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);

        let (parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
