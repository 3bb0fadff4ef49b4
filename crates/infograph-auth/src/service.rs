//! [`AuthService`]: identity assertion in, local user and session token out.

use chrono::{DateTime, Utc};
use infograph_core::{
  store::UserStore,
  user::{NewUser, User},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{AuthConfig, AuthError, Claims, IdentityVerifier, VerifyError};

const ALGORITHM: Algorithm = Algorithm::HS256;

pub struct AuthService<U, V> {
  users:    U,
  verifier: V,
  config:   AuthConfig,
  encoding: EncodingKey,
  decoding: DecodingKey,
}

impl<U: UserStore, V: IdentityVerifier> AuthService<U, V> {
  pub fn new(users: U, verifier: V, config: AuthConfig) -> Self {
    let secret = config.jwt_secret.as_bytes();
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      users,
      verifier,
      config,
    }
  }

  pub fn config(&self) -> &AuthConfig { &self.config }

  /// Verify an external credential, resolve or create its local user, and
  /// issue a session token for it.
  ///
  /// An existing user is returned as stored: sign-in never rewrites the
  /// email or name captured the first time a subject was seen.
  pub async fn authenticate(&self, credential: &str) -> Result<(User, String), AuthError> {
    let identity = self
      .verifier
      .verify(credential, &self.config.google_client_id)
      .await
      .map_err(|e| match e {
        VerifyError::Rejected(reason) => {
          tracing::warn!(%reason, "identity assertion rejected");
          AuthError::InvalidCredential(reason)
        }
        VerifyError::Unavailable(reason) => {
          tracing::error!(%reason, "identity provider unavailable");
          AuthError::VerifierUnavailable(reason)
        }
      })?;

    let email = non_empty(identity.email)
      .ok_or_else(|| AuthError::InvalidCredential("assertion has no email".into()))?;
    let name = non_empty(identity.name).unwrap_or_else(|| email.clone());
    if identity.subject.trim().is_empty() {
      return Err(AuthError::InvalidCredential("assertion has no subject".into()));
    }

    let user = match self.users.get_user_by_google_id(&identity.subject).await? {
      Some(user) => user,
      None => {
        let new = NewUser { email, name, google_id: identity.subject };
        self.users.create_user(new).await?
      }
    };

    let token = self.issue_token(user.user_id)?;
    tracing::info!(user_id = %user.user_id, "signed in");
    Ok((user, token))
  }

  pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
    self.issue_token_at(user_id, Utc::now())
  }

  /// Sign a token as if issued at `issued_at`.
  pub fn issue_token_at(
    &self,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
  ) -> Result<String, AuthError> {
    let claims = Claims::new(user_id, issued_at, self.config.token_ttl());
    jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
      .map_err(AuthError::Signing)
  }

  /// Check signature, expiry and payload shape.
  pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
      .map(|data| data.claims)
      .map_err(|e| {
        tracing::warn!(error = %e, "session token rejected");
        AuthError::InvalidToken
      })
  }

  /// Resolve the live user behind a session token. Never served from a
  /// cache, so deletions and renames show up while the token is still valid.
  pub async fn resolve_user_from_token(&self, token: &str) -> Result<User, AuthError> {
    let claims = self.decode_token(token)?;
    self
      .users
      .get_user(claims.user_id)
      .await?
      .ok_or(AuthError::UserNotFound)
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}
