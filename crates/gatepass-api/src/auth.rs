//! HTTP Basic-auth extractor backed by the profile table.
//!
//! The username is the profile's email; the password is checked against the
//! argon2 PHC string stored with the profile.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use gatepass_core::{Error as CoreError, access::Actor, profile::Profile, store::ProfileStore};
use rand_core::OsRng;
use tracing::debug;

use crate::{ApiState, AppStore, error::ApiError};

/// Hash `password` into an argon2 PHC string suitable for a profile.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Split an `Authorization: Basic …` header into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Look up the profile for the request's credentials and verify its password.
pub async fn verify_auth<S: ProfileStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Profile, ApiError> {
  let (email, password) = basic_credentials(headers)?;

  let profile = store
    .find_profile_by_email(&email)
    .await
    .map_err(|e| CoreError::StoreUnavailable(Box::new(e)))?
    .ok_or_else(|| {
      debug!(%email, "unknown login");
      ApiError::Unauthorized
    })?;

  let parsed_hash =
    PasswordHash::new(&profile.password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| {
      debug!(%email, "password rejected");
      ApiError::Unauthorized
    })?;

  Ok(profile)
}

/// The authenticated profile behind a request.
///
/// A profile without a role still authenticates; it fails with
/// `RoleNotAssigned` only when [`Authenticated::actor`] is asked for.
pub struct Authenticated(pub Profile);

impl Authenticated {
  pub fn actor(&self) -> Result<Actor, ApiError> { Ok(Actor::from_profile(&self.0)?) }
}

impl<S: AppStore> FromRequestParts<ApiState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let profile = verify_auth(&parts.headers, state.store.as_ref()).await?;
    Ok(Authenticated(profile))
  }
}

/// `GET /me`
pub async fn me(Authenticated(profile): Authenticated) -> Json<Profile> {
  Json(profile)
}
