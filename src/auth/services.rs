use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    claims::Claims,
    jwt::JwtKeys,
    password::{hash_password, verify_against_dummy, verify_password, PasswordError},
    repo::{StoreError, UserStore},
    repo_types::User,
    role::Role,
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("token generation failed: {0}")]
    TokenGeneration(#[source] jsonwebtoken::errors::Error),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

/// Outcome of a registration attempt. A taken email is not an error.
#[derive(Debug)]
pub enum Registration {
    Created(User),
    AlreadyExists,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    pub fn create_token(&self, role: Role) -> Result<String, AuthError> {
        self.keys.sign(role).map_err(AuthError::TokenGeneration)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.keys.verify(token).map_err(AuthError::InvalidToken)
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Registration, AuthError> {
        if self.store.find_by_email(email).await?.is_some() {
            info!("email already registered");
            return Ok(Registration::AlreadyExists);
        }

        let hash = hash_password(password)?;

        // A concurrent registration can win between the lookup and the insert;
        // the unique index reports that as Duplicate.
        match self.store.create_user(email, &hash, role).await {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "user registered");
                Ok(Registration::Created(user))
            }
            Err(StoreError::Duplicate) => {
                info!("email registered concurrently");
                Ok(Registration::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            verify_against_dummy(password);
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.create_token(user.role)?;
        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(token)
    }
}
