//! User accounts: registration, login, profile fetch and update.

use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, instrument, warn};

use stealth_core::{Email, EmailError, UserId};

use crate::api::decode::{ObjectShape, decode_object};
use crate::api::{ApiClient, ApiError, ApiRequest, endpoints};
use crate::models::{LoginRequest, RegisterUser, UserRecord, UserUpdate};

/// Login answers with the user either bare or wrapped as `{"user": {...}}`.
const USER_SHAPES: &[ObjectShape] = &[ObjectShape::Envelope("user"), ObjectShape::Bare];

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend signals bad credentials with 418.
    #[error("Authentication failed. Please check your credentials and try again.")]
    InvalidCredentials,

    #[error("User not found. Please check your account.")]
    NotFound,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Network operations on user accounts.
#[derive(Debug, Clone)]
pub struct AccountService {
    api: ApiClient,
}

impl AccountService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /users`.
    ///
    /// # Errors
    ///
    /// Returns the server's error verbatim (e.g. an already registered email).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &RegisterUser) -> Result<UserRecord, AccountError> {
        let raw = self
            .api
            .execute(ApiRequest::post([endpoints::USERS]).json(registration)?)
            .await?;
        let (user, _) = decode_object::<UserRecord>(&raw.body, USER_SHAPES)?;
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// `POST /users/login`.
    ///
    /// `email` is validated before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidEmail`] for a malformed address,
    /// [`AccountError::InvalidCredentials`] when the server answers 418, or
    /// any other API error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: SecretString) -> Result<UserRecord, AccountError> {
        let body = LoginRequest {
            email: Email::parse(email)?,
            password,
        };
        let request = ApiRequest::post([endpoints::USERS, endpoints::LOGIN]).json(&body)?;

        let raw = match self.api.execute(request).await {
            Ok(raw) => raw,
            Err(e) if e.status() == Some(418) => {
                warn!("Login rejected with 418");
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };
        let (user, _) = decode_object::<UserRecord>(&raw.body, USER_SHAPES)?;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// `GET /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] on 404, or any other API error.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn fetch_user(&self, id: &UserId) -> Result<UserRecord, AccountError> {
        self.api
            .request(ApiRequest::get([endpoints::USERS, id.as_str()]))
            .await
            .map_err(not_found)
    }

    /// `PUT /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] on 404, or any other API error.
    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_user(&self, id: &UserId, update: &UserUpdate) -> Result<UserRecord, AccountError> {
        let request = ApiRequest::put([endpoints::USERS, id.as_str()]).json(update)?;
        let user = self.api.request(request).await.map_err(not_found)?;
        info!("Updated user");
        Ok(user)
    }
}

fn not_found(error: ApiError) -> AccountError {
    if error.is_not_found() {
        AccountError::NotFound
    } else {
        AccountError::Api(error)
    }
}
