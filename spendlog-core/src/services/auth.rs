//! Auth service - registration, login and token validation

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, instrument, warn};

use crate::config::AuthConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{AuthResult, RegisterRequest, User, UserId};
use crate::ports::UserRepository;

use super::password::PasswordHasher;
use super::token::TokenService;

/// Verified against when the email is unknown so both login failures cost one hash
const DUMMY_PASSWORD: &str = "spendlog-timing-parity";

/// Service owning the credential and session policy
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenService,
    dummy_digest: OnceLock<String>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            users,
            hasher: PasswordHasher::new(config.argon2),
            tokens: TokenService::new(&config.token_secret)?,
            dummy_digest: OnceLock::new(),
        })
    }

    /// Register a new user and sign them in
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResult> {
        request.validate()?;

        if self.users.email_exists(&request.email).await? {
            warn!("registration rejected, email taken");
            return Err(Error::EmailAlreadyExists);
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = User::new(request.name.trim(), request.email, password_hash);

        // The store's unique constraint is authoritative over the check above
        self.users.create_user(&user).await?;
        let token = self.tokens.issue(user.id)?;

        info!(user_id = %user.id, "user registered");
        Ok(AuthResult {
            user: user.to_public(),
            token,
        })
    }

    /// Exchange email and password for a session token
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult> {
        let user = match self.users.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                self.burn_verification(password).await;
                warn!("login rejected");
                return Err(Error::InvalidCredentials);
            }
        };

        if !self
            .verify_password(user.password_hash.clone(), password.to_string())
            .await?
        {
            warn!(user_id = %user.id, "login rejected");
            return Err(Error::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthResult {
            user: user.to_public(),
            token,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: UserId) -> Result<User> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("User"))
    }

    /// The single trust boundary: a token in, an owner ID out
    pub fn validate_token(&self, token: &str) -> Result<UserId> {
        self.tokens
            .verify(token)
            .inspect_err(|_| warn!("token rejected"))
    }

    /// Resolve a bearer token to a live user.
    ///
    /// A valid token whose user has since disappeared is rejected as
    /// `InvalidToken`.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let id = self.validate_token(token)?;
        match self.users.find_user_by_id(id).await? {
            Some(user) => {
                debug!(user_id = %user.id, "authenticated");
                Ok(user)
            }
            None => {
                warn!(user_id = %id, "token for unknown user");
                Err(Error::InvalidToken)
            }
        }
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, digest: String, password: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| Error::Hashing(e.to_string()))
    }

    /// Spend one verification on a throwaway digest
    async fn burn_verification(&self, password: &str) {
        let digest = match self.dummy_digest.get() {
            Some(digest) => digest.clone(),
            None => match self.hash_password(DUMMY_PASSWORD.to_string()).await {
                Ok(digest) => self.dummy_digest.get_or_init(|| digest).clone(),
                Err(e) => {
                    debug!(error = %e, "dummy digest unavailable");
                    return;
                }
            },
        };
        let _ = self.verify_password(digest, password.to_string()).await;
    }
}
