//! Identity services: signup, login, token authentication and suspension.

use std::sync::Arc;

use common::UserId;
use store::{NewUser, Store, StoreError, Transaction, UserRole, UserStatus, UserStore};

use crate::caller::{Caller, RequestContext};
use crate::error::DomainError;

use super::{
    LoginResponse, SignupRequest, TokenIssuer, UserError, UserProfile, hash_password,
    is_valid_email, normalize_email, validate_password, verify_password,
};

/// Service for account creation and authentication.
pub struct UserService<S: Store> {
    store: S,
    tokens: Arc<dyn TokenIssuer>,
}

impl<S: Store> UserService<S> {
    /// Creates a new user service issuing tokens with `tokens`.
    pub fn new(store: S, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    /// Registers a new active customer.
    #[tracing::instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id))]
    pub async fn signup(
        &self,
        ctx: &RequestContext,
        request: SignupRequest,
    ) -> Result<UserProfile, DomainError> {
        let profile = self.create_user(request, UserRole::Customer).await?;

        metrics::counter!("users_signed_up_total").increment(1);
        tracing::info!(user_id = %profile.id, "customer signed up");
        Ok(profile)
    }

    /// Checks credentials of an active user and issues an access token.
    #[tracing::instrument(skip(self, ctx, password), fields(request_id = %ctx.request_id))]
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, DomainError> {
        let email = normalize_email(email);

        let mut tx = self.store.begin().await?;
        let user = tx.get_active_user_by_email(&email).await?;
        tx.commit().await?;

        let user = user.ok_or(UserError::UserNotFound)?;
        if !verify_password(&user.password_hash, password)? {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(UserError::InvalidCredentials.into());
        }

        let access_token = self.tokens.issue(&user)?;
        Ok(LoginResponse {
            access_token,
            user_id: user.id,
            role: user.role,
            status: user.status,
        })
    }

    /// Resolves the identity carried by a verified token into a [`Caller`].
    ///
    /// The user must still exist, hold the role the token was issued for,
    /// and be active.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        role: UserRole,
    ) -> Result<Caller, DomainError> {
        let mut tx = self.store.begin().await?;
        let user = tx.get_user_by_id(user_id).await?;
        tx.commit().await?;

        let user = user.ok_or(UserError::Unauthenticated("user not found"))?;
        if user.role != role {
            return Err(UserError::Unauthenticated("role mismatch").into());
        }
        if user.status != UserStatus::Active {
            return Err(UserError::Unauthenticated("user is not active").into());
        }

        Ok(Caller::new(user.id, user.role, ctx))
    }

    /// Creates the admin account unless the email is already registered.
    ///
    /// Returns the new admin, or `None` when nothing was created.
    #[tracing::instrument(skip(self, password))]
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, DomainError> {
        let request = SignupRequest {
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.create_user(request, UserRole::Admin).await {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, "admin account created");
                Ok(Some(profile))
            }
            Err(DomainError::User(UserError::EmailTaken { .. })) => {
                tracing::info!("admin email already registered, skipping seed");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_user(
        &self,
        request: SignupRequest,
        role: UserRole,
    ) -> Result<UserProfile, DomainError> {
        let new_user = prepare_user(request, role)?;
        let email = new_user.email.clone();

        let mut tx = self.store.begin().await?;
        if tx.get_user_by_email(&email).await?.is_some() {
            return Err(UserError::EmailTaken { email }.into());
        }
        let user = match tx.create_user(new_user).await {
            Ok(user) => user,
            Err(StoreError::UniqueViolation { .. }) => {
                return Err(UserError::EmailTaken { email }.into());
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        Ok(user.into())
    }
}

/// Validates a signup request and hashes its password.
///
/// Runs before any transaction is opened; hashing is slow on purpose and must
/// not hold the store.
fn prepare_user(request: SignupRequest, role: UserRole) -> Result<NewUser, DomainError> {
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    if first_name.is_empty() {
        return Err(UserError::InvalidUser("first name must not be empty".to_string()).into());
    }
    if last_name.is_empty() {
        return Err(UserError::InvalidUser("last name must not be empty".to_string()).into());
    }
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(UserError::InvalidUser(format!("invalid email: {email}")).into());
    }
    validate_password(&request.password)?;

    Ok(NewUser {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        role,
        status: UserStatus::Active,
        password_hash: hash_password(&request.password)?,
    })
}

/// Service for admin actions on customer accounts.
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Suspends a customer. Admin accounts are never matched.
    #[tracing::instrument(skip(self, caller), fields(request_id = %caller.request_id))]
    pub async fn suspend_customer(
        &self,
        caller: &Caller,
        customer_id: UserId,
    ) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;
        let updated = tx
            .update_user_status(customer_id, UserStatus::Suspended, Some(UserRole::Customer))
            .await?;
        if updated == 0 {
            return Err(UserError::CustomerNotFound { customer_id }.into());
        }
        tx.commit().await?;

        tracing::info!(%customer_id, suspended_by = %caller.user_id, "customer suspended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryStore, User};

    struct FixedToken;

    impl TokenIssuer for FixedToken {
        fn issue(&self, user: &User) -> Result<String, UserError> {
            Ok(format!("token-for-{}", user.id))
        }
    }

    fn service(store: &InMemoryStore) -> UserService<InMemoryStore> {
        UserService::new(store.clone(), Arc::new(FixedToken))
    }

    fn jane() -> SignupRequest {
        SignupRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "Jane@Example.com".to_string(),
            password: "Sup3r$ecret".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let store = InMemoryStore::new();
        let users = service(&store);
        let ctx = RequestContext::new();

        let profile = users.signup(&ctx, jane()).await.unwrap();
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.role, UserRole::Customer);
        assert_eq!(profile.status, UserStatus::Active);

        let login = users
            .login(&ctx, "jane@example.com", "Sup3r$ecret")
            .await
            .unwrap();
        assert_eq!(login.user_id, profile.id);
        assert_eq!(login.access_token, format!("token-for-{}", profile.id));
    }

    #[test]
    fn prepared_user_is_hashed_without_a_store() {
        let new_user = prepare_user(jane(), UserRole::Customer).unwrap();
        assert_eq!(new_user.email, "jane@example.com");
        assert_ne!(new_user.password_hash, "Sup3r$ecret");
        assert!(verify_password(&new_user.password_hash, "Sup3r$ecret").unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryStore::new();
        let users = service(&store);
        let ctx = RequestContext::new();

        users.signup(&ctx, jane()).await.unwrap();
        let err = users.signup(&ctx, jane()).await.unwrap_err();
        assert_eq!(err.code(), "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn signup_rejects_invalid_fields() {
        let users = service(&InMemoryStore::new());
        let ctx = RequestContext::new();

        let err = users
            .signup(&ctx, SignupRequest { first_name: " ".to_string(), ..jane() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_USER");

        let err = users
            .signup(&ctx, SignupRequest { email: "jane.example.com".to_string(), ..jane() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_USER");

        let err = users
            .signup(&ctx, SignupRequest { password: "password".to_string(), ..jane() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "WEAK_PASSWORD");
    }

    #[tokio::test]
    async fn login_failures() {
        let store = InMemoryStore::new();
        let users = service(&store);
        let ctx = RequestContext::new();

        let err = users
            .login(&ctx, "nobody@example.com", "Sup3r$ecret")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "USER_NOT_FOUND");

        users.signup(&ctx, jane()).await.unwrap();
        let err = users
            .login(&ctx, "jane@example.com", "Wr0ng$ecret")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn suspended_customer_cannot_log_in_or_authenticate() {
        let store = InMemoryStore::new();
        let users = service(&store);
        let customers = CustomerService::new(store.clone());
        let ctx = RequestContext::new();

        let profile = users.signup(&ctx, jane()).await.unwrap();
        let caller = users
            .authenticate(&ctx, profile.id, UserRole::Customer)
            .await
            .unwrap();
        assert_eq!(caller.request_id, ctx.request_id);

        customers
            .suspend_customer(&Caller::admin(UserId::new()), profile.id)
            .await
            .unwrap();

        let err = users
            .login(&ctx, "jane@example.com", "Sup3r$ecret")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "USER_NOT_FOUND");

        let err = users
            .authenticate(&ctx, profile.id, UserRole::Customer)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn authenticate_rejects_role_mismatch() {
        let store = InMemoryStore::new();
        let users = service(&store);
        let ctx = RequestContext::new();

        let profile = users.signup(&ctx, jane()).await.unwrap();
        let err = users
            .authenticate(&ctx, profile.id, UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::User(UserError::Unauthenticated("role mismatch"))
        ));
    }

    #[tokio::test]
    async fn admins_cannot_be_suspended() {
        let store = InMemoryStore::new();
        let users = service(&store);
        let customers = CustomerService::new(store.clone());

        let admin = users
            .ensure_admin("admin@example.com", "Adm1n$ecret")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(
            users
                .ensure_admin("admin@example.com", "Adm1n$ecret")
                .await
                .unwrap()
                .is_none()
        );

        let err = customers
            .suspend_customer(&Caller::admin(admin.id), admin.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CUSTOMER_NOT_FOUND");

        let err = customers
            .suspend_customer(&Caller::admin(admin.id), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CUSTOMER_NOT_FOUND");
    }
}
