//! `SeaORM` implementation of the `IdentityService` trait.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Duration;
use tokio::task;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{NewAccount, Store, otp_state};
use crate::domain::{AccountId, Role, identity_key};
use crate::entities::users;
use crate::models::account::{
    AccountInfo, LoginResult, NewManagerRequest, NewProfile, Profile, RegisterRequest,
};
use crate::services::clock::Clock;
use crate::services::identity_service::{IdentityError, IdentityService};
use crate::services::notification::{Notification, NotificationSender, Templates};
use crate::services::otp::{OtpPolicy, OtpState};
use crate::services::password::{Credential, CredentialHasher};
use crate::services::token::TokenIssuer;
use crate::services::validation::{validate_email, validate_password, validate_username};

pub struct SeaOrmIdentityService {
    store: Store,
    hasher: CredentialHasher,
    otp: OtpPolicy,
    tokens: Arc<TokenIssuer>,
    notifier: Arc<dyn NotificationSender>,
    templates: Templates,
    clock: Arc<dyn Clock>,
    min_password_length: usize,
    verification_ttl: Duration,
    reset_ttl: Duration,
    require_email_verification: bool,
}

impl SeaOrmIdentityService {
    pub fn new(
        store: Store,
        config: &Config,
        tokens: Arc<TokenIssuer>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            hasher: CredentialHasher::new(&config.security)?,
            otp: OtpPolicy::from_config(&config.otp),
            tokens,
            notifier,
            templates: Templates::from_config(&config.notification),
            clock,
            min_password_length: config.security.min_password_length,
            verification_ttl: Duration::minutes(config.otp.verification_ttl_minutes),
            reset_ttl: Duration::minutes(config.otp.reset_ttl_minutes),
            require_email_verification: config.otp.require_email_verification,
        })
    }

    async fn hash_secret(&self, secret: &str) -> Result<Credential, IdentityError> {
        let hasher = self.hasher.clone();
        let secret = secret.to_string();

        let credential = task::spawn_blocking(move || hasher.create(&secret))
            .await
            .context("Password hashing task panicked")??;

        Ok(credential)
    }

    async fn verify_secret(&self, secret: &str, user: &users::Model) -> Result<bool, IdentityError> {
        let hasher = self.hasher.clone();
        let secret = secret.to_string();
        let hash = user.password_hash.clone();
        let salt = user.password_salt.clone();

        let valid = task::spawn_blocking(move || hasher.verify(&secret, &hash, &salt))
            .await
            .context("Password verification task panicked")?;

        Ok(valid)
    }

    /// Delivery failures are logged and swallowed.
    async fn notify(&self, notification: Notification) {
        let subject = notification.subject.clone();
        if let Err(e) = self.notifier.send(notification).await {
            warn!(error = %e, subject = %subject, "Failed to deliver notification");
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<users::Model, IdentityError> {
        let email = validate_email(email)?;
        self.store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| IdentityError::not_found("User not found"))
    }

    async fn load_profile(&self, user: &users::Model) -> Result<Option<Profile>, IdentityError> {
        let profile = match user.role {
            Role::Employee => self
                .store
                .get_employee(user.id)
                .await?
                .map(|e| Profile::Employee(e.into())),
            Role::Manager => self
                .store
                .get_manager(user.id)
                .await?
                .map(|m| Profile::Manager(m.into())),
            Role::Admin => None,
        };

        Ok(profile)
    }

    async fn account_info(&self, user: users::Model) -> Result<AccountInfo, IdentityError> {
        let profile = self.load_profile(&user).await?;
        Ok(AccountInfo::new(user, profile))
    }

    async fn is_vacant_manager(&self, user: &users::Model) -> Result<bool, IdentityError> {
        if user.role != Role::Manager {
            return Ok(false);
        }

        let appointed = self
            .store
            .get_manager(user.id)
            .await?
            .is_some_and(|m| m.is_appointed);

        Ok(!appointed)
    }

    fn conflict_with(holder: &users::Model, username: &str) -> IdentityError {
        if holder.username_key == identity_key(username) {
            IdentityError::conflict("Username already exists")
        } else {
            IdentityError::conflict("Email already exists")
        }
    }

    async fn check_profile_references(&self, profile: &NewProfile) -> Result<(), IdentityError> {
        match profile {
            NewProfile::Employee(fields) => {
                self.store
                    .get_manager(fields.manager_id.value())
                    .await?
                    .ok_or_else(|| IdentityError::not_found("Manager not found"))?;
            }
            NewProfile::Manager(fields) => {
                self.store
                    .get_department(fields.department_id.0)
                    .await?
                    .ok_or_else(|| IdentityError::not_found("Department not found"))?;

                if self
                    .store
                    .get_manager_by_department(fields.department_id.0)
                    .await?
                    .is_some()
                {
                    return Err(IdentityError::conflict(
                        "Manager already exists for this department",
                    ));
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl IdentityService for SeaOrmIdentityService {
    async fn register(&self, request: RegisterRequest) -> Result<AccountInfo, IdentityError> {
        let username = validate_username(&request.username)?.to_string();
        let email = validate_email(&request.email)?.to_string();
        validate_password(&request.password, self.min_password_length)?;

        if request.role == Role::Admin {
            return Err(IdentityError::validation(
                "Admin accounts cannot be registered",
            ));
        }
        if request.role != request.profile.role() {
            return Err(IdentityError::validation(
                "Profile does not match the requested role",
            ));
        }

        if let Some(holder) = self
            .store
            .find_identity_holder(&username, &email, None)
            .await?
        {
            return Err(Self::conflict_with(&holder, &username));
        }

        self.check_profile_references(&request.profile).await?;

        let credential = self.hash_secret(&request.password).await?;

        let mut otp = OtpState {
            is_verified: true,
            ..OtpState::default()
        };
        let code = self
            .require_email_verification
            .then(|| self.otp.issue(&mut otp, self.verification_ttl, self.clock.now()));
        let expires_at = otp.expires_at;

        let user = self
            .store
            .create_account(
                NewAccount {
                    username,
                    email,
                    role: request.role,
                    credential,
                    otp,
                },
                &request.profile,
            )
            .await?;

        metrics::counter!("identity_registrations_total", "role" => user.role.as_str())
            .increment(1);
        info!(account_id = user.id, role = %user.role, "Account registered");

        let verification = code.as_deref().zip(expires_at);
        if verification.is_some() {
            metrics::counter!("identity_otp_issued_total", "flow" => "registration").increment(1);
        }
        self.notify(
            self.templates
                .welcome(&user.email, &user.username, user.role, verification),
        )
        .await;

        self.account_info(user).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, IdentityError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            metrics::counter!("identity_logins_total", "outcome" => "not_found").increment(1);
            return Err(IdentityError::not_found("User not found"));
        };

        if self.is_vacant_manager(&user).await? {
            metrics::counter!("identity_logins_total", "outcome" => "not_found").increment(1);
            return Err(IdentityError::not_found("User not found"));
        }

        if !self.verify_secret(password, &user).await? {
            metrics::counter!("identity_logins_total", "outcome" => "invalid_credential")
                .increment(1);
            return Err(IdentityError::InvalidCredential);
        }

        if self.require_email_verification && !user.is_verified {
            metrics::counter!("identity_logins_total", "outcome" => "unverified").increment(1);
            return Err(IdentityError::Unverified);
        }

        let id = AccountId::new(user.id);
        let token = self.tokens.mint(id, &user.username, user.role)?;

        metrics::counter!("identity_logins_total", "outcome" => "success").increment(1);
        info!(account_id = user.id, "Login succeeded");

        Ok(LoginResult {
            token,
            id,
            username: user.username,
            role: user.role,
            expires_in_secs: self.tokens.ttl().num_seconds(),
        })
    }

    async fn verify(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        let user = self.find_by_email(email).await?;

        let mut state = otp_state(&user);
        self.otp.consume(&mut state, code.trim(), self.clock.now())?;

        let id = user.id;
        self.store.save_otp_state(user, &state).await?;
        info!(account_id = id, "Email verified");

        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> Result<(), IdentityError> {
        let user = self.find_by_email(email).await?;

        let mut state = otp_state(&user);
        let code = self.otp.restart(&mut state, self.reset_ttl, self.clock.now());
        let expires_at = state.expires_at.unwrap_or_else(|| self.clock.now());

        let recipient = user.email.clone();
        let id = user.id;
        self.store.save_otp_state(user, &state).await?;

        metrics::counter!("identity_otp_issued_total", "flow" => "reset").increment(1);
        info!(account_id = id, "Password reset code issued");

        self.notify(self.templates.password_reset(&recipient, &code, expires_at))
            .await;

        Ok(())
    }

    async fn resend_otp(&self, email: &str) -> Result<(), IdentityError> {
        let user = self.find_by_email(email).await?;

        let mut state = otp_state(&user);
        let code = self
            .otp
            .resend(&mut state, self.reset_ttl, self.clock.now())?;
        let expires_at = state.expires_at.unwrap_or_else(|| self.clock.now());

        let recipient = user.email.clone();
        let id = user.id;
        self.store.save_otp_state(user, &state).await?;

        metrics::counter!("identity_otp_issued_total", "flow" => "resend").increment(1);
        info!(
            account_id = id,
            resend_count = state.resend_count,
            "Verification code resent"
        );

        self.notify(self.templates.otp_resent(&recipient, &code, expires_at))
            .await;

        Ok(())
    }

    async fn reset_password(
        &self,
        email: Option<&str>,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IdentityError::validation("Email is required"))?;
        validate_password(new_password, self.min_password_length)?;
        let user = self.find_by_email(email).await?;

        if !user.is_verified {
            return Err(IdentityError::Unverified);
        }

        let now = self.clock.now();
        if !user.otp_expires_at.is_some_and(|exp| exp > now) {
            return Err(IdentityError::Expired);
        }

        let credential = self.hash_secret(new_password).await?;
        let id = user.id;
        self.store.replace_credential(user, credential).await?;
        info!(account_id = id, "Password reset");

        Ok(())
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), IdentityError> {
        let user = self
            .store
            .get_user_by_id(id.value())
            .await?
            .ok_or_else(|| IdentityError::not_found("User not found"))?;

        match user.role {
            Role::Employee => {
                self.store.delete_employee_account(user.id).await?;
                info!(account_id = user.id, "Employee account deleted");
            }
            Role::Manager => {
                let manager = self
                    .store
                    .get_manager(user.id)
                    .await?
                    .ok_or_else(|| IdentityError::not_found("Manager not found"))?;
                self.store.set_manager_appointed(manager, false).await?;
                info!(account_id = user.id, "Manager slot marked vacant");
            }
            Role::Admin => return Err(IdentityError::validation("Invalid user role")),
        }

        Ok(())
    }

    async fn appoint_new_manager(
        &self,
        manager_id: AccountId,
        request: NewManagerRequest,
    ) -> Result<AccountInfo, IdentityError> {
        let manager = self
            .store
            .get_manager(manager_id.value())
            .await?
            .ok_or_else(|| IdentityError::not_found("Manager not found"))?;
        let user = self
            .store
            .get_user_by_id(manager_id.value())
            .await?
            .filter(|u| u.role == Role::Manager)
            .ok_or_else(|| IdentityError::not_found("Manager not found"))?;

        let username = validate_username(&request.username)?.to_string();
        let email = validate_email(&request.email)?.to_string();
        validate_password(&request.password, self.min_password_length)?;

        if let Some(holder) = self
            .store
            .find_identity_holder(&username, &email, Some(user.id))
            .await?
        {
            return Err(Self::conflict_with(&holder, &username));
        }

        let credential = self.hash_secret(&request.password).await?;
        let request = NewManagerRequest {
            username,
            email,
            ..request
        };

        self.store
            .appoint_manager(user, manager, &request, credential)
            .await?;
        info!(account_id = manager_id.value(), "New manager appointed");

        self.notify(
            self.templates
                .manager_appointed(&request.email, &request.username),
        )
        .await;

        self.get_account(manager_id).await
    }

    async fn get_account(&self, id: AccountId) -> Result<AccountInfo, IdentityError> {
        let user = self
            .store
            .get_user_by_id(id.value())
            .await?
            .ok_or_else(|| IdentityError::not_found("User not found"))?;

        self.account_info(user).await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountInfo>, IdentityError> {
        let users = self.store.list_users().await?;

        let mut accounts = Vec::with_capacity(users.len());
        for user in users {
            accounts.push(self.account_info(user).await?);
        }

        Ok(accounts)
    }
}
