use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::domain::{Role, identity_key};
use crate::entities::{employees, managers, users};
use crate::models::account::{NewManagerRequest, NewProfile};
use crate::services::otp::OtpState;
use crate::services::password::Credential;

/// Everything needed to write a fresh `users` row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub credential: Credential,
    pub otp: OtpState,
}

/// Reads the OTP columns of an account row.
#[must_use]
pub fn otp_state(user: &users::Model) -> OtpState {
    OtpState {
        code: user.otp.clone(),
        expires_at: user.otp_expires_at,
        is_verified: user.is_verified,
        resend_count: user.otp_resend_count,
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    /// Case-insensitive lookup.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::UsernameKey.eq(identity_key(username)))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    /// Case-insensitive lookup.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::EmailKey.eq(identity_key(email)))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    /// Any account already holding `username` or `email`, other than `except`.
    pub async fn find_holder(
        &self,
        username: &str,
        email: &str,
        except: Option<i32>,
    ) -> Result<Option<users::Model>> {
        let mut query = users::Entity::find().filter(
            Condition::any()
                .add(users::Column::UsernameKey.eq(identity_key(username)))
                .add(users::Column::EmailKey.eq(identity_key(email))),
        );

        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }

        query
            .one(&self.conn)
            .await
            .context("Failed to query users by identity")
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    /// Writes the account row and its role profile in one transaction.
    pub async fn create_with_profile(
        &self,
        account: NewAccount,
        profile: &NewProfile,
    ) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let user = users::ActiveModel {
            username_key: Set(identity_key(&account.username)),
            username: Set(account.username),
            email_key: Set(identity_key(&account.email)),
            email: Set(account.email.clone()),
            role: Set(account.role),
            password_hash: Set(account.credential.hash),
            password_salt: Set(account.credential.salt),
            is_verified: Set(account.otp.is_verified),
            otp: Set(account.otp.code),
            otp_expires_at: Set(account.otp.expires_at),
            otp_resend_count: Set(account.otp.resend_count),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        match profile {
            NewProfile::Manager(fields) => {
                managers::ActiveModel {
                    id: Set(user.id),
                    department_id: Set(fields.department_id.0),
                    is_appointed: Set(true),
                    name: Set(fields.name.clone()),
                    salary: Set(fields.salary),
                    age: Set(fields.age),
                    phone: Set(fields.phone.clone()),
                    address: Set(fields.address.clone()),
                    email: Set(account.email),
                }
                .insert(&txn)
                .await?;
            }
            NewProfile::Employee(fields) => {
                employees::ActiveModel {
                    id: Set(user.id),
                    manager_id: Set(fields.manager_id.value()),
                    name: Set(fields.name.clone()),
                    salary: Set(fields.salary),
                    age: Set(fields.age),
                    phone: Set(fields.phone.clone()),
                    address: Set(fields.address.clone()),
                    designation: Set(fields.designation.clone()),
                    email: Set(account.email),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;
        Ok(user)
    }

    pub async fn save_otp_state(&self, user: users::Model, state: &OtpState) -> Result<()> {
        let mut active: users::ActiveModel = user.into();
        active.otp = Set(state.code.clone());
        active.otp_expires_at = Set(state.expires_at);
        active.is_verified = Set(state.is_verified);
        active.otp_resend_count = Set(state.resend_count);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update OTP state")?;

        Ok(())
    }

    /// Stores a new credential and closes any open code window.
    pub async fn replace_credential(&self, user: users::Model, credential: Credential) -> Result<()> {
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(credential.hash);
        active.password_salt = Set(credential.salt);
        active.otp = Set(None);
        active.otp_expires_at = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update credential")?;

        Ok(())
    }

    /// Removes an employee's profile and account together.
    pub async fn delete_employee(&self, id: i32) -> Result<()> {
        let txn = self.conn.begin().await?;

        employees::Entity::delete_by_id(id).exec(&txn).await?;
        users::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Re-credentials the account behind a manager slot and marks it appointed.
    pub async fn appoint_manager(
        &self,
        user: users::Model,
        manager: managers::Model,
        request: &NewManagerRequest,
        credential: Credential,
    ) -> Result<()> {
        let txn = self.conn.begin().await?;

        let mut account: users::ActiveModel = user.into();
        account.username = Set(request.username.clone());
        account.username_key = Set(identity_key(&request.username));
        account.email = Set(request.email.clone());
        account.email_key = Set(identity_key(&request.email));
        account.password_hash = Set(credential.hash);
        account.password_salt = Set(credential.salt);
        account.is_verified = Set(true);
        account.otp = Set(None);
        account.otp_expires_at = Set(None);
        account.otp_resend_count = Set(0);
        account.updated_at = Set(chrono::Utc::now().to_rfc3339());
        account.update(&txn).await?;

        let mut profile: managers::ActiveModel = manager.into();
        profile.name = Set(request.name.clone());
        profile.salary = Set(request.salary);
        profile.age = Set(request.age);
        profile.phone = Set(request.phone.clone());
        profile.address = Set(request.address.clone());
        profile.email = Set(request.email.clone());
        profile.is_appointed = Set(true);
        profile.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}
