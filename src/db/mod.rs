use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{departments, employees, managers, users};
use crate::models::account::{NewManagerRequest, NewProfile};
use crate::services::otp::OtpState;
use crate::services::password::Credential;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{NewAccount, otp_state};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn manager_repo(&self) -> repositories::manager::ManagerRepository {
        repositories::manager::ManagerRepository::new(self.conn.clone())
    }

    fn employee_repo(&self) -> repositories::employee::EmployeeRepository {
        repositories::employee::EmployeeRepository::new(self.conn.clone())
    }

    fn department_repo(&self) -> repositories::department::DepartmentRepository {
        repositories::department::DepartmentRepository::new(self.conn.clone())
    }

    // ========== Accounts ==========

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn find_identity_holder(
        &self,
        username: &str,
        email: &str,
        except: Option<i32>,
    ) -> Result<Option<users::Model>> {
        self.user_repo().find_holder(username, email, except).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list().await
    }

    pub async fn create_account(
        &self,
        account: NewAccount,
        profile: &NewProfile,
    ) -> Result<users::Model> {
        self.user_repo().create_with_profile(account, profile).await
    }

    pub async fn save_otp_state(&self, user: users::Model, state: &OtpState) -> Result<()> {
        self.user_repo().save_otp_state(user, state).await
    }

    pub async fn replace_credential(&self, user: users::Model, credential: Credential) -> Result<()> {
        self.user_repo().replace_credential(user, credential).await
    }

    pub async fn delete_employee_account(&self, id: i32) -> Result<()> {
        self.user_repo().delete_employee(id).await
    }

    pub async fn appoint_manager(
        &self,
        user: users::Model,
        manager: managers::Model,
        request: &NewManagerRequest,
        credential: Credential,
    ) -> Result<()> {
        self.user_repo()
            .appoint_manager(user, manager, request, credential)
            .await
    }

    // ========== Profiles ==========

    pub async fn get_manager(&self, id: i32) -> Result<Option<managers::Model>> {
        self.manager_repo().get_by_id(id).await
    }

    pub async fn get_manager_by_department(
        &self,
        department_id: i32,
    ) -> Result<Option<managers::Model>> {
        self.manager_repo().get_by_department(department_id).await
    }

    pub async fn set_manager_appointed(
        &self,
        manager: managers::Model,
        appointed: bool,
    ) -> Result<()> {
        self.manager_repo().set_appointed(manager, appointed).await
    }

    pub async fn get_employee(&self, id: i32) -> Result<Option<employees::Model>> {
        self.employee_repo().get_by_id(id).await
    }

    // ========== Departments ==========

    pub async fn get_department(&self, id: i32) -> Result<Option<departments::Model>> {
        self.department_repo().get_by_id(id).await
    }

    pub async fn create_department(&self, name: &str) -> Result<departments::Model> {
        self.department_repo().create(name).await
    }
}
