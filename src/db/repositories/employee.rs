use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entities::employees;

pub struct EmployeeRepository {
    conn: DatabaseConnection,
}

impl EmployeeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<employees::Model>> {
        employees::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query employee by ID")
    }
}
