use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::managers;

pub struct ManagerRepository {
    conn: DatabaseConnection,
}

impl ManagerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<managers::Model>> {
        managers::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query manager by ID")
    }

    /// The manager row holding a department slot, appointed or vacant.
    pub async fn get_by_department(&self, department_id: i32) -> Result<Option<managers::Model>> {
        managers::Entity::find()
            .filter(managers::Column::DepartmentId.eq(department_id))
            .one(&self.conn)
            .await
            .context("Failed to query manager by department")
    }

    pub async fn set_appointed(&self, manager: managers::Model, appointed: bool) -> Result<()> {
        let mut active: managers::ActiveModel = manager.into();
        active.is_appointed = Set(appointed);
        active
            .update(&self.conn)
            .await
            .context("Failed to update manager appointment")?;

        Ok(())
    }
}
