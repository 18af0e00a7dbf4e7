use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::departments;

pub struct DepartmentRepository {
    conn: DatabaseConnection,
}

impl DepartmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<departments::Model>> {
        departments::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query department by ID")
    }

    pub async fn create(&self, name: &str) -> Result<departments::Model> {
        departments::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to create department")
    }
}
