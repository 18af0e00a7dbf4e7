use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Selects which profile table (if any) is joined by id.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "employee")]
    Employee,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Employee => "Employee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Username as entered at registration.
    pub username: String,

    /// Lower-cased username; carries the uniqueness constraint.
    #[sea_orm(unique)]
    pub username_key: String,

    pub email: String,

    /// Lower-cased email; carries the uniqueness constraint.
    #[sea_orm(unique)]
    pub email_key: String,

    pub role: Role,

    /// Argon2id PHC string
    pub password_hash: String,

    /// B64 salt the hash was keyed with
    pub password_salt: String,

    pub is_verified: bool,

    pub otp: Option<String>,

    pub otp_expires_at: Option<DateTimeUtc>,

    #[sea_orm(default_value = 0)]
    pub otp_resend_count: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::managers::Entity")]
    Managers,
    #[sea_orm(has_one = "super::employees::Entity")]
    Employees,
}

impl Related<super::managers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Managers.def()
    }
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
