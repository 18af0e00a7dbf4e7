use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, DepartmentId, Role};
use crate::entities::{employees, managers, users};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeFields {
    pub manager_id: AccountId,
    pub name: String,
    pub salary: i32,
    pub age: i32,
    pub phone: String,
    pub address: String,
    pub designation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerFields {
    pub department_id: DepartmentId,
    pub name: String,
    pub salary: i32,
    pub age: i32,
    pub phone: String,
    pub address: String,
}

/// Role-specific data supplied at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NewProfile {
    Employee(EmployeeFields),
    Manager(ManagerFields),
}

impl NewProfile {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Employee(_) => Role::Employee,
            Self::Manager(_) => Role::Manager,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub profile: NewProfile,
}

/// Replacement identity for a vacant (or outgoing) manager slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewManagerRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub salary: i32,
    pub age: i32,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeProfile {
    pub manager_id: AccountId,
    pub name: String,
    pub salary: i32,
    pub age: i32,
    pub phone: String,
    pub address: String,
    pub designation: String,
}

impl From<employees::Model> for EmployeeProfile {
    fn from(model: employees::Model) -> Self {
        Self {
            manager_id: AccountId::new(model.manager_id),
            name: model.name,
            salary: model.salary,
            age: model.age,
            phone: model.phone,
            address: model.address,
            designation: model.designation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerProfile {
    pub department_id: DepartmentId,
    pub is_appointed: bool,
    pub name: String,
    pub salary: i32,
    pub age: i32,
    pub phone: String,
    pub address: String,
}

impl From<managers::Model> for ManagerProfile {
    fn from(model: managers::Model) -> Self {
        Self {
            department_id: DepartmentId(model.department_id),
            is_appointed: model.is_appointed,
            name: model.name,
            salary: model.salary,
            age: model.age,
            phone: model.phone,
            address: model.address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Profile {
    Employee(EmployeeProfile),
    Manager(ManagerProfile),
}

/// Account view without credential or code material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub profile: Option<Profile>,
    pub created_at: String,
    pub updated_at: String,
}

impl AccountInfo {
    #[must_use]
    pub fn new(user: users::Model, profile: Option<Profile>) -> Self {
        Self {
            id: AccountId::new(user.id),
            username: user.username,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            profile,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub id: AccountId,
    pub username: String,
    pub role: Role,
    pub expires_in_secs: i64,
}
