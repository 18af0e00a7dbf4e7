pub use super::departments::Entity as Departments;
pub use super::employees::Entity as Employees;
pub use super::managers::Entity as Managers;
pub use super::users::Entity as Users;
