pub mod prelude;

pub mod departments;
pub mod employees;
pub mod managers;
pub mod users;
