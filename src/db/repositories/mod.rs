pub mod department;
pub mod employee;
pub mod manager;
pub mod user;
