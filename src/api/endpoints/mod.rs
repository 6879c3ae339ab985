pub mod dashboard;
pub mod database;
pub mod export;
pub mod health;
pub mod mine;
pub mod page;
pub mod patients;
