pub mod health;
pub mod interactions;
pub mod messages;
pub mod pages;
