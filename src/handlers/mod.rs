pub mod agenda;
pub mod chat;
pub mod health;
