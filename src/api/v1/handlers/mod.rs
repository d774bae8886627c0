pub mod discussions;
pub mod health;
