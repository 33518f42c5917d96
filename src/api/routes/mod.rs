pub mod admin;
pub mod content;
pub mod game;
pub mod health;
pub mod history;
pub mod user_apps;
