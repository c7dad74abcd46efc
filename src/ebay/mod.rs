pub mod auth;
pub mod trading;

pub use auth::TokenManager;
