pub mod auth;
pub mod gateway;
pub mod two_factor;
