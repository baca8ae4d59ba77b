pub mod models;
pub mod session;
