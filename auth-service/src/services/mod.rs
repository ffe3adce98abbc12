pub mod token_service;

pub use token_service::{SessionTokens, TokenService};
