mod database {
    pub mod actions;
    pub mod catalog;
    pub mod error;
    pub mod membership;
    pub mod pagination;
    pub mod schema;
    pub mod validate;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;

pub use authentication::*;
pub use config::Config;
pub use constants::*;
pub use database::*;
