use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

use crate::constants::Limits;

/// Runtime configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub limits: Limits,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: require("DATABASE_URL"),
            jwt_secret: require("JWT_SECRET"),
            session_ttl_hours: load_or("SESSION_TTL_HOURS", 1),
            limits: Limits {
                min_cooking_time: load_or("MIN_COOKING_TIME", Limits::default().min_cooking_time),
                max_cooking_time: load_or("MAX_COOKING_TIME", Limits::default().max_cooking_time),
                min_ingredient_amount: load_or(
                    "MIN_INGREDIENT_AMOUNT",
                    Limits::default().min_ingredient_amount,
                ),
                max_ingredient_amount: load_or(
                    "MAX_INGREDIENT_AMOUNT",
                    Limits::default().max_ingredient_amount,
                ),
            },
        }
    }
}

fn require(key: &str) -> String {
    match env::var(key) {
        Ok(value) => value,
        Err(_) => panic!("Environment variable {key} must be set"),
    }
}

fn load_or<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => match value.parse() {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid {key} value ({e}), using default {default}");
                default
            }
        },
        Err(_) => {
            info!("{key} not set, using default {default}");
            default
        }
    }
}
