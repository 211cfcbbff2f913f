use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub time_zone: Tz,
    pub bind_addr: String,
    pub cors_allow_origins: Vec<String>,
    pub password_min_length: usize,
    pub protected_super_admin_email: String,
    pub sweep_enabled: bool,
    pub sweep_hour: u32,
    pub audit_log_default_limit: i64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/staffdesk".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        let jwt_expiration_hours = parse_env("JWT_EXPIRATION_HOURS", 8u64)?;

        let time_zone_name =
            env::var("APP_TIMEZONE").unwrap_or_else(|_| "Europe/Madrid".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5173".to_string());

        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        let password_min_length = parse_env("PASSWORD_MIN_LENGTH", 6usize)?;

        let protected_super_admin_email = env::var("PROTECTED_SUPER_ADMIN_EMAIL")
            .unwrap_or_else(|_| "superadmin@glovo.com".to_string())
            .to_ascii_lowercase();

        let sweep_enabled = parse_env("SWEEP_ENABLED", true)?;
        let sweep_hour = parse_env("SWEEP_HOUR", 0u32)?;
        if sweep_hour > 23 {
            return Err(anyhow!("Invalid SWEEP_HOUR value: {} (expected 0-23)", sweep_hour));
        }

        let audit_log_default_limit = parse_env("AUDIT_LOG_DEFAULT_LIMIT", 1000i64)?;
        if audit_log_default_limit < 1 {
            return Err(anyhow!(
                "Invalid AUDIT_LOG_DEFAULT_LIMIT value: {}",
                audit_log_default_limit
            ));
        }

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            time_zone,
            bind_addr,
            cors_allow_origins,
            password_min_length,
            protected_super_admin_email,
            sweep_enabled,
            sweep_hour,
            audit_log_default_limit,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, raw)),
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_skips_blanks() {
        let origins = parse_origins("http://localhost:3000, ,http://frontend:3000,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:3000".to_string(),
                "http://frontend:3000".to_string()
            ]
        );
    }

    #[test]
    fn parse_env_falls_back_to_default_when_missing() {
        let value: u32 = parse_env("STAFFDESK_TEST_UNSET_VARIABLE", 7).expect("default");
        assert_eq!(value, 7);
    }
}
