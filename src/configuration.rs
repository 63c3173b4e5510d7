use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub security: SecuritySettings,
    pub media: MediaSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT signing settings. Access and refresh tokens use separate secrets.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 864000 for 10 days)
    pub issuer: String,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.is_empty() || self.refresh_token_secret.is_empty() {
            return Err(ConfigError::Message("jwt secrets must not be empty".to_string()));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::Message(
                "access and refresh token secrets must differ".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct SecuritySettings {
    pub bcrypt_cost: u32,
}

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

impl SecuritySettings {
    /// bcrypt refuses any cost outside 4..=31, so catch it before serving
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Message(format!(
                "security.bcrypt_cost must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, self.bcrypt_cost
            )));
        }
        Ok(())
    }
}

/// Remote media store that accepts uploads and returns a public URL
#[derive(serde::Deserialize, Clone)]
pub struct MediaSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_milliseconds: u64,
}

impl MediaSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Reads `configuration.{yaml,toml,json}` if present, then `APP_*` env vars
/// (`APP_JWT__ACCESS_TOKEN_SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("jwt.access_token_expiry", 900)?
        .set_default("jwt.refresh_token_expiry", 864_000)?
        .set_default("jwt.issuer", "sessionkeeper")?
        .set_default("security.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?
        .set_default("media.timeout_milliseconds", 10_000)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.jwt.validate()?;
    settings.security.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(access: &str, refresh: &str) -> JwtSettings {
        JwtSettings {
            access_token_secret: access.to_string(),
            refresh_token_secret: refresh.to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 864_000,
            issuer: "test".to_string(),
        }
    }

    #[test]
    fn test_distinct_secrets_are_accepted() {
        assert!(jwt("access-secret", "refresh-secret").validate().is_ok());
    }

    #[test]
    fn test_shared_secret_is_rejected() {
        assert!(jwt("same", "same").validate().is_err());
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(jwt("", "refresh-secret").validate().is_err());
    }

    #[test]
    fn test_bcrypt_cost_must_be_in_range() {
        for cost in [4, 12, 31] {
            assert!(SecuritySettings { bcrypt_cost: cost }.validate().is_ok());
        }
        for cost in [0, 2, 3, 32] {
            assert!(
                SecuritySettings { bcrypt_cost: cost }.validate().is_err(),
                "cost {} should be rejected",
                cost
            );
        }
    }
}
