use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BlogConfig {
    pub api_port: u16,
    pub paths: BlogPaths,
    pub admin: AdminConfig,
    pub password: PasswordConfig,
}

impl BlogConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match env::var("JACKBLOG_DATA_DIR") {
            Ok(raw) if !raw.trim().is_empty() => BlogPaths::from_base_dir(raw.trim())?,
            _ => BlogPaths::discover()?,
        };
        let api_port = env::var("JACKBLOG_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        Ok(Self {
            api_port,
            paths,
            admin: AdminConfig::from_env(),
            password: PasswordConfig::from_env(),
        })
    }

    pub fn new(api_port: u16, paths: BlogPaths) -> Self {
        Self {
            api_port,
            paths,
            admin: AdminConfig::default(),
            password: PasswordConfig::default(),
        }
    }

    pub fn with_admin(mut self, admin: AdminConfig) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_password(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }
}

/// Credentials for the administrator endpoints. Session issuance lives in a
/// separate service; this side only compares the bearer token it was handed.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    pub token: Option<String>,
}

impl AdminConfig {
    pub fn from_env() -> Self {
        let token = env::var("JACKBLOG_ADMIN_TOKEN").ok().and_then(|raw| {
            if raw.trim().is_empty() {
                None
            } else {
                Some(raw)
            }
        });
        Self { token }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

/// Argon2id cost parameters used for comment passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
        }
    }
}

impl PasswordConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let memory_kib = env::var("JACKBLOG_ARGON2_MEMORY_KIB")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(defaults.memory_kib);
        let iterations = env::var("JACKBLOG_ARGON2_ITERATIONS")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(defaults.iterations);
        Self {
            memory_kib,
            iterations,
        }
    }

    /// Cheapest parameters argon2 accepts. Only meant for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl BlogPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("jackblog.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            logs_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_base_dir() {
        let paths = BlogPaths::from_base_dir("/srv/jackblog").expect("paths");
        assert_eq!(paths.db_path, PathBuf::from("/srv/jackblog/data/jackblog.db"));
        assert_eq!(paths.logs_dir, PathBuf::from("/srv/jackblog/logs"));
    }

    #[test]
    fn config_builders_override_defaults() {
        let paths = BlogPaths::from_base_dir("/tmp/blog").expect("paths");
        let config = BlogConfig::new(9000, paths)
            .with_admin(AdminConfig::with_token("secret"))
            .with_password(PasswordConfig::minimal());
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.admin.token.as_deref(), Some("secret"));
        assert_eq!(config.password, PasswordConfig::minimal());
    }
}
