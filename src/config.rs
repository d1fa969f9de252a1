//! Server configuration loaded from the environment.

/// Runtime configuration for the HTTP server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to local
    /// development defaults. `.env` loading is the caller's concern.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost:5432/aerosafe".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Self { database_url, port }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let cfg = ServerConfig {
            database_url: "postgresql://localhost:5432/aerosafe".into(),
            port: 3000,
        };
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
    }
}
