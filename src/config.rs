use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// SQLite database at `--database-url`
    Sqlite,
    /// Process-local store, lost on exit
    Memory,
}

/// Runtime configuration. Flags override environment variables, which
/// override the defaults; a `.env` file is read before parsing.
#[derive(Debug, Clone, Parser)]
#[command(name = "person_registry", version, about = "Person record service")]
pub struct AppConfig {
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long = "store", env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Sqlite)]
    pub store_backend: StoreBackend,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://persons.db")]
    pub database_url: String,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
