use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        mongo_uri: get_env("MONGO_URI"),
        mongo_db_name: get_env_or_default("MONGO_DB_NAME", "marketplace"),
        elasticsearch_host: get_env_or_default("ELASTICSEARCH_HOST", "http://localhost:9200"),
        elasticsearch_index: get_env_or_default(
            "ELASTICSEARCH_PRODUCTS_INDEX",
            "marketplace_products",
        ),
        elasticsearch_username: env::var("ELASTICSEARCH_USERNAME").ok(),
        elasticsearch_password: env::var("ELASTICSEARCH_PASSWORD").ok(),
        elasticsearch_timeout: Duration::from_secs(get_env_parsed(
            "ELASTICSEARCH_TIMEOUT_SECS",
            30,
        )),
        search_cache_ttl: Duration::from_secs(get_env_parsed("SEARCH_CACHE_TTL_SECS", 300)),
        search_path: get_env_or_default("SEARCH_PATH", "/api/v1/products/search"),
        bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:8000"),
    }
});

pub struct Config {
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub elasticsearch_host: String,
    pub elasticsearch_index: String,
    pub elasticsearch_username: Option<String>,
    pub elasticsearch_password: Option<String>,
    pub elasticsearch_timeout: Duration,
    pub search_cache_ttl: Duration,
    pub search_path: String,
    pub bind_addr: String,
}

fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("Missing required environment variable: {key}"))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable value for {key}: {raw:?}");
            default
        }),
        Err(_) => default,
    }
}
