use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    MongoDb { uri: String, database: String },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    pub grpc_addr: String,
    pub http_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub grpc_concurrency_limit: usize,
    pub grpc_request_timeout_secs: u64,
    pub grpc_max_decoding_message_size_bytes: usize,
    pub grpc_max_encoding_message_size_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "mongodb".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "mongodb" | "mongo" => StorageSettings::MongoDb {
                uri: get_required(&lookup, "MONGODB_URI")
                    .context("MONGODB_URI is required for the mongodb backend")?,
                database: lookup("MONGODB_DATABASE").unwrap_or_else(|| "blog".to_string()),
            },
            "memory" => StorageSettings::Memory,
            other => {
                return Err(anyhow!(
                    "unknown STORAGE_BACKEND '{other}', expecting mongodb or memory"
                ));
            }
        };

        let grpc_addr = lookup("GRPC_ADDR").unwrap_or_else(|| "0.0.0.0:50051".to_string());
        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(anyhow!(
                    "unknown LOG_FORMAT '{other}', expecting compact or json"
                ));
            }
        };
        let grpc_concurrency_limit = parse_usize(&lookup, "GRPC_CONCURRENCY_LIMIT", 256)?;
        let grpc_request_timeout_secs = parse_u64(&lookup, "GRPC_REQUEST_TIMEOUT_SECS", 10)?;
        let grpc_max_decoding_message_size_bytes =
            parse_usize(&lookup, "GRPC_MAX_DECODING_MESSAGE_SIZE_BYTES", 4 * 1024 * 1024)?;
        let grpc_max_encoding_message_size_bytes =
            parse_usize(&lookup, "GRPC_MAX_ENCODING_MESSAGE_SIZE_BYTES", 4 * 1024 * 1024)?;

        Ok(Self {
            storage,
            grpc_addr,
            http_addr,
            log_level,
            log_format,
            grpc_concurrency_limit,
            grpc_request_timeout_secs,
            grpc_max_decoding_message_size_bytes,
            grpc_max_encoding_message_size_bytes,
        })
    }
}

fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    let value = lookup(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize> {
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<usize>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
