use super::error_code::{self, BizkitErrorCode};

/// Errors raised while loading `bizkit.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid config value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl BizkitErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::IO_ERROR,
            Self::TomlParse(_) => error_code::CONFIG_PARSE_ERROR,
            Self::InvalidValue { .. } => error_code::CONFIG_ERROR,
        }
    }
}
