use thiserror::Error;

#[derive(Debug, Error)]
pub enum MolrewardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MolrewardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_variant_format() {
        let err = MolrewardError::Config("negative weight".into());
        assert_eq!(err.to_string(), "Configuration error: negative weight");
    }

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("disk gone");
        let err: MolrewardError = io_err.into();
        assert_eq!(err.to_string(), "I/O error: disk gone");
    }
}
