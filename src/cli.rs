use clap::Parser;
use std::path::PathBuf;

/// GraphQL Mock Server - serves schema-shaped mock data for any GraphQL schema
#[derive(Parser, Debug, Clone)]
#[command(name = "graphql-mock", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "GRAPHQL_MOCK_CONFIG", default_value = "graphql-mock.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "GRAPHQL_MOCK_HOST")]
    pub host: Option<String>,

    /// Server port, 0 picks a free one
    #[arg(long, env = "GRAPHQL_MOCK_PORT")]
    pub port: Option<u16>,

    /// Schema file or glob pattern
    #[arg(short, long, env = "GRAPHQL_MOCK_SCHEMA")]
    pub schema: Option<String>,

    /// Seed for reproducible responses
    #[arg(long, env = "GRAPHQL_MOCK_SEED")]
    pub seed: Option<u64>,

    /// Number of elements generated for list fields
    #[arg(long, env = "GRAPHQL_MOCK_LIST_LENGTH")]
    pub list_length: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["graphql-mock"]);
        assert_eq!(cli.config, PathBuf::from("graphql-mock.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.schema.is_none());
        assert!(cli.seed.is_none());
        assert!(cli.list_length.is_none());
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "graphql-mock",
            "--config",
            "custom.toml",
            "--host",
            "0.0.0.0",
            "--port",
            "4000",
            "--schema",
            "schemas/*.graphql",
            "--seed",
            "7",
            "--list-length",
            "5",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.host, Some("0.0.0.0".to_string()));
        assert_eq!(cli.port, Some(4000));
        assert_eq!(cli.schema, Some("schemas/*.graphql".to_string()));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.list_length, Some(5));
    }
}
