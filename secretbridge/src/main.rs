//! secretbridge - AWS Secrets Manager from the command line
//!
//! Loads a connection map from `secretbridge.toml` and `SECRETBRIDGE_*`
//! variables, initializes a client handle, runs one operation and prints
//! the response as JSON.

mod config;

use clap::{Parser, Subcommand};
use secretbridge_secretsmanager::{
    BatchGetSecretValueRequest, ClientHandle, SecretFilter, VersionSelector,
};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "secretbridge")]
#[command(about = "Read secrets from AWS Secrets Manager", long_about = None)]
struct Args {
    /// Configuration file (optional)
    #[arg(short, long, default_value = "secretbridge.toml", env = "SECRETBRIDGE_CONFIG")]
    config: PathBuf,

    /// Region, overriding the configuration
    #[arg(long)]
    region: Option<String>,

    /// Endpoint to send requests to instead of the regional one
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "SECRETBRIDGE_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the details of a secret, without its value
    DescribeSecret {
        /// Secret name or ARN
        secret_id: String,
    },

    /// Fetch the value of a secret
    GetSecretValue {
        /// Secret name or ARN
        secret_id: String,

        /// Version to fetch
        #[arg(long, conflicts_with = "version_stage")]
        version_id: Option<String>,

        /// Staging label of the version to fetch
        #[arg(long)]
        version_stage: Option<String>,
    },

    /// Fetch the values of several secrets
    BatchGetSecretValue {
        /// Secret name or ARN, may be repeated
        #[arg(long = "secret-id", conflicts_with = "filters")]
        secret_ids: Vec<String>,

        /// Filter as key=value1,value2, may be repeated
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<SecretFilter>,

        /// Page size when filtering
        #[arg(long)]
        max_results: Option<i32>,

        /// Token from a previous page
        #[arg(long)]
        next_token: Option<String>,
    },
}

impl Command {
    async fn run(self, handle: &ClientHandle) -> anyhow::Result<serde_json::Value> {
        let value = match self {
            Self::DescribeSecret { secret_id } => {
                serde_json::to_value(handle.describe_secret(&secret_id).await?)?
            }
            Self::GetSecretValue {
                secret_id,
                version_id,
                version_stage,
            } => {
                let selector = VersionSelector {
                    version_id,
                    version_stage,
                };
                serde_json::to_value(handle.get_secret_value(&secret_id, &selector).await?)?
            }
            Self::BatchGetSecretValue {
                secret_ids,
                filters,
                max_results,
                next_token,
            } => {
                let request = BatchGetSecretValueRequest {
                    secret_ids: (!secret_ids.is_empty()).then_some(secret_ids),
                    filters: (!filters.is_empty()).then_some(filters),
                    max_results,
                    next_token,
                };
                serde_json::to_value(handle.batch_get_secret_value(request).await?)?
            }
        };
        Ok(value)
    }
}

fn parse_filter(raw: &str) -> Result<SecretFilter, String> {
    let (key, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value1,value2, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing filter key in '{raw}'"));
    }

    Ok(SecretFilter {
        key: key.to_string(),
        values: values
            .split(',')
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "secretbridge={level},secretbridge_secretsmanager={level}",
                    level = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let connection = config::load(
        &args.config,
        config::Overrides {
            region: args.region,
            endpoint_url: args.endpoint_url,
        },
    )?;
    debug!(config = %args.config.display(), "Loaded configuration");

    let handle = ClientHandle::new();
    handle.init(&connection)?;

    let result = args.command.run(&handle).await;
    handle.close()?;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter("tag-key=team,owner").unwrap();
        assert_eq!(filter.key, "tag-key");
        assert_eq!(filter.values, ["team", "owner"]);

        assert!(parse_filter("name").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn test_version_flags_conflict() {
        let result = Args::try_parse_from([
            "secretbridge",
            "get-secret-value",
            "db",
            "--version-id",
            "v1",
            "--version-stage",
            "AWSCURRENT",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_args() {
        let args = Args::try_parse_from([
            "secretbridge",
            "--region",
            "eu-west-1",
            "batch-get-secret-value",
            "--filter",
            "name=prod/",
            "--max-results",
            "5",
        ])
        .unwrap();

        assert_eq!(args.region.as_deref(), Some("eu-west-1"));
        match args.command {
            Command::BatchGetSecretValue {
                secret_ids,
                filters,
                max_results,
                ..
            } => {
                assert!(secret_ids.is_empty());
                assert_eq!(filters[0].values, ["prod/"]);
                assert_eq!(max_results, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_against_emulator() {
        let server = secretbridge_test::TestServer::start().await.unwrap();
        server
            .storage()
            .create_secret(
                "db",
                None,
                None,
                Some("hunter2".to_string()),
                None,
                std::collections::HashMap::new(),
            )
            .unwrap();

        let handle = ClientHandle::new();
        handle
            .init(&serde_json::json!({
                "region": "us-east-1",
                "auth": { "accessKeyId": "test", "secretAccessKey": "test" },
                "endpointUrl": server.url(),
            }))
            .unwrap();

        let command = Command::GetSecretValue {
            secret_id: "db".to_string(),
            version_id: None,
            version_stage: None,
        };
        let value = command.run(&handle).await.unwrap();

        assert_eq!(value["name"], "db");
        assert_eq!(value["secretString"], "hunter2");
        assert_eq!(value["versionStages"], serde_json::json!(["AWSCURRENT"]));
    }
}
