//! # CLI Interface
//!
//! Command-line arguments for `cashchain-node`, via `clap` derive. Every
//! `run` flag can also come from a `CASHCHAIN_*` environment variable.

use clap::{Parser, Subcommand};

use cashchain_protocol::config::{DEFAULT_BIND_ADDRESS, DEFAULT_HTTP_PORT, DEFAULT_METRICS_PORT};
use cashchain_protocol::storage::ReplacePolicy;

/// Cashchain ledger node.
///
/// Holds a hash-linked chain of cash values in memory, accepts new values
/// over HTTP, and adopts longer valid chains received from peers.
#[derive(Parser, Debug)]
#[command(
    name = "cashchain-node",
    about = "Cashchain ledger node",
    version,
    propagate_version = true
)]
pub struct CashchainCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Query the status of a running node.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Address the HTTP and metrics listeners bind to.
    #[arg(long, env = "CASHCHAIN_BIND", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    /// Port for the HTTP API.
    #[arg(long, env = "CASHCHAIN_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CASHCHAIN_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// How candidate chains from peers are checked before replacing ours:
    /// `validated` or `length-only`.
    #[arg(long, env = "CASHCHAIN_REPLACE_POLICY", default_value = "validated")]
    pub replace_policy: ReplacePolicy,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "CASHCHAIN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// `host:port` of the running node's HTTP API.
    #[arg(long, default_value = "127.0.0.1:3001")]
    pub api_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        CashchainCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = CashchainCli::try_parse_from(["cashchain-node", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.http_port, DEFAULT_HTTP_PORT);
                assert_eq!(args.metrics_port, DEFAULT_METRICS_PORT);
                assert_eq!(args.replace_policy, ReplacePolicy::Validated);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn replace_policy_flag_parses() {
        let cli = CashchainCli::try_parse_from([
            "cashchain-node",
            "run",
            "--replace-policy",
            "length-only",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => assert_eq!(args.replace_policy, ReplacePolicy::LengthOnly),
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn unknown_replace_policy_is_rejected() {
        let result =
            CashchainCli::try_parse_from(["cashchain-node", "run", "--replace-policy", "longest"]);
        assert!(result.is_err());
    }
}
