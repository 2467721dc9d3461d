//! Command line and environment configuration

use crate::auth_gate::DEFAULT_COOKIE_NAME;
use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format '{}', expected text or json", other),
        }
    }
}

/// Settings shared by every subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_format: LogFormat,
    pub log_level: String,
}

/// Settings of `sessiongate-server serve`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub cookie_name: String,
}

/// Settings of `sessiongate-server seed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    pub data_dir: PathBuf,
}

/// Parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Serve(ServeConfig),
    Seed(SeedConfig),
}

fn data_dir_arg() -> Arg {
    Arg::new("data-dir")
        .long("data-dir")
        .value_name("PATH")
        .env("SESSIONGATE_DATA_DIR")
        .help("Data directory path")
        .default_value("./data")
}

pub fn command() -> Command {
    Command::new("sessiongate-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cookie session gate and names API")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .env("SESSIONGATE_LOG_FORMAT")
                .help("Log output format: text or json")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log filter used when RUST_LOG is unset")
                .default_value("info")
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP server")
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_name("ADDR")
                        .env("SESSIONGATE_BIND")
                        .help("Bind address")
                        .default_value("127.0.0.1:8080"),
                )
                .arg(data_dir_arg())
                .arg(
                    Arg::new("cookie-name")
                        .long("cookie-name")
                        .value_name("NAME")
                        .help("Cookie carrying the session token")
                        .default_value(DEFAULT_COOKIE_NAME),
                ),
        )
        .subcommand(
            Command::new("seed")
                .about("Replace the names collection with the default records")
                .arg(data_dir_arg()),
        )
}

impl GlobalConfig {
    pub fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        Ok(GlobalConfig {
            log_format: required(matches, "log-format")?.parse()?,
            log_level: required(matches, "log-level")?.to_string(),
        })
    }
}

impl Invocation {
    pub fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        match matches.subcommand() {
            Some(("serve", sub)) => Ok(Invocation::Serve(ServeConfig {
                bind: required(sub, "bind")?
                    .parse()
                    .context("Invalid bind address")?,
                data_dir: PathBuf::from(required(sub, "data-dir")?),
                cookie_name: required(sub, "cookie-name")?.to_string(),
            })),
            Some(("seed", sub)) => Ok(Invocation::Seed(SeedConfig {
                data_dir: PathBuf::from(required(sub, "data-dir")?),
            })),
            Some((other, _)) => bail!("unknown subcommand '{}'", other),
            None => bail!("a subcommand is required"),
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing --{}", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (GlobalConfig, Invocation) {
        let matches = command().try_get_matches_from(args).unwrap();
        (
            GlobalConfig::from_matches(&matches).unwrap(),
            Invocation::from_matches(&matches).unwrap(),
        )
    }

    #[test]
    fn test_serve_defaults() {
        let (global, invocation) = parse(&["sessiongate-server", "serve"]);

        assert_eq!(global.log_format, LogFormat::Text);
        assert_eq!(global.log_level, "info");
        assert_eq!(
            invocation,
            Invocation::Serve(ServeConfig {
                bind: "127.0.0.1:8080".parse().unwrap(),
                data_dir: PathBuf::from("./data"),
                cookie_name: "authToken".to_string(),
            })
        );
    }

    #[test]
    fn test_serve_overrides() {
        let (global, invocation) = parse(&[
            "sessiongate-server",
            "serve",
            "--bind",
            "0.0.0.0:3000",
            "--data-dir",
            "/tmp/names",
            "--cookie-name",
            "sid",
            "--log-format",
            "json",
        ]);

        assert_eq!(global.log_format, LogFormat::Json);
        let Invocation::Serve(serve) = invocation else {
            panic!("expected serve");
        };
        assert_eq!(serve.bind.port(), 3000);
        assert_eq!(serve.data_dir, PathBuf::from("/tmp/names"));
        assert_eq!(serve.cookie_name, "sid");
    }

    #[test]
    fn test_seed_and_rejections() {
        let (_, invocation) = parse(&["sessiongate-server", "seed", "--data-dir", "db"]);
        assert_eq!(invocation, Invocation::Seed(SeedConfig { data_dir: PathBuf::from("db") }));

        assert!(command().try_get_matches_from(["sessiongate-server"]).is_err());
        assert!(command()
            .try_get_matches_from(["sessiongate-server", "serve", "--log-format", "xml"])
            .is_err());

        let matches = command()
            .try_get_matches_from(["sessiongate-server", "serve", "--bind", "nowhere"])
            .unwrap();
        assert!(Invocation::from_matches(&matches).is_err());
    }
}
