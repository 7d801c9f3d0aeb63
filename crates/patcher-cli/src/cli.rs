//! Command line surface

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use patcher_types::{Environment, Tenant};
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Parsed and validated arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub(crate) env: Environment,
    pub(crate) tenants: Vec<Tenant>,
    pub(crate) target: String,
    pub(crate) concurrency: usize,
    pub(crate) config: Option<PathBuf>,
}

pub(crate) fn command() -> Command {
    Command::new("vendor-patcher")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Repair missing vendor attributes in the ordering table from the vendor service")
        .arg(
            Arg::new("env")
                .long("env")
                .default_value("staging")
                .value_parser(["staging", "prod"])
                .help("Deployment environment"),
        )
        .arg(
            Arg::new("geid")
                .long("geid")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Comma separated global entity ids, e.g. \"FP_SG,FP_TW\""),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Patch every entity of the environment; --geid is ignored"),
        )
        .group(
            ArgGroup::new("tenants")
                .args(["geid", "all"])
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .required(true)
                .help("Attribute to patch, e.g. local_legal_name"),
        )
        .arg(
            Arg::new("concurrency")
                .short('n')
                .long("concurrency")
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Maximum concurrent patches per entity; 0 for no limit"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML file overriding the built-in environment settings"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
}

impl CliArgs {
    pub(crate) fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let env = matches
            .get_one::<String>("env")
            .map_or(Ok(Environment::default()), |name| name.parse())?;

        let tenants = if matches.get_flag("all") {
            Tenant::all()
        } else {
            let ids = matches
                .get_many::<String>("geid")
                .into_iter()
                .flatten();
            Tenant::resolve_all(ids).context("invalid --geid")?
        };

        let target = matches
            .get_one::<String>("target")
            .cloned()
            .context("target flag is required")?;

        Ok(Self {
            env,
            tenants,
            target,
            concurrency: matches.get_one::<usize>("concurrency").copied().unwrap_or(1),
            config: matches.get_one::<PathBuf>("config").cloned(),
        })
    }
}

pub(crate) fn log_format(matches: &ArgMatches) -> LogFormat {
    match matches.get_one::<String>("log-format").map(String::as_str) {
        Some("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
