use core::time::Duration;
use std::time::SystemTime;

use anyhow::{Context, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sonyflake::{ClockRegressionPolicy, Settings, SonyflakeId};

/// Runtime configuration for the `sonyflake` binary.
///
/// Global options are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first) and may appear before
/// or after the subcommand.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sonyflake",
    version,
    about = "Generate and decode Sonyflake IDs"
)]
pub struct CliArgs {
    /// Start time that elapsed ticks are counted from, as an RFC 3339
    /// instant. Must not lie in the future.
    ///
    /// Environment variable: `SONYFLAKE_EPOCH`
    #[arg(
        long,
        env = "SONYFLAKE_EPOCH",
        default_value = "2014-09-01T00:00:00Z",
        global = true
    )]
    pub epoch: String,

    /// Machine ID embedded in every generated ID (0..=65535).
    ///
    /// When unset, the lower 16 bits of the host's private IPv4 address are
    /// used.
    ///
    /// Environment variable: `SONYFLAKE_MACHINE_ID`
    #[arg(long, env = "SONYFLAKE_MACHINE_ID", global = true)]
    pub machine_id: Option<u64>,

    /// What to do when the clock moves backwards.
    ///
    /// Environment variable: `SONYFLAKE_REGRESSION_POLICY`
    #[arg(
        long,
        env = "SONYFLAKE_REGRESSION_POLICY",
        value_enum,
        default_value_t = RegressionPolicy::FailFast,
        global = true
    )]
    pub regression_policy: RegressionPolicy,

    /// Largest clock regression waited out under `--regression-policy wait`,
    /// in milliseconds.
    ///
    /// Environment variable: `SONYFLAKE_MAX_SKEW_MS`
    #[arg(long, env = "SONYFLAKE_MAX_SKEW_MS", default_value_t = 100, global = true)]
    pub max_skew_ms: u64,

    /// Log output format. Logs go to stderr.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text,
        global = true
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate IDs and print them one per line in ascending order.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Number of threads sharing one generator.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
    },
    /// Print the fields of each ID under the configured epoch.
    Decode {
        /// Decimal IDs to decode.
        #[arg(required = true)]
        ids: Vec<String>,

        /// Print one JSON object per line.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressionPolicy {
    /// Fail immediately.
    FailFast,
    /// Wait for the clock to catch up, up to `--max-skew-ms`.
    Wait,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub epoch: DateTime<Utc>,
    pub machine_id: Option<u16>,
    pub clock_regression_policy: ClockRegressionPolicy,
    pub log_format: LogFormat,
    pub command: Command,
}

impl TryFrom<CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let epoch = DateTime::parse_from_rfc3339(&args.epoch)
            .with_context(|| format!("SONYFLAKE_EPOCH ({}) is not an RFC 3339 instant", args.epoch))?
            .with_timezone(&Utc);

        if epoch.timestamp_millis() < 0 {
            bail!("SONYFLAKE_EPOCH ({}) lies before the UNIX epoch", args.epoch);
        }

        let max_machine_id = SonyflakeId::max_machine_id();
        let machine_id = match args.machine_id {
            Some(id) if id > u64::from(max_machine_id) => bail!(
                "SONYFLAKE_MACHINE_ID ({}) exceeds available machine ID space (max = {})",
                id,
                max_machine_id
            ),
            Some(id) => u16::try_from(id).ok(),
            None => None,
        };

        let clock_regression_policy = match args.regression_policy {
            RegressionPolicy::FailFast => ClockRegressionPolicy::FailFast,
            RegressionPolicy::Wait => ClockRegressionPolicy::Wait {
                max_skew: Duration::from_millis(args.max_skew_ms),
            },
        };

        if let Command::Generate { threads: 0, .. } = args.command {
            bail!("--threads must be greater than 0");
        }

        Ok(Self {
            epoch,
            machine_id,
            clock_regression_policy,
            log_format: args.log_format,
            command: args.command,
        })
    }
}

impl Config {
    /// Generator settings for this configuration, discovering the machine ID
    /// from the host's private IPv4 address when none was given.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let machine_id = match self.machine_id {
            Some(id) => id,
            None => sonyflake::machine_id::lower_16_bit_private_ip()
                .context("no --machine-id given and none could be discovered")?,
        };

        let settings = Settings::from_system_time(SystemTime::from(self.epoch))?
            .with_machine_id(u64::from(machine_id))?
            .with_clock_regression_policy(self.clock_regression_policy);
        Ok(settings)
    }

    /// Settings used to decode IDs. Only the epoch matters.
    pub fn decode_settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings::from_system_time(SystemTime::from(self.epoch))?)
    }

    pub fn epoch_rfc3339(&self) -> String {
        self.epoch.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Config> {
        let args = CliArgs::try_parse_from(
            ["sonyflake"].iter().chain(args).copied(),
        )?;
        Config::try_from(args)
    }

    #[test]
    fn explicit_options() {
        let config = parse(&[
            "--epoch",
            "2025-01-01T00:00:00Z",
            "--machine-id",
            "65535",
            "generate",
            "-n",
            "10",
        ])
        .unwrap();

        assert_eq!(config.epoch.timestamp_millis(), 1_735_689_600_000);
        assert_eq!(config.machine_id, Some(65_535));
        assert_eq!(config.clock_regression_policy, ClockRegressionPolicy::FailFast);
        assert_eq!(
            config.command,
            Command::Generate {
                count: 10,
                threads: 1
            }
        );

        let settings = config.settings().unwrap();
        assert_eq!(settings.machine_id(), 65_535);
        assert_eq!(settings.start_time(), sonyflake::CUSTOM_EPOCH);
    }

    #[test]
    fn options_after_subcommand() {
        let config = parse(&[
            "generate",
            "--machine-id",
            "7",
            "--regression-policy",
            "wait",
            "--max-skew-ms",
            "25",
        ])
        .unwrap();

        assert_eq!(config.machine_id, Some(7));
        assert_eq!(
            config.clock_regression_policy,
            ClockRegressionPolicy::Wait {
                max_skew: Duration::from_millis(25)
            }
        );
    }

    #[test]
    fn epoch_with_offset_is_normalized() {
        let config = parse(&["--epoch", "2021-05-17T09:00:00+09:00", "decode", "1"]).unwrap();
        assert_eq!(config.epoch_rfc3339(), "2021-05-17T00:00:00Z");
    }

    #[test]
    fn rejects_machine_id_out_of_range() {
        let err = parse(&["--machine-id", "65536", "generate"]).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{err}");
    }

    #[test]
    fn rejects_malformed_epoch() {
        let err = parse(&["--epoch", "yesterday", "generate"]).unwrap_err();
        assert!(err.to_string().contains("RFC 3339"), "{err}");
    }

    #[test]
    fn rejects_epoch_before_unix_epoch() {
        assert!(parse(&["--epoch", "1969-12-31T23:59:59Z", "generate"]).is_err());
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(parse(&["generate", "--threads", "0"]).is_err());
    }

    #[test]
    fn decode_requires_ids() {
        assert!(parse(&["decode"]).is_err());
        let config = parse(&["decode", "1", "2", "--json"]).unwrap();
        assert_eq!(
            config.command,
            Command::Decode {
                ids: vec!["1".into(), "2".into()],
                json: true
            }
        );
    }
}
