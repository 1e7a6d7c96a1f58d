use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

use crate::report::{ReportCategory, ReportSource};

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "false")]
    pub print_sink: bool,

    pub redis_url: String,

    /// How long a seen key stays marked, in seconds. 0 keeps keys
    /// forever. The feeds are daily cumulative logs, so 48h comfortably
    /// outlives any re-listed line.
    #[envconfig(default = "172800")]
    pub dedup_ttl_seconds: usize,

    #[envconfig(default = "60000")]
    pub poll_interval: EnvMsDuration,

    #[envconfig(default = "10000")]
    pub fetch_timeout: EnvMsDuration,

    #[envconfig(nested = true)]
    pub kafka: KafkaConfig,

    #[envconfig(default = "https://www.spc.noaa.gov/climo/reports/today_hail.csv")]
    pub hail_report_url: String,

    #[envconfig(default = "https://www.spc.noaa.gov/climo/reports/today_wind.csv")]
    pub wind_report_url: String,

    #[envconfig(default = "https://www.spc.noaa.gov/climo/reports/today_torn.csv")]
    pub tornado_report_url: String,
}

impl Config {
    /// The fixed source set for this process. Not hard-limited to three
    /// categories, but these are the feeds the reference deployment
    /// polls.
    pub fn sources(&self) -> Vec<ReportSource> {
        vec![
            ReportSource {
                category: ReportCategory::Hail,
                url: self.hail_report_url.clone(),
            },
            ReportSource {
                category: ReportCategory::Wind,
                url: self.wind_report_url.clone(),
            },
            ReportSource {
                category: ReportCategory::Tornado,
                url: self.tornado_report_url.clone(),
            },
        ]
    }
}

#[derive(Envconfig, Clone)]
pub struct KafkaConfig {
    #[envconfig(default = "20")]
    pub kafka_producer_linger_ms: u32, // Maximum time between producer batches during low traffic

    #[envconfig(default = "400")]
    pub kafka_producer_queue_mib: u32, // Size of the in-memory producer queue in mebibytes

    #[envconfig(default = "20000")]
    pub kafka_message_timeout_ms: u32, // Time before we stop retrying producing a message: 20 seconds

    #[envconfig(default = "none")]
    pub kafka_compression_codec: String, // none, gzip, snappy, lz4, zstd

    pub kafka_hosts: String,
    pub kafka_topic: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    #[envconfig(default = "")]
    pub kafka_sasl_user: String,

    #[envconfig(default = "")]
    pub kafka_sasl_password: String,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}
