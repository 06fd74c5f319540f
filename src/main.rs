use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use tracing::info;
use yudetamago::{
    Config, PollPolicy,
    btle::{AdapterSelector, BtleCentral},
};

/// Send `set_led 0 0 0 0` to a "Yudetamago config" peripheral and wait for its result.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Bluetooth adapter to use: `default`, an index, or part of the adapter's name.
    #[arg(long, default_value = "default")]
    device: AdapterSelector,

    /// Scanning duration, 0 for indefinitely.
    #[arg(long = "sd", default_value = "5s", value_parser = humantime::parse_duration)]
    scan_duration: Duration,

    /// ATT MTU to request.
    #[arg(long, default_value_t = 512)]
    mtu: u16,

    /// Give up after this many reads without a result.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    max_reads: u32,

    /// Delay after the first read without a result; doubles on every further one.
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    read_interval: Duration,
}

impl Cli {
    fn config(&self) -> Config {
        let poll = PollPolicy {
            max_attempts: self.max_reads,
            initial_delay: self.read_interval,
            ..Default::default()
        };

        Config {
            mtu: self.mtu,
            poll,
            ..Default::default()
        }
        .with_scan_duration(self.scan_duration)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| "info,yudetamago=debug".parse())?,
        )
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let central = BtleCentral::new(&cli.device)
        .await
        .wrap_err("can't new device")?;

    let response = yudetamago::run(&central, &cli.config(), async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!(response = response.trim_end(), "done");

    Ok(())
}
