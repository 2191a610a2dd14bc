use log::{error, info};
use std::process;

use trusty_split::config::{Config, SinkKind, DEFAULT_SHARE_DECIMALS};
use trusty_split::disburse::{DisbursementSink, DryRunSink, JsonFileSink};
use trusty_split::funding::{ConfiguredVault, ShareVault};
use trusty_split::round::{run_round, RoundSettings};
use trusty_split::source::source_for;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(2);
        }
    };

    let settings = RoundSettings {
        token: config.token.clone(),
        sent_max: config.sent_max,
        funding: config.funding,
        share_decimals: config.vault.map_or(DEFAULT_SHARE_DECIMALS, |v| v.decimals),
    };
    info!(
        "Starting {} round for {} (sent max {})",
        config.funding.name(),
        settings.token,
        settings.sent_max
    );

    let source = source_for(&config.source);
    let vault = config.vault.map(|v| {
        ConfiguredVault::new(v.price_per_share, v.decimals, v.share_balance)
            .with_underlying_balance(v.underlying_balance)
    });
    let sink: Box<dyn DisbursementSink> = match &config.sink {
        SinkKind::DryRun => Box::new(DryRunSink),
        SinkKind::JsonFile(path) => Box::new(JsonFileSink::new(path)),
    };

    match run_round(
        &settings,
        source.as_ref(),
        vault.as_ref().map(|v| v as &dyn ShareVault),
        sink.as_ref(),
    )
    .await
    {
        Ok(report) => println!("{}", report.summary()),
        Err(e) => {
            error!("Round aborted: {}", e);
            process::exit(1);
        }
    }
}
