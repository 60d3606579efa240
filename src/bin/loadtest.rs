use std::{fs, io::Write, sync::Arc};

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use rpc_loadgen::{
    ConstantArrivalRate, HttpTransport, LoadTestSettings, MeteredTransport, Metrics,
    RpcTransport, TrafficGenerator, resolve_config,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = LoadTestSettings::from_env()?;
    let config = resolve_config(settings)?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level.as_tracing())
        .init();

    tracing::info!(
        base_url = %config.base_url,
        chains = config.chains.len(),
        variant = %config.variant,
        "loadtest configured"
    );

    let metrics = Arc::new(Metrics::new());
    let transport: Arc<dyn RpcTransport> = Arc::new(MeteredTransport::new(
        HttpTransport::new(&config)?,
        Arc::clone(&metrics),
    ));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, stopping");
                cancel.cancel();
            }
        });
    }

    let executor = ConstantArrivalRate::new(config.scenario.clone(), Arc::clone(&metrics));
    let report = executor
        .run(
            |_vu| {
                TrafficGenerator::new(
                    &config,
                    Arc::clone(&transport),
                    Arc::clone(&metrics),
                    StdRng::from_entropy(),
                )
            },
            cancel,
        )
        .await;

    tracing::info!(
        started = report.started,
        dropped = report.dropped,
        vus = report.vus_allocated,
        interrupted = report.interrupted,
        elapsed_s = report.elapsed.as_secs_f64(),
        "scenario finished"
    );

    let summary = metrics.summary();
    println!("{}", summary.render_text());

    fs::create_dir_all(&config.results_dir)?;
    let now = Utc::now();
    let json_path = config.results_dir.join(format!(
        "summary-{}-{}.json",
        config.variant,
        now.to_rfc3339().replace(':', "-")
    ));
    fs::write(&json_path, serde_json::to_string_pretty(&summary)?)?;
    println!("WROTE_SUMMARY {}", json_path.display());

    let prom_path = config.results_dir.join("loadtest_metrics.prom");
    let mut prom = fs::OpenOptions::new().create(true).append(true).open(&prom_path)?;
    for line in summary.to_prometheus(&config.variant, now.timestamp_millis()) {
        writeln!(prom, "{line}")?;
    }
    println!("WROTE_PROMETHEUS {}", prom_path.display());

    Ok(())
}
