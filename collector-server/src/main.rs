use envconfig::Envconfig;
use tokio::signal;

use collector::collector::ReportCollector;
use collector::config::Config;
use collector::dedup::RedisDedupStore;
use collector::fetch::ReportFetcher;
use collector::scheduler::{IntervalTicker, Scheduler};
use collector::sinks::kafka::KafkaSink;
use collector::sinks::PrintSink;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("Invalid configuration:");

    let fetcher =
        ReportFetcher::new(config.fetch_timeout.0).expect("failed to create http client");

    let store = RedisDedupStore::new(config.redis_url.clone(), config.dedup_ttl_seconds)
        .await
        .expect("failed to connect to redis");

    tracing::info!(
        interval = ?config.poll_interval.0,
        "starting collection service"
    );

    let result = if config.print_sink {
        let collector = ReportCollector::new(config.sources(), fetcher, store, PrintSink {});
        let mut scheduler =
            Scheduler::new(collector, IntervalTicker::new(config.poll_interval.0));
        scheduler.run(shutdown()).await
    } else {
        let sink = KafkaSink::new(&config.kafka).expect("failed to create kafka sink");
        let collector = ReportCollector::new(config.sources(), fetcher, store, sink);
        let mut scheduler =
            Scheduler::new(collector, IntervalTicker::new(config.poll_interval.0));
        scheduler.run(shutdown()).await
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "collector stopped on fatal error");
        std::process::exit(1);
    }
}
