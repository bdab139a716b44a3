use anyhow::{Error, Result};
use tokio::time::{Duration, sleep};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use push_worker::{
    clients::{
        enrichment::EnrichmentClient, fcm::FcmGateway, rbmq::RabbitMqClient,
        status::StatusReporter,
    },
    config::Config,
    consumer::Worker,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let gateway = FcmGateway::init(&config);

    info!(
        queue = %config.push_queue_name,
        user_service = %config.user_service_url,
        template_service = %config.template_service_url,
        "Starting push worker"
    );

    loop {
        tokio::select! {
            result = consume(&config, gateway.clone()) => {
                match result {
                    Ok(()) => break,
                    Err(e) => {
                        error!(error = %e, "Consumer error");
                        info!(
                            delay_secs = config.reconnect_delay_secs,
                            "Reconnecting after delay"
                        );
                        sleep(Duration::from_secs(config.reconnect_delay_secs)).await;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down push worker");
                break;
            }
        }
    }

    Ok(())
}

async fn consume(config: &Config, gateway: FcmGateway) -> Result<(), Error> {
    let rbmq = RabbitMqClient::connect(config).await?;
    let enrichment = EnrichmentClient::new(config)?;
    let status = StatusReporter::new(config)?;

    let worker = Worker::new(rbmq, enrichment, status, gateway, config.retry_policy());
    worker.run().await
}
