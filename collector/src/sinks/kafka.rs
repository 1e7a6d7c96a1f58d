use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{DeliveryFuture, FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use tracing::{debug, error, info};

use crate::config::KafkaConfig;
use crate::error::CollectError;
use crate::report::ReportCategory;
use crate::sinks::LineSink;

pub struct KafkaContext {}

impl rdkafka::ClientContext for KafkaContext {}

/// Produces one Kafka message per new report line. The payload is the
/// raw line; a `reportType` header carries the provenance tag so
/// consumers can route without parsing the line.
#[derive(Clone)]
pub struct KafkaSink {
    producer: FutureProducer<KafkaContext>,
    topic: String,
}

impl KafkaSink {
    pub fn new(config: &KafkaConfig) -> anyhow::Result<KafkaSink> {
        info!("connecting to Kafka brokers at {}...", config.kafka_hosts);

        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.kafka_hosts)
            .set("statistics.interval.ms", "10000")
            .set("linger.ms", config.kafka_producer_linger_ms.to_string())
            .set(
                "message.timeout.ms",
                config.kafka_message_timeout_ms.to_string(),
            )
            .set(
                "compression.codec",
                config.kafka_compression_codec.to_owned(),
            )
            .set(
                "queue.buffering.max.kbytes",
                (config.kafka_producer_queue_mib * 1024).to_string(),
            );

        if !config.kafka_sasl_user.is_empty() && !config.kafka_sasl_password.is_empty() {
            client_config
                .set("security.protocol", "sasl_ssl")
                .set("sasl.mechanisms", "SCRAM-SHA-256")
                .set("sasl.username", &config.kafka_sasl_user)
                .set("sasl.password", &config.kafka_sasl_password);
        } else if config.kafka_tls {
            client_config
                .set("security.protocol", "ssl")
                .set("enable.ssl.certificate.verification", "false");
        }

        debug!("rdkafka configuration: {:?}", client_config);
        let producer: FutureProducer<KafkaContext> =
            client_config.create_with_context(KafkaContext {})?;

        // Ping the cluster to make sure we can reach brokers, fail after 10 seconds
        drop(producer.client().fetch_metadata(
            Some("__consumer_offsets"),
            Timeout::After(Duration::new(10, 0)),
        )?);
        info!("connected to Kafka brokers");

        Ok(KafkaSink {
            producer,
            topic: config.kafka_topic.clone(),
        })
    }

    fn enqueue(&self, line: &str, category: ReportCategory) -> Result<DeliveryFuture, CollectError> {
        let headers = OwnedHeaders::new().insert(Header {
            key: "reportType",
            value: Some(category.as_str()),
        });

        let record = FutureRecord::<(), str>::to(self.topic.as_str())
            .payload(line)
            .headers(headers);

        match self.producer.send_result(record) {
            Ok(ack) => Ok(ack),
            Err((err, _)) => {
                error!("failed to enqueue report line: {}", err);
                Err(produce_error(err))
            }
        }
    }

    async fn process_ack(delivery: DeliveryFuture) -> Result<(), CollectError> {
        match delivery.await {
            Err(_) => {
                // Cancelled due to timeout while retrying
                error!("failed to produce report line before write timeout");
                Err(CollectError::PublishFailed(
                    "delivery cancelled by producer".to_string(),
                ))
            }
            Ok(Err((err, _))) => {
                error!("failed to produce report line: {}", err);
                Err(produce_error(err))
            }
            Ok(Ok(_)) => Ok(()),
        }
    }
}

fn produce_error(err: KafkaError) -> CollectError {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::Authentication)
        | Some(RDKafkaErrorCode::SaslAuthenticationFailed)
        | Some(RDKafkaErrorCode::TopicAuthorizationFailed)
        | Some(RDKafkaErrorCode::GroupAuthorizationFailed)
        | Some(RDKafkaErrorCode::ClusterAuthorizationFailed) => {
            CollectError::FatalAuthFailure(err.to_string())
        }
        _ => CollectError::PublishFailed(err.to_string()),
    }
}

#[async_trait]
impl LineSink for KafkaSink {
    async fn publish(&self, line: &str, category: ReportCategory) -> Result<(), CollectError> {
        let ack = self.enqueue(line, category)?;
        Self::process_ack(ack).await?;

        counter!("collector_lines_published_total", "category" => category.as_str()).increment(1);
        Ok(())
    }
}
