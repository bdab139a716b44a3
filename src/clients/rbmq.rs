use std::future::Future;

use anyhow::{Error, Result, anyhow};
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        BasicRejectOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable},
};
use tracing::{info, warn};

use crate::{
    config::Config,
    models::message::{DlqMessage, WorkItem},
};

/// Queue operations the consumer uses to finalize a message. Split from
/// the concrete client so the ack/reject/publish ordering rules can be
/// exercised without a broker.
pub trait MessageQueue {
    fn acknowledge(&self, delivery_tag: u64) -> impl Future<Output = Result<(), Error>> + Send;

    fn reject(
        &self,
        delivery_tag: u64,
        requeue: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn publish_to_dlq(
        &self,
        message: &DlqMessage,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn schedule_retry(
        &self,
        item: &WorkItem,
        delay_secs: u64,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Per-message TTL for a delay queue. Checked so an oversized configured
/// tier saturates instead of wrapping into a negative TTL.
pub fn retry_ttl_millis(delay_secs: u64) -> i64 {
    i64::try_from(delay_secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}

/// Owns the channel for one consumption loop. All coordination (delayed
/// retries, dead-lettering) is expressed through durable queue topology
/// declared here, never through in-process state.
pub struct RabbitMqClient {
    channel: Channel,
    push_queue_name: String,
    failed_queue_name: String,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        info!("RabbitMQ connection established");

        let channel = connection
            .create_channel()
            .await
            .map_err(|_| anyhow!("RabbitMQ channel creation failed"))?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to set up QoS"))?;

        let mut push_queue_args = FieldTable::default();
        push_queue_args.insert("x-max-priority".into(), AMQPValue::LongInt(10));

        channel
            .queue_declare(
                &config.push_queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                push_queue_args,
            )
            .await
            .map_err(|_| anyhow!("Failed to declare push queue"))?;

        channel
            .queue_declare(
                &config.failed_queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to declare failed queue"))?;

        info!(
            push_queue = %config.push_queue_name,
            failed_queue = %config.failed_queue_name,
            "Queues declared"
        );

        Ok(Self {
            channel,
            push_queue_name: config.push_queue_name.clone(),
            failed_queue_name: config.failed_queue_name.clone(),
        })
    }

    pub async fn create_consumer(&self) -> Result<Consumer, Error> {
        let consumer = self
            .channel
            .basic_consume(
                &self.push_queue_name,
                "push_worker",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to create consumer"))?;

        Ok(consumer)
    }
}

impl MessageQueue for RabbitMqClient {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to acknowledge message"))?;

        Ok(())
    }

    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error> {
        self.channel
            .basic_reject(delivery_tag, BasicRejectOptions { requeue })
            .await
            .map_err(|_| anyhow!("Failed to reject message"))?;

        Ok(())
    }

    async fn publish_to_dlq(&self, message: &DlqMessage) -> Result<(), Error> {
        let payload = serde_json::to_vec(message)?;

        self.channel
            .basic_publish(
                "",
                &self.failed_queue_name,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|_| anyhow!("Failed to publish message to dlq"))?;

        warn!(
            notification_id = %message.item.notification_id,
            reason = %message.failure_reason,
            "Message moved to DLQ"
        );

        Ok(())
    }

    /// Publishes the item onto the delay queue for `delay_secs`. The
    /// queue is declared with a per-message TTL that dead-letters back
    /// to the main queue, so expiry alone re-enqueues the item.
    /// Declaration is idempotent: the same name always carries the same
    /// arguments.
    async fn schedule_retry(&self, item: &WorkItem, delay_secs: u64) -> Result<(), Error> {
        let retry_queue = format!("{}.retry.{}", self.push_queue_name, delay_secs);

        let mut args = FieldTable::default();
        args.insert(
            "x-message-ttl".into(),
            AMQPValue::LongLongInt(retry_ttl_millis(delay_secs)),
        );
        args.insert("x-dead-letter-exchange".into(), AMQPValue::LongString("".into()));
        args.insert(
            "x-dead-letter-routing-key".into(),
            AMQPValue::LongString(self.push_queue_name.as_str().into()),
        );

        self.channel
            .queue_declare(
                &retry_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                args,
            )
            .await
            .map_err(|_| anyhow!("Failed to declare retry queue"))?;

        let payload = serde_json::to_vec(item)?;

        self.channel
            .basic_publish(
                "",
                &retry_queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|_| anyhow!("Failed to publish message to retry queue"))?;

        info!(
            notification_id = %item.notification_id,
            retry_queue = %retry_queue,
            delay_secs,
            attempt = item.retry_count,
            "Message scheduled for retry"
        );

        Ok(())
    }
}
