use anyhow::{Error, Result};
use futures_util::StreamExt;
use tracing::{error, info, warn};

use crate::{
    clients::{
        enrichment::EnrichmentClient,
        fcm::{PushGateway, PushNote},
        rbmq::{MessageQueue, RabbitMqClient},
        status::StatusReporter,
    },
    models::{
        message::{DlqMessage, WorkItem},
        retry::{RetryDecision, RetryPolicy},
        status::DeliveryStatus,
    },
    render::{build_data_payload, render},
};

/// Terminal decision for one processing pass over a work item.
///
/// Malformed payloads never get this far; they are rejected at the parse
/// stage without a decision, since there is no identifier to attribute
/// one to.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Delivery succeeded; acknowledge and report `delivered`.
    Delivered,

    /// Intentional no-op (user opt-out); acknowledge and report
    /// `skipped`. Never dead-lettered.
    Skip { reason: String },

    /// Transient delivery failure within the retry budget. The carried
    /// item already has its retry count incremented.
    RetryScheduled {
        item: WorkItem,
        delay_secs: u64,
        attempt: u32,
    },

    /// Terminal failure; publish to the DLQ, acknowledge, report
    /// `failed`.
    DeadLetter { reason: String },
}

/// Runs the enrichment, render, and delivery steps for one item and
/// decides its fate. Performs no queue operations itself; the caller
/// applies the disposition so that publishes can be ordered before the
/// ack.
pub async fn process_delivery<G: PushGateway>(
    item: &WorkItem,
    enrichment: &EnrichmentClient,
    gateway: &G,
    policy: &RetryPolicy,
) -> Disposition {
    let Some(user) = enrichment.fetch_user(&item.user_id).await else {
        error!(user_id = %item.user_id, "User not found");
        return Disposition::DeadLetter {
            reason: "User not found".to_string(),
        };
    };

    let Some(push_token) = user.push_token.filter(|t| !t.is_empty()) else {
        error!(user_id = %item.user_id, "No push token found for user");
        return Disposition::DeadLetter {
            reason: "Missing push token".to_string(),
        };
    };

    if !user.preferences.push {
        info!(user_id = %item.user_id, "User has disabled push notifications");
        return Disposition::Skip {
            reason: "User disabled push notifications".to_string(),
        };
    }

    let Some(template) = enrichment.fetch_template(&item.template_code).await else {
        error!(template_code = %item.template_code, "Template not found");
        return Disposition::DeadLetter {
            reason: "Template not found".to_string(),
        };
    };

    let title = render(template.title.as_deref().unwrap_or("Notification"), &item.variables);
    let body = render(template.body.as_deref().unwrap_or(""), &item.variables);
    let data = build_data_payload(&item.notification_id, &item.variables);

    let note = PushNote {
        token: &push_token,
        title: &title,
        body: &body,
        data,
        image_url: template.image_url.as_deref(),
    };

    match gateway.send(note).await {
        Ok(()) => Disposition::Delivered,
        Err(failure) => {
            warn!(
                notification_id = %item.notification_id,
                failure = %failure,
                "Push delivery failed"
            );

            match policy.decide(item.retry_count) {
                RetryDecision::Retry {
                    next_attempt,
                    delay_secs,
                } => {
                    let mut retried = item.clone();
                    retried.retry_count = next_attempt;
                    Disposition::RetryScheduled {
                        item: retried,
                        delay_secs,
                        attempt: next_attempt,
                    }
                }
                RetryDecision::GiveUp => Disposition::DeadLetter {
                    reason: "Max retries exceeded".to_string(),
                },
            }
        }
    }
}

/// The consumption loop: one unacknowledged item at a time, processed to
/// a terminal decision before the next pull.
pub struct Worker<Q, G> {
    queue: Q,
    enrichment: EnrichmentClient,
    status: StatusReporter,
    gateway: G,
    policy: RetryPolicy,
}

impl<G: PushGateway> Worker<RabbitMqClient, G> {
    /// Consumes until the delivery stream ends or the connection fails.
    /// A connection error propagates so the caller can reconnect;
    /// per-message errors never escape.
    pub async fn run(&self) -> Result<(), Error> {
        let mut consumer = self.queue.create_consumer().await?;
        info!("Push worker ready, waiting for messages");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery?;
            self.handle_delivery(delivery.delivery_tag, &delivery.data).await;
        }

        Ok(())
    }
}

impl<Q: MessageQueue, G: PushGateway> Worker<Q, G> {
    pub fn new(
        queue: Q,
        enrichment: EnrichmentClient,
        status: StatusReporter,
        gateway: G,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            enrichment,
            status,
            gateway,
            policy,
        }
    }

    /// Processes one raw delivery to a terminal decision and performs
    /// the matching queue effects. Never fails the loop.
    pub async fn handle_delivery(&self, delivery_tag: u64, payload: &[u8]) {
        let item = match serde_json::from_slice::<WorkItem>(payload) {
            Ok(item) => item,
            Err(e) => {
                error!(error = %e, "Invalid message payload, discarding");
                if let Err(e) = self.queue.reject(delivery_tag, false).await {
                    error!(error = %e, "Failed to reject malformed message");
                }
                return;
            }
        };

        info!(
            notification_id = %item.notification_id,
            attempt = item.retry_count + 1,
            max_attempts = self.policy.max_attempts + 1,
            "Processing notification"
        );

        let disposition =
            process_delivery(&item, &self.enrichment, &self.gateway, &self.policy).await;

        if let Err(e) = self.apply(delivery_tag, &item, disposition).await {
            error!(
                error = %e,
                notification_id = %item.notification_id,
                "Failed to finalize message, discarding"
            );
            if let Err(e) = self.queue.reject(delivery_tag, false).await {
                error!(error = %e, "Failed to reject message");
            }
        }
    }

    /// Applies a disposition. DLQ and retry publishes happen before the
    /// ack of the original message: a crash between the two redelivers
    /// the item instead of dropping it. Status reports come last and
    /// cannot change the decision.
    async fn apply(
        &self,
        delivery_tag: u64,
        item: &WorkItem,
        disposition: Disposition,
    ) -> Result<(), Error> {
        match disposition {
            Disposition::Delivered => {
                self.queue.acknowledge(delivery_tag).await?;
                self.status
                    .report(&item.notification_id, DeliveryStatus::Delivered, None)
                    .await;
                info!(
                    notification_id = %item.notification_id,
                    "Push notification delivered successfully"
                );
            }
            Disposition::Skip { reason } => {
                self.queue.acknowledge(delivery_tag).await?;
                self.status
                    .report(&item.notification_id, DeliveryStatus::Skipped, Some(reason))
                    .await;
            }
            Disposition::DeadLetter { reason } => {
                let dlq_message = DlqMessage::new(item.clone(), reason.clone());
                self.queue.publish_to_dlq(&dlq_message).await?;
                self.queue.acknowledge(delivery_tag).await?;
                self.status
                    .report(&item.notification_id, DeliveryStatus::Failed, Some(reason))
                    .await;
            }
            Disposition::RetryScheduled {
                item: retried,
                delay_secs,
                attempt,
            } => {
                // A lost retry is preferable to crashing the consumer.
                if let Err(e) = self.queue.schedule_retry(&retried, delay_secs).await {
                    warn!(
                        error = %e,
                        notification_id = %retried.notification_id,
                        "Failed to schedule retry, attempt is lost"
                    );
                }
                self.queue.acknowledge(delivery_tag).await?;
                self.status
                    .report(
                        &item.notification_id,
                        DeliveryStatus::Pending,
                        Some(format!("Retry scheduled (attempt {})", attempt)),
                    )
                    .await;
            }
        }

        Ok(())
    }
}
