//! NATS request/reply prediction service
//!
//! Each request is decoded, predicted and answered on its own task. The
//! predictor is shared read-only; concurrency is bounded by a semaphore.

use crate::config::AppConfig;
use crate::consumer::RequestConsumer;
use crate::error::ErrorKind;
use crate::metrics::{MetricsReporter, ServiceMetrics};
use crate::models::inference::Predictor;
use crate::models::regression::Regressor;
use crate::producer::ReplyProducer;
use crate::types::application::PredictionRequest;
use crate::types::prediction::PredictionReply;
use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Decode a request payload and produce the reply for it.
pub fn handle_payload<M: Regressor>(predictor: &Predictor<M>, payload: &[u8]) -> PredictionReply {
    let request: PredictionRequest = match serde_json::from_slice(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Failed to deserialize prediction request");
            return PredictionReply::error(ErrorKind::Unexpected, format!("invalid request: {}", e));
        }
    };

    match predictor.predict(&request) {
        Ok(result) => PredictionReply::ok(result),
        Err(e) => {
            error!(
                country = %request.country,
                visa_type = %request.visa_type,
                error = %e,
                "Prediction failed"
            );
            PredictionReply::from_error(&e)
        }
    }
}

/// Run the service until the subscription ends.
pub async fn run(config: AppConfig, predictor: Predictor) -> Result<()> {
    let predictor = Arc::new(predictor);
    let metrics = Arc::new(ServiceMetrics::new());

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::from_config(&config.nats);
    let producer = Arc::new(ReplyProducer::new(client.clone(), &config.nats.reply_subject));

    let workers = config.service.workers.max(1);
    info!(
        workers,
        request_subject = %consumer.subject(),
        queue_group = consumer.queue_group().unwrap_or("-"),
        fallback_reply_subject = %producer.fallback_subject(),
        "Starting prediction loop"
    );

    let semaphore = Arc::new(Semaphore::new(workers));

    let reporter = MetricsReporter::new(metrics.clone(), config.service.report_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe(&client).await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let predictor = predictor.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let reply = handle_payload(&*predictor, &message.payload);
            let elapsed = start_time.elapsed();

            match (&reply.result, &reply.error) {
                (Some(result), _) => {
                    metrics.record_prediction(elapsed, result.predicted_days);
                    debug!(
                        prediction_id = %reply.prediction_id,
                        predicted_days = result.predicted_days,
                        processing_time_us = elapsed.as_micros(),
                        "Prediction served"
                    );
                }
                (None, Some(err)) => metrics.record_failure(elapsed, err.kind),
                (None, None) => metrics.record_failure(elapsed, ErrorKind::Unexpected),
            }

            if let Err(e) = producer.publish(message.reply.clone(), &reply).await {
                error!(
                    prediction_id = %reply.prediction_id,
                    error = %e,
                    "Failed to publish prediction reply"
                );
            }

            drop(permit);
        });
    }

    info!("Prediction service shutting down...");
    metrics.print_summary();

    Ok(())
}
