//! Test Request Generator
//!
//! Sends randomized prediction requests to the estimator service and logs
//! the replies.

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use visa_processing_estimator::types::{PredictionReply, PredictionRequest};

const COUNTRIES: &[&str] = &[
    "India",
    "United States",
    "United Kingdom",
    "Canada",
    "Australia",
    "Germany",
    "France",
    "Japan",
    "Brazil",
    "Atlantis",
];

const VISA_TYPES: &[&str] = &["Student", "Tourist", "Work", "Diplomatic"];

/// Random prediction request generator
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    base_date: NaiveDate,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            base_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }

    fn generate(&mut self) -> PredictionRequest {
        let offset = self.rng.gen_range(0..366);
        let date = self.base_date + ChronoDuration::days(offset);

        let mut request = PredictionRequest::new(
            date.format("%Y-%m-%d").to_string(),
            self.pick(COUNTRIES),
            self.pick(VISA_TYPES),
        );

        // Occasionally exercise the fallback paths
        if self.rng.gen_bool(0.05) {
            request.application_date = "not-a-date".to_string();
        }
        if self.rng.gen_bool(0.05) {
            request = request.with_processing_office("Geneva");
        }

        request
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Command line: `[nats_url] [subject] [count] [delay_ms] [--dry-run]`,
/// flags allowed anywhere
#[derive(Debug, Default, PartialEq)]
struct Args {
    positional: Vec<String>,
    dry_run: bool,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(raw: I) -> Self {
        let mut args = Self::default();
        for arg in raw {
            match arg.as_str() {
                "--dry-run" => args.dry_run = true,
                flag if flag.starts_with("--") => warn!(flag = %flag, "Ignoring unknown flag"),
                _ => args.positional.push(arg),
            }
        }
        args
    }

    fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_requester=info".parse()?),
        )
        .init();

    info!("Starting Test Request Generator");

    let args = Args::parse(std::env::args().skip(1));
    let nats_url = args.positional(0).unwrap_or("nats://localhost:4222");
    let subject = args.positional(1).unwrap_or("visa.predict");
    let count: u64 = args.positional(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let delay_ms: u64 = args.positional(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let dry_run = args.dry_run;

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    if dry_run {
        return run_dry_mode(count, delay_ms).await;
    }

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, delay_ms).await;
        }
    };

    let mut generator = RequestGenerator::new();
    let mut answered = 0u64;
    let mut failed = 0u64;

    for i in 0..count {
        let request = generator.generate();
        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(message) => match serde_json::from_slice::<PredictionReply>(&message.payload) {
                Ok(reply) => match (&reply.result, &reply.error) {
                    (Some(result), _) => {
                        answered += 1;
                        info!(
                            prediction_id = %reply.prediction_id,
                            country = %result.country,
                            visa_type = %result.visa_type,
                            season = %result.season,
                            office = %result.processing_office,
                            predicted_days = result.predicted_days,
                            "Prediction received"
                        );
                    }
                    (None, Some(err)) => {
                        failed += 1;
                        warn!(kind = ?err.kind, message = %err.message, "Service returned an error");
                    }
                    (None, None) => {
                        failed += 1;
                        warn!(prediction_id = %reply.prediction_id, "Empty reply");
                    }
                },
                Err(e) => {
                    failed += 1;
                    warn!(error = %e, "Failed to decode reply");
                }
            },
            Err(e) => {
                failed += 1;
                warn!(error = %e, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!("Sent {}/{} requests ({} answered, {} failed)", i + 1, count, answered, failed);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} answered, {} failed)",
        count, answered, failed
    );

    Ok(())
}

async fn run_dry_mode(count: u64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();

    for i in 0..count {
        let request = generator.generate();
        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
