//! Replay recorded bus traffic
//!
//! Each input line is one record:
//! `{"topic", "partition", "offset"?, "headers"?, "payload"}`. The payload
//! may be the envelope object itself or a string holding it.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use responder_engine::{
    CommandDispatcher, ConsumerRecord, ListenerContainer, LocationIngestor, TopicRouter,
    TransportHeaders,
};
use serde::Deserialize;

use super::Context;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Newline-delimited JSON records
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RecordedRecord {
    topic: String,
    #[serde(default)]
    partition: i32,
    offset: Option<i64>,
    #[serde(default)]
    headers: HashMap<String, String>,
    payload: serde_json::Value,
}

impl RecordedRecord {
    fn into_record(self, line: usize) -> ConsumerRecord {
        let payload = match self.payload {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        ConsumerRecord::new(self.topic, self.partition, payload)
            .with_offset(self.offset.unwrap_or(line as i64))
            .with_headers(TransportHeaders::from(self.headers))
    }
}

pub fn execute(ctx: &Context, args: ReplayArgs) -> anyhow::Result<()> {
    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    tracing::debug!(input = %args.input.display(), "replaying records");

    let topics = &ctx.config.topics;
    let router = TopicRouter::new()
        .route(
            topics.update_responder_command.clone(),
            Arc::new(CommandDispatcher::new(
                Arc::clone(&ctx.store),
                ctx.emitter.clone(),
                ctx.config.destinations.responder_updated_event.clone(),
            )),
        )
        .route(
            topics.responder_location_update.clone(),
            Arc::new(LocationIngestor::new(Arc::clone(&ctx.store))),
        );
    let container = ListenerContainer::start(&ctx.config.consumer, Arc::new(router))?;

    let mut submitted = 0usize;
    let mut failure = None;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let submit = line
            .with_context(|| format!("failed to read line {}", index + 1))
            .and_then(|line| {
                if line.trim().is_empty() {
                    return Ok(false);
                }
                let recorded: RecordedRecord = serde_json::from_str(&line)
                    .with_context(|| format!("line {} is not a recorded record", index + 1))?;
                container.submit(recorded.into_record(index))?;
                Ok(true)
            });
        match submit {
            Ok(true) => submitted += 1,
            Ok(false) => {}
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    let stats = container.shutdown();
    eprintln!(
        "replayed {} records: {} committed, {} redelivered, {} skipped",
        submitted, stats.committed, stats.redelivered, stats.skipped
    );
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
