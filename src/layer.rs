use crate::init::LayerConfig;
use crate::record::{LogRecord, Severity};
use crate::registry::LoggerRegistry;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events from this crate's own modules are never turned into entries.
const OWN_TARGET: &str = "file_log_sink";

/// A record on its way to the logger registered for `source`.
struct Routed {
    source: String,
    record: LogRecord,
}

/// `tracing_subscriber` layer that turns `tracing` events into
/// [`LogRecord`]s and dispatches them through a [`LoggerRegistry`] from a
/// background task.
///
/// Only events at or above the configured level are captured. The event's
/// `message` becomes the entry message; `caller` and `source` fields, when
/// present, pick the caller and the target logger; every other field is
/// collected into `data`. File I/O never runs on the application thread.
pub struct EntryLayer {
    sender: mpsc::Sender<Routed>,
    default_source: String,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full or closed.
    pub dropped_events: Arc<AtomicU64>,
    /// Dequeued but rejected by the registry or the file write.
    pub failed_entries: Arc<AtomicU64>,
}

impl EntryLayer {
    /// Create a new layer and spawn a background task that pulls records
    /// from a bounded channel and writes them through `registry`.
    ///
    /// Minimal thresholds are enforced for `channel_buffer`, `batch_size`
    /// and `flush_interval` to avoid degenerate configurations. The task
    /// writes what is left and finishes once the layer is dropped.
    pub fn new(registry: Arc<LoggerRegistry>, config: &LayerConfig) -> (Self, JoinHandle<()>) {
        let buffer = config.channel_buffer.max(16);
        let batch_size = config.batch_size.max(1);
        let flush_interval = config.flush_interval.max(Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel::<Routed>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));
        let failed_entries = Arc::new(AtomicU64::new(0));

        let failed_entries_bg = Arc::clone(&failed_entries);

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            // One ticker for the task's lifetime: arrivals must not push the
            // next flush further out.
            let mut ticker = interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(routed) => {
                            batch.push(routed);
                            if batch.len() >= batch_size {
                                write_batch(&registry, &mut batch, &failed_entries_bg).await;
                            }
                        }
                        None => {
                            write_batch(&registry, &mut batch, &failed_entries_bg).await;
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            write_batch(&registry, &mut batch, &failed_entries_bg).await;
                        }
                    }
                }
            }
        });

        (Self {
            sender: tx,
            default_source: config.default_source.clone(),
            min_level: config.min_level,
            total_events,
            enqueued_events,
            dropped_events,
            failed_entries,
        }, handle)
    }
}

/// Hand the batch to a blocking thread; `add_entry` does synchronous file
/// I/O. Failures are reported on stderr since emitting a `tracing` event
/// here would feed back into the layer.
async fn write_batch(
    registry: &Arc<LoggerRegistry>,
    batch: &mut Vec<Routed>,
    failed: &Arc<AtomicU64>,
) {
    if batch.is_empty() {
        return;
    }

    let registry = Arc::clone(registry);
    let failed = Arc::clone(failed);
    let records = std::mem::take(batch);

    let result = tokio::task::spawn_blocking(move || {
        for Routed { source, record } in records {
            if let Err(e) = registry.dispatch(&source, record) {
                failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("error writing log entry for {}: {}", source, e);
            }
        }
    })
    .await;

    if let Err(e) = result {
        eprintln!("log writer task failed: {}", e);
    }
}

fn severity_for(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warning,
        _ => Severity::Info,
    }
}

impl<S> Layer<S> for EntryLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level || meta.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut caller: Option<String> = None;
        let mut source: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
            caller: &mut caller,
            source: &mut source,
        };
        event.record(&mut visitor);

        let caller = caller
            .or_else(|| meta.module_path().map(|s| s.to_string()))
            .unwrap_or_else(|| meta.target().to_string());
        let data = if fields.is_empty() {
            Value::Null
        } else {
            Value::Object(fields.into_iter().collect())
        };

        let routed = Routed {
            source: source.unwrap_or_else(|| self.default_source.clone()),
            record: LogRecord::entry(severity_for(meta.level()), message.unwrap_or_default())
                .with_caller(caller)
                .with_data(data),
        };

        match self.sender.try_send(routed) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log channel full, dropping log record");
            }
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
    pub caller: &'a mut Option<String>,
    pub source: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => *self.message = Some(value),
            "caller" => *self.caller = Some(value),
            "source" => *self.source = Some(value),
            name => {
                self.fields.insert(name.to_string(), Value::String(value));
            }
        }
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.text(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.text(field, format!("{:?}", value));
    }
}
