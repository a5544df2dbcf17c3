use crate::layer::EntryLayer;
use crate::registry::LoggerRegistry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `default_source`: logger events are routed to when they carry no
///   `source` field.
/// - `min_level`: least severe level still captured (`WARN` captures
///   warnings and errors).
/// - `channel_buffer`: maximum number of records queued before new ones
///   are dropped.
/// - `batch_size`: records written per trip to the blocking pool.
/// - `flush_interval`: maximum delay before a partial batch is written.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`EntryLayer`] and events are echoed to the
///   console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub default_source: String,
    pub min_level: Level,
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            default_source: "app".to_string(),
            min_level: Level::INFO,
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            enable_stdout: true,
        }
    }
}

/// Install an [`EntryLayer`] writing through `registry` as the global
/// default `tracing` subscriber.
///
/// Must be called from within a Tokio runtime; the layer's background task
/// is spawned on it.
///
/// **Returns**
/// - the background task's handle, or
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_with_config(
    registry: Arc<LoggerRegistry>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    let (layer, handle) = EntryLayer::new(registry, &config);

    // Two subscriber shapes because the fmt layer changes the stacked type.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize the bridge with [`LayerConfig::default`], routing events to
/// `default_source`.
pub fn init_tracing(
    registry: Arc<LoggerRegistry>,
    default_source: impl Into<String>,
) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    init_tracing_with_config(
        registry,
        LayerConfig {
            default_source: default_source.into(),
            ..LayerConfig::default()
        },
    )
}
