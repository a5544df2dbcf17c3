use std::sync::Arc;
use std::time::Instant;

use file_log_sink::caller::NoCallerInfo;
use file_log_sink::{FileLogger, LogRecord, Severity, TextBackend};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("file-log-sink-load");
    let logger = FileLogger::builder("load", Arc::new(TextBackend::new(&dir)))
        .caller_info(Arc::new(NoCallerInfo))
        .build()?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.add_entry(
            LogRecord::entry(Severity::Error, "default load test error")
                .with_caller("load:main")
                .with_data(json!({ "iteration": i })),
        )?;
    }

    let elapsed = start.elapsed();
    println!("sequential: wrote {} entries in {:?} (~{:.0} entries/s) to {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        logger.path().display()
    );
    Ok(())
}
