use async_trait::async_trait;
use metrics::counter;

use crate::error::CollectError;
use crate::report::ReportCategory;

pub mod kafka;

/// Publishing boundary: forward one report line to the downstream topic,
/// tagged with the category it came from.
#[async_trait]
pub trait LineSink: Send + Sync {
    async fn publish(&self, line: &str, category: ReportCategory) -> Result<(), CollectError>;
}

/// Logs lines instead of producing them, for local development.
pub struct PrintSink {}

#[async_trait]
impl LineSink for PrintSink {
    async fn publish(&self, line: &str, category: ReportCategory) -> Result<(), CollectError> {
        tracing::info!(category = %category, line, "report line");
        counter!("collector_lines_published_total", "category" => category.as_str()).increment(1);

        Ok(())
    }
}
