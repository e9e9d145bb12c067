// src/infrastructure/audit/mod.rs
// Cycle record sinks

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::model::CycleRecord;
use crate::domain::repository::CycleLog;

/// Run history held for the lifetime of the process
#[derive(Default)]
pub struct InMemoryCycleLog {
    records: Mutex<Vec<CycleRecord>>,
}

impl InMemoryCycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CycleRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(records) => records.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CycleLog for InMemoryCycleLog {
    async fn append(&self, record: CycleRecord) -> AuditResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuditError::Unavailable("in-memory log lock poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }
}

/// One JSON document per line, appended
pub struct JsonlCycleLog {
    path: PathBuf,
    // Serialises writers so lines never interleave
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlCycleLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CycleLog for JsonlCycleLog {
    async fn append(&self, record: CycleRecord) -> AuditResult<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Appends to every sink in order. All sinks are attempted; the first
/// error is returned.
pub struct FanOutCycleLog {
    sinks: Vec<Arc<dyn CycleLog + Send + Sync>>,
}

impl FanOutCycleLog {
    pub fn new(sinks: Vec<Arc<dyn CycleLog + Send + Sync>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl CycleLog for FanOutCycleLog {
    async fn append(&self, record: CycleRecord) -> AuditResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.append(record.clone()).await {
                log::error!("Audit: sink append failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        AutonomousDecision, DecisionSource, MarketConditions, PortfolioDecision, PortfolioImpact,
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn record(cycle: u64) -> CycleRecord {
        CycleRecord {
            cycle,
            timestamp: Utc::now(),
            decision: AutonomousDecision {
                source: DecisionSource::Service,
                market_analysis: Value::Null,
                portfolio: PortfolioDecision::default(),
                decisions: Vec::new(),
                rejections: Vec::new(),
                risk_management: Value::Null,
                execution_parameters: Value::Null,
                learning_adaptation: Value::Null,
            },
            outcomes: Vec::new(),
            impact: PortfolioImpact::default(),
            conditions: MarketConditions {
                timestamp: Utc::now(),
                total_equity: dec!(1000),
                active_positions: Some(0),
                market_volatility: "moderate".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_in_memory_log_keeps_order() {
        let log = InMemoryCycleLog::new();
        log.append(record(1)).await.unwrap();
        log.append(record(2)).await.unwrap();

        let cycles: Vec<u64> = log.records().iter().map(|r| r.cycle).collect();
        assert_eq!(cycles, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_jsonl_log_appends_lines() {
        let path = std::env::temp_dir().join(format!("cycles-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let log = JsonlCycleLog::new(&path);
        log.append(record(1)).await.unwrap();
        log.append(record(2)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: CycleRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.cycle, 2);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_sink() {
        let first = Arc::new(InMemoryCycleLog::new());
        let second = Arc::new(InMemoryCycleLog::new());
        let sinks: Vec<Arc<dyn CycleLog + Send + Sync>> = vec![first.clone(), second.clone()];
        let fan_out = FanOutCycleLog::new(sinks);

        fan_out.append(record(7)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.records()[0].cycle, 7);
    }
}
