//! CSV Persistence Module
//!
//! Appends token price history and per-round volume totals to daily CSV
//! files for offline analysis

use anyhow::{Context, Result};
use chrono::Utc;
use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::info;

/// One closed-tick history point of a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: i64,
    pub token: String,
    pub symbol: String,
    pub block_number: u64,
    pub price: Decimal,
    pub volume: Decimal,
}

/// USD volume ingested by one polling round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub timestamp: i64,
    pub first_block: u64,
    pub last_block: u64,
    pub swaps: usize,
    pub failed: usize,
    pub volume_usd: Decimal,
}

type CsvLog = csv::Writer<File>;

/// Open today's `<stream>/<stream>_YYYY-MM-DD.csv` under `data_dir` for
/// appending. A file that already holds rows keeps its existing header.
fn open_daily_writer(data_dir: &Path, stream: &str) -> Result<CsvLog> {
    let dir = data_dir.join(stream);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {} directory", stream))?;
    let path = dir.join(format!("{}_{}.csv", stream, Utc::now().format("%Y-%m-%d")));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    let fresh = file.metadata().map(|m| m.len() == 0).unwrap_or(true);

    Ok(WriterBuilder::new().has_headers(fresh).from_writer(file))
}

/// CSV persistence manager
pub struct CsvPersistence {
    data_dir: PathBuf,
    history_writer: Arc<AsyncRwLock<CsvLog>>,
    volume_writer: Arc<AsyncRwLock<CsvLog>>,
}

impl CsvPersistence {
    /// Create new persistence manager
    pub fn new(data_dir: &str) -> Result<Self> {
        let data_dir = PathBuf::from(data_dir);
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let history_writer = open_daily_writer(&data_dir, "history")?;
        let volume_writer = open_daily_writer(&data_dir, "volume")?;

        info!(data_dir = %data_dir.display(), "CSV persistence initialized");

        Ok(Self {
            data_dir,
            history_writer: Arc::new(AsyncRwLock::new(history_writer)),
            volume_writer: Arc::new(AsyncRwLock::new(volume_writer)),
        })
    }

    pub async fn save_history(&self, records: &[HistoryRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut writer = self.history_writer.write().await;
        for record in records {
            writer
                .serialize(record)
                .context("Failed to write history record")?;
        }
        writer.flush().context("Failed to flush history writer")?;
        Ok(())
    }

    pub async fn save_volume(&self, record: VolumeRecord) -> Result<()> {
        let mut writer = self.volume_writer.write().await;
        writer
            .serialize(&record)
            .context("Failed to write volume record")?;
        writer.flush().context("Failed to flush volume writer")?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "dexvolume_persistence_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    fn history_record(block_number: u64) -> HistoryRecord {
        HistoryRecord {
            timestamp: 1_700_000_000_000,
            token: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
            symbol: "WETH".to_string(),
            block_number,
            price: dec!(2000),
            volume: dec!(2.5),
        }
    }

    fn today_file(data_dir: &Path, folder: &str) -> PathBuf {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        data_dir
            .join(folder)
            .join(format!("{}_{}.csv", folder, today))
    }

    #[test]
    fn creates_history_and_volume_dirs() {
        let data_dir = temp_data_dir("dirs");
        let persistence = CsvPersistence::new(data_dir.to_str().unwrap()).unwrap();

        assert!(data_dir.join("history").is_dir());
        assert!(data_dir.join("volume").is_dir());
        assert_eq!(persistence.data_dir(), data_dir.as_path());

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[test]
    fn history_rows_append_under_single_header() {
        let data_dir = temp_data_dir("history_append");

        let persistence = CsvPersistence::new(data_dir.to_str().unwrap()).unwrap();
        tokio_test::block_on(persistence.save_history(&[history_record(20), history_record(40)]))
            .unwrap();
        drop(persistence);

        // Reopening the same day's file must not repeat the header
        let persistence = CsvPersistence::new(data_dir.to_str().unwrap()).unwrap();
        tokio_test::block_on(persistence.save_history(&[history_record(60)])).unwrap();

        let content = fs::read_to_string(today_file(&data_dir, "history")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "timestamp,token,symbol,block_number,price,volume"
        );
        assert_eq!(
            content.matches("block_number").count(),
            1,
            "header must be written once"
        );
        assert!(lines[3].contains(",60,2000,2.5"));

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[test]
    fn empty_history_batch_writes_nothing() {
        let data_dir = temp_data_dir("history_empty");
        let persistence = CsvPersistence::new(data_dir.to_str().unwrap()).unwrap();
        tokio_test::block_on(persistence.save_history(&[])).unwrap();

        let content = fs::read_to_string(today_file(&data_dir, "history")).unwrap();
        assert!(content.is_empty());

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn volume_row_is_flushed() {
        let data_dir = temp_data_dir("volume");
        let persistence = CsvPersistence::new(data_dir.to_str().unwrap()).unwrap();
        persistence
            .save_volume(VolumeRecord {
                timestamp: 1_700_000_000_000,
                first_block: 100,
                last_block: 119,
                swaps: 7,
                failed: 1,
                volume_usd: dec!(12345.678),
            })
            .await
            .unwrap();

        let content = fs::read_to_string(today_file(&data_dir, "volume")).unwrap();
        assert!(content.starts_with("timestamp,first_block,last_block,swaps,failed,volume_usd"));
        assert!(content.contains("1700000000000,100,119,7,1,12345.678"));

        let _ = fs::remove_dir_all(&data_dir);
    }
}
