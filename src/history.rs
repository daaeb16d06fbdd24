use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::errors::HistoryError;
use crate::models::forecast::ForecastRecord;

/// Which record survives when existing and incoming history share a date
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// The most recently supplied record wins
    #[default]
    IncomingWins,
    /// Stored records are kept, incoming records only fill new dates
    ExistingWins,
}

/// Record-oriented representation, date as an ISO-8601 timestamp
#[derive(Serialize, Deserialize)]
struct JsonRecord {
    date: NaiveDateTime,
    uv_index: f64,
    ozone_column: Option<f64>,
}

impl From<&ForecastRecord> for JsonRecord {
    fn from(r: &ForecastRecord) -> Self {
        Self { date: r.date.and_time(NaiveTime::MIN), uv_index: r.uv_index, ozone_column: r.ozone_column }
    }
}

/// Merges incoming records into existing history.
///
/// The result holds exactly one record per date in ascending date order. With
/// MergePolicy::IncomingWins the last supplied record for a date is kept, so incoming
/// beats existing and a later incoming record beats an earlier one.
///
/// # Arguments
///
/// * 'existing' - history as previously persisted
/// * 'incoming' - freshly normalized records
/// * 'policy' - resolution of same date conflicts
pub fn merge(existing: &[ForecastRecord], incoming: &[ForecastRecord], policy: MergePolicy) -> Vec<ForecastRecord> {
    let mut merged: BTreeMap<NaiveDate, ForecastRecord> = BTreeMap::new();

    for r in existing {
        merged.insert(r.date, r.clone());
    }
    let stored = existing.iter().map(|r| r.date).collect::<HashSet<NaiveDate>>();
    for r in incoming {
        if policy == MergePolicy::IncomingWins || !stored.contains(&r.date) {
            merged.insert(r.date, r.clone());
        }
    }

    merged.into_values().collect()
}

/// Handle on the persisted forecast history, a csv file with one row per date and a
/// json file holding the same records
pub struct HistoryStore {
    csv_path: PathBuf,
    json_path: PathBuf,
}

impl HistoryStore {
    /// Returns a new HistoryStore over the given files, nothing is read until load
    ///
    /// # Arguments
    ///
    /// * 'csv_path' - the row-oriented history file
    /// * 'json_path' - the record-oriented history file
    pub fn open(csv_path: &str, json_path: &str) -> Self {
        Self { csv_path: PathBuf::from(csv_path), json_path: PathBuf::from(json_path) }
    }

    /// Loads the stored history from the csv file, falling back to the json file when the
    /// csv is missing or can't be read. No readable history at all is an empty history.
    /// Any file that can't be read is set aside as `<name>.corrupt-<timestamp>` so that
    /// the next persist doesn't destroy it.
    ///
    pub fn load(&self) -> Vec<ForecastRecord> {
        if self.csv_path.exists() {
            match read_csv(&self.csv_path) {
                Ok(records) => {
                    info!("loaded {} history records from {}", records.len(), self.csv_path.display());
                    return records;
                },
                Err(e) => {
                    warn!("{}, trying {}", e, self.json_path.display());
                    set_aside_corrupt(&self.csv_path);
                },
            }
        }

        if !self.json_path.exists() {
            info!("no history at {}, starting a new one", self.csv_path.display());
            return Vec::new();
        }

        match read_json(&self.json_path) {
            Ok(records) => {
                warn!("recovered {} history records from {}", records.len(), self.json_path.display());
                records
            },
            Err(e) => {
                warn!("{}, continuing with empty history", e);
                set_aside_corrupt(&self.json_path);
                Vec::new()
            },
        }
    }

    /// Loads history, merges the incoming records and persists the result.
    /// The merged table is returned even when persisting fails, together with the error.
    ///
    /// # Arguments
    ///
    /// * 'incoming' - freshly normalized records
    /// * 'policy' - resolution of same date conflicts
    pub fn update(&self, incoming: &[ForecastRecord], policy: MergePolicy) -> (Vec<ForecastRecord>, Result<(), HistoryError>) {
        let existing = self.load();
        let merged = merge(&existing, incoming, policy);
        let result = self.persist(&merged);

        (merged, result)
    }

    /// Writes the table to both history files. Each file is first written in full to a
    /// temporary sibling which then replaces the previous version.
    ///
    /// # Arguments
    ///
    /// * 'table' - records in ascending date order, unique dates
    pub fn persist(&self, table: &[ForecastRecord]) -> Result<(), HistoryError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for r in table {
            writer.serialize(r)?;
        }
        let csv = writer.into_inner().map_err(|e| HistoryError::Persist(e.to_string()))?;

        let records = table.iter().map(JsonRecord::from).collect::<Vec<JsonRecord>>();
        let json = serde_json::to_string_pretty(&records)?;

        replace_file(&self.csv_path, &csv)?;
        replace_file(&self.json_path, json.as_bytes())?;
        info!("persisted {} history records", table.len());

        Ok(())
    }
}

/// Reads the csv history, any unreadable row makes the whole file corrupt
///
/// # Arguments
///
/// * 'path' - path to the csv history
fn read_csv(path: &Path) -> Result<Vec<ForecastRecord>, HistoryError> {
    let corrupt = |e: &dyn std::fmt::Display| HistoryError::Corrupt(format!("{}: {}", path.display(), e));

    let mut reader = csv::Reader::from_path(path).map_err(|e| corrupt(&e))?;
    let mut records: Vec<ForecastRecord> = Vec::new();
    for row in reader.deserialize() {
        records.push(row.map_err(|e| corrupt(&e))?);
    }

    Ok(records)
}

/// Reads the json history, dates are timestamps of which only the date is kept
///
/// # Arguments
///
/// * 'path' - path to the json history
fn read_json(path: &Path) -> Result<Vec<ForecastRecord>, HistoryError> {
    let corrupt = |e: &dyn std::fmt::Display| HistoryError::Corrupt(format!("{}: {}", path.display(), e));

    let json = fs::read_to_string(path).map_err(|e| corrupt(&e))?;
    let records: Vec<JsonRecord> = serde_json::from_str(&json).map_err(|e| corrupt(&e))?;

    Ok(records
        .into_iter()
        .map(|r| ForecastRecord { date: r.date.date(), uv_index: r.uv_index, ozone_column: r.ozone_column })
        .collect())
}

fn set_aside_corrupt(path: &Path) {
    let mut name = path.to_path_buf().into_os_string();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%d%H%M%S")));

    match fs::rename(path, &name) {
        Ok(()) => warn!("corrupt history kept as {}", PathBuf::from(name).display()),
        Err(e) => warn!("could not set aside corrupt history {}: {}", path.display(), e),
    }
}

fn replace_file(path: &Path, content: &[u8]) -> Result<(), HistoryError> {
    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");

    fs::write(&tmp, content)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| {
            let _ = fs::remove_file(&tmp);
            HistoryError::Persist(format!("{}: {}", path.display(), e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(day: u32, uv: f64) -> ForecastRecord {
        ForecastRecord { date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(), uv_index: uv, ozone_column: Some(300.0) }
    }

    fn store(name: &str) -> HistoryStore {
        let dir = std::env::temp_dir().join(format!("uvforecast_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        HistoryStore::open(
            dir.join("history.csv").to_str().unwrap(),
            dir.join("history.json").to_str().unwrap(),
        )
    }

    #[test]
    fn incoming_wins_on_same_date() {
        let merged = merge(&[rec(1, 3.0)], &[rec(1, 9.0)], MergePolicy::IncomingWins);
        assert_eq!(merged, vec![rec(1, 9.0)]);
    }

    #[test]
    fn existing_wins_when_asked() {
        let merged = merge(&[rec(1, 3.0)], &[rec(1, 9.0), rec(2, 4.0)], MergePolicy::ExistingWins);
        assert_eq!(merged, vec![rec(1, 3.0), rec(2, 4.0)]);
    }

    #[test]
    fn later_incoming_beats_earlier_incoming() {
        let merged = merge(&[], &[rec(2, 1.0), rec(1, 5.0), rec(2, 2.0)], MergePolicy::IncomingWins);
        assert_eq!(merged, vec![rec(1, 5.0), rec(2, 2.0)]);
    }

    #[test]
    fn history_fuses_with_newer_fetch() {
        let s = store("fuse");
        s.persist(&[rec(1, 4.0)]).unwrap();

        let (merged, result) = s.update(&[rec(1, 6.5), rec(2, 7.0)], MergePolicy::IncomingWins);
        assert!(result.is_ok());
        assert_eq!(merged, vec![rec(1, 6.5), rec(2, 7.0)]);
        assert_eq!(s.load(), merged);
    }

    #[test]
    fn persisted_files_have_expected_layout() {
        let s = store("layout");
        let table = vec![
            rec(1, 4.0),
            ForecastRecord { date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), uv_index: 5.5, ozone_column: None },
        ];
        s.persist(&table).unwrap();

        let csv = fs::read_to_string(&s.csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["date,uv_index,ozone_column", "2024-06-01,4.0,300.0", "2024-06-02,5.5,"]);

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&s.json_path).unwrap()).unwrap();
        assert_eq!(json[0]["date"], "2024-06-01T00:00:00");
        assert_eq!(json[1]["ozone_column"], serde_json::Value::Null);
        assert_eq!(s.load(), table);
    }

    #[test]
    fn missing_history_is_empty() {
        let s = store("missing");
        assert!(s.load().is_empty());
    }

    #[test]
    fn corrupt_history_is_empty_and_kept_aside() {
        let s = store("corrupt");
        fs::write(&s.csv_path, "date,uv_index,ozone_column\nyesterday,4.0,300\n").unwrap();

        assert!(s.load().is_empty());
        assert!(!s.csv_path.exists());
        let dir = s.csv_path.parent().unwrap();
        let kept = fs::read_dir(dir).unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("history.csv.corrupt-"))
            .count();
        assert_eq!(kept, 1);
    }

    #[test]
    fn corrupt_csv_falls_back_to_json_history() {
        let s = store("csv_fallback");
        s.persist(&[rec(1, 1.0), rec(2, 2.0), rec(3, 3.0), rec(4, 4.0), rec(5, 5.0)]).unwrap();
        let csv = fs::read_to_string(&s.csv_path).unwrap().replace("2024-06-03", "2024-05-3x");
        fs::write(&s.csv_path, csv).unwrap();

        let (merged, result) = s.update(&[rec(6, 6.0)], MergePolicy::IncomingWins);
        assert!(result.is_ok());
        assert_eq!(merged.len(), 6);
        assert_eq!(merged[2], rec(3, 3.0));
        assert_eq!(s.load(), merged);

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&s.json_path).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 6);
    }

    #[test]
    fn missing_csv_falls_back_to_json_history() {
        let s = store("csv_missing");
        s.persist(&[rec(1, 1.0), rec(2, 2.0)]).unwrap();
        fs::remove_file(&s.csv_path).unwrap();

        assert_eq!(s.load(), vec![rec(1, 1.0), rec(2, 2.0)]);
    }

    #[test]
    fn both_files_corrupt_are_kept_aside() {
        let s = store("both_corrupt");
        fs::write(&s.csv_path, "date,uv_index,ozone_column\nyesterday,4.0,300\n").unwrap();
        fs::write(&s.json_path, "[{\"date\": \"yesterday\"}]").unwrap();

        let (merged, result) = s.update(&[rec(1, 1.0)], MergePolicy::IncomingWins);
        assert!(result.is_ok());
        assert_eq!(merged, vec![rec(1, 1.0)]);

        let dir = s.csv_path.parent().unwrap();
        let kept = fs::read_dir(dir).unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.contains(".corrupt-"))
            .collect::<Vec<String>>();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().any(|n| n.starts_with("history.json.corrupt-")));
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let s = store("no_tmp");
        fs::create_dir_all(s.csv_path.join("occupied")).unwrap();

        assert!(matches!(s.persist(&[rec(1, 1.0)]), Err(HistoryError::Persist(_))));
        let mut tmp = s.csv_path.clone().into_os_string();
        tmp.push(".tmp");
        assert!(!PathBuf::from(tmp).exists());
    }

    #[test]
    fn persist_failure_is_reported() {
        let s = HistoryStore::open("/nonexistent-dir/uv/history.csv", "/nonexistent-dir/uv/history.json");
        let (merged, result) = s.update(&[rec(1, 1.0)], MergePolicy::IncomingWins);
        assert_eq!(merged.len(), 1);
        assert!(matches!(result, Err(HistoryError::Persist(_))));
    }

    fn records() -> impl Strategy<Value = Vec<ForecastRecord>> {
        prop::collection::vec((1u32..=30, 0.0f64..15.0), 0..20)
            .prop_map(|v| v.into_iter().map(|(d, uv)| rec(d, uv)).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn merge_has_unique_ascending_dates(existing in records(), incoming in records()) {
            let existing_dates = existing.iter().map(|r| r.date).collect::<HashSet<NaiveDate>>();
            let incoming_dates = incoming.iter().map(|r| r.date).collect::<HashSet<NaiveDate>>();
            let shared = existing_dates.intersection(&incoming_dates).count();

            for policy in [MergePolicy::IncomingWins, MergePolicy::ExistingWins] {
                let merged = merge(&existing, &incoming, policy);
                prop_assert!(merged.windows(2).all(|w| w[0].date < w[1].date));
                prop_assert!(merged.len() <= existing.len() + incoming.len());
                prop_assert!(merged.len() >= existing_dates.len().max(incoming_dates.len()));
                prop_assert_eq!(merged.len(), existing_dates.len() + incoming_dates.len() - shared);
                for r in &incoming {
                    prop_assert!(merged.iter().any(|m| m.date == r.date));
                }
            }
        }

        #[test]
        fn merge_is_idempotent(existing in records(), incoming in records()) {
            for policy in [MergePolicy::IncomingWins, MergePolicy::ExistingWins] {
                let once = merge(&existing, &incoming, policy);
                let twice = merge(&once, &incoming, policy);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
