use std::fmt;
use std::fmt::Formatter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A validated forecast for one day as it flows through the pipeline and into history
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub uv_index: f64,
    pub ozone_column: Option<f64>,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for ForecastRecord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.ozone_column {
            Some(ozone) => write!(f, "{} -> UV {:>5.1}, Ozone {:>6.1} DU", self.date, self.uv_index, ozone),
            None => write!(f, "{} -> UV {:>5.1}, Ozone    n/a", self.date, self.uv_index),
        }
    }
}

/// Unvalidated cell text of one forecast table row
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    pub date: String,
    pub uv_index: String,
    pub ozone_column: Option<String>,
}

/// Result of a table extraction, the location label and the rows in source order
#[derive(Debug)]
pub struct RawTable {
    pub location: String,
    pub rows: Vec<RawRow>,
}
