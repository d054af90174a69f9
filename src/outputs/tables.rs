//! Tabular views of validation results, written as CSV and logged to the
//! tracking run.
//!
//! CSV files follow the dataframe convention of an unnamed index column:
//!
//! ```text
//! ,precision,recall,f1-score,support
//! 0,0.666…,1.0,0.8,2
//! ...
//! ```
//!
//! When logged to a tracker the index column gets a name (`metric`,
//! `actual`).

use crate::models::Label;
use crate::validate::{ClassMetrics, ClassificationReport, ConfusionMatrix};
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// A small table with a labelled index column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Name of the index column in the tracker payload; blank in the CSV.
    pub index_name: String,
    /// Value column names.
    pub columns: Vec<String>,
    /// Index value and cells of each row.
    pub rows: Vec<(String, Vec<Value>)>,
}

impl Table {
    /// Column names including the index column.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(self.index_name.clone())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    /// Rows with the index value as the first cell.
    pub fn data(&self) -> Vec<Vec<Value>> {
        self.rows
            .iter()
            .map(|(index, cells)| {
                std::iter::once(Value::String(index.clone()))
                    .chain(cells.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Render as CSV with a blank first header cell, the way a dataframe
    /// with an unnamed index writes out.
    ///
    /// # Returns
    ///
    /// The CSV text, strings unquoted unless the CSV rules need it.
    pub fn to_csv(&self) -> Result<String, Box<dyn Error>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(std::iter::once("").chain(self.columns.iter().map(String::as_str)))?;
        for (index, cells) in &self.rows {
            let cells = cells.iter().map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            writer.write_record(std::iter::once(index.clone()).chain(cells))?;
        }
        Ok(String::from_utf8(writer.into_inner()?)?)
    }

    /// Write [`Table::to_csv`] to `path`, creating parent directories.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn write_csv(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, self.to_csv()?).await?;
        info!(rows = self.rows.len(), "Wrote CSV table");
        Ok(())
    }
}

fn metric_cells(m: &ClassMetrics) -> Vec<Value> {
    vec![json!(m.precision), json!(m.recall), json!(m.f1), json!(m.support)]
}

/// The classification report, one row per class plus the summary rows.
pub fn report_table(report: &ClassificationReport) -> Table {
    let mut rows: Vec<(String, Vec<Value>)> = Label::ALL
        .iter()
        .map(|&l| (l.to_string(), metric_cells(report.class(l))))
        .collect();
    rows.push(("accuracy".to_string(), vec![json!(report.accuracy); 4]));
    rows.push(("macro avg".to_string(), metric_cells(&report.macro_avg)));
    rows.push(("weighted avg".to_string(), metric_cells(&report.weighted_avg)));

    Table {
        index_name: "metric".to_string(),
        columns: ["precision", "recall", "f1-score", "support"]
            .map(String::from)
            .to_vec(),
        rows,
    }
}

/// The confusion matrix with `actual_*` rows and `pred_*` columns.
pub fn confusion_table(matrix: &ConfusionMatrix) -> Table {
    Table {
        index_name: "actual".to_string(),
        columns: vec!["pred_0".to_string(), "pred_1".to_string()],
        rows: Label::ALL
            .iter()
            .map(|&actual| {
                let counts = matrix.counts[actual.as_u8() as usize];
                (format!("actual_{actual}"), counts.iter().map(|c| json!(c)).collect())
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ConfusionMatrix {
        ConfusionMatrix {
            counts: [[2, 0], [1, 1]],
        }
    }

    #[test]
    fn test_confusion_csv() {
        let csv = confusion_table(&matrix()).to_csv().unwrap();
        assert_eq!(csv, ",pred_0,pred_1\nactual_0,2,0\nactual_1,1,1\n");
    }

    #[test]
    fn test_report_csv_rows() {
        let report = ClassificationReport::from_confusion(&matrix());
        let csv = report_table(&report).to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], ",precision,recall,f1-score,support");
        assert!(lines[1].starts_with("0,"));
        assert!(lines[1].ends_with(",2"));
        assert_eq!(lines[3], "accuracy,0.75,0.75,0.75,0.75");
        assert!(lines[4].starts_with("macro avg,"));
        assert!(lines[5].starts_with("weighted avg,"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_table_header_and_data_include_index() {
        let table = confusion_table(&matrix());
        assert_eq!(table.header(), vec!["actual", "pred_0", "pred_1"]);
        assert_eq!(table.data()[1], vec![json!("actual_1"), json!(1), json!(1)]);
    }

    #[tokio::test]
    async fn test_write_csv_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/confusion_matrix.csv");
        confusion_table(&matrix()).write_csv(&path).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with(",pred_0,pred_1"));
    }
}
