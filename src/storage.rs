use crate::config::StorageConfig;
use chrono::{DateTime, Days, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("invalid storage response: {0}")]
    Deserialize(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageObject {
    pub name: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Object-storage collaborator. The core only ever consumes key names and
/// raw bytes from here.
#[derive(Debug, Clone)]
pub struct StorageClient {
    config: StorageConfig,
    http: Client,
}

impl StorageClient {
    pub fn new(config: StorageConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Spreadsheet keys in the bucket that were modified during the
    /// previous day. An empty result is not an error; the caller logs and
    /// moves on.
    pub async fn list_candidate_files(&self) -> Result<Vec<String>, StorageError> {
        let url = format!(
            "{}/object/list/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket
        );
        let response = self
            .http
            .post(url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_key),
            )
            .json(&json!({ "prefix": "" }))
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(StorageError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }
        let objects: Vec<StorageObject> = response
            .json()
            .await
            .map_err(|err| StorageError::Deserialize(err.to_string()))?;

        let Some(previous_day) = Utc::now().date_naive().checked_sub_days(Days::new(1)) else {
            return Ok(Vec::new());
        };
        Ok(filter_candidates(objects, previous_day))
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let url = format!(
            "{}/object/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            key
        );
        let response = self
            .http
            .get(url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_key),
            )
            .send()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(StorageError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| StorageError::Request(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Keeps CSV exports modified on `day`, dropping folder markers.
fn filter_candidates(objects: Vec<StorageObject>, day: NaiveDate) -> Vec<String> {
    objects
        .into_iter()
        .filter(|obj| !obj.name.ends_with('/') && is_csv_export(&obj.name))
        .filter(|obj| {
            obj.updated_at
                .map(|at| at.date_naive() == day)
                .unwrap_or(false)
        })
        .map(|obj| obj.name)
        .collect()
}

/// The upstream export job flattens workbooks to CSV before upload; a
/// `.xlsx` key cannot be parsed downstream, so selecting one would retry
/// it on every run.
fn is_csv_export(name: &str) -> bool {
    name.ends_with(".csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn object(name: &str, day: Option<(i32, u32, u32)>) -> StorageObject {
        StorageObject {
            name: name.to_string(),
            updated_at: day.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn keeps_only_previous_day_csv_exports() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let keys = filter_candidates(
            vec![
                object("exports/", Some((2024, 5, 2))),
                object("exports/old.csv", Some((2024, 4, 30))),
                object("exports/notes.txt", Some((2024, 5, 2))),
                object("exports/daily.csv", Some((2024, 5, 2))),
                object("exports/undated.csv", None),
            ],
            day,
        );
        assert_eq!(keys, vec!["exports/daily.csv"]);
    }

    #[test]
    fn workbook_keys_are_never_selected() {
        // A workbook key would download fine but fail to parse, so the
        // filter must not admit it even on the right day.
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let keys = filter_candidates(
            vec![object("exports/daily.xlsx", Some((2024, 5, 2)))],
            day,
        );
        assert!(keys.is_empty());
    }
}
