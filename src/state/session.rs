use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Length of the hex session key derived from query and cap
pub const SESSION_KEY_LEN: usize = 12;

/// Derives the session key for a query and result cap
///
/// The query is trimmed and lowercased first, so `" Coffee Shops "` and
/// `"coffee shops"` share a session. Different caps never share one.
///
/// # Arguments
///
/// * `query` - The search query as typed by the user
/// * `max_results` - The result cap of the job
///
/// # Returns
///
/// The first 12 hex characters of the SHA-256 digest of `<query>_<cap>`
pub fn session_key(query: &str, max_results: usize) -> String {
    let normalized = format!("{}_{}", query.trim().to_lowercase(), max_results);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(SESSION_KEY_LEN);
    key
}

/// Persistent progress record of one scraping job
///
/// Serialized as pretty JSON into `state_<query_hash>.json`. The candidate
/// list is frozen once enumeration finishes; only the processed set, the
/// counters and the timestamps move afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub query: String,
    pub query_hash: String,
    pub max_results: usize,
    pub output_file: String,
    pub business_urls: Vec<String>,
    pub processed_indices: BTreeSet<usize>,
    pub last_processed_index: Option<usize>,
    pub success_count: usize,
    pub failed_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed: bool,
}

impl SessionState {
    /// Creates a fresh session over an enumerated candidate list
    pub fn new(
        query: &str,
        max_results: usize,
        output_file: impl Into<String>,
        business_urls: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            query: query.to_string(),
            query_hash: session_key(query, max_results),
            max_results,
            output_file: output_file.into(),
            business_urls,
            processed_indices: BTreeSet::new(),
            last_processed_index: None,
            success_count: 0,
            failed_count: 0,
            created_at: now,
            updated_at: now,
            completed: false,
        }
    }

    /// Number of enumerated candidates
    pub fn total(&self) -> usize {
        self.business_urls.len()
    }

    /// Number of candidates with a recorded outcome
    pub fn processed_count(&self) -> usize {
        self.processed_indices.len()
    }

    pub fn is_processed(&self, index: usize) -> bool {
        self.processed_indices.contains(&index)
    }

    /// Records a successful candidate
    ///
    /// Returns false, leaving the counters untouched, when the index is out of
    /// range or already processed.
    pub fn mark_success(&mut self, index: usize) -> bool {
        self.mark(index, true)
    }

    /// Records a failed candidate
    ///
    /// Returns false, leaving the counters untouched, when the index is out of
    /// range or already processed.
    pub fn mark_failed(&mut self, index: usize) -> bool {
        self.mark(index, false)
    }

    fn mark(&mut self, index: usize, success: bool) -> bool {
        if index >= self.total() || !self.processed_indices.insert(index) {
            return false;
        }

        if success {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
        self.last_processed_index = Some(index);
        self.touch();
        true
    }

    /// Refreshes `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Indices still waiting for an outcome, in ascending order
    pub fn pending_indices(&self) -> Vec<usize> {
        (0..self.total())
            .filter(|i| !self.processed_indices.contains(i))
            .collect()
    }

    pub fn first_unprocessed(&self) -> Option<usize> {
        (0..self.total()).find(|i| !self.processed_indices.contains(i))
    }

    /// True when every enumerated candidate has an outcome
    pub fn all_processed(&self) -> bool {
        self.processed_count() >= self.total()
    }

    /// Processed share of the candidate list, 0.0 to 100.0
    pub fn progress_percentage(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.processed_count() as f64 * 100.0 / self.total() as f64
    }

    /// Flags the session as finished; it will not be resumed again
    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.touch();
    }

    /// Checks the structural invariants of a loaded session
    ///
    /// # Arguments
    ///
    /// * `expected_key` - The key the file was loaded under
    ///
    /// # Returns
    ///
    /// `Err` with a description of the first violated invariant
    pub fn check_integrity(&self, expected_key: &str) -> Result<(), String> {
        if self.query_hash != expected_key {
            return Err(format!(
                "query hash '{}' does not match file key '{}'",
                self.query_hash, expected_key
            ));
        }

        if let Some(index) = self.processed_indices.iter().next_back() {
            if *index >= self.total() {
                return Err(format!(
                    "processed index {} is out of range for {} candidates",
                    index,
                    self.total()
                ));
            }
        }

        if let Some(last) = self.last_processed_index {
            if !self.processed_indices.contains(&last) {
                return Err(format!(
                    "last processed index {} is not in the processed set",
                    last
                ));
            }
        }

        if self.success_count + self.failed_count != self.processed_count() {
            return Err(format!(
                "success ({}) + failed ({}) does not equal processed ({})",
                self.success_count,
                self.failed_count,
                self.processed_count()
            ));
        }

        Ok(())
    }
}
