//! JSON File Stores
//!
//! Holdings, chat history, and the investment profile each live in one JSON
//! file under the data directory. Writes are last-write-wins; a lock per
//! store serializes read-modify-write sequences inside one process.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AdvisorError, Result};
use crate::model::{ChatMessage, Holding, normalize_ticker, parse_ticker};
use crate::profile::UserProfile;

/// Read a JSON file; a missing or unreadable file yields the default value
async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Corrupt store file, using defaults");
            T::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read store file, using defaults");
            T::default()
        }
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json).await?;
    debug!(path = %path.display(), "Store written");
    Ok(())
}

/// Holdings persisted as a JSON array
pub struct PortfolioStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PortfolioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All holdings; empty when the file is missing or corrupt
    pub async fn load(&self) -> Vec<Holding> {
        read_json(&self.path).await
    }

    pub async fn save(&self, holdings: &[Holding]) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_json(&self.path, holdings).await
    }

    /// Add a position, merging into an existing one with the same ticker.
    ///
    /// The merged cost basis is the share-weighted average, rounded to 4 dp.
    pub async fn add_holding(&self, ticker: &str, shares: Decimal, cost_basis: Decimal) -> Result<Holding> {
        let ticker = parse_ticker(ticker)?;
        if shares <= Decimal::ZERO {
            return Err(AdvisorError::InvalidInput("shares must be positive".into()));
        }
        if cost_basis < Decimal::ZERO {
            return Err(AdvisorError::InvalidInput("cost basis must not be negative".into()));
        }

        let _guard = self.lock.lock().await;
        let mut holdings: Vec<Holding> = read_json(&self.path).await;

        let updated = if let Some(existing) = holdings.iter_mut().find(|h| h.ticker == ticker) {
            let total_shares = existing.shares + shares;
            let total_cost = existing.total_cost() + shares * cost_basis;
            existing.cost_basis = (total_cost / total_shares).round_dp(4);
            existing.shares = total_shares;
            info!(ticker = %ticker, shares = %total_shares, cost_basis = %existing.cost_basis, "Position updated");
            existing.clone()
        } else {
            let holding = Holding::new(&ticker, shares, cost_basis.round_dp(4));
            info!(ticker = %ticker, shares = %shares, "Position added");
            holdings.push(holding.clone());
            holding
        };

        write_json(&self.path, &holdings).await?;
        Ok(updated)
    }

    /// Remove a position. Returns false when the ticker was not held.
    pub async fn remove_holding(&self, ticker: &str) -> Result<bool> {
        let ticker = normalize_ticker(ticker);
        let _guard = self.lock.lock().await;
        let mut holdings: Vec<Holding> = read_json(&self.path).await;

        let before = holdings.len();
        holdings.retain(|h| h.ticker != ticker);
        if holdings.len() == before {
            return Ok(false);
        }

        write_json(&self.path, &holdings).await?;
        info!(ticker = %ticker, "Position removed");
        Ok(true)
    }
}

/// Chat log persisted as a JSON array, capped at `max_messages`
pub struct ChatHistoryStore {
    path: PathBuf,
    max_messages: usize,
    lock: Mutex<()>,
}

impl ChatHistoryStore {
    pub fn new(path: impl Into<PathBuf>, max_messages: usize) -> Self {
        Self {
            path: path.into(),
            max_messages,
            lock: Mutex::new(()),
        }
    }

    /// The most recent `max_messages` entries, oldest first
    pub async fn load(&self) -> Vec<ChatMessage> {
        let history: Vec<ChatMessage> = read_json(&self.path).await;
        self.trimmed(history)
    }

    /// Persist, evicting the oldest entries beyond the cap
    pub async fn save(&self, history: Vec<ChatMessage>) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_json(&self.path, &self.trimmed(history)).await
    }

    /// Append one message and return the updated (trimmed) history
    pub async fn append(&self, message: ChatMessage) -> Result<Vec<ChatMessage>> {
        let _guard = self.lock.lock().await;
        let mut history: Vec<ChatMessage> = read_json(&self.path).await;
        history.push(message);
        let history = self.trimmed(history);
        write_json(&self.path, &history).await?;
        Ok(history)
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_json(&self.path, &Vec::<ChatMessage>::new()).await?;
        info!("Chat history cleared");
        Ok(())
    }

    fn trimmed(&self, mut history: Vec<ChatMessage>) -> Vec<ChatMessage> {
        if history.len() > self.max_messages {
            history.drain(..history.len() - self.max_messages);
        }
        history
    }
}

/// Investment profile persisted as one JSON object
pub struct ProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Stored profile; missing fields and a missing file take defaults
    pub async fn load(&self) -> UserProfile {
        read_json(&self.path).await
    }

    /// Persist the profile, stamping `last_updated`
    pub async fn save(&self, mut profile: UserProfile) -> Result<UserProfile> {
        profile.last_updated = Some(Utc::now());
        let _guard = self.lock.lock().await;
        write_json(&self.path, &profile).await?;
        info!("Investment profile saved");
        Ok(profile)
    }

    pub async fn reset(&self) -> Result<UserProfile> {
        info!("Investment profile reset to defaults");
        self.save(UserProfile::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Intent;
    use crate::profile::RiskTolerance;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_missing_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));
        assert!(store.load().await.is_empty());

        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_merges_with_weighted_average_cost() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));

        store.add_holding("rklb", dec!(100), dec!(10)).await.unwrap();
        let merged = store.add_holding("RKLB ", dec!(50), dec!(13)).await.unwrap();

        assert_eq!(merged.shares, dec!(150));
        assert_eq!(merged.cost_basis, dec!(11));

        let third = store.add_holding("RKLB", dec!(1), dec!(0)).await.unwrap();
        assert_eq!(third.cost_basis, dec!(10.9272));

        let holdings = store.load().await;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "RKLB");
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_shares() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));
        let err = store.add_holding("NVDA", dec!(0), dec!(100)).await.unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_add_rejects_malformed_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));
        let err = store.add_holding("NV/DA", dec!(1), dec!(100)).await.unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(msg) if msg.contains("NV/DA")));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_holding() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));
        store.add_holding("NVDA", dec!(2), dec!(100)).await.unwrap();

        assert!(!store.remove_holding("AAPL").await.unwrap());
        assert!(store.remove_holding("nvda").await.unwrap());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_history_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChatHistoryStore::new(dir.path().join("chat_history.json"), 3);

        for i in 0..5 {
            store.append(ChatMessage::user(format!("q{i}"))).await.unwrap();
        }
        let history = store.load().await;
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q2", "q3", "q4"]);

        let history = store
            .append(ChatMessage::assistant("a4", Intent::News))
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].agent_type, Some(Intent::News));

        store.clear().await.unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_profile_save_stamps_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested/investment_profile.json"));
        assert_eq!(store.load().await, UserProfile::default());

        let profile = UserProfile {
            risk_tolerance: RiskTolerance::High,
            ..UserProfile::default()
        };
        let saved = store.save(profile).await.unwrap();
        assert!(saved.last_updated.is_some());
        assert_eq!(store.load().await.risk_tolerance, RiskTolerance::High);

        let reset = store.reset().await.unwrap();
        assert!(!reset.is_configured());
        assert!(!store.load().await.is_configured());
    }
}
