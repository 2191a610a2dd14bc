pub mod csv_rows;

use async_trait::async_trait;
use log::info;
use std::path::PathBuf;

use crate::error::{SplitError, SplitResult};
use crate::models::ContributorVote;

pub use csv_rows::{parse_received, parse_vote_csv};

/// Where the round's vote records come from. Called once per round.
#[async_trait]
pub trait VoteSource: Send + Sync {
    async fn fetch_votes(&self) -> SplitResult<Vec<ContributorVote>>;

    fn describe(&self) -> String;
}

pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VoteSource for CsvFileSource {
    async fn fetch_votes(&self) -> SplitResult<Vec<ContributorVote>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| {
                SplitError::Source(format!("failed to read {}: {}", self.path.display(), e))
            })?;
        parse_vote_csv(&text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetches the vote CSV with a single unauthenticated GET.
pub struct HttpCsvSource {
    url: String,
    client: reqwest::Client,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VoteSource for HttpCsvSource {
    async fn fetch_votes(&self) -> SplitResult<Vec<ContributorVote>> {
        info!("Fetching vote records from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SplitError::Source(format!("{} returned status {}", self.url, status)));
        }
        let text = response.text().await?;
        parse_vote_csv(&text)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Pick a source from a location string: URLs are fetched, anything else is a file path.
pub fn source_for(location: &str) -> Box<dyn VoteSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpCsvSource::new(location))
    } else {
        Box::new(CsvFileSource::new(location))
    }
}

/// Records already in memory; handy for callers that build rows themselves.
pub struct StaticSource {
    votes: Vec<ContributorVote>,
}

impl StaticSource {
    pub fn new(votes: Vec<ContributorVote>) -> Self {
        Self { votes }
    }
}

#[async_trait]
impl VoteSource for StaticSource {
    async fn fetch_votes(&self) -> SplitResult<Vec<ContributorVote>> {
        Ok(self.votes.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory records", self.votes.len())
    }
}
