use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::card::Card;
use crate::error::CatalogLoadError;

const CATALOG_FETCH_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
  File(PathBuf),
  Url(String),
}

impl CatalogSource {
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
      CatalogSource::Url(trimmed.to_string())
    } else {
      CatalogSource::File(PathBuf::from(trimmed))
    }
  }

  pub fn describe(&self) -> String {
    match self {
      CatalogSource::File(path) => path.display().to_string(),
      CatalogSource::Url(url) => url.clone(),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
  cards: Vec<Card>,
  by_id: HashMap<String, usize>,
}

impl Catalog {
  pub fn from_cards(cards: Vec<Card>) -> Result<Self, CatalogLoadError> {
    let mut by_id = HashMap::with_capacity(cards.len());
    for (index, card) in cards.iter().enumerate() {
      if by_id.insert(card.id.clone(), index).is_some() {
        return Err(CatalogLoadError::DuplicateId(card.id.clone()));
      }
    }
    Ok(Self { cards, by_id })
  }

  pub fn from_json_str(body: &str) -> Result<Self, CatalogLoadError> {
    let cards: Vec<Card> = serde_json::from_str(body)?;
    Self::from_cards(cards)
  }

  pub fn load(source: &CatalogSource) -> Result<Self, CatalogLoadError> {
    let body = match source {
      CatalogSource::File(path) => {
        fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
          path: path.display().to_string(),
          source,
        })?
      }
      CatalogSource::Url(url) => fetch_catalog_body(url)?,
    };
    let catalog = Self::from_json_str(&body)?;
    log::info!(
      "Loaded {} cards from {}",
      catalog.len(),
      source.describe()
    );
    Ok(catalog)
  }

  pub fn cards(&self) -> &[Card] {
    &self.cards
  }

  pub fn get(&self, id: &str) -> Option<&Card> {
    self.by_id.get(id).map(|&index| &self.cards[index])
  }

  pub fn contains(&self, id: &str) -> bool {
    self.by_id.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.cards.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cards.is_empty()
  }

  /// SHA-256 over the ordered ids and names. Changes whenever the set list does.
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    for card in &self.cards {
      let line = format!("{}|{}\n", card.id, card.name);
      hasher.update(line.as_bytes());
    }
    format!("{:x}", hasher.finalize())
  }
}

fn fetch_catalog_body(url: &str) -> Result<String, CatalogLoadError> {
  let client = Client::builder()
    .timeout(Duration::from_secs(CATALOG_FETCH_TIMEOUT_SECONDS))
    .build()?;

  let response = client
    .get(url)
    .header(USER_AGENT, concat!("card-ranker/", env!("CARGO_PKG_VERSION")))
    .header(ACCEPT, "application/json")
    .send()?;

  if !response.status().is_success() {
    return Err(CatalogLoadError::Http(format!(
      "Catalog request to {} failed with status {}",
      url,
      response.status()
    )));
  }

  Ok(response.text()?)
}
