use std::path::PathBuf;

use crate::catalog::CatalogSource;

pub const DEFAULT_SET_CODE: &str = "tla";
pub const DATABASE_FILE: &str = "card-ranker.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub set_code: String,
  pub data_dir: PathBuf,
  /// Overrides the per-set catalog location; a path or an http(s) URL.
  pub catalog: Option<String>,
  pub database: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      set_code: DEFAULT_SET_CODE.to_string(),
      data_dir: PathBuf::from("."),
      catalog: None,
      database: None,
    }
  }
}

impl Config {
  pub fn normalized_set_code(&self) -> String {
    let normalized = self.set_code.trim().to_lowercase();
    if normalized.is_empty() {
      DEFAULT_SET_CODE.to_string()
    } else {
      normalized
    }
  }

  pub fn storage_key(&self) -> String {
    format!("rankings-{}", self.normalized_set_code())
  }

  /// `<data_dir>/sets/<set>`, home of the catalog and local images.
  pub fn set_dir(&self) -> PathBuf {
    self.data_dir.join("sets").join(self.normalized_set_code())
  }

  pub fn catalog_source(&self) -> CatalogSource {
    match self.catalog.as_deref().map(str::trim) {
      Some(raw) if !raw.is_empty() => CatalogSource::parse(raw),
      _ => {
        let set = self.normalized_set_code();
        CatalogSource::File(self.set_dir().join(format!("{}.json", set)))
      }
    }
  }

  pub fn database_path(&self) -> PathBuf {
    self
      .database
      .clone()
      .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE))
  }
}
