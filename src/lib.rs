pub mod card;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod grade;
pub mod session;
pub mod state;
pub mod store;
pub mod tier;
pub mod transfer;

use clap::Parser;

pub use card::{Card, CardFace, CardImage, Color, ImageUris, Rarity};
pub use catalog::{Catalog, CatalogSource};
pub use config::Config;
pub use error::{CatalogLoadError, DecodeError, Error, GradeError, Result, SessionError, StoreError};
pub use filter::{compute_visible_cards, ColorSelector, FilterCriteria, SortKey};
pub use grade::{Grade, GradeEntry, Letter, Modifier};
pub use session::{Phase, Session};
pub use state::{Direction, DisplayMode, FilterChange, Transition, ViewState};
pub use store::{BlobStore, GradeStore, MemoryBlobStore, SqliteBlobStore};
pub use tier::{group_by_tier, Tier, TierGroup};
pub use transfer::{check_export, export_store, import_store, ExportCheck};

fn init_logging(level: Option<log::LevelFilter>) {
  let mut builder =
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
  if let Some(level) = level {
    builder.filter_level(level);
  }
  builder.format_timestamp_secs().init();
}

/// Opens the grade database for a freshly loaded catalog and starts a session.
///
/// Without a usable database the session still runs, backed by memory only.
fn start_session(config: &Config, catalog: Catalog) -> Session {
  let set_code = config.normalized_set_code();
  let db_path = config.database_path();

  let blobs: Box<dyn BlobStore> = match SqliteBlobStore::open(&db_path) {
    Ok(store) => {
      let fingerprint = catalog.fingerprint();
      match store.remember_catalog(&set_code, &fingerprint, catalog.len()) {
        Ok(Some(previous)) if previous != fingerprint => {
          log::info!("Card list for {} changed since the last session", set_code);
        }
        Ok(_) => {}
        Err(e) => log::warn!("Could not record catalog fingerprint: {}", e),
      }
      Box::new(store)
    }
    Err(e) => {
      log::error!(
        "Could not open {}; grades will not be saved: {}",
        db_path.display(),
        e
      );
      Box::new(MemoryBlobStore::new())
    }
  };

  Session::start(catalog, blobs, config.storage_key(), config.set_dir())
}

/// Loads the catalog once; the returned phase is `Ready` or `Failed`.
pub fn load(config: &Config) -> Phase {
  let source = config.catalog_source();
  log::info!(
    "Loading cards for {} from {}",
    config.normalized_set_code(),
    source.describe()
  );
  Phase::from_load(Catalog::load(&source).map(|catalog| start_session(config, catalog)))
}

pub fn run() -> Result<()> {
  let cli = cli::Cli::parse();
  init_logging(cli.log_level);

  let mut phase = load(&cli.config());
  cli::execute(&cli, &mut phase)
}
