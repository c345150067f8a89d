use std::path::PathBuf;

use crate::card::{Card, CardImage};
use crate::catalog::Catalog;
use crate::error::{CatalogLoadError, DecodeError, GradeError, SessionError};
use crate::filter::{compute_visible_cards, SortKey};
use crate::grade::Grade;
use crate::state::{assign_grade, Direction, DisplayMode, FilterChange, ViewState};
use crate::store::{BlobStore, GradeStore};
use crate::tier::{group_by_tier, TierGroup};
use crate::transfer::{check_export, export_store, import_store, ExportCheck};

pub enum Phase {
  Loading,
  Ready(Box<Session>),
  Failed(String),
}

impl Phase {
  pub fn from_load(result: Result<Session, CatalogLoadError>) -> Self {
    match result {
      Ok(session) => Phase::Ready(Box::new(session)),
      Err(e) => {
        log::error!("Failed to load card data: {}", e);
        Phase::Failed(e.to_string())
      }
    }
  }

  pub fn session(&self) -> Result<&Session, SessionError> {
    match self {
      Phase::Loading => Err(SessionError::NotReady),
      Phase::Ready(session) => Ok(&**session),
      Phase::Failed(message) => Err(SessionError::Failed(message.clone())),
    }
  }

  pub fn session_mut(&mut self) -> Result<&mut Session, SessionError> {
    match self {
      Phase::Loading => Err(SessionError::NotReady),
      Phase::Ready(session) => Ok(&mut **session),
      Phase::Failed(message) => Err(SessionError::Failed(message.clone())),
    }
  }
}

/// One user's grading session over one set.
///
/// The in-memory grade store is authoritative: every mutation is written back
/// to the blob store, and a failed write is only logged.
pub struct Session {
  catalog: Catalog,
  grades: GradeStore,
  view: ViewState,
  blobs: Box<dyn BlobStore>,
  storage_key: String,
  image_base: PathBuf,
}

impl Session {
  pub fn start(
    catalog: Catalog,
    blobs: Box<dyn BlobStore>,
    storage_key: impl Into<String>,
    image_base: impl Into<PathBuf>,
  ) -> Self {
    let storage_key = storage_key.into();
    let grades = match GradeStore::load_from(blobs.as_ref(), &storage_key) {
      Ok(grades) => grades,
      Err(e) => {
        log::warn!("Ignoring persisted grades under {}: {}", storage_key, e);
        GradeStore::new()
      }
    };

    let orphans = grades.orphan_count(&catalog);
    if orphans > 0 {
      log::warn!(
        "{} stored grade(s) refer to cards missing from the catalog",
        orphans
      );
    }
    log::info!(
      "Session ready: {} cards, {} graded",
      catalog.len(),
      grades.len()
    );

    Self {
      catalog,
      grades,
      view: ViewState::default(),
      blobs,
      storage_key,
      image_base: image_base.into(),
    }
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn grades(&self) -> &GradeStore {
    &self.grades
  }

  pub fn view(&self) -> &ViewState {
    &self.view
  }

  pub fn visible(&self) -> Vec<&Card> {
    compute_visible_cards(
      self.catalog.cards(),
      &self.view.criteria,
      self.view.sort,
      &self.grades,
    )
  }

  pub fn gallery(&self) -> Vec<TierGroup<'_>> {
    group_by_tier(&self.visible(), &self.grades)
  }

  pub fn position(&self) -> Option<(usize, usize)> {
    let len = self.visible().len();
    self.view.effective_cursor(len).map(|cursor| (cursor, len))
  }

  pub fn current_card(&self) -> Option<&Card> {
    let visible = self.visible();
    self
      .view
      .effective_cursor(visible.len())
      .map(|cursor| visible[cursor])
  }

  pub fn grade_of(&self, card_id: &str) -> Option<&str> {
    self.grades.get(card_id)
  }

  pub fn image_for(&self, card: &Card) -> CardImage {
    card.resolve_image(&self.image_base)
  }

  pub fn set_filter(&mut self, change: FilterChange) {
    self.view = self.view.set_filter(change).applied();
  }

  pub fn set_sort(&mut self, sort: SortKey) {
    self.view = self.view.set_sort(sort).applied();
  }

  pub fn set_mode(&mut self, mode: DisplayMode) {
    self.view = self.view.set_mode(mode);
  }

  pub fn navigate(&mut self, direction: Direction) {
    let len = self.visible().len();
    self.view = self.view.navigate(direction, len);
  }

  pub fn jump_to(&mut self, card_id: &str) {
    let next = self.view.jump_to(card_id, &self.visible());
    self.view = next;
  }

  pub fn assign_grade(&mut self, card_id: &str, grade: &str) -> Result<Grade, GradeError> {
    let grade: Grade = grade.trim().parse()?;
    self.assign(card_id, grade)?;
    Ok(grade)
  }

  /// Grades the card under the cursor, then moves on to the next one.
  ///
  /// When the graded card drops out of the visible list (unranked-only view),
  /// the cursor already points at its successor and is only wrapped.
  pub fn grade_current(&mut self, grade: Grade) -> Option<String> {
    let card_id = self.current_card()?.id.clone();
    if let Err(e) = self.assign(&card_id, grade) {
      log::warn!("Could not grade {}: {}", card_id, e);
      return None;
    }

    let visible = self.visible();
    if visible.iter().any(|card| card.id == card_id) {
      let len = visible.len();
      self.view = self.view.navigate(Direction::Next, len);
    } else if self.view.cursor >= visible.len() {
      self.view.cursor = 0;
    }
    Some(card_id)
  }

  pub fn check_export(&self) -> ExportCheck {
    check_export(&self.grades, &self.catalog)
  }

  /// Produces the transfer string. With unranked cards left, `confirm` gets
  /// their count and may decline, in which case nothing is exported.
  pub fn export(
    &self,
    confirm: impl FnOnce(usize) -> bool,
  ) -> Result<Option<String>, serde_json::Error> {
    if let ExportCheck::NeedsConfirmation { unranked } = self.check_export() {
      if !confirm(unranked) {
        log::info!("Export cancelled with {} unranked card(s)", unranked);
        return Ok(None);
      }
    }
    export_store(&self.grades).map(Some)
  }

  /// Replaces every grade with the decoded ones. On error nothing changes.
  pub fn import(&mut self, encoded: &str) -> Result<usize, DecodeError> {
    let grades = import_store(encoded)?;
    let orphans = grades.orphan_count(&self.catalog);
    if orphans > 0 {
      log::warn!("Imported {} grade(s) for cards not in this set", orphans);
    }
    self.grades = grades;
    self.persist();
    Ok(self.grades.len())
  }

  fn assign(&mut self, card_id: &str, grade: Grade) -> Result<(), GradeError> {
    if !self.catalog.contains(card_id) {
      return Err(GradeError::UnknownCard(card_id.to_string()));
    }
    assign_grade(&mut self.grades, card_id, grade);
    log::debug!("Graded {} as {}", card_id, grade);
    self.persist();
    Ok(())
  }

  fn persist(&self) {
    if let Err(e) = self.grades.save_to(self.blobs.as_ref(), &self.storage_key) {
      log::error!(
        "Failed to save grades under {}; keeping them in memory: {}",
        self.storage_key,
        e
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::card::test_support::card;
  use crate::card::Color;
  use crate::filter::ColorSelector;
  use crate::store::MemoryBlobStore;

  const KEY: &str = "rankings-tla";

  fn catalog() -> Catalog {
    Catalog::from_cards(vec![
      card("a", "Aang", "mythic", 4.0, &[Color::White]),
      card("b", "Bumi", "rare", 5.0, &[Color::Red, Color::Green]),
      card("c", "Cabbage Merchant", "common", 1.0, &[]),
    ])
    .unwrap()
  }

  fn session_with(blobs: &MemoryBlobStore) -> Session {
    Session::start(catalog(), Box::new(blobs.clone()), KEY, "/sets/tla")
  }

  #[test]
  fn loading_phase_blocks_interaction() {
    let mut phase = Phase::Loading;
    assert!(matches!(phase.session(), Err(SessionError::NotReady)));
    assert!(matches!(phase.session_mut(), Err(SessionError::NotReady)));

    let failed = Phase::from_load(Err(CatalogLoadError::DuplicateId("a".to_string())));
    assert!(matches!(failed.session(), Err(SessionError::Failed(_))));

    let ready = Phase::from_load(Ok(session_with(&MemoryBlobStore::new())));
    assert_eq!(ready.session().unwrap().catalog().len(), 3);
  }

  #[test]
  fn corrupt_persisted_blob_starts_empty() {
    let blobs = MemoryBlobStore::with_blob(KEY, "definitely not json");
    let session = session_with(&blobs);
    assert!(session.grades().is_empty());
  }

  #[test]
  fn persisted_grades_are_restored() {
    let blobs = MemoryBlobStore::with_blob(KEY, r#"{"b":"C-"}"#);
    let session = session_with(&blobs);
    assert_eq!(session.grade_of("b"), Some("C-"));
  }

  #[test]
  fn assignment_persists_and_keeps_cursor() {
    let blobs = MemoryBlobStore::new();
    let mut session = session_with(&blobs);
    session.navigate(Direction::Next);
    assert_eq!(session.assign_grade("c", "B+").unwrap(), Grade::BPlus);
    assert_eq!(session.view().cursor, 1);
    assert_eq!(blobs.raw(KEY).as_deref(), Some(r#"{"c":"B+"}"#));
  }

  #[test]
  fn invalid_grades_and_cards_are_rejected() {
    let mut session = session_with(&MemoryBlobStore::new());
    assert_eq!(
      session.assign_grade("a", "F+"),
      Err(GradeError::Invalid("F+".to_string()))
    );
    assert_eq!(
      session.assign_grade("zz", "A"),
      Err(GradeError::UnknownCard("zz".to_string()))
    );
    assert!(session.grades().is_empty());
  }

  #[test]
  fn failed_write_keeps_memory_state() {
    let blobs = MemoryBlobStore::new();
    blobs.set_fail_writes(true);
    let mut session = session_with(&blobs);
    session.assign_grade("a", "A").unwrap();
    assert_eq!(session.grade_of("a"), Some("A"));
    assert_eq!(blobs.raw(KEY), None);
  }

  #[test]
  fn filter_change_resets_cursor() {
    let mut session = session_with(&MemoryBlobStore::new());
    session.navigate(Direction::Next);
    session.navigate(Direction::Next);
    assert_eq!(session.view().cursor, 2);
    session.set_filter(FilterChange::Color(ColorSelector::Any));
    assert_eq!(session.view().cursor, 0);
    session.navigate(Direction::Previous);
    session.set_sort(SortKey::ByRarity);
    assert_eq!(session.view().cursor, 0);
  }

  #[test]
  fn grading_current_card_advances() {
    let mut session = session_with(&MemoryBlobStore::new());
    // Aang, Bumi, Cabbage Merchant
    assert_eq!(session.grade_current(Grade::A).as_deref(), Some("a"));
    assert_eq!(session.current_card().map(|c| c.id.as_str()), Some("b"));
  }

  #[test]
  fn grading_in_unranked_view_shows_successor() {
    let mut session = session_with(&MemoryBlobStore::new());
    session.set_filter(FilterChange::UnrankedOnly(true));
    session.navigate(Direction::Next);
    assert_eq!(session.grade_current(Grade::D).as_deref(), Some("b"));
    assert_eq!(session.current_card().map(|c| c.id.as_str()), Some("c"));
    assert_eq!(session.grade_current(Grade::C).as_deref(), Some("c"));
    assert_eq!(session.current_card().map(|c| c.id.as_str()), Some("a"));
    assert_eq!(session.grade_current(Grade::B).as_deref(), Some("a"));
    assert_eq!(session.current_card(), None);
    assert_eq!(session.grade_current(Grade::B), None);
  }

  #[test]
  fn jump_from_gallery() {
    let mut session = session_with(&MemoryBlobStore::new());
    session.set_mode(DisplayMode::Gallery);
    session.jump_to("c");
    assert_eq!(session.view().mode, DisplayMode::SingleCard);
    assert_eq!(session.current_card().map(|c| c.id.as_str()), Some("c"));
  }

  #[test]
  fn declined_export_returns_nothing() {
    let mut session = session_with(&MemoryBlobStore::new());
    session.assign_grade("a", "A").unwrap();
    let mut asked = None;
    let result = session
      .export(|unranked| {
        asked = Some(unranked);
        false
      })
      .unwrap();
    assert_eq!(result, None);
    assert_eq!(asked, Some(2));
    assert!(session.export(|_| true).unwrap().is_some());
  }

  #[test]
  fn complete_export_skips_confirmation() {
    let mut session = session_with(&MemoryBlobStore::new());
    for id in ["a", "b", "c"] {
      session.assign_grade(id, "C").unwrap();
    }
    let exported = session.export(|_| panic!("should not ask")).unwrap();
    assert!(exported.is_some());
  }

  #[test]
  fn failed_import_changes_nothing() {
    let blobs = MemoryBlobStore::new();
    let mut session = session_with(&blobs);
    session.assign_grade("a", "A-").unwrap();
    let before = session.grades().clone();
    let persisted = blobs.raw(KEY);

    assert!(session.import("%%%").is_err());
    assert_eq!(session.grades(), &before);
    assert_eq!(blobs.raw(KEY), persisted);
  }

  #[test]
  fn import_replaces_and_persists() {
    let blobs = MemoryBlobStore::new();
    let mut source = session_with(&MemoryBlobStore::new());
    source.assign_grade("b", "D+").unwrap();
    let exported = source.export(|_| true).unwrap().unwrap();

    let mut session = session_with(&blobs);
    session.assign_grade("a", "A").unwrap();
    assert_eq!(session.import(&exported), Ok(1));
    assert_eq!(session.grade_of("a"), None);
    assert_eq!(session.grade_of("b"), Some("D+"));
    assert_eq!(blobs.raw(KEY).as_deref(), Some(r#"{"b":"D+"}"#));
  }
}
