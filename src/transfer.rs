use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::error::DecodeError;
use crate::store::GradeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportCheck {
  Ready,
  NeedsConfirmation { unranked: usize },
}

pub fn check_export(grades: &GradeStore, catalog: &Catalog) -> ExportCheck {
  match grades.unranked_count(catalog) {
    0 => ExportCheck::Ready,
    unranked => ExportCheck::NeedsConfirmation { unranked },
  }
}

/// Canonical JSON of the store, base64 encoded.
pub fn export_store(grades: &GradeStore) -> Result<String, serde_json::Error> {
  let json = grades.to_json()?;
  Ok(STANDARD.encode(json.as_bytes()))
}

/// Decodes a transfer string into a fresh store. Nothing is applied here.
pub fn import_store(encoded: &str) -> Result<GradeStore, DecodeError> {
  let trimmed = encoded.trim();
  if trimmed.is_empty() {
    return Err(DecodeError::Empty);
  }

  let bytes = STANDARD
    .decode(trimmed)
    .map_err(|e| DecodeError::Base64(e.to_string()))?;
  let text = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
  let grades: BTreeMap<String, String> =
    serde_json::from_str(&text).map_err(|e| DecodeError::Json(e.to_string()))?;

  Ok(GradeStore::from_map(grades))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::card::test_support::card;
  use crate::grade::Grade;

  #[test]
  fn export_is_base64_of_canonical_json() {
    let mut grades = GradeStore::new();
    grades.upsert("b", Grade::DMinus);
    grades.upsert("a", Grade::APlus);
    let encoded = export_store(&grades).unwrap();
    let decoded = STANDARD.decode(&encoded).unwrap();
    assert_eq!(
      String::from_utf8(decoded).unwrap(),
      r#"{"a":"A+","b":"D-"}"#
    );
  }

  #[test]
  fn empty_store_exports_empty_object() {
    assert_eq!(export_store(&GradeStore::new()).unwrap(), STANDARD.encode("{}"));
    assert_eq!(import_store(&STANDARD.encode("{}")), Ok(GradeStore::new()));
  }

  #[test]
  fn import_accepts_surrounding_whitespace() {
    let mut grades = GradeStore::new();
    grades.upsert("card-1", Grade::C);
    let encoded = format!("  {}\n", export_store(&grades).unwrap());
    assert_eq!(import_store(&encoded), Ok(grades));
  }

  #[test]
  fn import_keeps_unrecognized_values() {
    let encoded = STANDARD.encode(r#"{"x":"F+"}"#);
    let grades = import_store(&encoded).unwrap();
    assert_eq!(grades.get("x"), Some("F+"));
  }

  #[test]
  fn import_rejects_bad_input() {
    assert_eq!(import_store("   "), Err(DecodeError::Empty));
    assert!(matches!(
      import_store("not base64!!"),
      Err(DecodeError::Base64(_))
    ));
    assert_eq!(
      import_store(&STANDARD.encode([0xff, 0xfe, 0xfd])),
      Err(DecodeError::Utf8)
    );
    assert!(matches!(
      import_store(&STANDARD.encode("[1,2,3]")),
      Err(DecodeError::Json(_))
    ));
    assert!(matches!(
      import_store(&STANDARD.encode(r#"{"a":1}"#)),
      Err(DecodeError::Json(_))
    ));
  }

  #[test]
  fn export_check_counts_unranked() {
    let catalog = Catalog::from_cards(vec![
      card("a", "Aang", "mythic", 4.0, &[]),
      card("b", "Bumi", "rare", 5.0, &[]),
    ])
    .unwrap();
    let mut grades = GradeStore::new();
    assert_eq!(
      check_export(&grades, &catalog),
      ExportCheck::NeedsConfirmation { unranked: 2 }
    );
    grades.upsert("a", Grade::A);
    grades.upsert("b", Grade::B);
    assert_eq!(check_export(&grades, &catalog), ExportCheck::Ready);
  }
}
