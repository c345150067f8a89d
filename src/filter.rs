use std::cmp::Ordering;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::card::{Card, Color};
use crate::grade::stored_grade_rank;
use crate::store::GradeStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorSelector {
  #[default]
  Any,
  /// Exactly this one color; multicolored cards do not match.
  Single(Color),
  Multi,
  Colorless,
}

impl ColorSelector {
  /// Accepts `W`/`U`/`B`/`R`/`G`, `M`/`Multi`, `C`/`Colorless`, and `All` or
  /// an empty string for no filter.
  pub fn parse(raw: &str) -> Option<Self> {
    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
      "" | "all" | "any" => Some(ColorSelector::Any),
      "m" | "multi" => Some(ColorSelector::Multi),
      "c" | "colorless" => Some(ColorSelector::Colorless),
      _ => {
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
          (Some(symbol), None) => Color::from_symbol(symbol).map(ColorSelector::Single),
          _ => None,
        }
      }
    }
  }

  pub fn matches(self, card: &Card) -> bool {
    let identity = card.color_identity();
    match self {
      ColorSelector::Any => true,
      ColorSelector::Single(color) => identity.len() == 1 && identity.contains(&color),
      ColorSelector::Multi => identity.len() >= 2,
      ColorSelector::Colorless => identity.is_empty(),
    }
  }
}

impl fmt::Display for ColorSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ColorSelector::Any => f.write_str("All"),
      ColorSelector::Single(color) => write!(f, "{}", color),
      ColorSelector::Multi => f.write_str("Multi"),
      ColorSelector::Colorless => f.write_str("Colorless"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
  pub color: ColorSelector,
  /// Case-sensitive; empty disables the predicate.
  pub type_substring: String,
  pub max_mana_value: Option<i64>,
  pub unranked_only: bool,
}

impl FilterCriteria {
  pub fn matches(&self, card: &Card, grades: &GradeStore) -> bool {
    if self.unranked_only && grades.contains(&card.id) {
      return false;
    }
    if !self.color.matches(card) {
      return false;
    }
    if !self.type_substring.is_empty() && !card.type_line.contains(&self.type_substring) {
      return false;
    }
    if let Some(ceiling) = self.max_mana_value {
      if card.cmc > ceiling as f64 {
        return false;
      }
    }
    true
  }

  pub fn is_unfiltered(&self) -> bool {
    *self == FilterCriteria::default()
  }
}

/// Reads the free-text mana ceiling field from its leading integer, so `3.5`
/// is 3. Text without a leading integer disables the ceiling.
pub fn parse_mana_ceiling(raw: &str) -> Option<i64> {
  let trimmed = raw.trim_start();
  let unsigned = trimmed.trim_start_matches(['+', '-']);
  let sign_len = trimmed.len() - unsigned.len();
  if sign_len > 1 {
    return None;
  }
  let digits_len = unsigned
    .find(|c: char| !c.is_ascii_digit())
    .unwrap_or(unsigned.len());
  if digits_len == 0 {
    return None;
  }
  trimmed[..sign_len + digits_len].parse::<i64>().ok()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
  #[default]
  ByName,
  ByRarity,
  ByGrade,
}

impl SortKey {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_lowercase().as_str() {
      "name" => Some(SortKey::ByName),
      "rarity" => Some(SortKey::ByRarity),
      "grade" | "rank" => Some(SortKey::ByGrade),
      _ => None,
    }
  }

  pub fn compare(self, a: &Card, b: &Card, grades: &GradeStore) -> Ordering {
    match self {
      SortKey::ByName => compare_names(&a.name, &b.name),
      SortKey::ByRarity => a.rarity.rank().cmp(&b.rarity.rank()),
      SortKey::ByGrade => {
        stored_grade_rank(grades.get(&a.id)).cmp(&stored_grade_rank(grades.get(&b.id)))
      }
    }
  }
}

impl fmt::Display for SortKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      SortKey::ByName => "name",
      SortKey::ByRarity => "rarity",
      SortKey::ByGrade => "grade",
    };
    f.write_str(label)
  }
}

/// Base letters first, ignoring case and accents; exact text breaks ties.
fn compare_names(a: &str, b: &str) -> Ordering {
  folded_name(a)
    .cmp(folded_name(b))
    .then_with(|| a.cmp(b))
}

fn folded_name(name: &str) -> impl Iterator<Item = char> + '_ {
  name
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
}

/// The visible, ordered working set for the current criteria.
///
/// Filtering keeps catalog order, then a stable sort applies the key, so ties
/// stay in catalog order.
pub fn compute_visible_cards<'a>(
  cards: &'a [Card],
  criteria: &FilterCriteria,
  sort: SortKey,
  grades: &GradeStore,
) -> Vec<&'a Card> {
  let mut visible: Vec<&Card> = cards
    .iter()
    .filter(|card| criteria.matches(card, grades))
    .collect();
  visible.sort_by(|a, b| sort.compare(a, b, grades));
  visible
}
