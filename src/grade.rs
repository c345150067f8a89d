use std::fmt;
use std::str::FromStr;

use crate::error::GradeError;

/// Sort rank of a stored grade string that is not one of the thirteen grades.
pub const UNRECOGNIZED_GRADE_RANK: u8 = 99;
pub const UNGRADED_RANK: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Letter {
  A,
  B,
  C,
  D,
  F,
}

impl Letter {
  pub fn from_char(key: char) -> Option<Self> {
    match key.to_ascii_uppercase() {
      'A' => Some(Letter::A),
      'B' => Some(Letter::B),
      'C' => Some(Letter::C),
      'D' => Some(Letter::D),
      'F' => Some(Letter::F),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
  Plus,
  Minus,
}

impl Modifier {
  /// `=` shares a key with `+` on most keyboards.
  pub fn from_char(key: char) -> Option<Self> {
    match key {
      '+' | '=' => Some(Modifier::Plus),
      '-' => Some(Modifier::Minus),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
  APlus,
  A,
  AMinus,
  BPlus,
  B,
  BMinus,
  CPlus,
  C,
  CMinus,
  DPlus,
  D,
  DMinus,
  F,
}

impl Grade {
  pub const ALL: [Grade; 13] = [
    Grade::APlus,
    Grade::A,
    Grade::AMinus,
    Grade::BPlus,
    Grade::B,
    Grade::BMinus,
    Grade::CPlus,
    Grade::C,
    Grade::CMinus,
    Grade::DPlus,
    Grade::D,
    Grade::DMinus,
    Grade::F,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Grade::APlus => "A+",
      Grade::A => "A",
      Grade::AMinus => "A-",
      Grade::BPlus => "B+",
      Grade::B => "B",
      Grade::BMinus => "B-",
      Grade::CPlus => "C+",
      Grade::C => "C",
      Grade::CMinus => "C-",
      Grade::DPlus => "D+",
      Grade::D => "D",
      Grade::DMinus => "D-",
      Grade::F => "F",
    }
  }

  /// 1 for A+ through 13 for F.
  pub fn rank(self) -> u8 {
    self as u8 + 1
  }

  /// F has no modifiers; `F+` and `F-` are rejected.
  pub fn from_parts(letter: Letter, modifier: Option<Modifier>) -> Result<Self, GradeError> {
    use Modifier::{Minus, Plus};
    let grade = match (letter, modifier) {
      (Letter::A, Some(Plus)) => Grade::APlus,
      (Letter::A, None) => Grade::A,
      (Letter::A, Some(Minus)) => Grade::AMinus,
      (Letter::B, Some(Plus)) => Grade::BPlus,
      (Letter::B, None) => Grade::B,
      (Letter::B, Some(Minus)) => Grade::BMinus,
      (Letter::C, Some(Plus)) => Grade::CPlus,
      (Letter::C, None) => Grade::C,
      (Letter::C, Some(Minus)) => Grade::CMinus,
      (Letter::D, Some(Plus)) => Grade::DPlus,
      (Letter::D, None) => Grade::D,
      (Letter::D, Some(Minus)) => Grade::DMinus,
      (Letter::F, None) => Grade::F,
      (Letter::F, Some(Plus)) => return Err(GradeError::Invalid("F+".to_string())),
      (Letter::F, Some(Minus)) => return Err(GradeError::Invalid("F-".to_string())),
    };
    Ok(grade)
  }
}

impl FromStr for Grade {
  type Err = GradeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Grade::ALL
      .into_iter()
      .find(|grade| grade.as_str() == s)
      .ok_or_else(|| GradeError::Invalid(s.to_string()))
  }
}

impl fmt::Display for Grade {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

pub fn stored_grade_rank(stored: Option<&str>) -> u8 {
  match stored {
    None => UNGRADED_RANK,
    Some(raw) => raw
      .parse::<Grade>()
      .map(Grade::rank)
      .unwrap_or(UNRECOGNIZED_GRADE_RANK),
  }
}

/// Tracks the letter and modifier keys a user has pressed on the current card.
///
/// A letter press commits the letter together with whatever modifier is staged.
/// A modifier press commits only once a letter has been staged. F ignores the
/// staged modifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeEntry {
  letter: Option<Letter>,
  modifier: Option<Modifier>,
}

impl GradeEntry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn staged_letter(&self) -> Option<Letter> {
    self.letter
  }

  pub fn staged_modifier(&self) -> Option<Modifier> {
    self.modifier
  }

  pub fn press_letter(&mut self, letter: Letter) -> Grade {
    self.letter = Some(letter);
    self.commit(letter)
  }

  pub fn press_modifier(&mut self, modifier: Modifier) -> Option<Grade> {
    self.modifier = Some(modifier);
    self.letter.map(|letter| self.commit(letter))
  }

  /// Feeds one key; `None` when the key is not a grade key or commits nothing.
  pub fn press_key(&mut self, key: char) -> Option<Grade> {
    if let Some(letter) = Letter::from_char(key) {
      return Some(self.press_letter(letter));
    }
    Modifier::from_char(key).and_then(|modifier| self.press_modifier(modifier))
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  fn commit(&self, letter: Letter) -> Grade {
    match letter {
      Letter::F => Grade::F,
      _ => Grade::from_parts(letter, self.modifier).unwrap_or(Grade::F),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn thirteen_grades_ranked_in_order() {
    let ranks: Vec<u8> = Grade::ALL.iter().map(|g| g.rank()).collect();
    assert_eq!(ranks, (1..=13).collect::<Vec<u8>>());
    assert_eq!(Grade::APlus.rank(), 1);
    assert_eq!(Grade::F.rank(), 13);
  }

  #[test]
  fn parse_and_display_agree() {
    for grade in Grade::ALL {
      assert_eq!(grade.as_str().parse::<Grade>(), Ok(grade));
      assert_eq!(grade.to_string(), grade.as_str());
    }
  }

  #[test]
  fn f_modifiers_are_not_grades() {
    assert_eq!(
      "F+".parse::<Grade>(),
      Err(GradeError::Invalid("F+".to_string()))
    );
    assert!("F-".parse::<Grade>().is_err());
    assert!(Grade::from_parts(Letter::F, Some(Modifier::Minus)).is_err());
    assert!("a+".parse::<Grade>().is_err());
    assert!("".parse::<Grade>().is_err());
  }

  #[test]
  fn stored_rank_table() {
    assert_eq!(stored_grade_rank(Some("A+")), 1);
    assert_eq!(stored_grade_rank(Some("F")), 13);
    assert_eq!(stored_grade_rank(Some("F+")), UNRECOGNIZED_GRADE_RANK);
    assert_eq!(stored_grade_rank(Some("S")), UNRECOGNIZED_GRADE_RANK);
    assert_eq!(stored_grade_rank(None), UNGRADED_RANK);
  }

  #[test]
  fn letter_then_modifier_commits_both() {
    let mut entry = GradeEntry::new();
    assert_eq!(entry.press_key('b'), Some(Grade::B));
    assert_eq!(entry.press_key('+'), Some(Grade::BPlus));
    assert_eq!(entry.press_key('-'), Some(Grade::BMinus));
  }

  #[test]
  fn modifier_first_waits_for_letter() {
    let mut entry = GradeEntry::new();
    assert_eq!(entry.press_key('='), None);
    assert_eq!(entry.staged_modifier(), Some(Modifier::Plus));
    assert_eq!(entry.press_key('C'), Some(Grade::CPlus));
  }

  #[test]
  fn staged_modifier_carries_to_next_letter() {
    let mut entry = GradeEntry::new();
    entry.press_key('A');
    entry.press_key('-');
    assert_eq!(entry.press_key('D'), Some(Grade::DMinus));
  }

  #[test]
  fn f_drops_staged_modifier() {
    let mut entry = GradeEntry::new();
    entry.press_key('+');
    assert_eq!(entry.press_key('f'), Some(Grade::F));
    assert_eq!(entry.press_key('+'), Some(Grade::F));
  }

  #[test]
  fn other_keys_are_ignored() {
    let mut entry = GradeEntry::new();
    assert_eq!(entry.press_key('x'), None);
    assert_eq!(entry, GradeEntry::new());
    entry.press_key('A');
    entry.clear();
    assert_eq!(entry.staged_letter(), None);
  }
}
