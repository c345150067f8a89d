//! Ranking state machine.
//!
//! Every transition is a pure function of the current `ViewState`. Transitions
//! that change the filter or sort criteria report `cursor_reset`; the caller
//! decides what to do with it.

use crate::card::Card;
use crate::filter::{ColorSelector, FilterCriteria, SortKey};
use crate::grade::Grade;
use crate::store::GradeStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
  #[default]
  SingleCard,
  Gallery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  Next,
  Previous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
  Color(ColorSelector),
  TypeSubstring(String),
  MaxManaValue(Option<i64>),
  UnrankedOnly(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
  pub criteria: FilterCriteria,
  pub sort: SortKey,
  pub cursor: usize,
  pub mode: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub state: ViewState,
  pub cursor_reset: bool,
}

impl Transition {
  pub fn applied(self) -> ViewState {
    let mut state = self.state;
    if self.cursor_reset {
      state.cursor = 0;
    }
    state
  }
}

impl ViewState {
  /// Any change other than the unranked-only toggle also turns that toggle off.
  pub fn set_filter(&self, change: FilterChange) -> Transition {
    let mut criteria = self.criteria.clone();
    match change {
      FilterChange::Color(selector) => {
        criteria.color = selector;
        criteria.unranked_only = false;
      }
      FilterChange::TypeSubstring(substring) => {
        criteria.type_substring = substring;
        criteria.unranked_only = false;
      }
      FilterChange::MaxManaValue(ceiling) => {
        criteria.max_mana_value = ceiling;
        criteria.unranked_only = false;
      }
      FilterChange::UnrankedOnly(enabled) => criteria.unranked_only = enabled,
    }

    Transition {
      state: ViewState {
        criteria,
        ..self.clone()
      },
      cursor_reset: true,
    }
  }

  pub fn set_sort(&self, sort: SortKey) -> Transition {
    Transition {
      state: ViewState {
        sort,
        ..self.clone()
      },
      cursor_reset: true,
    }
  }

  pub fn set_mode(&self, mode: DisplayMode) -> ViewState {
    ViewState {
      mode,
      ..self.clone()
    }
  }

  pub fn navigate(&self, direction: Direction, visible_len: usize) -> ViewState {
    if visible_len == 0 {
      return self.clone();
    }
    let current = self.cursor % visible_len;
    let cursor = match direction {
      Direction::Next => (current + 1) % visible_len,
      Direction::Previous => (current + visible_len - 1) % visible_len,
    };
    ViewState {
      cursor,
      ..self.clone()
    }
  }

  /// Switches to single-card mode on `card_id`, if it is visible.
  pub fn jump_to(&self, card_id: &str, visible: &[&Card]) -> ViewState {
    match visible.iter().position(|card| card.id == card_id) {
      Some(cursor) => ViewState {
        cursor,
        mode: DisplayMode::SingleCard,
        ..self.clone()
      },
      None => self.clone(),
    }
  }

  /// The cursor clamped to a list that may have shrunk since it was set.
  pub fn effective_cursor(&self, visible_len: usize) -> Option<usize> {
    if visible_len == 0 {
      None
    } else {
      Some(self.cursor.min(visible_len - 1))
    }
  }
}

/// Records a grade. View state is left alone.
pub fn assign_grade(grades: &mut GradeStore, card_id: &str, grade: Grade) {
  grades.upsert(card_id, grade);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::card::test_support::card;
  use crate::card::Color;

  fn unranked_state() -> ViewState {
    ViewState {
      criteria: FilterCriteria {
        unranked_only: true,
        ..Default::default()
      },
      cursor: 4,
      ..Default::default()
    }
  }

  #[test]
  fn defaults() {
    let state = ViewState::default();
    assert!(state.criteria.is_unfiltered());
    assert_eq!(state.sort, SortKey::ByName);
    assert_eq!(state.cursor, 0);
    assert_eq!(state.mode, DisplayMode::SingleCard);
  }

  #[test]
  fn other_filters_clear_unranked_only() {
    let changes = vec![
      FilterChange::Color(ColorSelector::Single(Color::Green)),
      FilterChange::TypeSubstring("Land".to_string()),
      FilterChange::MaxManaValue(Some(3)),
      FilterChange::MaxManaValue(None),
    ];
    for change in changes {
      let transition = unranked_state().set_filter(change.clone());
      assert!(!transition.state.criteria.unranked_only, "{:?}", change);
      assert!(transition.cursor_reset);
    }
  }

  #[test]
  fn unranked_toggle_keeps_other_filters() {
    let state = ViewState {
      criteria: FilterCriteria {
        color: ColorSelector::Multi,
        type_substring: "Creature".to_string(),
        max_mana_value: Some(4),
        unranked_only: false,
      },
      ..Default::default()
    };
    let next = state.set_filter(FilterChange::UnrankedOnly(true)).state;
    assert!(next.criteria.unranked_only);
    assert_eq!(next.criteria.color, ColorSelector::Multi);
    assert_eq!(next.criteria.type_substring, "Creature");
    assert_eq!(next.criteria.max_mana_value, Some(4));
  }

  #[test]
  fn transitions_report_reset_without_applying_it() {
    let transition = unranked_state().set_sort(SortKey::ByRarity);
    assert!(transition.cursor_reset);
    assert_eq!(transition.state.cursor, 4);
    assert_eq!(transition.state.sort, SortKey::ByRarity);
    assert_eq!(transition.applied().cursor, 0);
  }

  #[test]
  fn navigation_wraps_both_ways() {
    let state = ViewState::default();
    let back = state.navigate(Direction::Previous, 3);
    assert_eq!(back.cursor, 2);
    let forward = back.navigate(Direction::Next, 3);
    assert_eq!(forward.cursor, 0);
    assert_eq!(state.navigate(Direction::Next, 0), state);
  }

  #[test]
  fn jump_to_switches_to_single_card() {
    let cards = vec![
      card("a", "Aang", "mythic", 4.0, &[]),
      card("b", "Bumi", "rare", 5.0, &[]),
    ];
    let visible: Vec<&Card> = cards.iter().collect();
    let gallery = ViewState::default().set_mode(DisplayMode::Gallery);

    let jumped = gallery.jump_to("b", &visible);
    assert_eq!(jumped.cursor, 1);
    assert_eq!(jumped.mode, DisplayMode::SingleCard);

    assert_eq!(gallery.jump_to("zz", &visible), gallery);
  }

  #[test]
  fn assigning_leaves_view_untouched() {
    let state = unranked_state();
    let before = state.clone();
    let mut grades = GradeStore::new();
    assign_grade(&mut grades, "a", Grade::BPlus);
    assert_eq!(grades.get("a"), Some("B+"));
    assert_eq!(state, before);
  }

  #[test]
  fn cursor_clamps_to_shrunken_list() {
    let state = ViewState {
      cursor: 5,
      ..Default::default()
    };
    assert_eq!(state.effective_cursor(3), Some(2));
    assert_eq!(state.effective_cursor(0), None);
  }
}
