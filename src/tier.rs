use std::fmt;

use crate::card::Card;
use crate::grade::Grade;
use crate::store::GradeStore;

/// Gallery bucket. Ordered best first, `Unranked` always last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
  Graded(Grade),
  /// A stored grade string outside the thirteen grades.
  Other,
  Unranked,
}

impl Tier {
  pub fn of(stored: Option<&str>) -> Self {
    match stored {
      None => Tier::Unranked,
      Some(raw) => raw.parse::<Grade>().map(Tier::Graded).unwrap_or(Tier::Other),
    }
  }

  pub fn all() -> impl Iterator<Item = Tier> {
    Grade::ALL
      .into_iter()
      .map(Tier::Graded)
      .chain([Tier::Other, Tier::Unranked])
  }

  pub fn label(self) -> &'static str {
    match self {
      Tier::Graded(grade) => grade.as_str(),
      Tier::Other => "Other",
      Tier::Unranked => "Unranked",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.label())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierGroup<'a> {
  pub tier: Tier,
  pub cards: Vec<&'a Card>,
}

/// Buckets an already ordered card list by tier.
///
/// Empty tiers are left out, and cards keep their input order inside a tier.
pub fn group_by_tier<'a>(ordered: &[&'a Card], grades: &GradeStore) -> Vec<TierGroup<'a>> {
  let mut groups: Vec<TierGroup<'a>> = Tier::all()
    .map(|tier| TierGroup {
      tier,
      cards: Vec::new(),
    })
    .collect();

  for &card in ordered {
    let tier = Tier::of(grades.get(&card.id));
    if let Some(group) = groups.iter_mut().find(|group| group.tier == tier) {
      group.cards.push(card);
    }
  }

  groups.retain(|group| !group.cards.is_empty());
  groups
}
