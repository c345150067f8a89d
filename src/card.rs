use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
  #[serde(rename = "W")]
  White,
  #[serde(rename = "U")]
  Blue,
  #[serde(rename = "B")]
  Black,
  #[serde(rename = "R")]
  Red,
  #[serde(rename = "G")]
  Green,
}

impl Color {
  pub const ALL: [Color; 5] = [
    Color::White,
    Color::Blue,
    Color::Black,
    Color::Red,
    Color::Green,
  ];

  pub fn symbol(self) -> char {
    match self {
      Color::White => 'W',
      Color::Blue => 'U',
      Color::Black => 'B',
      Color::Red => 'R',
      Color::Green => 'G',
    }
  }

  pub fn from_symbol(symbol: char) -> Option<Self> {
    Self::ALL
      .into_iter()
      .find(|color| color.symbol() == symbol.to_ascii_uppercase())
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.symbol())
  }
}

/// Card rarity. Values outside the four printed rarities keep their raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
  Common,
  Uncommon,
  Rare,
  Mythic,
  Unknown(String),
}

impl Rarity {
  /// Sort rank, lowest first. Unknown rarities sort after every known one.
  pub fn rank(&self) -> u8 {
    match self {
      Rarity::Mythic => 1,
      Rarity::Rare => 2,
      Rarity::Uncommon => 3,
      Rarity::Common => 4,
      Rarity::Unknown(_) => 5,
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Rarity::Common => "common",
      Rarity::Uncommon => "uncommon",
      Rarity::Rare => "rare",
      Rarity::Mythic => "mythic",
      Rarity::Unknown(raw) => raw,
    }
  }
}

impl From<String> for Rarity {
  fn from(value: String) -> Self {
    match value.as_str() {
      "common" => Rarity::Common,
      "uncommon" => Rarity::Uncommon,
      "rare" => Rarity::Rare,
      "mythic" => Rarity::Mythic,
      _ => Rarity::Unknown(value),
    }
  }
}

impl From<Rarity> for String {
  fn from(value: Rarity) -> Self {
    value.as_str().to_string()
  }
}

impl fmt::Display for Rarity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageUris {
  #[serde(default)]
  pub normal: Option<String>,
  #[serde(default)]
  pub small: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFace {
  pub name: String,
  #[serde(default)]
  pub colors: Option<Vec<Color>>,
  #[serde(default)]
  pub image_uris: Option<ImageUris>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub type_line: String,
  #[serde(default)]
  pub cmc: f64,
  pub rarity: Rarity,
  #[serde(default)]
  pub color_identity: Option<Vec<Color>>,
  #[serde(default)]
  pub colors: Option<Vec<Color>>,
  #[serde(default)]
  pub card_faces: Option<Vec<CardFace>>,
  #[serde(default)]
  pub image_uris: Option<ImageUris>,
  #[serde(default, rename = "localImagePaths")]
  pub local_image_paths: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardImage {
  Local(PathBuf),
  Remote(String),
  Placeholder(String),
}

impl Card {
  /// Colors used for filtering.
  ///
  /// The declared identity wins. Without one, the union of the faces' colors is
  /// used, then the printed colors of a single-faced card.
  pub fn color_identity(&self) -> BTreeSet<Color> {
    if let Some(identity) = &self.color_identity {
      return identity.iter().copied().collect();
    }
    if let Some(faces) = &self.card_faces {
      return faces
        .iter()
        .flat_map(|face| face.colors.iter().flatten().copied())
        .collect();
    }
    self.colors.iter().flatten().copied().collect()
  }

  pub fn resolve_image(&self, local_base: &Path) -> CardImage {
    if let Some(local) = self
      .local_image_paths
      .as_ref()
      .and_then(|paths| paths.first())
    {
      return CardImage::Local(local_base.join(local));
    }

    let normal = self
      .image_uris
      .as_ref()
      .and_then(|uris| uris.normal.clone())
      .or_else(|| {
        self
          .card_faces
          .as_ref()
          .and_then(|faces| faces.first())
          .and_then(|face| face.image_uris.as_ref())
          .and_then(|uris| uris.normal.clone())
      });

    match normal {
      Some(url) => CardImage::Remote(url),
      None => CardImage::Placeholder(format!("{} (No Image)", self.name)),
    }
  }
}
