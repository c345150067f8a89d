#![allow(dead_code)]

use card_ranker_lib::{Card, Color, Rarity};
use std::path::{Path, PathBuf};

pub fn card(id: &str, name: &str, rarity: &str, cmc: f64, colors: &[Color]) -> Card {
  Card {
    id: id.to_string(),
    name: name.to_string(),
    type_line: "Creature".to_string(),
    cmc,
    rarity: Rarity::from(rarity.to_string()),
    color_identity: Some(colors.to_vec()),
    colors: Some(colors.to_vec()),
    card_faces: None,
    image_uris: None,
    local_image_paths: None,
  }
}

pub fn ids(cards: &[&Card]) -> Vec<String> {
  cards.iter().map(|card| card.id.clone()).collect()
}

pub fn fixture_path() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join("tla_sample.json")
}
