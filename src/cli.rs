use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::card::{Card, CardImage};
use crate::config::{Config, DEFAULT_SET_CODE};
use crate::error::{Error, Result};
use crate::filter::{parse_mana_ceiling, ColorSelector, SortKey};
use crate::grade::{Grade, GradeEntry};
use crate::session::{Phase, Session};
use crate::state::{Direction, DisplayMode, FilterChange};

#[derive(Debug, Parser)]
#[command(name = "card-ranker", version, about = "Grade every card in a set")]
pub struct Cli {
  /// Set code; picks the catalog and the storage key
  #[arg(long = "set", env = "CARD_RANKER_SET", default_value = DEFAULT_SET_CODE, global = true)]
  pub set_code: String,

  /// Directory holding sets/<set>/<set>.json and the grade database
  #[arg(long, env = "CARD_RANKER_DATA_DIR", default_value = ".", global = true)]
  pub data_dir: PathBuf,

  /// Catalog path or http(s) URL overriding the per-set default
  #[arg(long, env = "CARD_RANKER_CATALOG", global = true)]
  pub catalog: Option<String>,

  /// SQLite file for persisted grades
  #[arg(long, env = "CARD_RANKER_DB", global = true)]
  pub database: Option<PathBuf>,

  /// Log level (error, warn, info, debug, trace); RUST_LOG applies otherwise
  #[arg(long, global = true)]
  pub log_level: Option<log::LevelFilter>,

  #[command(subcommand)]
  pub command: Command,
}

impl Cli {
  pub fn config(&self) -> Config {
    Config {
      set_code: self.set_code.clone(),
      data_dir: self.data_dir.clone(),
      catalog: self.catalog.clone(),
      database: self.database.clone(),
    }
  }
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Print the filtered, sorted card list
  List(ViewArgs),
  /// Print the filtered cards bucketed by grade tier
  Gallery(ViewArgs),
  /// Show one card with its grade and image source
  Show { card_id: String },
  /// Grade one card (A+ through D-, or F)
  Grade { card_id: String, grade: String },
  /// Print the transfer string for all grades
  Export {
    /// Skip the unranked-cards confirmation
    #[arg(short, long)]
    yes: bool,
  },
  /// Replace all grades with a transfer string (read from stdin when omitted)
  Import { encoded: Option<String> },
  /// Step through cards and grade them interactively
  Browse(ViewArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ViewArgs {
  /// W, U, B, R, G, Multi, Colorless, or All
  #[arg(long)]
  pub color: Option<String>,

  /// Case-sensitive type line substring, e.g. Creature
  #[arg(long = "type")]
  pub type_substring: Option<String>,

  /// Highest mana value to show
  #[arg(long)]
  pub max_cmc: Option<String>,

  /// Only cards without a grade
  #[arg(long)]
  pub unranked: bool,

  /// name, rarity, or grade
  #[arg(long, default_value = "name")]
  pub sort: String,
}

impl ViewArgs {
  /// Applies the arguments through the state machine, unranked toggle last.
  pub fn apply(&self, session: &mut Session) -> Result<()> {
    if let Some(raw) = &self.color {
      let selector = ColorSelector::parse(raw)
        .ok_or_else(|| Error::InvalidInput(format!("unknown color filter '{}'", raw)))?;
      session.set_filter(FilterChange::Color(selector));
    }
    if let Some(substring) = &self.type_substring {
      session.set_filter(FilterChange::TypeSubstring(substring.clone()));
    }
    if let Some(raw) = &self.max_cmc {
      session.set_filter(FilterChange::MaxManaValue(parse_mana_ceiling(raw)));
    }
    if self.unranked {
      session.set_filter(FilterChange::UnrankedOnly(true));
    }
    let sort = SortKey::parse(&self.sort)
      .ok_or_else(|| Error::InvalidInput(format!("unknown sort key '{}'", self.sort)))?;
    session.set_sort(sort);
    Ok(())
  }
}

pub fn execute(cli: &Cli, phase: &mut Phase) -> Result<()> {
  let session = phase.session_mut()?;
  let stdout = io::stdout();
  let mut out = stdout.lock();

  match &cli.command {
    Command::List(view) => {
      view.apply(session)?;
      print_list(&mut out, session)?;
    }
    Command::Gallery(view) => {
      view.apply(session)?;
      session.set_mode(DisplayMode::Gallery);
      print_gallery(&mut out, session)?;
    }
    Command::Show { card_id } => {
      let card = session
        .catalog()
        .get(card_id)
        .ok_or_else(|| Error::InvalidInput(format!("no card with id {}", card_id)))?;
      print_card(&mut out, session, card)?;
    }
    Command::Grade { card_id, grade } => {
      let grade = session.assign_grade(card_id, grade)?;
      writeln!(out, "{} -> {}", card_id, grade)?;
    }
    Command::Export { yes } => {
      let confirmed = *yes;
      let exported = session.export(|unranked| confirmed || confirm_export(unranked))?;
      match exported {
        Some(encoded) => writeln!(out, "{}", encoded)?,
        None => writeln!(out, "Export cancelled.")?,
      }
    }
    Command::Import { encoded } => {
      let encoded = match encoded {
        Some(encoded) => encoded.clone(),
        None => {
          let mut line = String::new();
          io::stdin().lock().read_line(&mut line)?;
          line
        }
      };
      let count = session.import(&encoded)?;
      writeln!(out, "Imported {} grade(s).", count)?;
    }
    Command::Browse(view) => {
      view.apply(session)?;
      drop(out);
      browse(session)?;
    }
  }
  Ok(())
}

fn confirm_export(unranked: usize) -> bool {
  eprint!(
    "You have {} unranked card(s). Are you sure you want to export? [y/N] ",
    unranked
  );
  let _ = io::stderr().flush();
  let mut answer = String::new();
  if io::stdin().lock().read_line(&mut answer).is_err() {
    return false;
  }
  matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn card_line(session: &Session, card: &Card) -> String {
  format!(
    "{:<36} {:<9} {:>4} {:<5} {}",
    card.name,
    card.rarity,
    card.cmc,
    session.grade_of(&card.id).unwrap_or("-"),
    card.id
  )
}

fn print_list(out: &mut impl Write, session: &Session) -> Result<()> {
  let visible = session.visible();
  for (index, card) in visible.iter().enumerate() {
    writeln!(out, "{:>4}. {}", index + 1, card_line(session, card))?;
  }
  if visible.is_empty() {
    writeln!(out, "No cards match the current filters.")?;
  }
  writeln!(out, "Showing {} cards", visible.len())?;
  Ok(())
}

fn print_gallery(out: &mut impl Write, session: &Session) -> Result<()> {
  let groups = session.gallery();
  if groups.is_empty() {
    writeln!(out, "No cards match the current filters.")?;
  }
  for group in groups {
    writeln!(out, "== {} ({})", group.tier, group.cards.len())?;
    for card in group.cards {
      writeln!(out, "   {}", card_line(session, card))?;
    }
  }
  Ok(())
}

fn print_card(out: &mut impl Write, session: &Session, card: &Card) -> Result<()> {
  writeln!(out, "{}", card.name)?;
  writeln!(out, "  {}", card.type_line)?;
  let identity: String = card.color_identity().iter().map(|c| c.symbol()).collect();
  writeln!(
    out,
    "  {} | mana value {} | colors {}",
    card.rarity,
    card.cmc,
    if identity.is_empty() { "C".to_string() } else { identity }
  )?;
  match session.image_for(card) {
    CardImage::Local(path) => writeln!(out, "  image: {}", path.display())?,
    CardImage::Remote(url) => writeln!(out, "  image: {}", url)?,
    CardImage::Placeholder(text) => writeln!(out, "  {}", text)?,
  }
  if let Some(grade) = session.grade_of(&card.id) {
    writeln!(out, "  Current Rank: {}", grade)?;
  }
  Ok(())
}

const BROWSE_HELP: &str = "keys: n/enter next, p previous, A-D/F with +/- to grade, \
u unranked toggle, c <W|U|B|R|G|M|C|All> color, t [text] type, m [n] max mana value, \
s <name|rarity|grade> sort, g gallery, j <id> jump, q quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseStep {
  Continue,
  Quit,
  Help,
  Gallery,
  Graded { card_id: String, grade: Grade },
  Rejected(String),
}

/// Applies one input line. Filter and sort commands take their argument after
/// a space, so a bare `c` still grades C.
fn browse_step(session: &mut Session, entry: &mut GradeEntry, input: &str) -> BrowseStep {
  let (head, arg) = match input.split_once(' ') {
    Some((head, arg)) => (head, Some(arg.trim())),
    None => (input, None),
  };

  match (head, arg) {
    ("q" | "quit", None) => BrowseStep::Quit,
    ("" | "n", None) => {
      session.navigate(Direction::Next);
      BrowseStep::Continue
    }
    ("p", None) => {
      session.navigate(Direction::Previous);
      BrowseStep::Continue
    }
    ("?", None) => BrowseStep::Help,
    ("u", None) => {
      let enabled = !session.view().criteria.unranked_only;
      session.set_filter(FilterChange::UnrankedOnly(enabled));
      BrowseStep::Continue
    }
    ("g", None) => BrowseStep::Gallery,
    ("j", Some(card_id)) => {
      session.jump_to(card_id);
      BrowseStep::Continue
    }
    ("c", Some(raw)) => match ColorSelector::parse(raw) {
      Some(selector) => {
        session.set_filter(FilterChange::Color(selector));
        BrowseStep::Continue
      }
      None => BrowseStep::Rejected(format!("unknown color filter '{}'", raw)),
    },
    ("t", raw) => {
      let substring = raw.unwrap_or_default().to_string();
      session.set_filter(FilterChange::TypeSubstring(substring));
      BrowseStep::Continue
    }
    ("m", raw) => {
      let ceiling = raw.and_then(parse_mana_ceiling);
      session.set_filter(FilterChange::MaxManaValue(ceiling));
      BrowseStep::Continue
    }
    ("s", Some(raw)) => match SortKey::parse(raw) {
      Some(sort) => {
        session.set_sort(sort);
        BrowseStep::Continue
      }
      None => BrowseStep::Rejected(format!("unknown sort key '{}'", raw)),
    },
    _ => {
      // The whole line is one gesture; its last commit wins.
      let committed = input.chars().filter_map(|key| entry.press_key(key)).last();
      match committed {
        Some(grade) => match session.grade_current(grade) {
          Some(card_id) => BrowseStep::Graded { card_id, grade },
          None => BrowseStep::Continue,
        },
        None => BrowseStep::Help,
      }
    }
  }
}

fn browse(session: &mut Session) -> Result<()> {
  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = stdout.lock();
  let mut entry = GradeEntry::new();
  writeln!(out, "{}", BROWSE_HELP)?;

  loop {
    match session.current_card() {
      Some(card) => {
        print_card(&mut out, session, card)?;
        if let Some((cursor, len)) = session.position() {
          writeln!(out, "Card {} of {}", cursor + 1, len)?;
        }
      }
      None => writeln!(out, "No cards match the current filters.")?,
    }
    write!(out, "> ")?;
    out.flush()?;

    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
      break;
    }

    match browse_step(session, &mut entry, line.trim()) {
      BrowseStep::Quit => break,
      BrowseStep::Continue => {}
      BrowseStep::Help => writeln!(out, "{}", BROWSE_HELP)?,
      BrowseStep::Gallery => {
        session.set_mode(DisplayMode::Gallery);
        print_gallery(&mut out, session)?;
        session.set_mode(DisplayMode::SingleCard);
      }
      BrowseStep::Graded { card_id, grade } => writeln!(out, "{} -> {}", card_id, grade)?,
      BrowseStep::Rejected(message) => writeln!(out, "{}", message)?,
    }
  }
  Ok(())
}
