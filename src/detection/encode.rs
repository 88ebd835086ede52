use std::fmt;
use std::str::FromStr;

use crate::models::{CardRecord, Player};

/// Line sent downstream when neither player has a card on the table.
pub const EMPTY_SENTINEL: &str = "empty";

impl fmt::Display for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.player.number(),
            self.position,
            self.rank,
            u8::from(self.rotated)
        )
    }
}

/// Concatenate records as `player:position:rank:rotated,` entries in the
/// order given. The trailing comma is kept.
pub fn encode_records<'a>(records: impl IntoIterator<Item = &'a CardRecord>) -> String {
    records.into_iter().map(|r| format!("{r},")).collect()
}

/// Encode both players' records, player one first.
pub fn encode_frame(player_one: &[CardRecord], player_two: &[CardRecord]) -> String {
    encode_records(player_one.iter().chain(player_two))
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("expected {expected} colon-separated fields, got {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid player {0:?}, expected 1 or 2")]
    Player(String),
    #[error("invalid {field} {value:?}")]
    Number { field: &'static str, value: String },
    #[error("rank must be at least 1")]
    ZeroRank,
    #[error("invalid rotation flag {0:?}, expected 0 or 1")]
    Rotation(String),
}

fn parse_player(field: &str) -> Result<Player, RecordParseError> {
    field
        .parse::<u8>()
        .ok()
        .and_then(Player::from_number)
        .ok_or_else(|| RecordParseError::Player(field.to_string()))
}

fn parse_number(field: &'static str, value: &str) -> Result<u32, RecordParseError> {
    value.parse().map_err(|_| RecordParseError::Number {
        field,
        value: value.to_string(),
    })
}

/// Parse a `player:position` slot reference. Longer card strings are
/// accepted and their extra fields ignored.
pub fn parse_slot(s: &str) -> Result<(Player, u32), RecordParseError> {
    let fields: Vec<&str> = s.trim().trim_end_matches(',').split(':').collect();
    if fields.len() < 2 {
        return Err(RecordParseError::FieldCount {
            expected: 2,
            found: fields.len(),
        });
    }
    Ok((parse_player(fields[0])?, parse_number("position", fields[1])?))
}

impl FromStr for CardRecord {
    type Err = RecordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().trim_end_matches(',').split(':').collect();
        let [player, position, rank, rotated] = fields[..] else {
            return Err(RecordParseError::FieldCount {
                expected: 4,
                found: fields.len(),
            });
        };
        let player = parse_player(player)?;
        let position = parse_number("position", position)?;
        let rank = parse_number("rank", rank)?;
        if rank == 0 {
            return Err(RecordParseError::ZeroRank);
        }
        let rotated = match rotated {
            "0" => false,
            "1" => true,
            other => return Err(RecordParseError::Rotation(other.to_string())),
        };
        Ok(CardRecord::new(player, position, rank, rotated))
    }
}

/// Split a wire line back into records. The sentinel and an empty line
/// both decode to no records.
pub fn decode_line(line: &str) -> Result<Vec<CardRecord>, RecordParseError> {
    let line = line.trim();
    if line == EMPTY_SENTINEL {
        return Ok(Vec::new());
    }
    line.split(',')
        .filter(|entry| !entry.is_empty())
        .map(str::parse)
        .collect()
}
