//! Interactive simulator that sends hand-made card states to the consumer,
//! for exercising it without a camera.

use std::io::{BufRead, Write};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use anyhow::Result;

use crate::detection::encode::{self, EMPTY_SENTINEL, RecordParseError};
use crate::models::{CardRecord, Player};

const SEND_INTERVAL: Duration = Duration::from_millis(100);

pub const HELP: &str = "commands: add P:S:R:O, remove P:S, rotate P:S, status, send [N], clear, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(CardRecord),
    Remove(Player, u32),
    Rotate(Player, u32),
    Status,
    Send(u32),
    Clear,
    Help,
    Quit,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}, type \"help\" for a list of commands")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Record(#[from] RecordParseError),
    #[error("slot {position} is out of range, the table has {slots} slots per player")]
    Slot { position: u32, slots: u32 },
    #[error("rank {rank} is above the maximum {max}")]
    Rank { rank: u32, max: u32 },
}

impl Command {
    /// Parse one console line. Slots and ranks are checked against the
    /// table layout.
    pub fn parse(line: &str, slots: u32, max_rank: Option<u32>) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let arg = tokens.next();
        if tokens.next().is_some() {
            return Err(CommandError::Usage(HELP));
        }

        let check_slot = |position: u32| {
            if position < slots {
                Ok(position)
            } else {
                Err(CommandError::Slot { position, slots })
            }
        };

        match (name, arg) {
            ("add", Some(card)) => {
                let record: CardRecord = card.parse()?;
                check_slot(record.position)?;
                if let Some(max) = max_rank.filter(|&max| record.rank > max) {
                    return Err(CommandError::Rank {
                        rank: record.rank,
                        max,
                    });
                }
                Ok(Command::Add(record))
            }
            ("add", None) => Err(CommandError::Usage("add P:S:R:O")),
            ("remove", Some(slot)) => {
                let (player, position) = encode::parse_slot(slot)?;
                Ok(Command::Remove(player, check_slot(position)?))
            }
            ("remove", None) => Err(CommandError::Usage("remove P:S")),
            ("rotate", Some(slot)) => {
                let (player, position) = encode::parse_slot(slot)?;
                Ok(Command::Rotate(player, check_slot(position)?))
            }
            ("rotate", None) => Err(CommandError::Usage("rotate P:S")),
            ("send", None) => Ok(Command::Send(1)),
            ("send", Some(n)) => n
                .parse()
                .map(Command::Send)
                .map_err(|_| CommandError::Usage("send [N]")),
            ("status", None) => Ok(Command::Status),
            ("clear", None) => Ok(Command::Clear),
            ("help", None) => Ok(Command::Help),
            ("quit", None) => Ok(Command::Quit),
            ("status" | "clear" | "help" | "quit", Some(_)) => Err(CommandError::Usage(HELP)),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Simulated table state: at most one card per player slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardTable {
    cards: Vec<CardRecord>,
}

impl CardTable {
    fn find(&self, player: Player, position: u32) -> Option<usize> {
        self.cards
            .iter()
            .position(|c| c.player == player && c.position == position)
    }

    /// Place a card, replacing whatever was in its slot.
    pub fn add(&mut self, record: CardRecord) {
        match self.find(record.player, record.position) {
            Some(i) => self.cards[i] = record,
            None => self.cards.push(record),
        }
    }

    pub fn remove(&mut self, player: Player, position: u32) -> bool {
        match self.find(player, position) {
            Some(i) => {
                self.cards.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn rotate(&mut self, player: Player, position: u32) -> bool {
        match self.find(player, position) {
            Some(i) => {
                self.cards[i].rotated = !self.cards[i].rotated;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn line(&self) -> String {
        encode::encode_records(&self.cards)
    }

    pub fn wire_line(&self) -> String {
        if self.cards.is_empty() {
            EMPTY_SENTINEL.to_string()
        } else {
            self.line()
        }
    }
}

/// Read commands from `input` until `quit` or end of input.
pub fn run(
    mut input: impl BufRead,
    mut output: impl Write,
    forward: SocketAddr,
    slots: u32,
    max_rank: Option<u32>,
) -> Result<()> {
    let socket = UdpSocket::bind(if forward.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" })?;
    let mut table = CardTable::default();
    let mut line = String::new();

    loop {
        write!(output, "$ ")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line, slots, max_rank) {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "error: {e}")?;
                continue;
            }
        };

        match command {
            Command::Add(record) => {
                table.add(record);
                writeln!(output, "added card {record}, status \"{}\"", table.line())?;
            }
            Command::Remove(player, position) => {
                if table.remove(player, position) {
                    writeln!(output, "removed card {player}:{position}, status \"{}\"", table.line())?;
                } else {
                    writeln!(output, "no card at {player}:{position}")?;
                }
            }
            Command::Rotate(player, position) => {
                if table.rotate(player, position) {
                    writeln!(output, "rotated card {player}:{position}, status \"{}\"", table.line())?;
                } else {
                    writeln!(output, "no card at {player}:{position}")?;
                }
            }
            Command::Status => writeln!(output, "{}", table.line())?,
            Command::Send(times) => {
                let payload = table.wire_line();
                for i in 0..times {
                    if i > 0 {
                        std::thread::sleep(SEND_INTERVAL);
                    }
                    socket.send_to(payload.as_bytes(), forward)?;
                }
                log::debug!("sent {payload:?} to {forward} {times} times");
                writeln!(output, "sent {times} times")?;
            }
            Command::Clear => {
                table.clear();
                writeln!(output, "cards were cleared")?;
            }
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Quit => return Ok(()),
        }
    }
}
