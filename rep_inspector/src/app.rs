use std::fmt::Write as _;

use clap::Subcommand;
use rep_core::{
    DeltaOutcome, Direction, ErrorKind, FactionTotal, FactionValue, Missing, ReputationStore,
    Standing, StoreError, TierStep,
};
use serde::Serialize;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a character's reputation and tier with a faction
    Rep { character: String, faction: String },
    /// Show how much reputation is needed to reach the next tier up or down
    NextRep {
        character: String,
        faction: String,
        direction: Direction,
    },
    /// Show a faction's combined reputation across every character
    Combined { faction: String },
    /// List factions whose combined reputation stands out
    Notable {
        /// Overrides the configured magnitude threshold
        #[arg(long)]
        threshold: Option<u64>,
        /// Overrides the configured minimum number of contributing characters
        #[arg(long)]
        min_participants: Option<usize>,
    },
    /// Add a (possibly negative) delta to a character's reputation
    Update {
        character: String,
        faction: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// List faction names in table order
    Factions,
    /// List character names in column order
    Characters,
    /// Show every faction's raw cell for a character
    Values { character: String },
    /// List factions where a character has a non-zero value
    Active { character: String },
    /// Show combined totals for every faction
    Totals,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Value {
        character: String,
        faction: String,
        value: i64,
    },
    Standing {
        character: String,
        faction: String,
        standing: Standing,
    },
    NextTier {
        character: String,
        faction: String,
        step: TierStep,
    },
    Combined {
        faction: String,
        value: i64,
        title: Option<String>,
    },
    Updated {
        character: String,
        faction: String,
        delta: i64,
        outcome: DeltaOutcome,
    },
    Names {
        of: &'static str,
        names: Vec<String>,
    },
    Values {
        character: String,
        values: Vec<FactionValue>,
    },
    Totals {
        totals: Vec<FactionTotal>,
    },
}

pub fn execute(store: &ReputationStore, command: &Command) -> Result<Reply, StoreError> {
    match command {
        Command::Rep { character, faction } => match store.standing(character, faction) {
            Ok(standing) => Ok(Reply::Standing {
                character: character.clone(),
                faction: faction.clone(),
                standing,
            }),
            Err(StoreError::NoBandMatch { value }) => Ok(Reply::Value {
                character: character.clone(),
                faction: faction.clone(),
                value,
            }),
            Err(err) => Err(err),
        },
        Command::NextRep {
            character,
            faction,
            direction,
        } => store
            .next_tier(character, faction, *direction)
            .map(|step| Reply::NextTier {
                character: character.clone(),
                faction: faction.clone(),
                step,
            }),
        Command::Combined { faction } => match store.combined_standing(faction) {
            Ok(standing) => Ok(Reply::Combined {
                faction: faction.clone(),
                value: standing.value,
                title: Some(standing.band.title),
            }),
            // A workbook without diplomacy bands still has a combined value.
            Err(StoreError::NoBandMatch { .. })
            | Err(StoreError::NotFound(Missing::BandTable { .. })) => {
                store.combined_value(faction).map(|value| Reply::Combined {
                    faction: faction.clone(),
                    value,
                    title: None,
                })
            }
            Err(err) => Err(err),
        },
        Command::Notable {
            threshold,
            min_participants,
        } => {
            let defaults = store.config().notable;
            store
                .filter_factions(
                    threshold.unwrap_or(defaults.magnitude_threshold),
                    min_participants.unwrap_or(defaults.min_participants),
                )
                .map(|names| Reply::Names {
                    of: "notable factions",
                    names,
                })
        }
        Command::Update {
            character,
            faction,
            delta,
        } => store
            .apply_delta_detailed(character, faction, *delta)
            .map(|outcome| Reply::Updated {
                character: character.clone(),
                faction: faction.clone(),
                delta: *delta,
                outcome,
            }),
        Command::Factions => store.list_factions().map(|names| Reply::Names {
            of: "factions",
            names,
        }),
        Command::Characters => store.list_characters().map(|names| Reply::Names {
            of: "characters",
            names,
        }),
        Command::Values { character } => {
            store
                .lookup_all_values(character)
                .map(|values| Reply::Values {
                    character: character.clone(),
                    values,
                })
        }
        Command::Active { character } => store.active_factions(character).map(|names| {
            Reply::Names {
                of: "active factions",
                names,
            }
        }),
        Command::Totals => store
            .faction_totals()
            .map(|totals| Reply::Totals { totals }),
    }
}

pub fn render_text(reply: &Reply) -> String {
    match reply {
        Reply::Value {
            character,
            faction,
            value,
        } => format!(
            "{character} has {value} reputation with {faction} (no matching tier)"
        ),
        Reply::Standing {
            character,
            faction,
            standing,
        } => {
            let mut out = format!(
                "{character} has {} reputation with {faction}: {}",
                standing.value, standing.band.title
            );
            if !standing.band.rewards.is_empty() {
                let _ = write!(out, " ({})", standing.band.rewards);
            }
            out
        }
        Reply::NextTier {
            character,
            faction,
            step,
        } => format!(
            "{character} needs {} reputation with {faction} to go {} from {} to {}",
            step.required, step.direction, step.current.title, step.next.title
        ),
        Reply::Combined {
            faction,
            value,
            title,
        } => match title {
            Some(title) => format!("{faction} combined reputation: {value} ({title})"),
            None => format!("{faction} combined reputation: {value}"),
        },
        Reply::Updated {
            character,
            faction,
            delta,
            outcome,
        } => format!(
            "{character} reputation with {faction} changed by {delta}: {} -> {} ({})",
            outcome.previous, outcome.value, outcome.cell
        ),
        Reply::Names { of, names } => {
            if names.is_empty() {
                format!("no {of}")
            } else {
                names.join("\n")
            }
        }
        Reply::Values { character, values } => {
            let mut out = format!("{character}:");
            for entry in values {
                let _ = write!(out, "\n  {}: {}", entry.faction, entry.value);
            }
            out
        }
        Reply::Totals { totals } => totals
            .iter()
            .map(|total| {
                format!(
                    "{}: {} from {} characters",
                    total.faction, total.combined, total.participants
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// User-facing wording for the negative outcomes a lookup can produce.
pub fn describe_expected(err: &StoreError) -> String {
    match err {
        StoreError::NotFound(missing) => format!("Could not find {missing}."),
        StoreError::NoBandMatch { value } => {
            format!("No tier covers a reputation of {value}.")
        }
        StoreError::EndOfRange {
            direction: Direction::Up,
        } => "Already at the highest tier.".to_string(),
        StoreError::EndOfRange {
            direction: Direction::Down,
        } => "Already at the lowest tier.".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorReply {
    pub error: ErrorKind,
    pub message: String,
}

impl ErrorReply {
    pub fn from_error(err: &StoreError) -> Self {
        Self {
            error: err.kind(),
            message: describe_expected(err),
        }
    }
}
