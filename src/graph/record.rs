// src/graph/record.rs
// =============================================================================
// Reads the parts of a feed record the graph cares about.
//
// A record looks roughly like:
//
//   {
//     "type": "payment",
//     "message": "pizza",
//     "actor": {"id": "A", "name": "Ann", ...},
//     "transactions": [ {"target": {"id": "B", ...}}, {"target": "a phone number"} ]
//   }
//
// and is split into:
// - the sender (actor.id + the whole actor object)
// - one receiver per transaction
// - edge details: everything else, with `type` renamed to `t_type`
//
// Receivers that cannot be resolved to a real account collapse into fixed
// placeholder ids so they all land on a single node each.
// =============================================================================

use serde_json::{Map, Value};
use thiserror::Error;

use crate::feed::Record;

pub const PHONE_ID: &str = "phone";
pub const EMAIL_ID: &str = "email";
pub const IMESSAGE_ID: &str = "iMessage";

const PHONE_TARGET: &str = "a phone number";
const EMAIL_TARGET: &str = "an email";
const IMESSAGE_NAME: &str = "a user on iMessage";

// Why a record could not be turned into nodes and edges
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no usable actor.id")]
    MissingActorId,

    #[error("record has no transactions array")]
    MissingTransactions,

    #[error("transaction {index} has no target")]
    MissingTarget { index: usize },

    #[error("transaction {index} has an unrecognised target: {target}")]
    UnknownTarget { index: usize, target: String },
}

/// A node endpoint extracted from a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub id: String,
    pub attributes: Map<String, Value>,
}

/// Everything the graph needs from one record, fully validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub sender: Party,
    pub receivers: Vec<Party>,
    pub details: Map<String, Value>,
}

impl Interaction {
    // Parses a whole record up front so a bad transaction is caught before
    // anything is written to the graph
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        let fields = record.as_value().as_object().ok_or(RecordError::NotAnObject)?;

        let (sender, details) = parse_sender(fields)?;

        let transactions = fields
            .get("transactions")
            .and_then(Value::as_array)
            .ok_or(RecordError::MissingTransactions)?;

        let receivers = transactions
            .iter()
            .enumerate()
            .map(|(index, t)| parse_receiver(index, t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sender,
            receivers,
            details,
        })
    }
}

fn parse_sender(fields: &Map<String, Value>) -> Result<(Party, Map<String, Value>), RecordError> {
    let actor = fields
        .get("actor")
        .and_then(Value::as_object)
        .ok_or(RecordError::MissingActorId)?;
    let id = actor.get("id").and_then(id_text).ok_or(RecordError::MissingActorId)?;

    let mut details = fields.clone();
    details.remove("actor");
    details.remove("transactions");
    if let Some(kind) = details.remove("type") {
        details.insert("t_type".to_string(), kind);
    }

    let sender = Party {
        id,
        attributes: actor.clone(),
    };
    Ok((sender, details))
}

fn parse_receiver(index: usize, transaction: &Value) -> Result<Party, RecordError> {
    let target = transaction
        .get("target")
        .ok_or(RecordError::MissingTarget { index })?;

    match target {
        Value::String(s) if s == PHONE_TARGET => Ok(placeholder(PHONE_ID)),
        Value::String(s) if s == EMAIL_TARGET => Ok(placeholder(EMAIL_ID)),
        Value::Object(map) => {
            let id = if map.get("name").and_then(Value::as_str) == Some(IMESSAGE_NAME) {
                IMESSAGE_ID.to_string()
            } else {
                map.get("id").and_then(id_text).ok_or_else(|| RecordError::UnknownTarget {
                    index,
                    target: target.to_string(),
                })?
            };
            Ok(Party {
                id,
                attributes: map.clone(),
            })
        }
        Value::Null => Err(RecordError::MissingTarget { index }),
        other => Err(RecordError::UnknownTarget {
            index,
            target: other.to_string(),
        }),
    }
}

fn placeholder(id: &str) -> Party {
    Party {
        id: id.to_string(),
        attributes: Map::new(),
    }
}

// Ids are usually strings but numeric ids are accepted too
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
