//! Node kinds and the opaque payloads attached to them.
//!
//! A dialogue node is either a plain choice node or carries a payload: an
//! event to fire or an audio clip to play. The engine never looks inside a
//! payload. It only moves the [`PayloadRef`] from the snapshot to the
//! persisted records and back, and hands its declared type to the editor when
//! a node is rebuilt so the right widget is constructed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An uninterpreted, typed reference to payload data owned by the host.
///
/// `type_name` names the payload's concrete type on the host side (for
/// example `"Quest.StartEvent"`), `reference` is whatever the host uses to find
/// the data again (an asset path, a GUID, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadRef {
    type_name: String,
    reference: String,
}

impl PayloadRef {
    /// Creates a new payload reference.
    pub fn new(type_name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            reference: reference.into(),
        }
    }

    /// Returns the host-side type name of the payload.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the host-side reference to the payload data.
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// The kind of a dialogue node.
///
/// Only the variants that need a payload carry one.
///
/// # Examples
///
/// ```
/// use colloquy_core::payload::{NodeKind, PayloadRef};
///
/// let kind = NodeKind::Audio(PayloadRef::new("AudioClip", "sfx/door.ogg"));
/// assert_eq!(kind.payload_type(), Some("AudioClip"));
/// assert_eq!(NodeKind::SingleChoice.payload(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    SingleChoice,
    MultipleChoice,
    Event(PayloadRef),
    Audio(PayloadRef),
}

impl NodeKind {
    /// Returns the payload, if this kind carries one.
    pub fn payload(&self) -> Option<&PayloadRef> {
        match self {
            Self::SingleChoice | Self::MultipleChoice => None,
            Self::Event(payload) | Self::Audio(payload) => Some(payload),
        }
    }

    /// Returns the payload's declared type, if this kind carries a payload.
    pub fn payload_type(&self) -> Option<&str> {
        self.payload().map(PayloadRef::type_name)
    }

    /// Returns a short, stable label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice => "multiple_choice",
            Self::Event(_) => "event",
            Self::Audio(_) => "audio",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
