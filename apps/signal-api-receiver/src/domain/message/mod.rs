//! Signal Message Types
//!
//! Wire format types for the envelopes pushed by the signal-cli REST API on
//! `/v1/receive/<account>`. Field names follow the upstream JSON exactly
//! (camelCase) so buffered messages can be handed back to consumers
//! unchanged.
//!
//! # Envelope Variants
//!
//! An envelope is tagged by whichever sub-message field is populated:
//!
//! - `dataMessage`: user-authored content (text, attachments, quotes, ...).
//!   Group updates also arrive here, with `groupInfo` and a null `message`.
//! - `typingMessage`: typing indicator
//! - `receiptMessage`: delivery/read/viewed receipts
//! - `syncMessage`: linked-device sync
//!
//! # Wire Format (JSON)
//! ```json
//! {
//!   "envelope": {
//!     "source": "+15550000001",
//!     "sourceNumber": "+15550000001",
//!     "sourceUuid": "2f0a...",
//!     "sourceName": "Alice",
//!     "sourceDevice": 1,
//!     "timestamp": 1700000000000,
//!     "dataMessage": {"timestamp": 1700000000000, "message": "hi", "expiresInSeconds": 0, "viewOnce": false}
//!   },
//!   "account": "+15550000000"
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Decode a JSON `null` as the field's default, same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Message
// =============================================================================

/// A single message as received from the stream and stored in the buffer.
///
/// Messages have no identity of their own; ordering is purely positional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Decoded envelope.
    #[serde(deserialize_with = "null_as_default")]
    pub envelope: Envelope,
    /// Account the envelope was received on.
    #[serde(deserialize_with = "null_as_default")]
    pub account: String,
}

impl Message {
    /// Create a message for the given account with an empty envelope.
    #[must_use]
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            envelope: Envelope::default(),
            account: account.into(),
        }
    }

    /// Create a data message carrying `text`.
    #[must_use]
    pub fn text(account: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            envelope: Envelope {
                data_message: Some(DataMessage {
                    message: Some(text.into()),
                    ..DataMessage::default()
                }),
                ..Envelope::default()
            },
            account: account.into(),
        }
    }

    /// Text of the data message, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.envelope
            .data_message
            .as_ref()
            .and_then(|data| data.message.as_deref())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Envelope metadata plus exactly one populated sub-message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Envelope {
    /// Sender identifier (number or UUID).
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    /// Sender phone number in E.164 form.
    #[serde(deserialize_with = "null_as_default")]
    pub source_number: String,
    /// Sender UUID.
    #[serde(deserialize_with = "null_as_default")]
    pub source_uuid: String,
    /// Sender profile name.
    #[serde(deserialize_with = "null_as_default")]
    pub source_name: String,
    /// Sending device id.
    #[serde(deserialize_with = "null_as_default")]
    pub source_device: i32,
    /// Server timestamp in milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,

    /// Receipt payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_message: Option<ReceiptMessage>,

    /// Typing indicator payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_message: Option<TypingMessage>,

    /// Data (user content) payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_message: Option<DataMessage>,

    /// Linked-device sync payload. Kept opaque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_message: Option<serde_json::Value>,
}

impl Envelope {
    /// Classify the envelope by its populated sub-message.
    ///
    /// When several fields are populated the precedence is
    /// data > sync > receipt > typing.
    #[must_use]
    pub const fn kind(&self) -> EnvelopeKind {
        if self.data_message.is_some() {
            EnvelopeKind::Data
        } else if self.sync_message.is_some() {
            EnvelopeKind::Sync
        } else if self.receipt_message.is_some() {
            EnvelopeKind::Receipt
        } else if self.typing_message.is_some() {
            EnvelopeKind::Typing
        } else {
            EnvelopeKind::Other
        }
    }
}

/// Envelope variant discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// `dataMessage` populated.
    Data,
    /// `typingMessage` populated.
    Typing,
    /// `receiptMessage` populated.
    Receipt,
    /// `syncMessage` populated.
    Sync,
    /// No known sub-message populated (stories, calls, ...).
    Other,
}

impl EnvelopeKind {
    /// All kinds, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Data,
            Self::Typing,
            Self::Receipt,
            Self::Sync,
            Self::Other,
        ]
    }

    /// Lowercase name used in configuration, logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Typing => "typing",
            Self::Receipt => "receipt",
            Self::Sync => "sync",
            Self::Other => "other",
        }
    }

    /// Parse a kind name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.trim().to_lowercase();
        Self::all().iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sub-messages
// =============================================================================

/// Delivery, read or viewed receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiptMessage {
    /// When the receipt was generated.
    #[serde(deserialize_with = "null_as_default")]
    pub when: i64,
    /// Delivery receipt.
    #[serde(deserialize_with = "null_as_default")]
    pub is_delivery: bool,
    /// Read receipt.
    #[serde(deserialize_with = "null_as_default")]
    pub is_read: bool,
    /// Viewed receipt.
    #[serde(deserialize_with = "null_as_default")]
    pub is_viewed: bool,
    /// Timestamps of the messages being acknowledged.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamps: Vec<i64>,
}

/// Typing indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingMessage {
    /// `STARTED` or `STOPPED`.
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    /// Indicator timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

/// User-authored content.
///
/// `message` is `None` for attachment-only messages, reactions, stickers
/// and group updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataMessage {
    /// Sender timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
    /// Message text.
    pub message: Option<String>,
    /// Disappearing message timer.
    #[serde(deserialize_with = "null_as_default")]
    pub expires_in_seconds: i32,
    /// View-once flag.
    #[serde(deserialize_with = "null_as_default")]
    pub view_once: bool,
    /// Group the message was sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_info: Option<GroupInfo>,
    /// Quoted message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    /// Mentions within `message`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(deserialize_with = "null_as_default")]
    pub mentions: Vec<Mention>,
    /// Sticker reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker: Option<Sticker>,
    /// Attachments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    /// Remote delete of an earlier message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_delete: Option<RemoteDelete>,
}

/// Group metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupInfo {
    /// Base64 group id.
    #[serde(deserialize_with = "null_as_default")]
    pub group_id: String,
    /// Group display name.
    #[serde(deserialize_with = "null_as_default")]
    pub group_name: String,
    /// Group revision.
    #[serde(deserialize_with = "null_as_default")]
    pub revision: i64,
    /// `DELIVER`, `UPDATE`, ...
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
}

/// Quoted (replied-to) message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Quote {
    /// Timestamp id of the quoted message.
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    /// Quoted author.
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    /// Quoted author number.
    #[serde(deserialize_with = "null_as_default")]
    pub author_number: String,
    /// Quoted author UUID.
    #[serde(deserialize_with = "null_as_default")]
    pub author_uuid: String,
    /// Quoted text.
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    /// Quoted attachments.
    #[serde(deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

/// Mention of a user within the message text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mention {
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Phone number.
    #[serde(deserialize_with = "null_as_default")]
    pub number: String,
    /// UUID.
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
    /// Start offset in the text.
    #[serde(deserialize_with = "null_as_default")]
    pub start: i32,
    /// Length of the mention placeholder.
    #[serde(deserialize_with = "null_as_default")]
    pub length: i32,
}

/// Sticker reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sticker {
    /// Sticker pack id.
    #[serde(deserialize_with = "null_as_default")]
    pub pack_id: String,
    /// Sticker id within the pack.
    #[serde(deserialize_with = "null_as_default")]
    pub sticker_id: i32,
}

/// Remote delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteDelete {
    /// Timestamp of the deleted message.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

/// Attachment metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Attachment {
    /// MIME type.
    #[serde(deserialize_with = "null_as_default")]
    pub content_type: String,
    /// Attachment id on the REST API.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Original filename.
    pub filename: Option<String>,
    /// Size in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub size: i64,
    /// Image width.
    pub width: Option<i32>,
    /// Image height.
    pub height: Option<i32>,
    /// Caption.
    pub caption: Option<String>,
    /// Upload timestamp.
    pub upload_timestamp: Option<i64>,
}

// =============================================================================
// Tests
// =============================================================================
