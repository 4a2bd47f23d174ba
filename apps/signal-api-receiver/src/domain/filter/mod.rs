//! Accept Policy
//!
//! Decides which decoded messages are buffered for consumers. The default
//! policy keeps only data messages that carry text; typing indicators,
//! receipts, sync messages, group updates and attachment-only messages are
//! dropped.
//!
//! The accepted kinds are configurable because the upstream schema has
//! changed over time and some consumers want receipts or typing events too.

use std::collections::HashSet;

use super::message::{Envelope, EnvelopeKind};

/// Outcome of classifying a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Buffer the message.
    Accept,
    /// Drop the message.
    Reject(RejectReason),
}

/// Why a message was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The envelope kind is not in the accepted set.
    Kind(EnvelopeKind),
    /// A data message without text (attachment-only, reaction, group update).
    EmptyData,
}

impl RejectReason {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kind(kind) => kind.as_str(),
            Self::EmptyData => "empty_data",
        }
    }
}

/// Set of envelope kinds that are buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptPolicy {
    kinds: HashSet<EnvelopeKind>,
    require_text: bool,
}

impl Default for AcceptPolicy {
    fn default() -> Self {
        Self::new([EnvelopeKind::Data], true)
    }
}

impl AcceptPolicy {
    /// Create a policy accepting `kinds`.
    ///
    /// With `require_text`, data messages are only accepted when their text
    /// is present.
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = EnvelopeKind>, require_text: bool) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            require_text,
        }
    }

    /// Whether `kind` is in the accepted set.
    #[must_use]
    pub fn accepts_kind(&self, kind: EnvelopeKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether data messages need text to be accepted.
    #[must_use]
    pub const fn require_text(&self) -> bool {
        self.require_text
    }

    /// Accepted kinds in a stable order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EnvelopeKind> {
        EnvelopeKind::all()
            .iter()
            .copied()
            .filter(|kind| self.kinds.contains(kind))
            .collect()
    }

    /// Classify an envelope.
    #[must_use]
    pub fn classify(&self, envelope: &Envelope) -> Verdict {
        let kind = envelope.kind();
        if !self.accepts_kind(kind) {
            return Verdict::Reject(RejectReason::Kind(kind));
        }

        let has_text = envelope
            .data_message
            .as_ref()
            .is_some_and(|data| data.message.is_some());
        if kind == EnvelopeKind::Data && self.require_text && !has_text {
            return Verdict::Reject(RejectReason::EmptyData);
        }

        Verdict::Accept
    }
}
