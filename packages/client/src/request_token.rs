//! Request generations per fetch channel.
//!
//! Every fetch takes a token when it starts. When its response arrives it
//! is applied only if no newer request was started on the same channel
//! since, so a slow response can never overwrite a newer one.

use std::collections::BTreeMap;

use strum_macros::{AsRefStr, Display, EnumIter};

/// An independent stream of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    /// Redlining overlay for the current bounding box.
    Redlining,
    /// Place search.
    Search,
    /// Reverse geocoding of a clicked point.
    Reverse,
    /// Safety scores for the current route.
    Safety,
}

/// Identifies one request on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    channel: Channel,
    generation: u64,
}

impl RequestToken {
    /// The channel this token was issued on.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }
}

/// Issues tokens and remembers the latest one per channel.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: BTreeMap<Channel, u64>,
}

impl RequestTracker {
    /// Starts a request on `channel`, superseding any earlier one.
    pub fn issue(&mut self, channel: Channel) -> RequestToken {
        let generation = self.latest.entry(channel).or_insert(0);
        *generation += 1;
        RequestToken {
            channel,
            generation: *generation,
        }
    }

    /// Whether `token` is still the latest request on its channel.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.get(&token.channel) == Some(&token.generation)
    }

    /// Like [`Self::is_current`], logging when the token is stale.
    #[must_use]
    pub fn accept(&self, token: RequestToken) -> bool {
        let current = self.is_current(token);
        if !current {
            log::debug!(
                "Dropping stale {} response (generation {})",
                token.channel,
                token.generation
            );
        }
        current
    }
}
