//! Heart-beat negotiation
//!
//! Each side advertises `heart-beat:cx,cy` (milliseconds): it can send every
//! `cx` and wants to receive every `cy`. Zero on either end disables that
//! direction; otherwise the slower of the two wins.

use std::time::Duration;

use crate::frame::FrameError;

/// Inbound silence longer than this many incoming intervals drops the connection
pub const SILENCE_TOLERANCE: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartBeat {
    pub outgoing_ms: u64,
    pub incoming_ms: u64,
}

/// Agreed intervals for one connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negotiated {
    /// How often we must send something
    pub send_every: Option<Duration>,
    /// How often the broker promised to send something
    pub expect_every: Option<Duration>,
}

impl Negotiated {
    /// Silence after which the connection is considered dead
    pub fn dead_after(&self) -> Option<Duration> {
        self.expect_every.map(|d| d * SILENCE_TOLERANCE)
    }
}

impl HeartBeat {
    pub fn new(outgoing: Duration, incoming: Duration) -> Self {
        Self {
            outgoing_ms: outgoing.as_millis() as u64,
            incoming_ms: incoming.as_millis() as u64,
        }
    }

    /// Parses a `heart-beat` header value; a missing header means `0,0`
    pub fn parse(value: Option<&str>) -> Result<Self, FrameError> {
        let Some(value) = value else {
            return Ok(Self::default());
        };

        let invalid = || FrameError::MalformedHeader(format!("heart-beat:{}", value));
        let (out, inc) = value.split_once(',').ok_or_else(invalid)?;

        Ok(Self {
            outgoing_ms: out.trim().parse().map_err(|_| invalid())?,
            incoming_ms: inc.trim().parse().map_err(|_| invalid())?,
        })
    }

    pub fn header_value(&self) -> String {
        format!("{},{}", self.outgoing_ms, self.incoming_ms)
    }

    /// Combines our offer with the broker's answer
    pub fn negotiate(&self, broker: &HeartBeat) -> Negotiated {
        Negotiated {
            send_every: agree(self.outgoing_ms, broker.incoming_ms),
            expect_every: agree(self.incoming_ms, broker.outgoing_ms),
        }
    }
}

fn agree(ours: u64, theirs: u64) -> Option<Duration> {
    if ours == 0 || theirs == 0 {
        None
    } else {
        Some(Duration::from_millis(ours.max(theirs)))
    }
}
