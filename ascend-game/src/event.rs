//! Events raised for the presentation layer.
//!
//! The core never renders; it reports what happened and lets the host decide
//! how to show it.

use serde::{Deserialize, Serialize};

/// Why a level attempt ended in a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    /// The player placed a number that broke ascending order.
    WrongPlacement,
    /// The drawn number fits no empty slot.
    ImpossibleMove,
}

impl LossReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WrongPlacement => "wrong placement",
            Self::ImpossibleMove => "impossible move",
        }
    }
}

/// Notification emitted by the game controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// A number was drawn for `round` and awaits placement.
    NumberReady { value: u32, round: u32 },
    /// `value` was written at `index` and the board stayed sorted.
    PlacementAccepted { index: usize, value: u32 },
    Lost { reason: LossReason },
    LevelComplete { level: u32 },
    LevelAdvanced { level: u32 },
}

impl GameEvent {
    /// Single-line JSON form for hosts that forward events as text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Receiver for [`GameEvent`]s. No return value is expected.
pub trait GameListener {
    fn on_event(&mut self, event: &GameEvent);
}

/// Listener that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl GameListener for NoopListener {
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Records events in emission order.
impl GameListener for Vec<GameEvent> {
    fn on_event(&mut self, event: &GameEvent) {
        self.push(*event);
    }
}

impl<F> GameListener for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event);
    }
}
