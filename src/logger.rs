use crate::deck::Deck;
use crate::event::{ActionKind, LogicalAction, Target};

/// A deck that only logs what it receives. Handy for bringing up a new
/// surface before a real deck is attached.
pub struct ActionLogger {
    label: String,
}

impl ActionLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Deck for ActionLogger {
    fn accept_control(&self, action: LogicalAction) {
        match (action.target, action.kind) {
            (Target::Button(id), ActionKind::Pressed) => {
                let (unit, page, shift, index) = id.decode();
                tracing::info!(deck = %self.label, %id, ?unit, page, shift, index, "pressed");
            }
            (Target::Button(id), ActionKind::Released) => {
                tracing::info!(deck = %self.label, %id, "released");
            }
            (target, ActionKind::Rotated(delta)) => {
                tracing::info!(deck = %self.label, ?target, delta, "rotated");
            }
            (Target::EncoderDelta, kind) => {
                tracing::warn!(deck = %self.label, ?kind, "unexpected encoder action");
            }
        }
    }

    fn sync(&self) {
        tracing::trace!(deck = %self.label, "frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogicalButtonId;

    #[test]
    fn accepts_every_action_shape() {
        let logger = ActionLogger::new("left");
        let id = LogicalButtonId::from_raw(17).unwrap();
        logger.accept_control(LogicalAction::pressed(id));
        logger.accept_control(LogicalAction::released(id));
        logger.accept_control(LogicalAction::rotated(-4));
        logger.sync();
        assert_eq!(logger.label(), "left");
    }
}
