use std::fmt;

/// Visitation state of a player during one run
///
/// Players move strictly forward: `Undiscovered → Queued → Visited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    /// Never seen in this run
    #[default]
    Undiscovered,

    /// Registered and waiting in the discovery queue
    Queued,

    /// Popped from the queue; its pages have been (or are being) walked
    Visited,
}

impl PlayerState {
    /// Returns true if the transition from `self` to `to` is allowed
    pub fn can_transition_to(&self, to: PlayerState) -> bool {
        matches!(
            (self, to),
            (Self::Undiscovered, Self::Queued) | (Self::Queued, Self::Visited)
        )
    }

    pub fn is_visited(&self) -> bool {
        matches!(self, Self::Visited)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Undiscovered => "undiscovered",
            Self::Queued => "queued",
            Self::Visited => "visited",
        };
        write!(f, "{}", s)
    }
}
