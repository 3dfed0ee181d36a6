use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    /// Malformed window: the named structural rule was violated.
    Validation(&'static str),
    /// The candidate window overlaps the identified existing window in both
    /// the date and daily-time dimensions.
    WindowConflict(Ulid),
    /// The slot was booked, blocked, or already started at the instant of the
    /// attempt. Also the outcome of losing a booking race.
    SlotUnavailable(Ulid),
    /// The consumer already holds the identified active reservation.
    AlreadyReserved(Ulid),
    /// The slot has started or was blocked; the requested change is no longer
    /// possible.
    PastOrBlocked(Ulid),
    /// The actor does not own the targeted resource.
    Forbidden,
    NotFound(Ulid),
    AlreadyExists(Ulid),
    UnknownConsumer(String),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(rule) => write!(f, "invalid window: {rule}"),
            EngineError::WindowConflict(id) => {
                write!(f, "window conflicts with existing availability: {id}")
            }
            EngineError::SlotUnavailable(id) => write!(f, "slot unavailable: {id}"),
            EngineError::AlreadyReserved(id) => {
                write!(f, "consumer already holds an active reservation: {id}")
            }
            EngineError::PastOrBlocked(id) => {
                write!(f, "slot has started or is blocked: {id}")
            }
            EngineError::Forbidden => write!(f, "actor does not own the targeted resource"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::UnknownConsumer(id) => write!(f, "unknown consumer: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
