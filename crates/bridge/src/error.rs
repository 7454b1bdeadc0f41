/// Failure taxonomy for the command surface.
///
/// Listener-level failures (errors raised inside an asynchronous engine
/// callback, such as a failed geolocation query) are surfaced as
/// `Notification::Error` on the bus instead of being discarded; see `events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Map or marker id not found among live instances.
    UnknownIdentifier(String),
    /// `create` called with an id that is already live.
    DuplicateIdentifier(String),
    /// The engine library failed to initialize.
    EngineLoadFailure(String),
    /// Capability not implemented on this substrate.
    UnsupportedOperation(&'static str),
    /// No location capability, or the platform denied the query.
    GeolocationUnavailable,
    /// The registry and the engine's live object graph diverged.
    InternalConsistency(String),
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::UnknownIdentifier(id) => write!(f, "unknown identifier: {id}"),
            BridgeError::DuplicateIdentifier(id) => {
                write!(f, "identifier already in use: {id}")
            }
            BridgeError::EngineLoadFailure(msg) => {
                write!(f, "map engine failed to load: {msg}")
            }
            BridgeError::UnsupportedOperation(what) => {
                write!(f, "{what} is not supported on this platform")
            }
            BridgeError::GeolocationUnavailable => {
                write!(f, "geolocation is not available on this platform")
            }
            BridgeError::InternalConsistency(msg) => {
                write!(f, "internal consistency error: {msg}")
            }
        }
    }
}

impl std::error::Error for BridgeError {}
