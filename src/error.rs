//! The error taxonomy shared by all backends, gates and circuits.

use crate::channel;

/// A custom error type for sharing, gate evaluation and communication.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A message could not be sent or received.
    #[error(transparent)]
    Channel(#[from] channel::Error),
    /// An earlier communication failure or public mismatch aborted this party's execution.
    #[error("the execution was aborted after an earlier failure")]
    Aborted,
    /// Two operands that must have the same length do not.
    #[error("operand lengths differ: {left} vs {right}")]
    LengthMismatch {
        /// The length of the left operand (or the expected length).
        left: usize,
        /// The length of the right operand (or the actual length).
        right: usize,
    },
    /// The specified party does not take part in the computation.
    #[error("party {0} does not exist")]
    PartyDoesNotExist(usize),
    /// An input or output client must be a channel endpoint outside the computing parties.
    #[error("endpoint {0} is a computing party, not a client")]
    NotAClient(usize),
    /// The computation needs at least two parties.
    #[error("at least 2 parties are required, found {0}")]
    TooFewParties(usize),
    /// The sharing scheme only works for a fixed number of parties.
    #[error("expected exactly {expected} parties, found {actual}")]
    WrongPartyCount {
        /// The number of parties supported by the scheme.
        expected: usize,
        /// The number of parties in the context.
        actual: usize,
    },
    /// The dealer of a sharing did not supply the clear value.
    #[error("the dealer must provide the clear value to be shared")]
    MissingDealerInput,
    /// Two copies of the same replicated share component differ.
    #[error("the replicated share received from party {0} is inconsistent")]
    InconsistentShares(usize),
    /// The operation is not available for the given operands.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// The operation needs correlated randomness that has not been set up (or is used up).
    #[error("missing preprocessing: {0}")]
    MissingPreprocessing(&'static str),
    /// Another party holds a different value for something declared public.
    #[error("party {party} disagrees about a public constant")]
    ConstantMismatch {
        /// The first party whose view differs from ours.
        party: usize,
    },
    /// A secret-shared value was used where a public value is required.
    #[error("the value is secret-shared and cannot be converted to plaintext")]
    NotPublic,
    /// The parties asked the dealer for different amounts of preprocessing.
    #[error("parties requested different numbers of triples: {expected} vs {actual}")]
    PreprocessingMismatch {
        /// The number requested by the first party.
        expected: usize,
        /// The number requested by a later party.
        actual: usize,
    },
    /// The parties asked the dealer for more triples than it hands out at once.
    #[error("{requested} triples requested, at most {max} are dealt at once")]
    TooManyTriples {
        /// The number requested by every party.
        requested: usize,
        /// The largest batch the dealer serves.
        max: usize,
    },
    /// The dealer refused to hand out preprocessing.
    #[error("the dealer rejected the preprocessing request: {0}")]
    PreprocessingRejected(String),
}

/// The broad class of an [`Error`], deciding how it has to be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operand shape or role precondition violated at the call site, never recoverable.
    ProtocolViolation,
    /// The channel failed; the whole execution of this context is aborted.
    CommunicationFailure,
    /// The backend or circuit cannot provide the requested operation.
    UnsupportedOperation,
    /// Parties disagree about a public value.
    ConstantMismatch,
}

impl Error {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Channel(_) | Error::Aborted | Error::PreprocessingRejected(_) => {
                ErrorKind::CommunicationFailure
            }
            Error::LengthMismatch { .. }
            | Error::PartyDoesNotExist(_)
            | Error::NotAClient(_)
            | Error::TooFewParties(_)
            | Error::WrongPartyCount { .. }
            | Error::MissingDealerInput
            | Error::InconsistentShares(_)
            | Error::NotPublic
            | Error::PreprocessingMismatch { .. }
            | Error::TooManyTriples { .. } => ErrorKind::ProtocolViolation,
            Error::Unsupported(_) | Error::MissingPreprocessing(_) => {
                ErrorKind::UnsupportedOperation
            }
            Error::ConstantMismatch { .. } => ErrorKind::ConstantMismatch,
        }
    }
}
