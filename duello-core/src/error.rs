//! Error types for duello-core

use thiserror::Error;

use crate::types::MarketState;

/// Result type alias for duello operations
pub type Result<T> = std::result::Result<T, DuelloError>;

/// Broad classes of failure, used by callers to decide whether a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation is invalid for the current state
    State,
    /// Caller lacks the required role
    Auth,
    /// Called before or after the allowed window
    Timing,
    /// Unsigned arithmetic would wrap
    Arithmetic,
    /// The action was already performed
    AlreadyDone,
    /// Malformed or out-of-range argument
    Input,
    /// The paying account cannot cover the transfer
    Funds,
    /// Encoding or decoding failure
    Serialization,
}

/// Error types for market, oracle and registry operations
#[derive(Error, Debug)]
pub enum DuelloError {
    /// Deposits are only accepted while the market is open
    #[error("Market is not open (state: {0})")]
    MarketNotOpen(MarketState),

    /// Operation is not valid in the current state
    #[error("Wrong state: {0}")]
    WrongState(String),

    /// No finalized oracle result exists for the event yet
    #[error("No final oracle result for event {0}")]
    OracleNotFinal(String),

    /// Caller has no claimable stake
    #[error("Nothing to claim")]
    NothingToClaim,

    /// Caller is not the owner
    #[error("Caller is not the owner")]
    NotOwner,

    /// Caller is not the arbiter
    #[error("Caller is not the arbiter")]
    NotArbiter,

    /// Deposits close at the start time
    #[error("Deposit window closed at {start_time}")]
    DepositWindowClosed { start_time: u64 },

    /// Called before the time gate opened
    #[error("Too early: allowed at {allowed_at}, now {now}")]
    TooEarly { allowed_at: u64, now: u64 },

    /// Dispute window has elapsed
    #[error("Dispute window closed at {closed_at}")]
    WindowClosed { closed_at: u64 },

    /// Market was created without an end time
    #[error("Market has no end time")]
    NoEndTime,

    /// Unsigned arithmetic would wrap
    #[error("Arithmetic overflow")]
    Overflow,

    /// Staker already withdrew
    #[error("Already claimed")]
    AlreadyClaimed,

    /// Event already carries a proposal
    #[error("Event {0} already has a proposal")]
    AlreadyProposed(String),

    /// Side code outside {0, 1}
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    /// Amount must be non-zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Bond below the required minimum
    #[error("Bond too low: required {required}, got {provided}")]
    BondTooLow { required: u128, provided: u128 },

    /// Start must precede end
    #[error("Invalid schedule: start {start_time} must be before end {end_time}")]
    InvalidSchedule { start_time: u64, end_time: u64 },

    /// Address validation errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Token identifier validation errors
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Amount parsing errors
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Registry has no market at the address
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    /// Paying account cannot cover the transfer
    #[error("Insufficient funds: {account} holds {available}, needs {required}")]
    InsufficientFunds {
        account: String,
        available: u128,
        required: u128,
    },

    /// Hex decoding errors
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Serde JSON errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DuelloError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MarketNotOpen(_)
            | Self::WrongState(_)
            | Self::OracleNotFinal(_)
            | Self::NothingToClaim => ErrorKind::State,
            Self::NotOwner | Self::NotArbiter => ErrorKind::Auth,
            Self::DepositWindowClosed { .. }
            | Self::TooEarly { .. }
            | Self::WindowClosed { .. }
            | Self::NoEndTime => ErrorKind::Timing,
            Self::Overflow => ErrorKind::Arithmetic,
            Self::AlreadyClaimed | Self::AlreadyProposed(_) => ErrorKind::AlreadyDone,
            Self::InvalidSide(_)
            | Self::ZeroAmount
            | Self::BondTooLow { .. }
            | Self::InvalidSchedule { .. }
            | Self::InvalidAddress(_)
            | Self::InvalidToken(_)
            | Self::InvalidAmount(_)
            | Self::UnknownMarket(_) => ErrorKind::Input,
            Self::InsufficientFunds { .. } => ErrorKind::Funds,
            Self::Hex(_) | Self::Json(_) => ErrorKind::Serialization,
        }
    }

    /// Shorthand for a [`DuelloError::WrongState`] with a formatted message.
    pub(crate) fn wrong_state(msg: impl Into<String>) -> Self {
        Self::WrongState(msg.into())
    }
}
