use crate::types::SlotDomain;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Store Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store Error: Malformed store contents. {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store Error: The durable store is not usable. {0}")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Index out of range: {index} is not a valid {domain} slot. There are {capacity} of them.")]
    SlotOutOfRange {
        domain: SlotDomain,
        index: usize,
        capacity: usize,
    },
    #[error("Index out of range: {0} is not a valid track. Tracks are numbered 0 to 15.")]
    TrackOutOfRange(usize),
    #[error("Index out of range: {0} is not a valid step. Steps are numbered 0 to 63.")]
    StepOutOfRange(usize),
    #[error("Index out of range: {0} is not a valid parameter. Parameters are numbered 0 to 7.")]
    ParamOutOfRange(usize),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SlotAddressError {
    #[error("Invalid slot id: {0}. A slot id looks like kit:3.")]
    InvalidFormat(String),
    #[error("Invalid slot domain: {0}. Try one of global, song, kit or pattern.")]
    InvalidDomain(String),
    #[error("Invalid slot index: {0}. The part after the colon must be a non negative integer.")]
    InvalidIndex(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid device model: {0}. Try one of mk1, mk2, uw_mk1 or uw_mk2.")]
    InvalidDeviceModel(String),
    #[error("Invalid transfer direction: {0}. Try send or receive.")]
    InvalidDirection(String),
    #[error("Invalid bus topic: {0}.")]
    InvalidTopic(String),
}

/// Wrapper error type for all machinedrum object errors.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MdObjectError {
    #[error("{0}")]
    Custom(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    SlotAddress(#[from] SlotAddressError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<&str> for MdObjectError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

impl From<String> for MdObjectError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}
