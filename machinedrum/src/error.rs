use machinedrum_object::error::MdObjectError;

/// Wrapper error type for all machinedrum session errors.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MachinedrumError {
    #[error("{0}")]
    Custom(String),
    #[error(transparent)]
    Object(#[from] MdObjectError),
}

impl From<&str> for MachinedrumError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

impl From<String> for MachinedrumError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<machinedrum_object::error::ModelError> for MachinedrumError {
    fn from(err: machinedrum_object::error::ModelError) -> Self {
        Self::Object(err.into())
    }
}
