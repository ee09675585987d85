#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::significant_drop_tightening,
    clippy::too_many_lines
)]
#![allow(clippy::must_use_candidate)]

//! A Machinedrum editor session.
//!
//! [`session::Session`] ties the device state, the preference store and the slot tracker
//! together the way a host application drives them, and owns the logging setup.

pub mod error;
pub mod session;
pub mod tracing_setup;

pub use error::MachinedrumError;
pub use session::Session;

use tracing_subscriber::{reload, EnvFilter};

pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;
