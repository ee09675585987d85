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
    clippy::too_many_lines
)]
#![allow(clippy::must_use_candidate)]

//! In-memory state of a Machinedrum editor.
//!
//! The four persisted objects of the device (kit, pattern, global, song) and their slot
//! libraries live in [`model`]. Lookups used while rendering a kit live in [`catalog`] and
//! [`labels`], pattern slot labels in [`pattern_label`]. [`sync`] tracks which slots have
//! unsaved edits or are in the middle of a transfer, and [`store`] keeps the few
//! preferences that survive a restart.

pub mod catalog;
pub mod error;
pub mod labels;
pub mod model;
pub mod pattern_label;
pub mod store;
pub mod sync;
pub mod types;

pub use error::MdObjectError;
pub use model::{DeviceState, Global, Kit, Pattern, Song};
pub use types::{DeviceModel, OsVersion};
