//! Serde support for fixed size arrays longer than serde handles on its own.
//!
//! Arrays go out as plain sequences and must come back with exactly `N` elements.

use serde::de::{Error, Expected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

struct ExactLength(usize);

impl Expected for ExactLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a sequence of exactly {} elements", self.0)
    }
}

pub fn serialize<S, T, const N: usize>(array: &[T; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_seq(array)
}

pub fn deserialize<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Vec::<T>::deserialize(deserializer)?;
    let len = items.len();
    items
        .try_into()
        .map_err(|_| D::Error::invalid_length(len, &ExactLength(N)))
}
