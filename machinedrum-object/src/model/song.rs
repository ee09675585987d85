use serde::{Deserialize, Deserializer, Serialize};

pub const SONG_SLOT_COUNT: usize = 32;
pub const SONG_ROW_LEN: usize = 10;
pub const SONG_NAME_LEN: usize = 16;
pub const DEFAULT_SONG_NAME: &str = "UNTITLED";

/// One playback instruction, kept as the device encodes it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRow(pub [u8; SONG_ROW_LEN]);

fn truncated_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?
        .chars()
        .take(SONG_NAME_LEN)
        .collect())
}

fn clamped_slot<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u8::deserialize(deserializer)?.min(SONG_SLOT_COUNT as u8 - 1))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub rows: Vec<SongRow>,
    #[serde(deserialize_with = "truncated_name")]
    pub name: String,
    #[serde(deserialize_with = "clamped_slot")]
    slot_index: u8,
}

impl Default for Song {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Song {
    /// An empty song for `slot`, clamped to the last song slot.
    pub fn new(slot: u8) -> Self {
        Self {
            rows: Vec::new(),
            name: DEFAULT_SONG_NAME.to_owned(),
            slot_index: slot.min(SONG_SLOT_COUNT as u8 - 1),
        }
    }

    pub const fn slot_index(&self) -> u8 {
        self.slot_index
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.chars().take(SONG_NAME_LEN).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_song() {
        let song = Song::new(40);
        assert_eq!(song.slot_index(), 31);
        assert!(song.rows.is_empty());
        assert_eq!(song.name, DEFAULT_SONG_NAME);
    }

    #[test]
    fn test_rows_keep_their_order() {
        let mut song = Song::new(1);
        song.rows.push(SongRow([1; SONG_ROW_LEN]));
        song.rows.push(SongRow([2; SONG_ROW_LEN]));
        song.set_name("A SONG NAME THAT IS TOO LONG");
        assert_eq!(song.rows[0].0[0], 1);
        assert_eq!(song.rows[1].0[0], 2);
        assert_eq!(song.name.chars().count(), SONG_NAME_LEN);
    }

    #[test]
    fn test_import_clamps_slot_and_name() {
        let json = r#"{"rows":[],"name":"A SONG NAME THAT IS TOO LONG","slotIndex":90}"#;
        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.slot_index(), 31);
        assert_eq!(song.name, "A SONG NAME THAT");
    }
}
