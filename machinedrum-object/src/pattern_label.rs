//! Pattern slots are shown as a bank letter and a position, `A01` to `H16`.

use tracing::debug;

pub const BANKS: &[u8; 8] = b"ABCDEFGH";
pub const PATTERNS_PER_BANK: usize = 16;
pub const PATTERN_COUNT: usize = BANKS.len() * PATTERNS_PER_BANK;

/// What [`label_to_index`] gives back for anything it can not read.
pub const FALLBACK_INDEX: usize = 0;

/// Shown for indices past the last bank.
pub const INVALID_LABEL: &str = "---";

/// `0` is `A01`, `17` is `B02`, `127` is `H16`.
pub fn index_to_label(index: usize) -> String {
    if index >= PATTERN_COUNT {
        return INVALID_LABEL.to_owned();
    }
    let bank = BANKS[index / PATTERNS_PER_BANK] as char;
    format!("{bank}{:02}", index % PATTERNS_PER_BANK + 1)
}

/// Parses a label such as `b02` or ` H16 `, degrading to [`FALLBACK_INDEX`] on bad input.
pub fn label_to_index(label: &str) -> usize {
    parse_label(label).unwrap_or_else(|| {
        debug!("Unreadable pattern label {:?}, using {}.", label, FALLBACK_INDEX);
        FALLBACK_INDEX
    })
}

fn parse_label(label: &str) -> Option<usize> {
    let label = label.trim().to_ascii_uppercase();
    let mut chars = label.chars();
    let bank_letter = chars.next()?;
    let bank = BANKS.iter().position(|b| *b as char == bank_letter)?;

    let number = chars.as_str();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: usize = number.parse().ok()?;
    if !(1..=PATTERNS_PER_BANK).contains(&number) {
        return None;
    }

    Some(bank * PATTERNS_PER_BANK + number - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_for_every_slot() {
        for index in 0..PATTERN_COUNT {
            assert_eq!(label_to_index(&index_to_label(index)), index);
        }
    }

    #[test]
    fn test_known_labels() {
        assert_eq!(index_to_label(0), "A01");
        assert_eq!(index_to_label(15), "A16");
        assert_eq!(index_to_label(17), "B02");
        assert_eq!(index_to_label(127), "H16");
        assert_eq!(index_to_label(128), INVALID_LABEL);
    }

    #[test]
    fn test_parsing_is_lenient_about_case_and_spacing() {
        assert_eq!(label_to_index("b02"), 17);
        assert_eq!(label_to_index("  h16\n"), 127);
        assert_eq!(label_to_index("C3"), 34);
    }

    #[test]
    fn test_bad_labels_fall_back() {
        assert_eq!(label_to_index("Z99"), 0);
        assert_eq!(label_to_index("A00"), 0);
        assert_eq!(label_to_index(""), 0);
        assert_eq!(label_to_index("A17"), 0);
        assert_eq!(label_to_index("A"), 0);
        assert_eq!(label_to_index("B+2"), 0);
        assert_eq!(label_to_index("Bx1"), 0);
    }
}
