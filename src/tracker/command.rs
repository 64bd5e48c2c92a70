//! Inbound command interpreter
//!
//! Parses retrieved message text into a verb via a fixed vocabulary
//! table. Matching is case-insensitive substring search, so command
//! words survive being embedded in reply chains or signatures.
//! Unrecognized content is silently ignored: no reply, no error.

use heapless::String;

/// Longest message prefix considered for matching
const MATCH_CAPACITY: usize = 256;

/// Recognized command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verb {
    /// Enter Tracking mode
    TrackOn,
    /// Leave Tracking mode
    TrackOff,
    /// Leave Emergency mode (the only way out)
    EmergencyOff,
    /// Reply with the device status summary
    Status,
    /// Reply with an immediate position report
    Location,
    /// Run a diagnostic pass and reply with the result
    Test,
    /// Reply with the command vocabulary
    Help,
    /// Request a device restart
    Reboot,
}

/// Verb vocabulary in match order
///
/// Longer phrases come before their prefixes so "TRACK OFF" cannot be
/// shadowed; the table is the single place to extend the vocabulary.
const VOCABULARY: &[(&str, Verb)] = &[
    ("TRACK ON", Verb::TrackOn),
    ("TRACK OFF", Verb::TrackOff),
    ("EMERGENCY OFF", Verb::EmergencyOff),
    ("STATUS", Verb::Status),
    ("LOCATION", Verb::Location),
    ("TEST", Verb::Test),
    ("HELP", Verb::Help),
    ("REBOOT", Verb::Reboot),
];

/// Parse message text into a verb
///
/// Returns `None` for unrecognized content, which the caller discards
/// without any visible effect.
pub fn parse(text: &str) -> Option<Verb> {
    let mut upper: String<MATCH_CAPACITY> = String::new();
    for ch in text.chars() {
        if upper.push(ch.to_ascii_uppercase()).is_err() {
            break;
        }
    }

    for (phrase, verb) in VOCABULARY {
        if upper.as_str().contains(phrase) {
            return Some(*verb);
        }
    }
    None
}
