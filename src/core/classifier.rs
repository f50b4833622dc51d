//! Trigger-phrase classification of utterances.
//!
//! In Assistant Mode an utterance is a note only when it contains one of a
//! fixed set of trigger phrases. The note payload is whatever follows the
//! trigger, minus a leading filler word.

/// Trigger phrases, in scan order
pub const TRIGGER_PHRASES: [&str; 9] = [
    "note this",
    "note that",
    "take a note",
    "remember this",
    "remember that",
    "add note",
    "save note",
    "write down",
    "jot down",
];

/// Fillers stripped from the start of a payload (first match only)
pub const FILLERS: [&str; 4] = ["that", "to", ":", "-"];

/// Classification of a single utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Contains a trigger phrase; `payload` is the extracted note
    Note {
        trigger: &'static str,
        payload: String,
    },

    /// No trigger phrase present
    NotANote,
}

// Triggers and fillers are ASCII, so ASCII folding keeps byte offsets aligned
// with the original-cased text.
fn fold(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// First trigger in scan order present in the utterance, with its byte offset
fn find_trigger(utterance: &str) -> Option<(&'static str, usize)> {
    let lower = fold(utterance);
    TRIGGER_PHRASES
        .iter()
        .find_map(|trigger| lower.find(trigger).map(|idx| (*trigger, idx)))
}

/// True iff the utterance contains any trigger phrase (case-insensitive)
pub fn is_note_command(utterance: &str) -> bool {
    find_trigger(utterance).is_some()
}

/// Extract the note payload from an utterance.
///
/// Returns the utterance unchanged when no trigger is present or the payload
/// after the trigger (and filler) is empty.
pub fn extract_note(utterance: &str) -> String {
    let Some((trigger, idx)) = find_trigger(utterance) else {
        return utterance.to_string();
    };

    let payload = strip_filler(utterance[idx + trigger.len()..].trim());
    if payload.is_empty() {
        utterance.to_string()
    } else {
        payload.to_string()
    }
}

/// Classify an utterance and extract its payload in one pass
pub fn classify(utterance: &str) -> Classification {
    match find_trigger(utterance) {
        Some((trigger, _)) => Classification::Note {
            trigger,
            payload: extract_note(utterance),
        },
        None => Classification::NotANote,
    }
}

fn strip_filler(payload: &str) -> &str {
    let lower = fold(payload);
    // plain prefix match: "tomorrow" loses its "to" too
    match FILLERS.iter().find(|filler| lower.starts_with(**filler)) {
        Some(filler) => payload[filler.len()..].trim(),
        None => payload,
    }
}
