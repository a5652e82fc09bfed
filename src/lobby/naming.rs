//! Player-name and room-id hygiene

use rand::Rng;

use crate::game::constants::net::{GENERATED_ROOM_ID_LEN, MAX_NAME_CHARS, MAX_ROOM_ID_LEN};

const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Clean a display name. Returns `None` if nothing printable is left.
pub fn sanitize_player_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '&'))
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let name: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
    let name = name.trim_end().to_string();

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Validate a client-supplied room id, returning its trimmed form
pub fn normalize_room_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    let valid = !id.is_empty()
        && id.len() <= MAX_ROOM_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| id.to_string())
}

/// Fresh six-character room code such as `K7Q2ZD`
pub fn generate_room_id_with<R: Rng>(rng: &mut R) -> String {
    (0..GENERATED_ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}
