//! Human-entered URL/ID/handle resolution. Pure string validation: nothing
//! here touches the network, so malformed input is rejected before any call
//! is billed.

const VIDEO_ID_LEN: usize = 11;
const CHANNEL_ID_LEN: usize = 24;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

/// Reads exactly `len` ID characters starting at `input`, rejecting shorter runs.
fn take_id(input: &str, len: usize) -> Option<String> {
    let id: String = input.chars().take_while(|c| is_id_char(*c)).take(len).collect();
    if id.chars().count() == len {
        Some(id)
    } else {
        None
    }
}

fn after<'a>(input: &'a str, marker: &str) -> Option<&'a str> {
    input.find(marker).map(|pos| &input[pos + marker.len()..])
}

/// Extracts an 11-character video ID from a raw ID, a `watch?v=` URL,
/// a `youtu.be` short link, or a `shorts/` URL. Returns None for anything
/// that cannot be a video reference.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.chars().count() == VIDEO_ID_LEN && input.chars().all(is_id_char) {
        return Some(input.to_string());
    }
    for marker in ["youtube.com/watch?v=", "youtu.be/", "youtube.com/shorts/"] {
        if let Some(rest) = after(input, marker) {
            if let Some(id) = take_id(rest, VIDEO_ID_LEN) {
                return Some(id);
            }
        }
    }
    None
}

/// Resolves channel input to either a `UC…` channel ID (24 chars) or an
/// `@handle`. Handles still need a billed search call to become IDs; the
/// caller must surface that cost difference before resolving.
pub fn extract_channel_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if is_channel_id(input) {
        return Some(input.to_string());
    }
    if let Some(rest) = after(input, "youtube.com/channel/") {
        if let Some(id) = take_id(rest, CHANNEL_ID_LEN) {
            if id.starts_with("UC") {
                return Some(id);
            }
        }
    }
    if let Some(rest) = after(input, "youtube.com/@") {
        let handle: String = rest.chars().take_while(|c| is_handle_char(*c)).collect();
        if !handle.is_empty() {
            return Some(format!("@{handle}"));
        }
    }
    if let Some(stripped) = input.strip_prefix('@') {
        if !stripped.is_empty() && stripped.chars().all(is_handle_char) {
            return Some(input.to_string());
        }
    }
    // Bare word: treat as a handle, same as the dashboard did.
    if input.chars().count() > 2 && input.chars().all(is_handle_char) {
        return Some(format!("@{input}"));
    }
    None
}

/// True for a fully resolved `UC…` ID (as opposed to an `@handle`).
pub fn is_channel_id(input: &str) -> bool {
    input.starts_with("UC") && input.chars().count() == CHANNEL_ID_LEN && input.chars().all(is_id_char)
}
