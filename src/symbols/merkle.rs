use sha2::{Digest, Sha256};

use super::Declaration;

/// Hash the raw source text of a declaration.
/// Whitespace is normalized first so reformatting does not change the hash.
pub fn content_hash(source: &str) -> [u8; 32] {
    let normalized = normalize_source(source);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.finalize().into()
}

/// Fill in `merkle_hash` for every declaration in the arena.
///
/// Children always sit at higher indices than their parent (the arena is in
/// document order), so walking the arena backwards visits every child before
/// the node that folds it in.
pub fn compute_merkle_hashes(decls: &mut [Declaration]) {
    for i in (0..decls.len()).rev() {
        let mut hasher = Sha256::new();
        hasher.update(decls[i].content_hash);
        for child in &decls[i].children {
            hasher.update(decls[child.index()].merkle_hash);
        }
        decls[i].merkle_hash = hasher.finalize().into();
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
fn normalize_source(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut prev_was_space = false;

    for ch in source.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }

    result.trim().to_string()
}

/// Estimate the number of tokens a source string would consume.
/// Rough approximation: ~3.5 characters per token for code.
pub fn estimate_tokens(source: &str) -> usize {
    (source.len() as f64 / 3.5).ceil() as usize
}

/// One-line summary of a declaration: its first non-blank line, cut at the
/// first space past `max_chars` (or at `max_chars` when there is none).
pub fn summarize(source: &str, max_chars: usize) -> String {
    let first_line = source.trim().lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max_chars {
        return first_line.to_string();
    }

    let cut = first_line
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(first_line.len());
    let end = first_line[cut..]
        .find(' ')
        .map(|space| cut + space)
        .unwrap_or(cut);

    format!("{}...", &first_line[..end])
}
