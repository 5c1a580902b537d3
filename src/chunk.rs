//! Splits the encoded payload into short fragments for embedding.
//!
//! Fragments always end on a token boundary: the comma where a fragment is
//! cut is dropped, so `fragments.join(",")` restores the text exactly and
//! no decimal byte is ever split across two fragments.

/// Default maximum fragment length, in characters.
pub const CHUNK_SIZE: usize = 100;

/// Smallest fragment length that can hold any decimal byte (`255`).
/// Below this, [`chunk`] cannot keep encoded payload fragments within size.
pub const MIN_CHUNK_SIZE: usize = 3;

/// Pack the comma-separated tokens of `text` into fragments of at most
/// `size` characters. A single token longer than `size` gets a fragment of
/// its own. Empty text yields no fragments.
pub fn chunk(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut fragments = Vec::new();
    if text.is_empty() {
        return fragments;
    }

    let mut current = String::with_capacity(size);
    let mut started = false;
    for token in text.split(',') {
        if started && current.len() + 1 + token.len() > size {
            fragments.push(std::mem::replace(&mut current, String::with_capacity(size)));
            started = false;
        }
        if started {
            current.push(',');
        }
        current.push_str(token);
        started = true;
    }
    fragments.push(current);
    fragments
}

/// Inverse of [`chunk`].
pub fn reassemble<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}
