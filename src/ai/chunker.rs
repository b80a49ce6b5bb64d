//! Splits token sequences that exceed a model's input window.

/// Ordered partition of a token sequence: equally sized full chunks followed
/// by an optional shorter remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunks<'a, T> {
    pub full: Vec<&'a [T]>,
    pub remainder: Option<&'a [T]>,
}

impl<'a, T> Chunks<'a, T> {
    /// Total number of chunks, remainder included.
    pub fn count(&self) -> usize {
        self.full.len() + usize::from(self.remainder.is_some())
    }

    /// All chunks in original order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        self.full.iter().copied().chain(self.remainder)
    }
}

/// Partitions `tokens` into chunks of at most `max_len`.
///
/// The leading `max(min(M, L), floor(L / M) * M)` tokens become full chunks of
/// `min(truncated, M)` tokens each; anything left over becomes the remainder.
/// Returns `None` for an empty sequence or a zero chunk size.
pub fn split<T>(tokens: &[T], max_len: usize) -> Option<Chunks<'_, T>> {
    let len = tokens.len();
    if len == 0 || max_len == 0 {
        return None;
    }

    let truncated = max_len.min(len).max((len / max_len) * max_len);
    let chunk_len = truncated.min(max_len);
    let (head, tail) = tokens.split_at(truncated);

    Some(Chunks {
        full: head.chunks_exact(chunk_len).collect(),
        remainder: (!tail.is_empty()).then_some(tail),
    })
}
