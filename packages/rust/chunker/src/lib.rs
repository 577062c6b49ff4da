//! Fixed-size text chunking for the non-AI fallback path.
//!
//! Chunks are counted in characters and split with no awareness of sentence
//! or paragraph boundaries, an accepted MVP simplification. Production
//! segmentation comes from the analysis service; this only has to cover the
//! degraded path.

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Lazy iterator over contiguous, non-overlapping chunks of a text.
///
/// Covers the whole input in order; the last chunk may be shorter. Cloning
/// the iterator restarts it from its current position, and calling
/// [`chunks`] again restarts from the beginning: the split is a pure
/// function of `(text, chunk_size)`.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    chunk_size: usize,
}

/// Split `text` into chunks of `chunk_size` characters.
///
/// A `chunk_size` of zero is treated as one.
pub fn chunks(text: &str, chunk_size: usize) -> Chunks<'_> {
    Chunks {
        rest: text,
        chunk_size: chunk_size.max(1),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let split = self
            .rest
            .char_indices()
            .nth(self.chunk_size)
            .map_or(self.rest.len(), |(i, _)| i);

        let (head, tail) = self.rest.split_at(split);
        self.rest = tail;
        Some(head)
    }
}
