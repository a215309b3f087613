//! Helpers for splitting a byte stream into transport reads.

/// Split `bytes` into consecutive chunks of the given sizes.
///
/// Sizes are used cyclically until the input is exhausted; a zero size
/// yields an empty chunk. The final chunk may be shorter than requested.
///
/// ```
/// use adminport_testing::chunk_by;
///
/// let chunks = chunk_by(&[1, 2, 3, 4, 5], &[2, 1]);
/// assert_eq!(chunks, vec![vec![1, 2], vec![3], vec![4, 5]]);
/// ```
///
/// # Panics
///
/// Panics if `sizes` is empty or contains only zeros.
#[must_use]
pub fn chunk_by(bytes: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    assert!(sizes.iter().any(|&s| s > 0), "chunk sizes must make progress");
    let mut chunks = Vec::new();
    let mut rest = bytes;
    for &size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(size.min(rest.len()));
        chunks.push(head.to_vec());
        rest = tail;
    }
    chunks
}

/// Split `bytes` into one-byte chunks.
#[must_use]
pub fn single_bytes(bytes: &[u8]) -> Vec<Vec<u8>> { bytes.iter().map(|b| vec![*b]).collect() }
