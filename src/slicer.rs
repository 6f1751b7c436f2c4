//! Splits a byte region at a delimiter into an indexable list of sub-regions.

/// One-pass index over the positions of a delimiter byte in a region.
///
/// Boundary sentinels at -1 and `len` let `slice` address both edges
/// uniformly; sub-region `i` spans `(idxs[i] + 1 .. idxs[i + 1])`.
pub(crate) struct Slicer<'a> {
    data: &'a [u8],
    idxs: Vec<isize>,
}

impl<'a> Slicer<'a> {
    pub(crate) fn new(data: &'a [u8], delimiter: u8) -> Self {
        let mut idxs = Vec::with_capacity(8);
        idxs.push(-1);
        for (i, &b) in data.iter().enumerate() {
            if b == delimiter {
                idxs.push(i as isize);
            }
        }
        idxs.push(data.len() as isize);
        Self { data, idxs }
    }

    /// Number of sub-regions: zero for an empty region, otherwise one more
    /// than the number of delimiter occurrences.
    pub(crate) fn count(&self) -> usize {
        if self.data.is_empty() {
            0
        } else {
            self.idxs.len() - 1
        }
    }

    /// The concatenation of sub-regions `[offset, offset + len)`, delimiters
    /// included between them. Caller guarantees the range is in bounds.
    pub(crate) fn slice(&self, offset: usize, len: usize) -> &'a [u8] {
        &self.data[(self.idxs[offset] + 1) as usize..self.idxs[offset + len] as usize]
    }
}
