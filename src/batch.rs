/// Rows loaded, written and committed together.
pub const CHUNK_SIZE: u32 = 100;

/// Inclusive, zero-based span of data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u32,
    pub end: u32,
}

impl Chunk {
    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Chunks always hold at least one row.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Walks data rows `1..row_count` (row 0 is the header) in chunks.
///
/// Cloning gives an independent walk from the same position.
#[derive(Debug, Clone)]
pub struct RowChunks {
    next_start: u32,
    row_count: u32,
    size: u32,
}

impl RowChunks {
    pub fn new(row_count: u32, size: u32) -> Self {
        RowChunks {
            next_start: 1,
            row_count,
            size: size.max(1),
        }
    }
}

impl Iterator for RowChunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next_start >= self.row_count {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.size - 1).min(self.row_count - 1);
        self.next_start = end + 1;

        Some(Chunk { start, end })
    }
}
