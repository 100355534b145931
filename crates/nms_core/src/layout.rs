use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentId {
    BlockHeader(usize),
    BlockPayload(usize),
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLayout {
    pub id: SegmentId,
    pub range: ByteRange,
}

/// Where each part of a decoded save file came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLayout {
    pub file_len: usize,
    pub segments: Vec<SegmentLayout>,
}

impl ContainerLayout {
    pub(crate) fn raw(file_len: usize) -> Self {
        Self {
            file_len,
            segments: vec![SegmentLayout {
                id: SegmentId::Raw,
                range: ByteRange {
                    start: 0,
                    end: file_len,
                },
            }],
        }
    }

    pub(crate) fn record(&mut self, id: SegmentId, start: usize, end: usize) {
        self.segments.push(SegmentLayout {
            id,
            range: ByteRange { start, end },
        });
    }

    pub fn block_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s.id, SegmentId::BlockPayload(_)))
            .count()
    }

    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            if self.file_len == 0 {
                return Ok(());
            }
            return Err(Error::corrupted(0, "layout has no segments"));
        }

        let mut expected = 0usize;
        for segment in &self.segments {
            if segment.range.start != expected {
                return Err(Error::corrupted(
                    segment.range.start,
                    format!(
                        "layout gap/overlap around segment {:?}: expected start {}, got {}",
                        segment.id, expected, segment.range.start
                    ),
                ));
            }
            if segment.range.end < segment.range.start {
                return Err(Error::corrupted(
                    segment.range.start,
                    format!(
                        "invalid segment range {:?}: {}..{}",
                        segment.id, segment.range.start, segment.range.end
                    ),
                ));
            }
            expected = segment.range.end;
        }

        if expected != self.file_len {
            return Err(Error::corrupted(
                expected,
                format!(
                    "layout does not cover file: ended at {}, file length {}",
                    expected, self.file_len
                ),
            ));
        }

        Ok(())
    }
}
