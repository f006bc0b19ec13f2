use super::types::Chunk;
use crate::transcript::Segment;

struct ChunkAccumulator {
    chunks: Vec<Chunk>,
    current: Option<Chunk>,
}

impl ChunkAccumulator {
    fn new() -> Self {
        Self {
            chunks: Vec::new(),
            current: None,
        }
    }

    fn push(&mut self, idx: usize, segment: &Segment, chunk_duration: f64) {
        let window_full = self
            .current
            .as_ref()
            .is_some_and(|current| segment.start - current.start >= chunk_duration);
        if window_full {
            self.flush();
        }

        match &mut self.current {
            Some(current) => {
                current.end = segment.end;
                let text = segment.text.trim();
                if !text.is_empty() {
                    if !current.text.is_empty() {
                        current.text.push(' ');
                    }
                    current.text.push_str(text);
                }
                current.source_segments.push(idx);
            }
            None => {
                self.current = Some(Chunk {
                    start: segment.start,
                    end: segment.end,
                    text: segment.text.trim().to_string(),
                    source_segments: vec![idx],
                });
            }
        }
    }

    fn flush(&mut self) {
        if let Some(chunk) = self.current.take() {
            self.chunks.push(chunk);
        }
    }

    fn into_chunks(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Greedily partition segments into analysis windows.
///
/// A new window starts once a segment begins `chunk_duration` seconds or more
/// after the current window's start. Every segment lands in exactly one window,
/// in order; the trailing partial window is always kept.
pub fn chunk_segments(segments: &[Segment], chunk_duration: f64) -> Vec<Chunk> {
    let mut accumulator = ChunkAccumulator::new();
    for (idx, segment) in segments.iter().enumerate() {
        accumulator.push(idx, segment, chunk_duration);
    }
    accumulator.into_chunks()
}
