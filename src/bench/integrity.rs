//! Detection of response bodies that are an exact repetition of a shorter
//! document, the symptom of an SSR handler rendering its output twice.

use super::sample::SampleRecord;

/// Duplication checker with a minimum repeat width
#[derive(Debug, Clone, Copy)]
pub struct IntegrityAnalyzer {
    min_repeat_width: usize,
}

impl IntegrityAnalyzer {
    pub fn new(min_repeat_width: usize) -> Self {
        Self {
            min_repeat_width: min_repeat_width.max(1),
        }
    }

    /// Length of the shortest unit that reconstructs `body` by repetition,
    /// if one exists that is at least `min_repeat_width` bytes and shorter than
    /// the body itself.
    pub fn repeat_unit(&self, body: &[u8]) -> Option<usize> {
        let len = body.len();
        if len < self.min_repeat_width * 2 {
            return None;
        }

        // Larger repeat counts give shorter units; the first hit is the shortest
        let max_count = len / self.min_repeat_width;
        (2..=max_count)
            .rev()
            .filter(|count| len % count == 0)
            .map(|count| len / count)
            .find(|&width| is_repetition(body, width))
    }

    /// `len / unit` for a repeated body, `1.0` otherwise
    pub fn duplication_factor(&self, body: &[u8]) -> f64 {
        match self.repeat_unit(body) {
            Some(width) => body.len() as f64 / width as f64,
            None => 1.0,
        }
    }

    /// Mean duplication factor across samples (`1.0` for none)
    pub fn analyze(&self, records: &[SampleRecord]) -> f64 {
        if records.is_empty() {
            return 1.0;
        }

        let total: f64 = records
            .iter()
            .map(|record| self.duplication_factor(&record.body))
            .sum();
        let factor = total / records.len() as f64;

        if factor > 1.0 {
            tracing::warn!(
                "Response bodies look duplicated (mean factor {:.2}x over {} samples)",
                factor,
                records.len()
            );
        }

        factor
    }
}

impl Default for IntegrityAnalyzer {
    fn default() -> Self {
        Self::new(super::config::DEFAULT_MIN_REPEAT_WIDTH)
    }
}

fn is_repetition(body: &[u8], width: usize) -> bool {
    let unit = &body[..width];
    body.chunks_exact(width).all(|chunk| chunk == unit)
}
