//! Bucketing size-sweep rows by their size column.
//!
//! The scan trusts that the rows of one size are contiguous in the
//! file (that's how the drivers write them); it does not sort or
//! merge. If sizes are interleaved, the same size shows up as several
//! buckets, in file order.

use crate::{ingest::record::SizeRow, stats::mean};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SizeBucket {
    pub size: u64,
    pub mean_latency_us: f64,
    pub num_rows: usize,
}

/// (size, mean latency) pairs in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SizeSeries {
    pub buckets: Vec<SizeBucket>,
}

impl SizeSeries {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.buckets
            .iter()
            .map(|b| (b.size as f64, b.mean_latency_us))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Left-to-right scan state.
#[derive(Debug, Default)]
pub struct SizeSeriesBuilder {
    current: Option<(u64, Vec<f64>)>,
    buckets: Vec<SizeBucket>,
}

impl SizeSeriesBuilder {
    fn flush(&mut self) {
        if let Some((size, latencies)) = self.current.take() {
            if let Some(mean_latency_us) = mean(&latencies) {
                self.buckets.push(SizeBucket {
                    size,
                    mean_latency_us,
                    num_rows: latencies.len(),
                });
            }
        }
    }

    pub fn push(mut self, row: SizeRow) -> Self {
        let SizeRow { size, latency_us } = row;
        match &mut self.current {
            Some((current_size, latencies)) if *current_size == size => {
                latencies.push(latency_us);
            }
            _ => {
                self.flush();
                self.current = Some((size, vec![latency_us]));
            }
        }
        self
    }

    pub fn finish(mut self) -> SizeSeries {
        self.flush();
        SizeSeries {
            buckets: self.buckets,
        }
    }
}

pub fn bucket_by_size(rows: &[SizeRow]) -> SizeSeries {
    rows.iter()
        .fold(SizeSeriesBuilder::default(), |b, row| b.push(*row))
        .finish()
}

#[cfg(test)]
mod tests {
    use crate::ingest::record::{parse_size_rows, RawRowFormat};

    use super::*;

    fn rows(rs: &[(u64, f64)]) -> Vec<SizeRow> {
        rs.iter()
            .map(|(size, latency_us)| SizeRow {
                size: *size,
                latency_us: *latency_us,
            })
            .collect()
    }

    fn pairs(s: &SizeSeries) -> Vec<(u64, f64)> {
        s.buckets
            .iter()
            .map(|b| (b.size, b.mean_latency_us))
            .collect()
    }

    #[test]
    fn t_buckets() {
        let s = bucket_by_size(&rows(&[(100, 5.), (100, 7.), (200, 9.)]));
        assert_eq!(pairs(&s), [(100, 6.0), (200, 9.0)]);
        assert_eq!(s.buckets[0].num_rows, 2);
    }

    #[test]
    fn t_first_seen_order_not_numeric() {
        let s = bucket_by_size(&rows(&[(4096, 1.), (128, 2.), (128, 4.), (1024, 3.)]));
        assert_eq!(pairs(&s), [(4096, 1.0), (128, 3.0), (1024, 3.0)]);
    }

    #[test]
    fn t_interleaved_sizes_are_not_merged() {
        let s = bucket_by_size(&rows(&[(100, 1.), (200, 2.), (100, 3.)]));
        assert_eq!(pairs(&s), [(100, 1.0), (200, 2.0), (100, 3.0)]);
    }

    #[test]
    fn t_empty_and_zero_size() {
        assert!(bucket_by_size(&[]).is_empty());
        let s = bucket_by_size(&rows(&[(0, 2.), (0, 4.)]));
        assert_eq!(pairs(&s), [(0, 3.0)]);
    }

    #[test]
    fn t_non_finite_row_keeps_its_bucket() -> anyhow::Result<()> {
        let parsed = parse_size_rows("100,5\n100,NaN\n100,7\n200,9\n", RawRowFormat::Plain)?;
        assert_eq!(parsed.malformed_rows, 1);
        let s = bucket_by_size(&parsed.rows);
        assert_eq!(pairs(&s), [(100, 6.0), (200, 9.0)]);
        Ok(())
    }

    #[test]
    fn t_idempotent() {
        let input = rows(&[(100, 0.1), (100, 0.2), (100, 0.7), (300, 1.0 / 3.0)]);
        let a = bucket_by_size(&input);
        let b = bucket_by_size(&input);
        assert_eq!(a, b);
        for (x, y) in a.buckets.iter().zip(&b.buckets) {
            assert_eq!(x.mean_latency_us.to_bits(), y.mean_latency_us.to_bits());
        }
    }
}
