use std::borrow::Cow;

use crate::{Downsampler, Point, Sample};

/// Largest Triangle Three Buckets (LTTB) downsampling algorithm.
///
/// Reduces a slice of points sorted by x to exactly `threshold` points while
/// preserving the visual shape of the data. The first and last points are
/// always kept; every interior bucket contributes the point forming the
/// largest triangle with the previously selected point and the average of
/// the following bucket.
///
/// Returns the original data unchanged if `threshold == 0` or
/// `threshold >= data.len()`. A threshold of 1 keeps only the first point;
/// this deliberately differs from the Prometheus implementation, which
/// divides by `threshold - 2` and ends up emitting both endpoints.
pub fn downsample<P: Point + Clone>(data: &[P], threshold: usize) -> Cow<'_, [P]> {
    let n = data.len();
    if threshold == 0 || threshold >= n {
        return Cow::Borrowed(data);
    }

    // From here on n >= 2.
    match threshold {
        1 => return Cow::Owned(vec![data[0].clone()]),
        2 => return Cow::Owned(vec![data[0].clone(), data[n - 1].clone()]),
        _ => {}
    }

    let mut sampled = Vec::with_capacity(threshold);
    sampled.push(data[0].clone());

    // Bucket size. Leave room for start and end data points.
    let bucket_size = (n - 2) as f64 / (threshold - 2) as f64;
    let edge = |k: usize| (k as f64 * bucket_size).floor() as usize + 1;

    let mut a_idx = 0usize;

    for i in 0..(threshold - 2) {
        let (avg_x, avg_y) = bucket_average(data, edge(i + 1), edge(i + 2).min(n))
            .unwrap_or_else(|| (data[n - 1].x(), data[n - 1].y()));

        let range_start = edge(i);
        let range_end = edge(i + 1).min(n - 1);

        let (ax, ay) = (data[a_idx].x(), data[a_idx].y());
        let mut max_area = -1.0f64;
        let mut max_idx = range_start;

        for (j, p) in data.iter().enumerate().take(range_end).skip(range_start) {
            let area = ((ax - avg_x) * (p.y() - ay) - (ax - p.x()) * (avg_y - ay)).abs() * 0.5;
            if area > max_area {
                max_area = area;
                max_idx = j;
            }
        }

        sampled.push(data[max_idx].clone());
        a_idx = max_idx;
    }

    sampled.push(data[n - 1].clone());
    Cow::Owned(sampled)
}

// Mean of the points in [start, end), or None when the range is empty.
fn bucket_average<P: Point>(data: &[P], start: usize, end: usize) -> Option<(f64, f64)> {
    if start >= end {
        return None;
    }
    let (sum_x, sum_y) = data[start..end]
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x(), sy + p.y()));
    let len = (end - start) as f64;
    Some((sum_x / len, sum_y / len))
}

/// Lttb is the [`Downsampler`] backed by [`downsample`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Lttb;

impl Downsampler for Lttb {
    fn downsample<'a>(&self, series: &'a [Sample], threshold: usize) -> Cow<'a, [Sample]> {
        let sampled = downsample(series, threshold);
        tracing::trace!(input = series.len(), output = sampled.len(), "lttb downsample");
        sampled
    }
}
