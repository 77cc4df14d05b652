//! Price series types.
//!
//! A [`PriceSeries`] is a bounded, strictly ascending sequence of
//! [`PricePoint`]s keyed by reference position (block height). The
//! synchronizer replaces the whole series atomically on each refresh,
//! so consumers never observe a partially assembled series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sampled price at a historical reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Monotonically increasing ledger marker (block height).
    pub position: u64,
    /// Wall-clock time the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Normalized decimal price.
    pub value: Decimal,
}

/// Bounded, time-ordered price series.
///
/// Invariants, held at every observable point:
/// - positions strictly ascending
/// - length never exceeds the configured window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Maximum number of retained points.
    window: usize,
    /// Points, ascending by position.
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create an empty series with the given window.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            points: Vec::with_capacity(window),
        }
    }

    /// Assemble a series from unordered points.
    ///
    /// Points are sorted ascending by position and de-duplicated (the
    /// sampler can collapse positions when stepping past genesis).
    /// When more than `window` points remain, the oldest are dropped.
    pub fn from_points(window: usize, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.position);
        points.dedup_by_key(|p| p.position);
        if points.len() > window {
            let excess = points.len() - window;
            points.drain(..excess);
        }
        Self { window, points }
    }

    /// Append a point, evicting the oldest when the window overflows.
    ///
    /// Returns `false` (and leaves the series untouched) when the point
    /// does not advance the position, preserving strict ordering.
    pub fn push(&mut self, point: PricePoint) -> bool {
        if self.window == 0 {
            return false;
        }
        if let Some(last) = self.points.last() {
            if point.position <= last.position {
                return false;
            }
        }
        self.points.push(point);
        if self.points.len() > self.window {
            self.points.remove(0);
        }
        true
    }

    /// All retained points, ascending by position.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Most recent point, if any.
    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Configured window length.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn point(position: u64, value: Decimal) -> PricePoint {
        PricePoint {
            position,
            timestamp: Utc::now(),
            value,
        }
    }

    #[test]
    fn test_from_points_sorts_ascending() {
        let series = PriceSeries::from_points(
            10,
            vec![
                point(300, dec!(1.02)),
                point(100, dec!(1.00)),
                point(200, dec!(1.01)),
            ],
        );
        let positions: Vec<u64> = series.points().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![100, 200, 300]);
    }

    #[test]
    fn test_from_points_drops_oldest_beyond_window() {
        let points = (0..30).map(|i| point(i * 100, dec!(1))).collect();
        let series = PriceSeries::from_points(24, points);
        assert_eq!(series.len(), 24);
        // The oldest six points were evicted, newest retained.
        assert_eq!(series.points()[0].position, 600);
        assert_eq!(series.latest().map(|p| p.position), Some(2900));
    }

    #[test]
    fn test_from_points_dedups_collapsed_positions() {
        // Saturating backward steps near genesis collapse to position 0.
        let series = PriceSeries::from_points(
            5,
            vec![point(0, dec!(1)), point(0, dec!(1)), point(100, dec!(1))],
        );
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_push_rejects_non_increasing_positions() {
        let mut series = PriceSeries::new(5);
        assert!(series.push(point(100, dec!(1.00))));
        assert!(!series.push(point(100, dec!(1.01))));
        assert!(!series.push(point(50, dec!(1.01))));
        assert!(series.push(point(101, dec!(1.01))));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_push_evicts_front_at_window() {
        let mut series = PriceSeries::new(3);
        for i in 1..=5u64 {
            assert!(series.push(point(i, dec!(1))));
            assert!(series.len() <= 3);
        }
        let positions: Vec<u64> = series.points().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![3, 4, 5]);
    }

    #[test]
    fn test_zero_window_accepts_nothing() {
        let mut series = PriceSeries::new(0);
        assert!(!series.push(point(1, dec!(1))));
        assert!(series.is_empty());
    }
}
