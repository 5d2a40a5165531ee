//! Range-scan operators and scan-state types.

use super::key::IndexKey;
use std::cmp::Ordering;
use vesper_common::{Result, VesperError};

/// Comparison operator bounding one side of a range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOp {
    /// Strictly less than (upper bound).
    Lt,
    /// Less than or equal (upper bound).
    Lte,
    /// Strictly greater than (lower bound).
    Gt,
    /// Greater than or equal (lower bound).
    Gte,
}

impl ScanOp {
    /// True for operators legal on the low endpoint.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, ScanOp::Gt | ScanOp::Gte)
    }

    /// True for operators legal on the high endpoint.
    pub fn is_upper_bound(&self) -> bool {
        matches!(self, ScanOp::Lt | ScanOp::Lte)
    }
}

/// Validates a scan range before positioning.
///
/// The low endpoint must use `>` or `>=` and the high endpoint `<` or
/// `<=` (`BadOpcode` otherwise). When both endpoints are present the
/// range must be non-empty: low above high, or low equal to high with
/// either side exclusive, is `BadScanRange`.
pub fn validate_range<K: IndexKey>(
    low: &Option<(K, ScanOp)>,
    high: &Option<(K, ScanOp)>,
) -> Result<()> {
    if let Some((_, op)) = low {
        if !op.is_lower_bound() {
            return Err(VesperError::BadOpcode);
        }
    }
    if let Some((_, op)) = high {
        if !op.is_upper_bound() {
            return Err(VesperError::BadOpcode);
        }
    }

    if let (Some((low_key, low_op)), Some((high_key, high_op))) = (low, high) {
        match low_key.compare(high_key) {
            Ordering::Greater => return Err(VesperError::BadScanRange),
            Ordering::Equal => {
                if *low_op == ScanOp::Gt || *high_op == ScanOp::Lt {
                    return Err(VesperError::BadScanRange);
                }
            }
            Ordering::Less => {}
        }
    }
    Ok(())
}

/// Position of an active scan within the leaf chain.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ScanPos {
    /// Holding a pin on `leaf`, about to emit the entry at `slot`.
    At { leaf: u32, slot: usize },
    /// The high endpoint was crossed or the leaf chain ended.
    Exhausted,
}

/// State carried by an index between start_scan and end_scan.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanCursor<K: IndexKey> {
    /// High endpoint, if bounded.
    pub high: Option<(K, ScanOp)>,
    /// Current position.
    pub pos: ScanPos,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_sides() {
        assert!(ScanOp::Gt.is_lower_bound());
        assert!(ScanOp::Gte.is_lower_bound());
        assert!(!ScanOp::Lt.is_lower_bound());
        assert!(ScanOp::Lt.is_upper_bound());
        assert!(ScanOp::Lte.is_upper_bound());
        assert!(!ScanOp::Gte.is_upper_bound());
    }

    #[test]
    fn test_validate_accepts_normal_ranges() {
        assert!(validate_range(&Some((1, ScanOp::Gte)), &Some((10, ScanOp::Lte))).is_ok());
        assert!(validate_range(&Some((1, ScanOp::Gt)), &Some((10, ScanOp::Lt))).is_ok());
        assert!(validate_range::<i32>(&None, &None).is_ok());
        assert!(validate_range(&None, &Some((10, ScanOp::Lt))).is_ok());
        assert!(validate_range(&Some((1, ScanOp::Gt)), &None).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_side_ops() {
        let err = validate_range(&Some((1, ScanOp::Lt)), &Some((10, ScanOp::Lte))).unwrap_err();
        assert!(matches!(err, VesperError::BadOpcode));

        let err = validate_range(&Some((1, ScanOp::Gte)), &Some((10, ScanOp::Gt))).unwrap_err();
        assert!(matches!(err, VesperError::BadOpcode));
    }

    #[test]
    fn test_validate_rejects_empty_ranges() {
        let err = validate_range(&Some((5, ScanOp::Gte)), &Some((4, ScanOp::Lte))).unwrap_err();
        assert!(matches!(err, VesperError::BadScanRange));

        // Equal endpoints with an exclusive side
        let err = validate_range(&Some((5, ScanOp::Gt)), &Some((5, ScanOp::Lte))).unwrap_err();
        assert!(matches!(err, VesperError::BadScanRange));
        let err = validate_range(&Some((5, ScanOp::Gte)), &Some((5, ScanOp::Lt))).unwrap_err();
        assert!(matches!(err, VesperError::BadScanRange));

        // Equal inclusive endpoints are a point lookup, allowed
        assert!(validate_range(&Some((5, ScanOp::Gte)), &Some((5, ScanOp::Lte))).is_ok());
    }
}
