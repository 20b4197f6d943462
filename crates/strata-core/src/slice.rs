use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::InvariantError;

/// A `start:stop:step` request along one axis.
///
/// Absent bounds are derived from the sign of the step, negative bounds count
/// from the end of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

/// One axis-indexing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceDesc {
    /// Keep the axis as is.
    All,
    /// Fix the axis at one index, dropping it from the output.
    Value(isize),
    /// Insert an axis of extent 1 without consuming an input axis.
    NewAxis,
    Range(Slice),
}

/// A [Slice] resolved against a concrete extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: isize,
    pub stop: isize,
    pub step: isize,
    pub len: usize,
}

impl Slice {
    pub fn new(
        start: impl Into<Option<isize>>,
        stop: impl Into<Option<isize>>,
        step: impl Into<Option<isize>>,
    ) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
            step: step.into(),
        }
    }

    /// `start:stop` with unit step.
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(start, stop, None)
    }

    /// `::step`
    pub fn step(step: isize) -> Self {
        Self::new(None, None, step)
    }

    /// Resolves the slice against an axis of extent `extent`.
    ///
    /// Both resolved bounds must stay on the axis: a positive step needs
    /// `0 <= start < stop <= extent`, a negative step needs
    /// `-1 <= stop < start < extent`. The start of a reversed slice may not
    /// equal the extent, even though such a slice would only skip its first
    /// element.
    ///
    /// `axis` is only used to label errors.
    pub fn resolve(&self, axis: usize, extent: usize) -> Result<ResolvedSlice, InvariantError> {
        let e = extent as isize;
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(InvariantError::InvalidStep);
        }

        let start = match self.start {
            None if step > 0 => 0,
            None => e - 1,
            Some(s) if s < 0 => s + e,
            Some(s) => s,
        };

        // stop == 0 with a unit step wraps to the end of the axis rather than
        // producing an empty range.
        let stop = match self.stop {
            None if step > 0 => e,
            None => -1,
            Some(0) if step == 1 => e,
            Some(s) if s < 0 => s + e,
            Some(s) => s,
        };

        let out_of_bounds = InvariantError::OutOfBounds {
            axis,
            start,
            stop,
            extent,
        };
        if start < 0 || (step < 0 && stop < -1) {
            return Err(out_of_bounds);
        }

        if (step > 0 && start >= stop) || (step < 0 && start <= stop) {
            return Err(InvariantError::InvalidRange { start, stop, step });
        }

        if (step > 0 && stop > e) || (step < 0 && start >= e) {
            return Err(out_of_bounds);
        }

        let len = if step > 0 {
            (stop - start - 1) as usize / step.unsigned_abs() + 1
        } else {
            (start - stop - 1) as usize / step.unsigned_abs() + 1
        };
        Ok(ResolvedSlice {
            start,
            stop,
            step,
            len,
        })
    }
}

impl SliceDesc {
    pub fn all() -> Self {
        SliceDesc::All
    }

    pub fn value(index: isize) -> Self {
        SliceDesc::Value(index)
    }

    pub fn newaxis() -> Self {
        SliceDesc::NewAxis
    }

    pub fn range(
        start: impl Into<Option<isize>>,
        stop: impl Into<Option<isize>>,
        step: impl Into<Option<isize>>,
    ) -> Self {
        SliceDesc::Range(Slice::new(start, stop, step))
    }

    /// Whether this descriptor consumes an axis of the input.
    pub fn consumes_axis(&self) -> bool {
        !matches!(self, SliceDesc::NewAxis)
    }

    /// Whether this descriptor produces an axis in the output.
    pub fn produces_axis(&self) -> bool {
        !matches!(self, SliceDesc::Value(_))
    }
}

impl std::fmt::Display for SliceDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn bound(b: Option<isize>) -> String {
            b.map(|v| v.to_string()).unwrap_or_default()
        }
        match self {
            SliceDesc::All => write!(f, ":"),
            SliceDesc::Value(v) => write!(f, "{}", v),
            SliceDesc::NewAxis => write!(f, "newaxis"),
            SliceDesc::Range(s) => write!(
                f,
                "{}:{}:{}",
                bound(s.start),
                bound(s.stop),
                bound(s.step)
            ),
        }
    }
}

impl From<Slice> for SliceDesc {
    fn from(slice: Slice) -> Self {
        SliceDesc::Range(slice)
    }
}

impl From<isize> for SliceDesc {
    fn from(index: isize) -> Self {
        SliceDesc::Value(index)
    }
}

impl From<RangeFull> for SliceDesc {
    fn from(_: RangeFull) -> Self {
        SliceDesc::All
    }
}

impl From<Range<isize>> for SliceDesc {
    fn from(range: Range<isize>) -> Self {
        SliceDesc::Range(Slice::range(range.start, range.end))
    }
}

impl From<RangeFrom<isize>> for SliceDesc {
    fn from(range: RangeFrom<isize>) -> Self {
        SliceDesc::Range(Slice::new(range.start, None, None))
    }
}

impl From<RangeTo<isize>> for SliceDesc {
    fn from(range: RangeTo<isize>) -> Self {
        SliceDesc::Range(Slice::new(None, range.end, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_step_sign() {
        let fwd = Slice::default().resolve(0, 5).unwrap();
        assert_eq!((fwd.start, fwd.stop, fwd.step, fwd.len), (0, 5, 1, 5));

        let rev = Slice::step(-1).resolve(0, 5).unwrap();
        assert_eq!((rev.start, rev.stop, rev.step, rev.len), (4, -1, -1, 5));
    }

    #[test]
    fn negative_start_wraps_once() {
        let r = Slice::new(-1, None, -1).resolve(0, 5).unwrap();
        assert_eq!(r.start, 4);
        assert_eq!(r.len, 5);

        let r = Slice::new(-2, None, None).resolve(0, 5).unwrap();
        assert_eq!((r.start, r.len), (3, 2));
    }

    #[test]
    fn reverse_over_empty_axis_is_out_of_bounds() {
        let err = Slice::new(-1, None, -1).resolve(0, 0).unwrap_err();
        assert!(matches!(err, InvariantError::OutOfBounds { extent: 0, .. }));
    }

    #[test]
    fn zero_step_is_rejected_regardless_of_bounds() {
        for (start, stop) in [(None, None), (Some(1), Some(3)), (Some(-1), Some(0))] {
            let err = Slice::new(start, stop, 0).resolve(0, 4).unwrap_err();
            assert_eq!(err, InvariantError::InvalidStep);
        }
    }

    #[test]
    fn stop_zero_with_unit_step_wraps_to_end() {
        let r = Slice::new(1, 0, 1).resolve(0, 5).unwrap();
        assert_eq!((r.start, r.stop, r.len), (1, 5, 4));

        // only the unit step is special
        let err = Slice::new(1, 0, 2).resolve(0, 5).unwrap_err();
        assert!(matches!(err, InvariantError::InvalidRange { .. }));
    }

    #[test]
    fn ordering_and_bounds() {
        assert!(matches!(
            Slice::range(3, 1).resolve(0, 5),
            Err(InvariantError::InvalidRange { .. })
        ));
        assert!(matches!(
            Slice::new(1, 3, -1).resolve(0, 5),
            Err(InvariantError::InvalidRange { .. })
        ));
        assert!(matches!(
            Slice::range(0, 6).resolve(2, 5),
            Err(InvariantError::OutOfBounds { axis: 2, .. })
        ));
        assert!(matches!(
            Slice::new(5, None, -1).resolve(0, 5),
            Err(InvariantError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn reversed_stop_stays_on_the_axis() {
        let err = Slice::new(4, -10, -1).resolve(1, 5).unwrap_err();
        assert_eq!(
            err,
            InvariantError::OutOfBounds {
                axis: 1,
                start: 4,
                stop: -5,
                extent: 5
            }
        );
        // -6 wraps to -1, one past the front
        let r = Slice::new(4, -6, -1).resolve(1, 5).unwrap();
        assert_eq!((r.stop, r.len), (-1, 5));
    }

    #[test]
    fn extreme_steps_take_one_element() {
        let r = Slice::step(isize::MIN).resolve(0, 5).unwrap();
        assert_eq!((r.start, r.stop, r.len), (4, -1, 1));
        let r = Slice::step(isize::MAX).resolve(0, 5).unwrap();
        assert_eq!((r.start, r.stop, r.len), (0, 5, 1));
    }

    #[test]
    fn stepped_lengths_truncate() {
        let r = Slice::new(0, 5, 2).resolve(0, 5).unwrap();
        assert_eq!(r.len, 3);
        let r = Slice::new(4, 0, -3).resolve(0, 5).unwrap();
        assert_eq!(r.len, 2);
        let r = Slice::new(1, 4, 5).resolve(0, 5).unwrap();
        assert_eq!(r.len, 1);
    }

    #[test]
    fn conversions() {
        assert_eq!(SliceDesc::from(..), SliceDesc::All);
        assert_eq!(SliceDesc::from(2isize), SliceDesc::Value(2));
        assert_eq!(
            SliceDesc::from(1isize..3),
            SliceDesc::Range(Slice::range(1, 3))
        );
        assert_eq!(
            SliceDesc::from(..-1isize),
            SliceDesc::Range(Slice::new(None, -1, None))
        );
        assert_eq!(SliceDesc::range(None, None, -1).to_string(), "::-1");
    }
}
