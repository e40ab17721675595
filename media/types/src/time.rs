/*!
    Timestamp and time-base types.
*/

/**
    A rational number, used as a time base (seconds per tick).
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational.
    */
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Time base for whole seconds.
    */
    pub const SECONDS: Self = Self::new(1, 1);

    /**
        Returns the rational as a float.
    */
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/**
    A presentation or decoding timestamp, in some stream's time base.

    Timestamps that the container left undefined are represented as
    `Option<Pts>::None`; arithmetic is never performed on an undefined value.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pts(pub i64);

/**
    A duration in some stream's time base.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediaDuration(pub i64);

/**
    Rescale a timestamp from one time base to another.

    Uses exact rational arithmetic with rounding to the nearest tick, ties
    away from zero, so repeated conversions do not drift over long runs.
    Both time bases must be positive.
*/
pub fn rescale(ts: i64, from: Rational, to: Rational) -> i64 {
    if from == to {
        return ts;
    }

    // ts * (from.num / from.den) / (to.num / to.den)
    let num = from.num as i128 * to.den as i128;
    let den = from.den as i128 * to.num as i128;
    debug_assert!(den > 0, "time bases must be positive");

    let scaled = ts as i128 * num;
    let half = den / 2;
    let rounded = if scaled >= 0 {
        (scaled + half) / den
    } else {
        (scaled - half) / den
    };
    rounded as i64
}

/**
    Per-stream timestamp origin tracking.

    Records the first defined presentation timestamp seen on a stream and
    reduces every later timestamp on that stream by it, so the output
    timeline starts at zero. Streams are rebased independently; undefined
    timestamps pass through untouched.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamRebase {
    start: Option<i64>,
}

impl StreamRebase {
    /**
        Create a rebase state with no origin recorded yet.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Rebase a PTS/DTS pair.

        The first defined PTS becomes the stream origin; it is immutable
        afterwards. Until an origin is known, timestamps pass through
        unchanged.
    */
    pub fn rebase(&mut self, pts: Option<Pts>, dts: Option<Pts>) -> (Option<Pts>, Option<Pts>) {
        if self.start.is_none() {
            if let Some(Pts(p)) = pts {
                self.start = Some(p);
            }
        }

        match self.start {
            Some(origin) => (
                pts.map(|Pts(p)| Pts(p - origin)),
                dts.map(|Pts(d)| Pts(d - origin)),
            ),
            None => (pts, dts),
        }
    }

    /**
        The recorded origin, if one has been observed.
    */
    pub fn origin(&self) -> Option<Pts> {
        self.start.map(Pts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_identity() {
        let tb = Rational::new(1, 90000);
        assert_eq!(rescale(12345, tb, tb), 12345);
    }

    #[test]
    fn rescale_exact() {
        // 90000 ticks at 1/90000 is exactly one second.
        assert_eq!(rescale(90000, Rational::new(1, 90000), Rational::SECONDS), 1);
        assert_eq!(rescale(3, Rational::SECONDS, Rational::new(1, 1000)), 3000);
    }

    #[test]
    fn rescale_rounds_to_nearest() {
        // 1 tick at 1/3 s = 0.333 s -> 0.667 ticks at 1/2 s, rounds to 1.
        assert_eq!(rescale(1, Rational::new(1, 3), Rational::new(1, 2)), 1);
        // 1 tick at 1/5 s = 0.2 s -> 0.4 ticks at 1/2 s, rounds to 0.
        assert_eq!(rescale(1, Rational::new(1, 5), Rational::new(1, 2)), 0);
    }

    #[test]
    fn rescale_ties_away_from_zero() {
        // 0.5 rounds to 1, -0.5 rounds to -1.
        assert_eq!(rescale(1, Rational::new(1, 2), Rational::SECONDS), 1);
        assert_eq!(rescale(-1, Rational::new(1, 2), Rational::SECONDS), -1);
    }

    #[test]
    fn rescale_large_values_do_not_overflow() {
        // ts * 45000 overflows i64; the conversion must still be exact.
        let ts = 4_000_000_000_000_000_000i64;
        let out = rescale(ts, Rational::new(1, 90000), Rational::new(1, 45000));
        assert_eq!(out, ts / 2);
    }

    #[test]
    fn rebase_sets_origin_on_first_defined_pts() {
        let mut rb = StreamRebase::new();
        let (pts, dts) = rb.rebase(Some(Pts(1000)), Some(Pts(900)));
        assert_eq!(pts, Some(Pts(0)));
        assert_eq!(dts, Some(Pts(-100)));
        assert_eq!(rb.origin(), Some(Pts(1000)));
    }

    #[test]
    fn rebase_origin_is_immutable() {
        let mut rb = StreamRebase::new();
        rb.rebase(Some(Pts(500)), None);
        let (pts, _) = rb.rebase(Some(Pts(700)), None);
        assert_eq!(pts, Some(Pts(200)));
        assert_eq!(rb.origin(), Some(Pts(500)));
    }

    #[test]
    fn rebase_passes_undefined_through() {
        let mut rb = StreamRebase::new();
        // No origin yet: nothing to subtract.
        assert_eq!(rb.rebase(None, None), (None, None));
        assert_eq!(rb.origin(), None);

        rb.rebase(Some(Pts(100)), None);
        // Undefined stays undefined even once an origin exists.
        assert_eq!(rb.rebase(None, Some(Pts(150))), (None, Some(Pts(50))));
    }
}
