/// Ticks per second in the lab format: 1 tick = 100 ns.
pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Half-open interval `[start, end)`. The unit is up to the caller:
/// seconds for alignments, ticks for lab files, character offsets for text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<T> {
    pub start: T,
    pub end: T,
}

impl<T> Span<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }
}

impl Span<f64> {
    pub fn to_ticks(self) -> Span<i64> {
        Span::new(seconds_to_ticks(self.start), seconds_to_ticks(self.end))
    }
}

impl Span<i64> {
    pub fn to_seconds(self) -> Span<f64> {
        Span::new(ticks_to_seconds(self.start), ticks_to_seconds(self.end))
    }
}

/// Span covered by a contiguous run of symbols: first start to last end.
///
/// Intermediate spans are not inspected, so a gap between merged symbols
/// ends up inside the result.
pub fn merge<T: Copy>(spans: &[Span<T>]) -> Option<Span<T>> {
    let first = spans.first()?;
    let last = spans.last()?;
    Some(Span::new(first.start, last.end))
}

pub fn seconds_to_ticks(seconds: f64) -> i64 {
    (seconds * TICKS_PER_SECOND).round() as i64
}

pub fn ticks_to_seconds(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND
}
