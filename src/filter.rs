//! Record filters and the filter chain.
//!
//! A [`FilterChain`] is built once from command line flags, one filter per
//! flag, and accepts a record only if every filter accepts it. An empty chain
//! accepts everything.
//!
//! How a filter treats a record that lacks the field it inspects is decided
//! per filter through [`MissingField`]; each format documents its choices.

use crate::error::Result;
use crate::expr::{Expression, Fields};
use crate::region::Interval;

/// Predicate over records of type `T`.
pub trait Filter<T: ?Sized> {
    /// Short description used in log messages.
    fn name(&self) -> &str;

    /// Return true to keep the record.
    fn accept(&self, record: &T) -> Result<bool>;
}

/// What a filter does with a record that lacks the inspected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Accept,
    Reject,
}

impl MissingField {
    #[inline]
    fn accepts(self) -> bool {
        self == MissingField::Accept
    }
}

/// Keeps records whose numeric field is at least `min`.
pub struct ThresholdFilter<T: ?Sized> {
    name: String,
    min: f64,
    extract: fn(&T) -> Option<f64>,
    missing: MissingField,
}

impl<T: ?Sized> ThresholdFilter<T> {
    pub fn new(
        name: impl Into<String>,
        min: f64,
        extract: fn(&T) -> Option<f64>,
        missing: MissingField,
    ) -> Self {
        Self {
            name: name.into(),
            min,
            extract,
            missing,
        }
    }

    /// Threshold value.
    pub fn min(&self) -> f64 {
        self.min
    }
}

impl<T: ?Sized> Filter<T> for ThresholdFilter<T> {
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn accept(&self, record: &T) -> Result<bool> {
        Ok(match (self.extract)(record) {
            Some(value) => value >= self.min,
            None => self.missing.accepts(),
        })
    }
}

/// Span of a record on a reference: name plus 0-based half-open coordinates.
pub type Span<'a> = (&'a str, u64, u64);

/// Keeps records overlapping any of a set of regions.
pub struct RangeFilter<T: ?Sized> {
    regions: Vec<Interval>,
    locate: for<'a> fn(&'a T) -> Option<Span<'a>>,
    missing: MissingField,
}

impl<T: ?Sized> RangeFilter<T> {
    pub fn new(
        regions: Vec<Interval>,
        locate: for<'a> fn(&'a T) -> Option<Span<'a>>,
        missing: MissingField,
    ) -> Self {
        Self {
            regions,
            locate,
            missing,
        }
    }
}

impl<T: ?Sized> Filter<T> for RangeFilter<T> {
    fn name(&self) -> &str {
        "range"
    }

    fn accept(&self, record: &T) -> Result<bool> {
        Ok(match (self.locate)(record) {
            Some((chrom, start, end)) => self
                .regions
                .iter()
                .any(|region| region.overlaps(chrom, start, end)),
            None => self.missing.accepts(),
        })
    }
}

/// Keeps records for which an expression evaluates to true.
///
/// Evaluation errors propagate and abort the run.
pub struct ExpressionFilter {
    expression: Expression,
}

impl ExpressionFilter {
    pub fn new(expression: Expression) -> Self {
        Self { expression }
    }

    /// Parse `source` into a filter.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self::new(Expression::parse(source)?))
    }
}

impl<T: Fields + ?Sized> Filter<T> for ExpressionFilter {
    fn name(&self) -> &str {
        self.expression.source()
    }

    fn accept(&self, record: &T) -> Result<bool> {
        self.expression.evaluate(record)
    }
}

/// Wraps an arbitrary typed predicate.
pub struct PredicateFilter<T: ?Sized> {
    name: String,
    predicate: Box<dyn Fn(&T) -> bool>,
}

impl<T: ?Sized> PredicateFilter<T> {
    pub fn new(name: impl Into<String>, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl<T: ?Sized> Filter<T> for PredicateFilter<T> {
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn accept(&self, record: &T) -> Result<bool> {
        Ok((self.predicate)(record))
    }
}

/// Applies a filter to the part of a record selected by `project`.
/// Records without that part (comments, non-segment lines) pass through.
pub struct ProjectedFilter<T: ?Sized, U: ?Sized> {
    inner: Box<dyn Filter<U>>,
    project: for<'a> fn(&'a T) -> Option<&'a U>,
}

impl<T: ?Sized, U: ?Sized> ProjectedFilter<T, U> {
    pub fn new(
        inner: impl Filter<U> + 'static,
        project: for<'a> fn(&'a T) -> Option<&'a U>,
    ) -> Self {
        Self {
            inner: Box::new(inner),
            project,
        }
    }
}

impl<T: ?Sized, U: ?Sized> Filter<T> for ProjectedFilter<T, U> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[inline]
    fn accept(&self, record: &T) -> Result<bool> {
        match (self.project)(record) {
            Some(part) => self.inner.accept(part),
            None => Ok(true),
        }
    }
}

/// Ordered conjunction of filters.
pub struct FilterChain<T: ?Sized> {
    filters: Vec<Box<dyn Filter<T>>>,
}

impl<T: ?Sized> Default for FilterChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> FilterChain<T> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Append a filter; filters run in the order they were added.
    pub fn push(&mut self, filter: impl Filter<T> + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Builder-style [`FilterChain::push`].
    pub fn with(mut self, filter: impl Filter<T> + 'static) -> Self {
        self.push(filter);
        self
    }

    /// Append a filter only when `filter` is `Some`.
    pub fn push_opt<F: Filter<T> + 'static>(&mut self, filter: Option<F>) {
        if let Some(filter) = filter {
            self.push(filter);
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of the configured filters, in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// True iff every filter accepts `record`.
    #[inline]
    pub fn accept(&self, record: &T) -> Result<bool> {
        for filter in &self.filters {
            if !filter.accept(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Value;

    struct Feature {
        chrom: &'static str,
        start: u64,
        end: u64,
        score: Option<f64>,
    }

    impl Fields for Feature {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "chrom" => Some(Value::text(self.chrom)),
                "length" => Some(Value::Number((self.end - self.start) as f64)),
                _ => None,
            }
        }
    }

    fn feature(chrom: &'static str, start: u64, end: u64, score: Option<f64>) -> Feature {
        Feature {
            chrom,
            start,
            end,
            score,
        }
    }

    fn locate(f: &Feature) -> Option<Span<'_>> {
        Some((f.chrom, f.start, f.end))
    }

    fn score(f: &Feature) -> Option<f64> {
        f.score
    }

    #[test]
    fn test_empty_chain_accepts_everything() {
        let chain: FilterChain<Feature> = FilterChain::new();
        assert!(chain.is_empty());
        assert!(chain.accept(&feature("chr1", 0, 10, None)).unwrap());
    }

    #[test]
    fn test_threshold_missing_policy() {
        let reject = ThresholdFilter::new("score", 5.0, score, MissingField::Reject);
        let accept = ThresholdFilter::new("score", 5.0, score, MissingField::Accept);

        assert!(reject.accept(&feature("chr1", 0, 1, Some(5.0))).unwrap());
        assert!(!reject.accept(&feature("chr1", 0, 1, Some(4.9))).unwrap());
        assert!(!reject.accept(&feature("chr1", 0, 1, None)).unwrap());
        assert!(accept.accept(&feature("chr1", 0, 1, None)).unwrap());
        assert_eq!(reject.min(), 5.0);
    }

    #[test]
    fn test_range_filter() {
        let filter = RangeFilter::new(
            vec!["chr1:101-200".parse().unwrap(), "chr2".parse().unwrap()],
            locate,
            MissingField::Reject,
        );
        assert!(filter.accept(&feature("chr1", 150, 160, None)).unwrap());
        assert!(!filter.accept(&feature("chr1", 0, 100, None)).unwrap());
        assert!(filter.accept(&feature("chr2", 5_000_000, 5_000_010, None)).unwrap());
        assert!(!filter.accept(&feature("chr3", 150, 160, None)).unwrap());
    }

    #[test]
    fn test_chain_is_conjunction_in_order() {
        let chain = FilterChain::new()
            .with(ThresholdFilter::new("score", 1.0, score, MissingField::Reject))
            .with(ExpressionFilter::parse("length >= 10").unwrap())
            .with(PredicateFilter::new("autosome", |f: &Feature| f.chrom != "chrX"));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.names(), vec!["score", "length >= 10", "autosome"]);
        assert!(chain.accept(&feature("chr1", 0, 10, Some(2.0))).unwrap());
        assert!(!chain.accept(&feature("chr1", 0, 9, Some(2.0))).unwrap());
        assert!(!chain.accept(&feature("chr1", 0, 10, None)).unwrap());
        assert!(!chain.accept(&feature("chrX", 0, 10, Some(2.0))).unwrap());
    }

    #[test]
    fn test_expression_errors_propagate() {
        let chain: FilterChain<Feature> =
            FilterChain::new().with(ExpressionFilter::parse("depth > 1").unwrap());
        assert!(chain.accept(&feature("chr1", 0, 10, None)).is_err());
    }

    #[test]
    fn test_projected_filter_passes_other_records() {
        enum Line {
            Feature(Feature),
            Comment,
        }

        fn feature_of(line: &Line) -> Option<&Feature> {
            match line {
                Line::Feature(f) => Some(f),
                Line::Comment => None,
            }
        }

        let filter = ProjectedFilter::new(
            ThresholdFilter::new("score", 1.0, score, MissingField::Reject),
            feature_of,
        );
        assert_eq!(Filter::<Line>::name(&filter), "score");
        assert!(filter.accept(&Line::Comment).unwrap());
        assert!(filter
            .accept(&Line::Feature(feature("chr1", 0, 1, Some(2.0))))
            .unwrap());
        assert!(!filter
            .accept(&Line::Feature(feature("chr1", 0, 1, None)))
            .unwrap());
    }

    #[test]
    fn test_push_opt() {
        let mut chain: FilterChain<Feature> = FilterChain::new();
        chain.push_opt(None::<ExpressionFilter>);
        assert!(chain.is_empty());
        chain.push_opt(Some(ExpressionFilter::parse("length > 0").unwrap()));
        assert_eq!(chain.len(), 1);
    }
}
