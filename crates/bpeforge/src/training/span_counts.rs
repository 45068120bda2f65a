//! # Pre-Token Frequency Tables

use crate::{
    training::{CountType, StringChunkType},
    types::CommonHashMap,
};

/// A pre-token frequency table: ``{ pre-token text -> count }``.
///
/// Every stored count is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanCountTable<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    counts: CommonHashMap<K, C>,
}

impl<K, C> Default for SpanCountTable<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> FromIterator<(K, C)> for SpanCountTable<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, count) in iter {
            table.add(key, count);
        }
        table
    }
}

impl<K, C> SpanCountTable<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            counts: CommonHashMap::new(),
        }
    }

    /// Create an empty table with room for `capacity` distinct pre-tokens.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: CommonHashMap::with_capacity(capacity),
        }
    }

    /// The number of distinct pre-tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Add `count` occurrences of `key`; zero counts are ignored.
    pub fn add(
        &mut self,
        key: K,
        count: C,
    ) {
        if count != C::zero() {
            *self.counts.entry(key).or_default() += count;
        }
    }

    /// Count one occurrence of `text`.
    pub fn increment(
        &mut self,
        text: &str,
    ) {
        self.add(K::from(text), C::one());
    }

    /// Look up the count of `text`; zero when absent.
    pub fn get(
        &self,
        text: &str,
    ) -> C {
        self.counts
            .get(&K::from(text))
            .copied()
            .unwrap_or_else(C::zero)
    }

    /// The total number of pre-token occurrences.
    pub fn total_count(&self) -> C {
        self.counts
            .values()
            .fold(C::zero(), |acc, &count| acc + count)
    }

    /// Iterate over ``(pre-token, count)`` entries, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, C)> + '_ {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    /// Sum another table into this one.
    pub fn merge(
        &mut self,
        other: Self,
    ) {
        for (key, count) in other.counts {
            self.add(key, count);
        }
    }

    /// Sum two tables; the smaller one is folded into the larger.
    pub fn merged(
        self,
        other: Self,
    ) -> Self {
        let (mut big, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        big.merge(small);
        big
    }
}

/// Sum per-chunk frequency tables into one global table.
///
/// ``F[T] = sum(F_i[T])``; the result does not depend on the input order.
pub fn merge_span_counts<K, C, I>(tables: I) -> SpanCountTable<K, C>
where
    K: StringChunkType,
    C: CountType,
    I: IntoIterator<Item = SpanCountTable<K, C>>,
{
    tables
        .into_iter()
        .fold(SpanCountTable::new(), SpanCountTable::merged)
}

#[cfg(test)]
mod tests {
    use compact_str::CompactString;

    use super::*;

    type Table = SpanCountTable<CompactString, u64>;

    fn table(entries: &[(&str, u64)]) -> Table {
        entries.iter().map(|&(k, c)| (k.into(), c)).collect()
    }

    #[test]
    fn test_add_and_get() {
        let mut t = Table::new();
        assert!(t.is_empty());

        t.increment("low");
        t.increment("low");
        t.add(" low".into(), 3);
        t.add("never".into(), 0);

        assert_eq!(t.len(), 2);
        assert_eq!(t.get("low"), 2);
        assert_eq!(t.get(" low"), 3);
        assert_eq!(t.get("never"), 0);
        assert_eq!(t.total_count(), 5);
    }

    #[test]
    fn test_merge_span_counts() {
        let a = table(&[("a", 1), ("b", 2)]);
        let b = table(&[("b", 3), ("c", 4)]);
        let c = table(&[("a", 5)]);

        let expected = table(&[("a", 6), ("b", 5), ("c", 4)]);

        assert_eq!(
            merge_span_counts(vec![a.clone(), b.clone(), c.clone()]),
            expected
        );
        assert_eq!(merge_span_counts(vec![c.clone(), b.clone(), a.clone()]), expected);
        assert_eq!(
            merge_span_counts(vec![a.clone().merged(c.clone()), b.clone()]),
            expected
        );
    }

    #[test]
    fn test_merge_empty() {
        let empty: Vec<Table> = vec![];
        assert!(merge_span_counts(empty).is_empty());

        assert!(merge_span_counts(vec![Table::new(), Table::new()]).is_empty());

        let a = table(&[("x", 7)]);
        assert_eq!(merge_span_counts(vec![Table::new(), a.clone(), Table::new()]), a);
    }
}
