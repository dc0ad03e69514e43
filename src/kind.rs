//! Runtime choice between the search strategies.

use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;
use crate::store::{Entry, Key, QueryResult};
use crate::{exact, exponential, linear};

/// Runtime choice of search strategy.
///
/// All strategies return the same result for the same store and key; they
/// differ only in how many entries they touch for a given estimate error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum SearchKind {
    /// Binary search; ignores the estimate.
    Binary,
    /// Step-by-step correction from the estimate.
    Linear,
    /// Doubling-step correction from the estimate.
    Exponential,
}

impl SearchKind {
    pub const ALL: [SearchKind; 3] = [
        SearchKind::Binary,
        SearchKind::Linear,
        SearchKind::Exponential,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SearchKind::Binary => "binary",
            SearchKind::Linear => "linear",
            SearchKind::Exponential => "exponential",
        }
    }

    /// True if the strategy reads the estimate.
    pub fn uses_estimate(self) -> bool {
        !matches!(self, SearchKind::Binary)
    }

    /// Dispatches to the matching kernel.
    ///
    /// Panics if the kind uses the estimate and `estimate >= data.len()`.
    #[inline]
    pub fn run<K: Key>(self, data: &[Entry<K>], key: K, estimate: usize) -> QueryResult {
        match self {
            SearchKind::Binary => exact::search(data, key, None),
            SearchKind::Linear => linear::search(data, key, estimate),
            SearchKind::Exponential => exponential::search(data, key, estimate),
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bs" => Ok(SearchKind::Binary),
            "linear" | "ls" => Ok(SearchKind::Linear),
            "exponential" | "exp" => Ok(SearchKind::Exponential),
            _ => Err(SearchError::UnknownKind { name: s.to_owned() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trips() {
        for kind in SearchKind::ALL {
            assert_eq!(kind.name().parse::<SearchKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!("EXP".parse::<SearchKind>(), Ok(SearchKind::Exponential));
        assert_eq!(
            "interpolation".parse::<SearchKind>(),
            Err(SearchError::UnknownKind {
                name: "interpolation".into()
            })
        );
    }

    #[test]
    fn test_binary_ignores_estimate() {
        let d = vec![Entry::new(1u64, 5), Entry::new(2, 6)];
        assert_eq!(SearchKind::Binary.run(&d, 2, 0), QueryResult::new(6, 1));
        assert!(!SearchKind::Binary.uses_estimate());
        assert!(SearchKind::Linear.uses_estimate());
    }
}
