//! Match results.

/// A correspondence between feature `index_a` of frame A and feature
/// `index_b` of frame B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    pub index_a: usize,
    pub index_b: usize,
}

impl Match {
    pub fn new(index_a: usize, index_b: usize) -> Self {
        Self { index_a, index_b }
    }
}

impl From<(usize, usize)> for Match {
    fn from((index_a, index_b): (usize, usize)) -> Self {
        Self { index_a, index_b }
    }
}

/// Ordered matches produced by one matcher invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    matches: Vec<Match>,
}

impl MatchSet {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Number of matches.
    pub fn size(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }
}

impl FromIterator<Match> for MatchSet {
    fn from_iter<I: IntoIterator<Item = Match>>(iter: I) -> Self {
        Self {
            matches: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
