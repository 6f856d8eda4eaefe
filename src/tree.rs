//! Clause tree: the persisted result of an analysis.

use serde::{Deserialize, Serialize};

/// A tagged clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// Plain text of the clause
    pub text: String,
    /// Rendered descriptor, e.g. `"SD+;SG--"`
    pub tag: String,
}

/// A group of consecutive clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperClause {
    /// Member clauses in reading order
    pub clauses: Vec<Clause>,
    /// Most frequent tag among the clauses
    pub tag: String,
}

impl SuperClause {
    /// Groups `clauses` and derives the super tag from them.
    pub fn new(clauses: Vec<Clause>) -> Self {
        let tag = mode(clauses.iter().map(|c| c.tag.as_str())).unwrap_or_default();
        Self { clauses, tag }
    }
}

/// The whole analysis of a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseTree {
    /// Super-clauses in reading order
    pub super_clauses: Vec<SuperClause>,
}

impl ClauseTree {
    /// Iterates over every clause in reading order.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.super_clauses.iter().flat_map(|s| s.clauses.iter())
    }

    /// Total number of clauses.
    pub fn clause_count(&self) -> usize {
        self.super_clauses.iter().map(|s| s.clauses.len()).sum()
    }

    /// Whether the tree contains no clause.
    pub fn is_empty(&self) -> bool {
        self.clause_count() == 0
    }
}

/// Most frequent tag; ties go to the tag seen first.
pub fn mode<'a>(tags: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tag in tags {
        match counts.iter_mut().find(|(seen, _)| *seen == tag) {
            Some((_, count)) => *count += 1,
            None => counts.push((tag, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (tag, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((tag, count));
        }
    }
    best.map(|(tag, _)| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_picks_most_frequent() {
        assert_eq!(mode(["+", "-", "+"]), Some("+".to_string()));
    }

    #[test]
    fn test_mode_tie_goes_to_first_occurrence() {
        assert_eq!(mode(["+", "-"]), Some("+".to_string()));
        assert_eq!(mode(["-", "+", "+", "-"]), Some("-".to_string()));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_super_clause_derives_tag() {
        let clause = |text: &str, tag: &str| Clause {
            text: text.to_string(),
            tag: tag.to_string(),
        };
        let sc = SuperClause::new(vec![clause("a", "SD+;SG+"), clause("b", "SD-;SG-"), clause("c", "SD-;SG-")]);
        assert_eq!(sc.tag, "SD-;SG-");
        let tree = ClauseTree {
            super_clauses: vec![sc],
        };
        assert_eq!(tree.clause_count(), 3);
        assert_eq!(tree.clauses().map(|c| c.text.as_str()).collect::<String>(), "abc");
    }
}
