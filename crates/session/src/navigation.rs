use pure_ide_protocol::FileCoordinate;
use std::collections::VecDeque;

/// Bookmarks pushed by "go to definition", popped by "navigate back".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationStack {
    entries: VecDeque<FileCoordinate>,
    limit: Option<usize>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack that forgets its oldest entries beyond `limit`.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.filter(|limit| *limit > 0),
        }
    }

    pub fn push(&mut self, coordinate: FileCoordinate) {
        self.entries.push_back(coordinate);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
    }

    /// `None` when empty; callers report that as a warning.
    pub fn pop(&mut self) -> Option<FileCoordinate> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&FileCoordinate> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: i64) -> FileCoordinate {
        FileCoordinate::new("/a.pure", line, 1).expect("coordinate")
    }

    #[test]
    fn pops_in_reverse_push_order() {
        let mut stack = NavigationStack::new();
        stack.push(at(1));
        stack.push(at(2));
        assert_eq!(stack.pop().map(|c| c.line()), Some(2));
        assert_eq!(stack.pop().map(|c| c.line()), Some(1));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut stack = NavigationStack::with_limit(Some(2));
        for line in 1..=3 {
            stack.push(at(line));
        }
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().map(|c| c.line()), Some(3));
        assert_eq!(stack.pop().map(|c| c.line()), Some(2));
        assert!(stack.is_empty());
    }
}
