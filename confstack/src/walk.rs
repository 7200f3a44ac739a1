//! Depth-first traversal of a section tree.

use crate::tree::{Children, Section};

/// Depth-first, pre-order iterator yielding `(depth, section)` pairs.
///
/// Depth starts at 0 for the immediate children of the section the walk
/// started from. Siblings are visited in first-insertion order. The walk
/// uses an explicit stack, so deep trees cannot overflow the call stack.
///
/// # Examples
///
/// ```
/// use confstack::ConfigurationBuilder;
///
/// let tree = ConfigurationBuilder::new()
///     .add_in_memory(vec![("A:X", "1"), ("A:Y", "2"), ("B", "3")])
///     .build()
///     .unwrap();
///
/// let visited: Vec<(usize, String)> = tree
///     .walk()
///     .map(|(depth, section)| (depth, section.path().to_string()))
///     .collect();
///
/// assert_eq!(
///     visited,
///     vec![
///         (0, "A".to_string()),
///         (1, "A:X".to_string()),
///         (1, "A:Y".to_string()),
///         (0, "B".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<(usize, Section<'a>)>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(children: Children<'a>) -> Self {
        Self {
            stack: children.rev().map(|section| (0, section)).collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, Section<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, section) = self.stack.pop()?;
        self.stack
            .extend(section.children().rev().map(|child| (depth + 1, child)));
        Some((depth, section))
    }
}

#[cfg(test)]
mod tests {
    use crate::ConfigurationBuilder;

    #[test]
    fn test_walk_visits_every_section_once() {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(vec![("A:B:C", "1"), ("A:D", "2"), ("E", "3")])
            .build()
            .unwrap();
        let paths: Vec<String> = tree.walk().map(|(_, s)| s.path().to_string()).collect();
        assert_eq!(paths, vec!["A", "A:B", "A:B:C", "A:D", "E"]);
    }

    #[test]
    fn test_walk_from_section() {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(vec![("A:B:C", "1"), ("Z", "2")])
            .build()
            .unwrap();
        let visited: Vec<(usize, String)> = tree
            .section("A")
            .walk()
            .map(|(depth, s)| (depth, s.key().to_string()))
            .collect();
        assert_eq!(visited, vec![(0, "B".to_string()), (1, "C".to_string())]);
    }

    #[test]
    fn test_walk_deep_tree() {
        let key = (0..2_000).map(|i| format!("n{i}")).collect::<Vec<_>>().join(":");
        let tree = ConfigurationBuilder::new()
            .add_in_memory(vec![(key.as_str(), "leaf")])
            .build()
            .unwrap();
        let (depth, leaf) = tree.walk().last().unwrap();
        assert_eq!(depth, 1_999);
        assert_eq!(leaf.value(), Some("leaf"));
    }

    #[test]
    fn test_walk_is_stable() {
        let tree = ConfigurationBuilder::new()
            .add_in_memory(vec![("b", "1"), ("a", "2"), ("b:c", "3")])
            .build()
            .unwrap();
        let first: Vec<String> = tree.walk().map(|(_, s)| s.path().to_string()).collect();
        let second: Vec<String> = tree.walk().map(|(_, s)| s.path().to_string()).collect();
        assert_eq!(first, second);
    }
}
