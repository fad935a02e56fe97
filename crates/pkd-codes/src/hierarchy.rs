//! Parent/child navigation over the four-level code tree.

use crate::sections::{division_range, section_for_division};
use index_core::{CodeLevel, IndustryCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immediate parent of a code.
///
/// Class → group → division drop the last digit; division → section goes
/// through the range table. Sections and unclassified codes have none.
pub fn find_parent(code: &IndustryCode) -> Option<IndustryCode> {
    match code.level() {
        CodeLevel::Class | CodeLevel::Group => {
            let key = code.key();
            let parent_level = code.level().parent()?;
            Some(IndustryCode::new(&key[..key.len() - 1], parent_level))
        }
        CodeLevel::Division => section_for_division(code.division_number()?).map(IndustryCode::section),
        CodeLevel::Section | CodeLevel::Unclassified => None,
    }
}

/// Immediate children of `code` among `universe`, one granularity down only.
pub fn find_children<'a, I>(code: &IndustryCode, universe: I) -> Vec<IndustryCode>
where
    I: IntoIterator<Item = &'a IndustryCode>,
{
    let Some(child_level) = code.level().child() else {
        return Vec::new();
    };

    let children: BTreeSet<IndustryCode> = universe
        .into_iter()
        .filter(|c| c.level() == child_level)
        .filter(|c| is_child_of(c, code))
        .cloned()
        .collect();
    children.into_iter().collect()
}

fn is_child_of(candidate: &IndustryCode, parent: &IndustryCode) -> bool {
    match parent.level() {
        CodeLevel::Section => {
            let (Some(letter), Some(division)) = (parent.section_letter(), candidate.division_number()) else {
                return false;
            };
            division_range(letter).is_some_and(|(lo, hi)| (lo..=hi).contains(&division))
        }
        CodeLevel::Division | CodeLevel::Group => candidate.key().starts_with(parent.key()),
        CodeLevel::Class | CodeLevel::Unclassified => false,
    }
}

/// Section enclosing any code; `None` puts the code in the "Other" bucket.
pub fn section_of(code: &IndustryCode) -> Option<IndustryCode> {
    match code.level() {
        CodeLevel::Section => Some(code.clone()),
        CodeLevel::Division | CodeLevel::Group | CodeLevel::Class => {
            section_for_division(code.division_number()?).map(IndustryCode::section)
        }
        CodeLevel::Unclassified => None,
    }
}

/// One node of a drill-down, with its children expanded to the requested depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillNode {
    pub code: IndustryCode,
    pub children: Vec<DrillNode>,
}

impl DrillNode {
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DrillNode::node_count).sum::<usize>()
    }
}

/// The universe of known codes, indexed for hierarchy queries.
#[derive(Debug, Clone, Default)]
pub struct HierarchyTree {
    codes: BTreeSet<IndustryCode>,
}

impl HierarchyTree {
    pub fn new<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = IndustryCode>,
    {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    pub fn contains(&self, code: &IndustryCode) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes_at(&self, level: CodeLevel) -> impl Iterator<Item = &IndustryCode> {
        self.codes.iter().filter(move |c| c.level() == level)
    }

    pub fn children(&self, code: &IndustryCode) -> Vec<IndustryCode> {
        find_children(code, &self.codes)
    }

    /// Expand `code` down to `depth` levels.
    ///
    /// Stops early on any branch that has no children. Returns `None` when
    /// `code` is not part of the universe.
    pub fn subtree(&self, code: &IndustryCode, depth: usize) -> Option<DrillNode> {
        if !self.contains(code) {
            return None;
        }
        Some(self.expand(code, depth))
    }

    fn expand(&self, code: &IndustryCode, depth: usize) -> DrillNode {
        let children = if depth == 0 {
            Vec::new()
        } else {
            self.children(code)
                .iter()
                .map(|child| self.expand(child, depth - 1))
                .collect()
        };
        DrillNode {
            code: code.clone(),
            children,
        }
    }

    /// Walk down from `start`, letting `select` pick one child per level.
    ///
    /// Terminates after `max_depth` steps, when a level has no children, or
    /// when `select` declines. The returned path always begins with `start`.
    pub fn descend<F>(&self, start: &IndustryCode, max_depth: usize, mut select: F) -> Vec<IndustryCode>
    where
        F: FnMut(&IndustryCode, &[IndustryCode]) -> Option<IndustryCode>,
    {
        let mut path = vec![start.clone()];
        let mut current = start.clone();
        for _ in 0..max_depth {
            let children = self.children(&current);
            if children.is_empty() {
                break;
            }
            match select(&current, &children) {
                Some(next) if children.contains(&next) => {
                    path.push(next.clone());
                    current = next;
                }
                _ => break,
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_code;

    fn codes(raw: &[&str]) -> Vec<IndustryCode> {
        raw.iter().map(|r| normalize_code(r)).collect()
    }

    fn sample_tree() -> HierarchyTree {
        HierarchyTree::new(codes(&[
            "SEK_F", "41.", "42.", "43.", "41.1", "41.2", "41.10", "41.20", "42.1", "45.", "SEK_G",
        ]))
    }

    #[test]
    fn test_parent_chain() {
        let class = normalize_code("41.20");
        let group = find_parent(&class).unwrap();
        assert_eq!(group, IndustryCode::new("412", CodeLevel::Group));
        let division = find_parent(&group).unwrap();
        assert_eq!(division, IndustryCode::new("41", CodeLevel::Division));
        let section = find_parent(&division).unwrap();
        assert_eq!(section, IndustryCode::section('F'));
        assert_eq!(find_parent(&section), None);
    }

    #[test]
    fn test_division_outside_table_has_no_parent() {
        assert_eq!(find_parent(&IndustryCode::new("40", CodeLevel::Division)), None);
        assert_eq!(section_of(&IndustryCode::new("4000", CodeLevel::Class)), None);
    }

    #[test]
    fn test_section_children_use_range_table() {
        let tree = sample_tree();
        let children = tree.children(&IndustryCode::section('F'));
        let keys: Vec<&str> = children.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["41", "42", "43"]);
    }

    #[test]
    fn test_children_do_not_skip_levels() {
        let tree = sample_tree();
        let children = tree.children(&IndustryCode::new("41", CodeLevel::Division));
        let keys: Vec<&str> = children.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["411", "412"]);
    }

    #[test]
    fn test_children_invert_parent() {
        let tree = sample_tree();
        for code in tree.codes_at(CodeLevel::Group) {
            let parent = find_parent(code).unwrap();
            assert!(tree.children(&parent).contains(code));
        }
    }

    #[test]
    fn test_section_of_any_level() {
        assert_eq!(section_of(&normalize_code("47.11")), Some(IndustryCode::section('G')));
        assert_eq!(section_of(&normalize_code("SEK_B")), Some(IndustryCode::section('B')));
        assert_eq!(section_of(&normalize_code("xx")), None);
    }

    #[test]
    fn test_subtree_respects_depth() {
        let tree = sample_tree();
        let root = IndustryCode::section('F');
        let shallow = tree.subtree(&root, 1).unwrap();
        assert_eq!(shallow.children.len(), 3);
        assert!(shallow.children.iter().all(|c| c.children.is_empty()));

        let deep = tree.subtree(&root, 3).unwrap();
        // SEK_F, 41, 42, 43, 411, 412, 421, 4110, 4120
        assert_eq!(deep.node_count(), 9);
        assert!(tree.subtree(&IndustryCode::section('Q'), 2).is_none());
    }

    #[test]
    fn test_descend_stops_when_no_children() {
        let tree = sample_tree();
        let path = tree.descend(&IndustryCode::section('F'), 10, |_, children| children.first().cloned());
        let keys: Vec<&str> = path.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["SEK_F", "41", "411", "4110"]);
    }

    #[test]
    fn test_descend_honours_depth_and_declined_selection() {
        let tree = sample_tree();
        let start = IndustryCode::section('F');
        assert_eq!(tree.descend(&start, 1, |_, c| c.last().cloned()).len(), 2);
        assert_eq!(tree.descend(&start, 5, |_, _| None).len(), 1);
    }
}
