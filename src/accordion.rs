//! Exclusive-open accordion over the rendered guides, plus search filtering.

use crate::guide::GuideEntry;
use serde::Serialize;

/// Emitted whenever content inside a guide's panel changes size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChanged {
    pub guide: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccordionItemState {
    /// 1-based, stable for the life of the page.
    pub index: usize,
    pub is_open: bool,
    pub is_visible: bool,
    /// Open panels expand to their natural height, closed ones collapse to 0.
    pub max_height: u32,
    #[serde(skip)]
    natural_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub matches: usize,
    pub no_results: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AccordionController {
    items: Vec<AccordionItemState>,
}

impl AccordionController {
    /// One closed, visible item per panel height, indexed from 1.
    pub fn new(natural_heights: impl IntoIterator<Item = u32>) -> Self {
        let items = natural_heights
            .into_iter()
            .enumerate()
            .map(|(idx, natural_height)| AccordionItemState {
                index: idx + 1,
                is_open: false,
                is_visible: true,
                max_height: 0,
                natural_height,
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[AccordionItemState] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&AccordionItemState> {
        index.checked_sub(1).and_then(|idx| self.items.get(idx))
    }

    pub fn open_index(&self) -> Option<usize> {
        self.items.iter().find(|item| item.is_open).map(|item| item.index)
    }

    /// Header activation: an open item closes everything, a closed item
    /// becomes the only open one. Unknown indices are ignored.
    pub fn activate(&mut self, index: usize) -> bool {
        let Some(was_open) = self.item(index).map(|item| item.is_open) else {
            return false;
        };
        for item in &mut self.items {
            item.is_open = false;
        }
        if !was_open {
            self.items[index - 1].is_open = true;
        }
        self.recompute_heights();
        true
    }

    pub fn on_content_changed(&mut self, change: ContentChanged, natural_height: u32) {
        if let Some(item) = change
            .guide
            .checked_sub(1)
            .and_then(|idx| self.items.get_mut(idx))
        {
            item.natural_height = natural_height;
        }
        self.recompute_heights();
    }

    fn recompute_heights(&mut self) {
        for item in &mut self.items {
            item.max_height = if item.is_open { item.natural_height } else { 0 };
        }
    }

    /// Case-insensitive substring match on title or raw content. Items are
    /// hidden, never removed, so indices stay valid across searches.
    pub fn filter(&mut self, term: &str, guides: &[GuideEntry]) -> SearchOutcome {
        let needle = term.to_lowercase();
        let mut matches = 0;
        for (item, guide) in self.items.iter_mut().zip(guides) {
            item.is_visible = matches_search(guide, &needle);
            if item.is_visible {
                matches += 1;
            }
        }
        SearchOutcome {
            matches,
            no_results: matches == 0,
        }
    }

    /// Resolve a `guide` query value to a rendered index.
    pub fn deep_link_target(&self, requested: &str) -> Option<usize> {
        requested
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|index| self.item(*index).is_some())
    }
}

pub fn matches_search(guide: &GuideEntry, needle_lower: &str) -> bool {
    guide.title.to_lowercase().contains(needle_lower)
        || guide.content.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guide(title: &str, content: &str) -> GuideEntry {
        GuideEntry {
            title: title.to_string(),
            content: content.to_string(),
            form: None,
        }
    }

    fn open_count(accordion: &AccordionController) -> usize {
        accordion.items().iter().filter(|item| item.is_open).count()
    }

    #[test]
    fn at_most_one_item_is_open() {
        let mut accordion = AccordionController::new([10, 20, 30, 40]);
        for index in [1, 3, 3, 2, 4, 4, 4, 1, 9, 0] {
            accordion.activate(index);
            assert!(open_count(&accordion) <= 1);
        }
    }

    #[test]
    fn activating_open_item_closes_everything() {
        let mut accordion = AccordionController::new([10, 20]);
        assert!(accordion.activate(2));
        assert_eq!(accordion.open_index(), Some(2));
        assert!(accordion.activate(2));
        assert_eq!(open_count(&accordion), 0);
        assert!(accordion.items().iter().all(|item| item.max_height == 0));
    }

    #[test]
    fn switching_items_moves_height() {
        let mut accordion = AccordionController::new([10, 20]);
        accordion.activate(1);
        assert_eq!(accordion.item(1).unwrap().max_height, 10);
        accordion.activate(2);
        assert_eq!(accordion.item(1).unwrap().max_height, 0);
        assert_eq!(accordion.item(2).unwrap().max_height, 20);
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut accordion = AccordionController::new([10]);
        accordion.activate(1);
        assert!(!accordion.activate(5));
        assert_eq!(accordion.open_index(), Some(1));
    }

    #[test]
    fn content_change_resizes_open_panel() {
        let mut accordion = AccordionController::new([10, 20]);
        accordion.activate(1);
        accordion.on_content_changed(ContentChanged { guide: 1 }, 90);
        assert_eq!(accordion.item(1).unwrap().max_height, 90);
        accordion.on_content_changed(ContentChanged { guide: 2 }, 50);
        assert_eq!(accordion.item(2).unwrap().max_height, 0);
        accordion.activate(2);
        assert_eq!(accordion.item(2).unwrap().max_height, 50);
    }

    #[test]
    fn search_shows_exactly_matching_items() {
        let guides = vec![
            guide("Password Reset", "tap forgot"),
            guide("Buy Data", "open services"),
            guide("Reset PIN", "call support"),
            guide("Wallet", "fund via transfer"),
        ];
        let mut accordion = AccordionController::new([1, 1, 1, 1]);
        let outcome = accordion.filter("RESET", &guides);
        assert_eq!(outcome.matches, 2);
        assert!(!outcome.no_results);
        let visible: Vec<_> = accordion
            .items()
            .iter()
            .filter(|item| item.is_visible)
            .map(|item| item.index)
            .collect();
        assert_eq!(visible, vec![1, 3]);

        let outcome = accordion.filter("", &guides);
        assert_eq!(outcome.matches, 4);
        assert!(accordion.items().iter().all(|item| item.is_visible));
    }

    #[test]
    fn search_matches_raw_content_and_reports_no_results() {
        let guides = vec![guide("A", "*Transfer* funds"), guide("B", "x")];
        let mut accordion = AccordionController::new([1, 1]);
        assert_eq!(accordion.filter("*transfer*", &guides).matches, 1);
        let outcome = accordion.filter("zzz", &guides);
        assert!(outcome.no_results);
        assert_eq!(accordion.len(), 2);
    }

    #[test]
    fn visibility_is_independent_of_open_state() {
        let guides = vec![guide("A", ""), guide("B", "")];
        let mut accordion = AccordionController::new([5, 5]);
        accordion.activate(1);
        accordion.filter("b", &guides);
        let first = accordion.item(1).unwrap();
        assert!(first.is_open);
        assert!(!first.is_visible);
    }

    #[test]
    fn deep_link_target_requires_rendered_index() {
        let accordion = AccordionController::new([1, 1, 1]);
        assert_eq!(accordion.deep_link_target("3"), Some(3));
        assert_eq!(accordion.deep_link_target("4"), None);
        assert_eq!(accordion.deep_link_target("0"), None);
        assert_eq!(accordion.deep_link_target("two"), None);
    }
}
