use cascade_selectors::SelectorList;
use std::cell::RefCell;

/// Stable handle to a selector list shared between the evaluator (which
/// creates it), the extender (which mutates it in place), and the emitter
/// (which reads the final value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(u32);

/// Arena of selector lists, indexed by [`ListId`]. Handles stay valid for
/// the whole compilation; lists are frozen once the emitter starts reading.
#[derive(Debug, Default)]
pub struct SelectorStore {
    lists: RefCell<Vec<SelectorList>>,
}

impl SelectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, list: SelectorList) -> ListId {
        let mut lists = self.lists.borrow_mut();
        let id = ListId(lists.len() as u32);
        lists.push(list);
        id
    }

    pub fn get(&self, id: ListId) -> SelectorList {
        self.lists.borrow()[id.0 as usize].clone()
    }

    pub fn set(&self, id: ListId, list: SelectorList) {
        self.lists.borrow_mut()[id.0 as usize] = list;
    }

    pub fn len(&self) -> usize {
        self.lists.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_selectors::parse_selector;

    #[test]
    fn ids_are_stable_across_mutation() {
        let store = SelectorStore::new();
        let a = store.insert(parse_selector(".a").unwrap());
        let b = store.insert(parse_selector(".b").unwrap());
        store.set(a, parse_selector(".a, .c").unwrap());
        assert_eq!(store.get(a).to_string(), ".a, .c");
        assert_eq!(store.get(b).to_string(), ".b");
    }
}
