use crate::models::{Book, Member, OpenLoan};

/// A scrollable single-choice list.
#[derive(Debug, Clone)]
pub(crate) struct Picker<T> {
    pub(crate) items: Vec<T>,
    pub(crate) selected: usize,
}

impl<T> Picker<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items, selected: 0 }
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.items.is_empty() {
            return;
        }
        let len = self.items.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.selected = self.items.len() - 1;
        }
    }
}

/// Which of the two issue pickers has focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum IssueList {
    Books,
    Members,
}

/// State for the issue screen: a book picker and a member picker.
#[derive(Debug, Clone)]
pub(crate) struct IssueScreen {
    pub(crate) books: Picker<Book>,
    pub(crate) members: Picker<Member>,
    pub(crate) active: IssueList,
}

impl IssueScreen {
    pub(crate) fn new(books: Vec<Book>, members: Vec<Member>) -> Self {
        Self {
            books: Picker::new(books),
            members: Picker::new(members),
            active: IssueList::Books,
        }
    }

    pub(crate) fn toggle_list(&mut self) {
        self.active = match self.active {
            IssueList::Books => IssueList::Members,
            IssueList::Members => IssueList::Books,
        };
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        match self.active {
            IssueList::Books => self.books.move_selection(offset),
            IssueList::Members => self.members.move_selection(offset),
        }
    }

    pub(crate) fn select_first(&mut self) {
        match self.active {
            IssueList::Books => self.books.select_first(),
            IssueList::Members => self.members.select_first(),
        }
    }

    pub(crate) fn select_last(&mut self) {
        match self.active {
            IssueList::Books => self.books.select_last(),
            IssueList::Members => self.members.select_last(),
        }
    }

    /// Book and member ids of the current choice, if both lists have one.
    pub(crate) fn selection(&self) -> Option<(i64, i64)> {
        Some((self.books.current()?.id, self.members.current()?.id))
    }
}

pub(crate) type ReturnScreen = Picker<OpenLoan>;
