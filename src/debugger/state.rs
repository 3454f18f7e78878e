use serde::{Deserialize, Serialize};

/// A (line, column) position in a window. Lines are 1-based, columns are
/// 0-based byte offsets, matching what the editor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Cursor {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl From<(usize, usize)> for Cursor {
    fn from((line, col): (usize, usize)) -> Self {
        Self { line, col }
    }
}

impl From<Cursor> for (usize, usize) {
    fn from(cursor: Cursor) -> Self {
        (cursor.line, cursor.col)
    }
}

/// An undo-tree checkpoint paired with where the cursor was at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    change_root: i64,
    cursor_root: Cursor,
}

impl State {
    pub fn new(change_root: i64, cursor_root: Cursor) -> Self {
        Self {
            change_root,
            cursor_root,
        }
    }

    pub fn change_root(&self) -> i64 {
        self.change_root
    }

    pub fn cursor_root(&self) -> Cursor {
        self.cursor_root
    }
}

/// Stack of replay states. Never empty: the root pushed at construction
/// cannot be popped, so stepping back past the start is a no-op.
#[derive(Debug, Clone)]
pub struct StateStack {
    states: Vec<State>,
}

impl StateStack {
    pub fn new(root: State) -> Self {
        Self { states: vec![root] }
    }

    pub fn push(&mut self, state: State) {
        self.states.push(state);
    }

    /// Removes and returns the top state, unless it is the root.
    pub fn pop(&mut self) -> Option<State> {
        if self.states.len() > 1 {
            self.states.pop()
        } else {
            None
        }
    }

    pub fn current(&self) -> &State {
        // Non-empty by construction.
        &self.states[self.states.len() - 1]
    }

    pub fn root(&self) -> &State {
        &self.states[0]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.states.len() == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(seq: i64, line: usize, col: usize) -> State {
        State::new(seq, Cursor::new(line, col))
    }

    #[test]
    fn test_pop_keeps_root() {
        let mut stack = StateStack::new(state(5, 1, 0));
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.len(), 1);
        assert_eq!(*stack.current(), state(5, 1, 0));
    }

    #[test]
    fn test_current_tracks_last_push() {
        let mut stack = StateStack::new(state(5, 1, 0));
        stack.push(state(6, 1, 10));
        stack.push(state(7, 2, 3));
        assert_eq!(*stack.current(), state(7, 2, 3));

        assert_eq!(stack.pop(), Some(state(7, 2, 3)));
        assert_eq!(*stack.current(), state(6, 1, 10));

        stack.push(state(8, 4, 4));
        assert_eq!(*stack.current(), state(8, 4, 4));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_root_survives_any_sequence() {
        let mut stack = StateStack::new(state(1, 1, 0));
        for i in 0..10 {
            stack.push(state(i + 2, 1, i as usize));
            if i % 3 == 0 {
                stack.pop();
            }
        }
        while !stack.is_at_root() {
            stack.pop();
        }
        stack.pop();
        assert_eq!(*stack.root(), state(1, 1, 0));
        assert_eq!(*stack.current(), state(1, 1, 0));
    }

    #[test]
    fn test_cursor_wire_shape() {
        let cursor: Cursor = serde_json::from_str("[3, 7]").unwrap();
        assert_eq!(cursor, Cursor::new(3, 7));
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "[3,7]");
    }
}
