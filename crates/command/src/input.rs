use crate::CommandError;

/// Longest waypoint number the box accepts.
pub const MAX_WAYPOINT_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Empty,
    Typing,
    /// the current value has been sent with GO
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Accepted,
    /// the key was dropped before reaching the box
    Filtered,
    /// the key was consumed and must not propagate (no form submit)
    Suppressed,
}

/// The waypoint number box next to the GO button. Only digits make it in, and
/// at most [`MAX_WAYPOINT_DIGITS`] of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaypointInput {
    value: String,
    state: InputState,
}

impl Default for WaypointInput {
    fn default() -> Self {
        WaypointInput {
            value: String::new(),
            state: InputState::Empty,
        }
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_WAYPOINT_DIGITS)
        .collect()
}

impl WaypointInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    fn edited(&mut self) {
        self.state = if self.value.is_empty() {
            InputState::Empty
        } else {
            InputState::Typing
        };
    }

    /// Replaces the contents of the box, e.g. on paste.
    pub fn input(&mut self, text: &str) {
        self.value = sanitize(text);
        self.edited();
    }

    pub fn key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Enter => KeyOutcome::Suppressed,
            Key::Char(c) if c.is_ascii_digit() && self.value.len() < MAX_WAYPOINT_DIGITS => {
                self.value.push(c);
                self.edited();
                KeyOutcome::Accepted
            }
            Key::Char(_) => KeyOutcome::Filtered,
            Key::Backspace => {
                self.value.pop();
                self.edited();
                KeyOutcome::Accepted
            }
        }
    }

    /// GO: hands out the entered waypoint number. The text stays in the box.
    pub fn commit(&mut self) -> Result<u16, CommandError> {
        let index = self
            .value
            .parse::<u16>()
            .map_err(|_| CommandError::EmptyWaypoint)?;

        self.state = InputState::Committed;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> WaypointInput {
        let mut input = WaypointInput::default();
        for c in text.chars() {
            input.key(Key::Char(c));
        }
        input
    }

    #[test]
    fn non_digits_are_stripped_as_typed() {
        let input = typed("12a3b4");

        assert_eq!(input.value(), "123");
        assert_eq!(input.state(), InputState::Typing);
    }

    #[test]
    fn pasted_text_is_sanitized_too() {
        let mut input = WaypointInput::default();
        input.input("12a3b4");
        assert_eq!(input.value(), "123");

        input.input("abc");
        assert_eq!(input.value(), "");
        assert_eq!(input.state(), InputState::Empty);
    }

    #[test]
    fn letters_are_filtered() {
        let mut input = WaypointInput::default();

        assert_eq!(input.key(Key::Char('x')), KeyOutcome::Filtered);
        assert_eq!(input.state(), InputState::Empty);
    }

    #[test]
    fn enter_is_suppressed_and_does_not_commit() {
        let mut input = typed("7");

        assert_eq!(input.key(Key::Enter), KeyOutcome::Suppressed);
        assert_eq!(input.state(), InputState::Typing);
        assert_eq!(input.value(), "7");
    }

    #[test]
    fn commit_then_edit() -> anyhow::Result<()> {
        let mut input = typed("042");

        assert_eq!(input.commit()?, 42);
        assert_eq!(input.state(), InputState::Committed);
        assert_eq!(input.value(), "042");

        input.key(Key::Backspace);
        assert_eq!(input.state(), InputState::Typing);
        assert_eq!(input.value(), "04");

        input.key(Key::Backspace);
        input.key(Key::Backspace);
        assert_eq!(input.state(), InputState::Empty);

        Ok(())
    }

    #[test]
    fn empty_box_cannot_be_committed() {
        let mut input = WaypointInput::default();

        assert!(matches!(input.commit(), Err(CommandError::EmptyWaypoint)));
        assert_eq!(input.state(), InputState::Empty);
    }
}
