use crate::sim::MoveIntent;

/// Held actions sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

const ACTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    /// Opposite directions held together cancel out on that axis.
    pub(crate) fn move_intent(&self) -> MoveIntent {
        let x = axis(
            self.is_down(InputAction::MoveLeft),
            self.is_down(InputAction::MoveRight),
        );
        let y = axis(
            self.is_down(InputAction::MoveUp),
            self.is_down(InputAction::MoveDown),
        );
        MoveIntent::new(x, y)
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
        }
    }
}

fn axis(negative: bool, positive: bool) -> i8 {
    i8::from(positive) - i8::from(negative)
}
