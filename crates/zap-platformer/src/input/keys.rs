/// Key events the level understands. The host translates its own key
/// codes into these before handing them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(Key),
    Up(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Jump,
    Action,
    Down,
}

/// Keys held at the start of a tick. The level never polls input itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub action: bool,
    pub down: bool,
}

impl KeySnapshot {
    pub const NONE: KeySnapshot = KeySnapshot {
        left: false,
        right: false,
        jump: false,
        action: false,
        down: false,
    };

    pub fn is_held(&self, key: Key) -> bool {
        match key {
            Key::Left => self.left,
            Key::Right => self.right,
            Key::Jump => self.jump,
            Key::Action => self.action,
            Key::Down => self.down,
        }
    }

    fn set(&mut self, key: Key, held: bool) {
        match key {
            Key::Left => self.left = held,
            Key::Right => self.right = held,
            Key::Jump => self.jump = held,
            Key::Action => self.action = held,
            Key::Down => self.down = held,
        }
    }

    pub fn apply(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Down(key) => self.set(key, true),
            KeyEvent::Up(key) => self.set(key, false),
        }
    }

    /// -1 for left only, 1 for right only, 0 otherwise.
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Buffers key events between frames and folds them into the held state.
#[derive(Debug, Default)]
pub struct KeyQueue {
    events: Vec<KeyEvent>,
    held: KeySnapshot,
}

impl KeyQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
            held: KeySnapshot::NONE,
        }
    }

    pub fn push(&mut self, event: KeyEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Apply pending events in arrival order and return the held keys.
    pub fn snapshot(&mut self) -> KeySnapshot {
        for event in self.events.drain(..) {
            self.held.apply(event);
        }
        self.held
    }
}
