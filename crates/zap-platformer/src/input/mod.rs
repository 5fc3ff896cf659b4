pub mod keys;

pub use keys::{Key, KeyEvent, KeyQueue, KeySnapshot};
