mod keys;
mod session;
mod state;

pub use keys::macro_prefix;
pub use session::{
    InputSurface, MacroSession, SessionOptions, SessionStatus, DEFAULT_WINDOW_HEIGHT,
};
pub use state::{Cursor, State, StateStack};
