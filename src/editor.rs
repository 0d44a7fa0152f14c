pub mod editor_events;
pub mod editor_state;

pub use editor_events::{EditorChange, handle_editor_key};
pub use editor_state::EditorState;
