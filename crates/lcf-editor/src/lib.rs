pub mod engine;
pub mod input;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use engine::{DiagramEngine, DiagramMutation, NodeStyle, PASTE_OFFSET, Selection};
pub use input::{InputEvent, Modifiers};
pub use session::EditorSession;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{Tool, ToolContext, ToolKind};
