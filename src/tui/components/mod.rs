//! # TUI Components
//!
//! Components follow two patterns:
//!
//! - Stateless, props-based: `TitleBar`, `Message`
//! - Stateful, event-driven: `InputBox`, `MessageList` (state in `MessageListState`)
//!
//! Components receive external data as props and their drawing area as a
//! `Rect`. None of them read global state.
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── message.rs       (Single turn renderer)
//! ├── message_list.rs  (Scrollable transcript)
//! └── input_box.rs     (Prompt input)
//! ```

pub mod input_box;
pub mod message;
pub mod message_list;
pub mod title_bar;

pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
