pub mod conversation;
pub mod input;
pub mod poller;
pub mod render;

pub use conversation::{ConversationView, TurnPolicy, ViewError, ViewState};
pub use input::{Command, InputError, LocalInput};
pub use poller::{PollConfig, PollOutcome};
pub use render::{ChatBubble, FeedbackControl, Transcript};
