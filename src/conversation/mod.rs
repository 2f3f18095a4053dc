//! 对话层：会话线程、Run 生命周期与轮询等待

pub mod run;
pub mod session;
pub mod sleeper;

pub use run::{latest_assistant_reply, PollPolicy, RunManager, RunOutcome};
pub use session::ConversationSession;
pub use sleeper::{Sleeper, TokioSleeper};
