//! 终端交互层：逐行问答循环与结果渲染

pub mod input;
pub mod repl;

pub use input::{LineSource, ThreadedLines};
pub use repl::{is_exit_command, render_outcome, InteractiveLoop, EXIT_KEYWORD, PROMPT};
