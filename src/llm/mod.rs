//! LLM 层：客户端抽象与实现（OpenAI 兼容 / 脚本化 Mock）

pub mod mock;
pub mod openai;
pub mod traits;
pub mod types;

pub use mock::{RecordedCall, ScriptedLlmClient};
pub use openai::OpenAiClient;
pub use traits::{CompletionOptions, LlmClient, LlmError};
pub use types::{ChatResponse, Choice, ResponseMessage};
