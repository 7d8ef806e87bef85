//! 运行期记忆：单次生成的对话记录、单次任务的资源池

pub mod conversation;
pub mod pool;

pub use conversation::{FunctionCall, Message, Role, ToolCallRequest};
pub use pool::ResourcePool;
