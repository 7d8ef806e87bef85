//! 核心编排层：错误类型、任务调度器、自动发帖器与装配

pub mod autopilot;
pub mod builder;
pub mod error;
pub mod scheduler;

pub use autopilot::{Autopilot, AutopilotReport};
pub use builder::{Engine, EngineBuilder};
pub use error::{PlanError, StepError};
pub use scheduler::{Scheduler, TaskOutcome};
