//! 工具箱：注册表、执行器与四个数据查询工具（论坛 / 公司 / 地图 / 商店）

pub mod company;
pub mod executor;
pub mod forum;
pub mod map;
pub mod output;
pub mod registry;
pub mod schema;
pub mod shop;

use std::sync::Arc;

pub use company::CompanyInfoTool;
pub use executor::ToolExecutor;
pub use forum::ForumInfoTool;
pub use map::MapLocationTool;
pub use registry::{Tool, ToolDescriptor, ToolRegistry};
pub use shop::ShopInfoTool;

use crate::store::Store;

/// 注册全部内置工具
pub fn builtin_registry(store: Arc<dyn Store>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ForumInfoTool::new(store.clone()));
    registry.register(CompanyInfoTool::new(store.clone()));
    registry.register(MapLocationTool::new(store.clone()));
    registry.register(ShopInfoTool::new(store));
    registry
}
