//! 持久化协作方：记录存储（SQLite）与网盘文件存储
//!
//! 编排器只依赖两个契约：「创建记录并拿回 ID」与「按 ID 读取记录」。
//! Store 为同步 trait，实现方自行保证写入的事务性（失败时不留半条记录）。

pub mod files;
pub mod models;
pub mod sqlite;

use chrono::NaiveDateTime;
use thiserror::Error;

pub use files::{LocalFileStorage, StoredFile};
pub use models::{
    format_time, AuthorStats, Board, Category, CompanyInfo, DiskShare, MapAgent, MapRegion,
    Merchant, NewDiskShare, NewPost, NewReply, PostRecord, Product, ReplyRecord, ShopProduct,
    TIME_FORMAT,
};
pub use sqlite::SqliteStore;

/// 记录存储错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection lock poisoned")]
    LockPoisoned,

    /// 写入成功但读回失败
    #[error("Record not found after insert: {0}")]
    NotFound(String),
}

/// 文件存储错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// 记录存储契约
pub trait Store: Send + Sync {
    // 论坛
    fn board(&self, id: i64) -> Result<Option<Board>, StoreError>;
    fn boards(&self, limit: usize) -> Result<Vec<Board>, StoreError>;
    fn post(&self, id: i64) -> Result<Option<PostRecord>, StoreError>;
    /// 按标题 / 正文关键词搜索，按创建时间倒序
    fn search_posts(&self, keyword: Option<&str>, limit: usize) -> Result<Vec<PostRecord>, StoreError>;
    fn posts_since(&self, since: NaiveDateTime) -> Result<Vec<PostRecord>, StoreError>;
    fn author_stats(&self, keyword: Option<&str>, limit: usize) -> Result<Vec<AuthorStats>, StoreError>;
    /// 发帖与回帖作者的去重集合（去除首尾空白与空名）
    fn distinct_authors(&self) -> Result<Vec<String>, StoreError>;
    fn create_post(&self, post: &NewPost) -> Result<PostRecord, StoreError>;
    fn create_reply(&self, reply: &NewReply) -> Result<ReplyRecord, StoreError>;

    // 网盘
    fn share_exists(&self, share_id: &str) -> Result<bool, StoreError>;
    fn create_disk_share(&self, share: &NewDiskShare) -> Result<DiskShare, StoreError>;

    // 公司目录
    fn company_info(&self) -> Result<Option<CompanyInfo>, StoreError>;
    fn product_categories(&self, limit: usize) -> Result<Vec<Category>, StoreError>;
    fn product(&self, id: i64) -> Result<Option<Product>, StoreError>;
    fn products(&self, category_id: Option<i64>, limit: usize) -> Result<Vec<Product>, StoreError>;

    // 地图
    fn map_region(&self, id: i64) -> Result<Option<MapRegion>, StoreError>;
    fn map_regions(&self, keyword: Option<&str>, limit: usize) -> Result<Vec<MapRegion>, StoreError>;
    fn map_agent(&self, id: i64) -> Result<Option<MapAgent>, StoreError>;
    fn map_agents(&self, region_id: Option<i64>, limit: usize) -> Result<Vec<MapAgent>, StoreError>;

    // 商店
    fn shop_categories(&self, limit: usize) -> Result<Vec<Category>, StoreError>;
    fn shop_products(
        &self,
        category_id: Option<i64>,
        keyword: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ShopProduct>, StoreError>;
    fn shop_product(&self, id: i64) -> Result<Option<ShopProduct>, StoreError>;
    fn merchants(&self, limit: usize) -> Result<Vec<Merchant>, StoreError>;
}
