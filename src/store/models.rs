//! 持久化记录：论坛、网盘分享、公司目录、地图与商店
//!
//! 记录字段与工具输出的 JSON 字段一一对应，时间统一序列化为 `%Y-%m-%d %H:%M:%S`。

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(t: &NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn serialize_time<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_time(t))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub board_id: i64,
    pub board_name: String,
    #[serde(serialize_with = "serialize_time")]
    pub create_time: NaiveDateTime,
    pub reply_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub board_id: i64,
    pub create_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyRecord {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub signature: String,
    pub post_id: i64,
    #[serde(serialize_with = "serialize_time")]
    pub create_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub content: String,
    pub author: String,
    pub signature: String,
    pub post_id: i64,
    pub create_time: NaiveDateTime,
}

/// 作者发帖 / 回帖计数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorStats {
    pub author: String,
    pub post_count: i64,
    pub reply_count: i64,
}

/// 网盘分享记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskShare {
    pub id: i64,
    pub share_id: String,
    pub password: String,
    pub file_name: String,
    pub file_path: String,
    #[serde(serialize_with = "serialize_time")]
    pub create_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDiskShare {
    pub share_id: String,
    pub password: String,
    pub file_name: String,
    pub file_path: String,
    pub create_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyInfo {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub founded_year: Option<i64>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub slogan: String,
}

/// 产品分类与商店分类共用
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub model: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRegion {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub x_coord: f64,
    pub y_coord: f64,
    pub place_type: String,
    pub population: i64,
    pub ai_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<String>,
}

/// 地图上的 AI 居民
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapAgent {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<String>,
    pub place_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopProduct {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_name: String,
    pub image_url: String,
    pub specifications: String,
    pub stock: i64,
    pub is_active: bool,
    #[serde(serialize_with = "serialize_time")]
    pub create_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Merchant {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub product_count: i64,
}
