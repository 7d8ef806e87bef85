//! 商店网页工具：商品分类、商品列表、商品详情与商家

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::store::{format_time, Store, StoreError};
use crate::tools::schema::{parameters_schema, parse_args};
use crate::tools::{output, Tool};

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum ShopQuery {
    Categories,
    Products,
    ProductDetail,
    Merchants,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ShopArgs {
    /// 查询类型，可以是：categories（商品分类）、products（商品列表）、product_detail（产品详情）、merchants（商家列表）
    query_type: ShopQuery,
    /// 产品ID，查询单个产品详情时使用
    #[serde(default)]
    product_id: Option<i64>,
    /// 产品分类ID，查询某个分类下的产品时使用
    #[serde(default)]
    category_id: Option<i64>,
    /// 产品名称关键词，用于搜索特定产品
    #[serde(default)]
    keyword: Option<String>,
    /// 返回结果数量限制，默认10
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

pub struct ShopInfoTool {
    store: Arc<dyn Store>,
}

impl ShopInfoTool {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ShopInfoTool {
    fn name(&self) -> &str {
        "get_shop_info"
    }

    fn description(&self) -> &str {
        "获取商店网页的内容，可以查询产品分类、产品列表或产品详情"
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<ShopArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: ShopArgs = parse_args(args)?;
        let fail = |e: StoreError| format!("查询失败: {e}");

        match args.query_type {
            ShopQuery::Categories => {
                let categories = self.store.shop_categories(args.limit).map_err(fail)?;
                output::list("categories", &categories)
            }
            ShopQuery::Products => {
                let keyword = args.keyword.as_deref().filter(|k| !k.trim().is_empty());
                let category = args.category_id.filter(|id| *id > 0);
                let products = self
                    .store
                    .shop_products(category, keyword, args.limit)
                    .map_err(fail)?;
                let results: Vec<Value> = products
                    .iter()
                    .map(|p| {
                        json!({
                            "id": p.id,
                            "name": p.name,
                            "description": output::preview(&p.description, 100),
                            "price": p.price,
                            "category_name": p.category_name,
                            "image_url": p.image_url,
                        })
                    })
                    .collect();
                output::list("products", &results)
            }
            ShopQuery::ProductDetail => {
                let id = args
                    .product_id
                    .filter(|id| *id > 0)
                    .ok_or_else(|| "查询产品详情时必须提供product_id参数".to_string())?;
                match self.store.shop_product(id).map_err(fail)? {
                    Some(p) if p.is_active => output::single(
                        "product_detail",
                        &json!({
                            "id": p.id,
                            "name": p.name,
                            "description": p.description,
                            "price": p.price,
                            "category_name": p.category_name,
                            "image_url": p.image_url,
                            "specifications": p.specifications,
                            "stock": p.stock,
                            "create_time": format_time(&p.create_time),
                        }),
                    ),
                    _ => Err(format!("未找到ID为{id}的产品或产品已下架")),
                }
            }
            ShopQuery::Merchants => {
                let merchants = self.store.merchants(args.limit).map_err(fail)?;
                output::list("merchants", &merchants)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn seeded() -> Arc<SqliteStore> {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .execute_batch(
                "INSERT INTO shop_categories (name, order_num) VALUES ('手柄', 1), ('键盘', 2);
                 INSERT INTO shop_merchants (name, order_num) VALUES ('复古小铺', 1);
                 INSERT INTO shop_products (name, description, price, category_id, merchant_id, stock) VALUES
                    ('怀旧手柄', '八位机手柄', 59.0, 1, 1, 12),
                    ('机械键盘', '青轴', 299.0, 2, 1, 3);
                 INSERT INTO shop_products (name, price, category_id, is_active) VALUES ('停产手柄', 9.0, 1, 0);",
            )
            .unwrap();
        store
    }

    async fn run(tool: &ShopInfoTool, args: Value) -> Value {
        serde_json::from_str(&tool.execute(args).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_products_filtered_by_keyword() {
        let tool = ShopInfoTool::new(seeded());
        let out = run(&tool, json!({"query_type": "products", "keyword": "手柄"})).await;
        assert_eq!(out["count"], 1);
        assert_eq!(out["results"][0]["name"], "怀旧手柄");
        assert_eq!(out["results"][0]["category_name"], "手柄");
    }

    #[tokio::test]
    async fn test_product_detail_requires_active_product() {
        let tool = ShopInfoTool::new(seeded());
        let out = run(&tool, json!({"query_type": "product_detail", "product_id": 2})).await;
        assert_eq!(out["result"]["stock"], 3);

        assert!(tool
            .execute(json!({"query_type": "product_detail"}))
            .await
            .is_err());
        let err = tool
            .execute(json!({"query_type": "product_detail", "product_id": 3}))
            .await
            .unwrap_err();
        assert!(err.contains("已下架"));
    }

    #[tokio::test]
    async fn test_categories_and_merchants() {
        let tool = ShopInfoTool::new(seeded());
        let categories = run(&tool, json!({"query_type": "categories"})).await;
        assert_eq!(categories["results"][0]["product_count"], 2);

        let merchants = run(&tool, json!({"query_type": "merchants"})).await;
        assert_eq!(merchants["results"][0]["product_count"], 2);
    }
}
