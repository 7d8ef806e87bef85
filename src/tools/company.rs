//! 公司网页 / 产品信息工具

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::store::{Store, StoreError};
use crate::tools::schema::{parameters_schema, parse_args};
use crate::tools::{output, Tool};

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum CompanyQuery {
    Company,
    Categories,
    Products,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CompanyArgs {
    /// 查询类型，可以是：company（公司信息）、categories（产品分类）、products（产品）
    query_type: CompanyQuery,
    /// 产品ID，查询单个产品时使用
    #[serde(default)]
    product_id: Option<i64>,
    /// 产品分类ID，查询某个分类下的产品时使用
    #[serde(default)]
    category_id: Option<i64>,
    /// 返回结果数量限制，默认10
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

pub struct CompanyInfoTool {
    store: Arc<dyn Store>,
}

impl CompanyInfoTool {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CompanyInfoTool {
    fn name(&self) -> &str {
        "get_company_info"
    }

    fn description(&self) -> &str {
        "获取公司网页/产品的信息，可以查询公司基本信息、产品分类或产品详情"
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<CompanyArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: CompanyArgs = parse_args(args)?;
        let fail = |e: StoreError| format!("查询失败: {e}");

        match args.query_type {
            CompanyQuery::Company => match self.store.company_info().map_err(fail)? {
                Some(info) => output::single("company", &info),
                None => Err("未找到公司信息".to_string()),
            },
            CompanyQuery::Categories => {
                let categories = self.store.product_categories(args.limit).map_err(fail)?;
                output::list("categories", &categories)
            }
            CompanyQuery::Products => {
                // 0 视为未指定
                if let Some(id) = args.product_id.filter(|id| *id > 0) {
                    return match self.store.product(id).map_err(fail)? {
                        Some(product) => output::single("product", &product),
                        None => Err(format!("未找到ID为{id}的产品")),
                    };
                }
                let category = args.category_id.filter(|id| *id > 0);
                let products = self.store.products(category, args.limit).map_err(fail)?;
                let results: Vec<Value> = products
                    .iter()
                    .map(|p| {
                        let mut v = serde_json::to_value(p).unwrap_or(Value::Null);
                        output::truncate_field(&mut v, "description", 100);
                        v
                    })
                    .collect();
                output::list("products", &results)
            }
        }
    }
}
