//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WEAVER__*` 覆盖（双下划线表示嵌套，如 `WEAVER__LLM__MODEL=xxx`）。

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub generation: GenerationSection,
    pub authors: AuthorsSection,
    pub scheduler: SchedulerSection,
    pub disk: DiskSection,
    pub autopilot: AutopilotSection,
}

/// [app] 段：数据库与网盘存储位置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    pub database_path: PathBuf,
    /// 网盘文件落盘目录
    pub storage_root: PathBuf,
    /// 返回给前端的相对路径前缀
    pub storage_url_prefix: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            database_path: PathBuf::from("instance/forum.db"),
            storage_root: PathBuf::from("static/files/online_disk"),
            storage_url_prefix: "/static/files/online_disk".to_string(),
        }
    }
}

/// [llm] 段：OpenAI 兼容端点、模型与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_url: String,
    /// 未设置时依次读取 SILICONFLOW_API_KEY / OPENAI_API_KEY
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_url: "https://api.siliconflow.cn/v1/chat/completions".to_string(),
            api_key: None,
            model: "Pro/deepseek-ai/DeepSeek-V3.2-Exp".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

impl LlmSection {
    pub fn resolve_api_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| std::env::var("SILICONFLOW_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string())
    }
}

/// 超时（秒）：普通调用与工具协议调用分开
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
    pub tool: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: 30,
            tool: 60,
        }
    }
}

/// [generation] 段：工具增强生成的策略开关
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    /// 每次生成向模型开放工具的概率
    pub use_tool_prob: f64,
    pub max_tool_calls: u32,
    /// 单次工具执行超时（秒）
    pub tool_timeout_secs: u64,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            use_tool_prob: 1.0,
            max_tool_calls: 2,
            tool_timeout_secs: 30,
        }
    }
}

/// [authors] 段：作者复用 / 新建策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthorsSection {
    pub reuse_prob: f64,
    /// 新用户名撞名时的重试次数
    pub max_retries: u32,
    pub base_pool: Vec<String>,
    pub signatures: Vec<String>,
}

impl Default for AuthorsSection {
    fn default() -> Self {
        Self {
            reuse_prob: 0.7,
            max_retries: 3,
            base_pool: [
                "路人甲",
                "技术爱好者",
                "打工人小李",
                "吃货小张",
                "运维老司机",
                "编程菜鸟",
                "生活观察员",
                "数码发烧友",
                "职场新人",
                "闲聊达人",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            signatures: ["", "专注此事10年", "纯属个人经验", "欢迎交流～", "亲测有效！", "踩过坑分享"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// [scheduler] 段：步间节流与默认计划
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub step_delay_ms: u64,
    /// 默认计划中标题截取的字符数
    pub fallback_title_chars: usize,
    pub default_board_id: i64,
    pub plan_temperature: f32,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            step_delay_ms: 1000,
            fallback_title_chars: 50,
            default_board_id: 1,
            plan_temperature: 0.7,
        }
    }
}

/// [disk] 段：分享号与访问码长度
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiskSection {
    pub share_id_length: usize,
    pub password_length: usize,
}

impl Default for DiskSection {
    fn default() -> Self {
        Self {
            share_id_length: 8,
            password_length: 6,
        }
    }
}

/// [autopilot] 段：无人值守批量发帖 / 回帖
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutopilotSection {
    pub posts_per_run: usize,
    pub replies_per_run: usize,
    /// 只回复该时间窗口（小时）内的帖子
    pub reply_window_hours: i64,
    /// 板块名 -> 主题列表
    pub board_themes: HashMap<String, Vec<String>>,
}

impl Default for AutopilotSection {
    fn default() -> Self {
        let mut board_themes = HashMap::new();
        board_themes.insert(
            "技术讨论区".to_string(),
            vec![
                "编程问题求助".to_string(),
                "技术工具分享".to_string(),
                "服务器运维经验".to_string(),
                "编程语言对比".to_string(),
                "软件使用技巧".to_string(),
            ],
        );
        board_themes.insert(
            "生活闲聊区".to_string(),
            vec![
                "日常美食分享".to_string(),
                "通勤路线推荐".to_string(),
                "租房经验交流".to_string(),
                "兴趣爱好讨论".to_string(),
                "职场吐槽".to_string(),
            ],
        );
        board_themes.insert(
            "游戏娱乐区".to_string(),
            vec![
                "复古游戏推荐".to_string(),
                "游戏攻略分享".to_string(),
                "电竞赛事讨论".to_string(),
                "游戏手柄测评".to_string(),
            ],
        );
        Self {
            posts_per_run: 1,
            replies_per_run: 4,
            reply_window_hours: 24,
            board_themes,
        }
    }
}

/// 从 config 目录加载配置，环境变量 WEAVER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WEAVER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WEAVER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
