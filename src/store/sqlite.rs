//! SQLite 记录存储
//!
//! 单连接 + Mutex：同一进程内的写入按锁串行化；每次写入在事务中完成并读回，
//! 任一步失败则事务随 Drop 回滚。

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::*;
use super::{Store, StoreError};

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS boards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    author TEXT NOT NULL,
    board_id INTEGER NOT NULL,
    create_time TEXT NOT NULL,
    FOREIGN KEY (board_id) REFERENCES boards(id)
);

CREATE TABLE IF NOT EXISTS replies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    author TEXT NOT NULL,
    signature TEXT NOT NULL DEFAULT '',
    post_id INTEGER NOT NULL,
    create_time TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id)
);

CREATE TABLE IF NOT EXISTS disk_shares (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    share_id TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    create_time TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS company_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    founded_year INTEGER,
    address TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    website TEXT NOT NULL DEFAULT '',
    slogan TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS product_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    order_num INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    model TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    price REAL NOT NULL DEFAULT 0,
    image_url TEXT NOT NULL DEFAULT '',
    category_id INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    create_time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (category_id) REFERENCES product_categories(id)
);

CREATE TABLE IF NOT EXISTS map_regions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    x_coord REAL NOT NULL DEFAULT 0,
    y_coord REAL NOT NULL DEFAULT 0,
    region_type TEXT NOT NULL DEFAULT '',
    population INTEGER NOT NULL DEFAULT 0,
    ai_count INTEGER NOT NULL DEFAULT 0,
    resources TEXT,
    is_public INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS map_agents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    capabilities TEXT,
    region_id INTEGER NOT NULL,
    FOREIGN KEY (region_id) REFERENCES map_regions(id)
);

CREATE TABLE IF NOT EXISTS shop_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    order_num INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS shop_merchants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    order_num INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS shop_products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price REAL NOT NULL DEFAULT 0,
    category_id INTEGER NOT NULL,
    merchant_id INTEGER,
    image_url TEXT NOT NULL DEFAULT '',
    specifications TEXT NOT NULL DEFAULT '',
    stock INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    create_time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (category_id) REFERENCES shop_categories(id),
    FOREIGN KEY (merchant_id) REFERENCES shop_merchants(id)
);

CREATE INDEX IF NOT EXISTS idx_posts_create_time ON posts(create_time);
CREATE INDEX IF NOT EXISTS idx_replies_post_id ON replies(post_id);
"#;

const POST_COLUMNS: &str = "SELECT p.id, p.title, p.content, p.author, p.board_id, COALESCE(b.name, ''), p.create_time, \
     (SELECT COUNT(*) FROM replies r WHERE r.post_id = p.id) \
     FROM posts p LEFT JOIN boards b ON b.id = p.board_id";

const SHOP_PRODUCT_COLUMNS: &str = "SELECT sp.id, sp.name, sp.description, sp.price, COALESCE(sc.name, ''), sp.image_url, \
     sp.specifications, sp.stock, sp.is_active, sp.create_time \
     FROM shop_products sp LEFT JOIN shop_categories sc ON sc.id = sp.category_id";

/// SQLite 实现
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 打开（或创建）数据库文件并建表
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// 执行任意 SQL（初始化数据 / 测试造数）
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    pub fn create_board(&self, name: &str, description: &str) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO boards (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author: row.get(3)?,
        board_id: row.get(4)?,
        board_name: row.get(5)?,
        create_time: row.get(6)?,
        reply_count: row.get(7)?,
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyRecord> {
    Ok(ReplyRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        author: row.get(2)?,
        signature: row.get(3)?,
        post_id: row.get(4)?,
        create_time: row.get(5)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        product_count: row.get(3)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        model: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        image_url: row.get(5)?,
        category_name: row.get(6)?,
    })
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<MapRegion> {
    Ok(MapRegion {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        x_coord: row.get(3)?,
        y_coord: row.get(4)?,
        place_type: row.get(5)?,
        population: row.get(6)?,
        ai_count: row.get(7)?,
        resources: row.get(8)?,
    })
}

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<MapAgent> {
    Ok(MapAgent {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        status: row.get(3)?,
        description: row.get(4)?,
        capabilities: row.get(5)?,
        place_name: row.get(6)?,
    })
}

fn shop_product_from_row(row: &Row<'_>) -> rusqlite::Result<ShopProduct> {
    Ok(ShopProduct {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category_name: row.get(4)?,
        image_url: row.get(5)?,
        specifications: row.get(6)?,
        stock: row.get(7)?,
        is_active: row.get(8)?,
        create_time: row.get(9)?,
    })
}

impl Store for SqliteStore {
    fn board(&self, id: i64) -> Result<Option<Board>, StoreError> {
        let conn = self.lock()?;
        let board = conn
            .query_row(
                "SELECT b.id, b.name, b.description, (SELECT COUNT(*) FROM posts p WHERE p.board_id = b.id) \
                 FROM boards b WHERE b.id = ?1",
                params![id],
                |row| {
                    Ok(Board {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        post_count: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(board)
    }

    fn boards(&self, limit: usize) -> Result<Vec<Board>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT b.id, b.name, b.description, (SELECT COUNT(*) FROM posts p WHERE p.board_id = b.id) \
             FROM boards b ORDER BY b.id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![sql_limit(limit)], |row| {
            Ok(Board {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                post_count: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn post(&self, id: i64) -> Result<Option<PostRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("{POST_COLUMNS} WHERE p.id = ?1");
        Ok(conn.query_row(&sql, params![id], post_from_row).optional()?)
    }

    fn search_posts(&self, keyword: Option<&str>, limit: usize) -> Result<Vec<PostRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "{POST_COLUMNS} WHERE ?1 IS NULL OR p.title LIKE '%' || ?1 || '%' OR p.content LIKE '%' || ?1 || '%' \
             ORDER BY p.create_time DESC, p.id DESC LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![keyword, sql_limit(limit)], post_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn posts_since(&self, since: NaiveDateTime) -> Result<Vec<PostRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("{POST_COLUMNS} WHERE p.create_time >= ?1 ORDER BY p.create_time DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![since], post_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn author_stats(&self, keyword: Option<&str>, limit: usize) -> Result<Vec<AuthorStats>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT a.author, \
                (SELECT COUNT(*) FROM posts p WHERE p.author = a.author), \
                (SELECT COUNT(*) FROM replies r WHERE r.author = a.author) \
             FROM (SELECT author FROM posts UNION SELECT author FROM replies) a \
             WHERE ?1 IS NULL OR a.author LIKE '%' || ?1 || '%' \
             ORDER BY a.author LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![keyword, sql_limit(limit)], |row| {
            Ok(AuthorStats {
                author: row.get(0)?,
                post_count: row.get(1)?,
                reply_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn distinct_authors(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT TRIM(author) FROM \
             (SELECT author FROM posts UNION ALL SELECT author FROM replies) \
             WHERE TRIM(author) <> '' ORDER BY 1",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_post(&self, post: &NewPost) -> Result<PostRecord, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO posts (title, content, author, board_id, create_time) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![post.title, post.content, post.author, post.board_id, post.create_time],
        )?;
        let id = tx.last_insert_rowid();
        let sql = format!("{POST_COLUMNS} WHERE p.id = ?1");
        let record = tx
            .query_row(&sql, params![id], post_from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("post {id}")))?;
        tx.commit()?;
        Ok(record)
    }

    fn create_reply(&self, reply: &NewReply) -> Result<ReplyRecord, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO replies (content, author, signature, post_id, create_time) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![reply.content, reply.author, reply.signature, reply.post_id, reply.create_time],
        )?;
        let id = tx.last_insert_rowid();
        let record = tx
            .query_row(
                "SELECT id, content, author, signature, post_id, create_time FROM replies WHERE id = ?1",
                params![id],
                reply_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("reply {id}")))?;
        tx.commit()?;
        Ok(record)
    }

    fn share_exists(&self, share_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM disk_shares WHERE share_id = ?1",
            params![share_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_disk_share(&self, share: &NewDiskShare) -> Result<DiskShare, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO disk_shares (share_id, password, file_name, file_path, create_time) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![share.share_id, share.password, share.file_name, share.file_path, share.create_time],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(DiskShare {
            id,
            share_id: share.share_id.clone(),
            password: share.password.clone(),
            file_name: share.file_name.clone(),
            file_path: share.file_path.clone(),
            create_time: share.create_time,
        })
    }

    fn company_info(&self) -> Result<Option<CompanyInfo>, StoreError> {
        let conn = self.lock()?;
        let info = conn
            .query_row(
                "SELECT id, name, description, founded_year, address, phone, email, website, slogan \
                 FROM company_info ORDER BY id LIMIT 1",
                [],
                |row| {
                    Ok(CompanyInfo {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        founded_year: row.get(3)?,
                        address: row.get(4)?,
                        phone: row.get(5)?,
                        email: row.get(6)?,
                        website: row.get(7)?,
                        slogan: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    fn product_categories(&self, limit: usize) -> Result<Vec<Category>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.description, (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) \
             FROM product_categories c ORDER BY c.order_num, c.id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![sql_limit(limit)], category_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let conn = self.lock()?;
        let product = conn
            .query_row(
                "SELECT p.id, p.name, p.model, p.description, p.price, p.image_url, COALESCE(c.name, '') \
                 FROM products p LEFT JOIN product_categories c ON c.id = p.category_id WHERE p.id = ?1",
                params![id],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    fn products(&self, category_id: Option<i64>, limit: usize) -> Result<Vec<Product>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.model, p.description, p.price, p.image_url, COALESCE(c.name, '') \
             FROM products p LEFT JOIN product_categories c ON c.id = p.category_id \
             WHERE p.is_active = 1 AND (?1 IS NULL OR p.category_id = ?1) \
             ORDER BY p.create_time DESC, p.id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![category_id, sql_limit(limit)], product_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_region(&self, id: i64) -> Result<Option<MapRegion>, StoreError> {
        let conn = self.lock()?;
        let region = conn
            .query_row(
                "SELECT id, name, description, x_coord, y_coord, region_type, population, ai_count, resources \
                 FROM map_regions WHERE id = ?1",
                params![id],
                region_from_row,
            )
            .optional()?;
        Ok(region)
    }

    fn map_regions(&self, keyword: Option<&str>, limit: usize) -> Result<Vec<MapRegion>, StoreError> {
        let conn = self.lock()?;
        // 列表不返回 resources 字段
        let mut stmt = conn.prepare(
            "SELECT id, name, description, x_coord, y_coord, region_type, population, ai_count, NULL \
             FROM map_regions \
             WHERE is_public = 1 AND (?1 IS NULL OR name LIKE '%' || ?1 || '%' OR description LIKE '%' || ?1 || '%') \
             ORDER BY id LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![keyword, sql_limit(limit)], region_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_agent(&self, id: i64) -> Result<Option<MapAgent>, StoreError> {
        let conn = self.lock()?;
        let agent = conn
            .query_row(
                "SELECT a.id, a.name, a.type, a.status, a.description, a.capabilities, COALESCE(r.name, '') \
                 FROM map_agents a LEFT JOIN map_regions r ON r.id = a.region_id WHERE a.id = ?1",
                params![id],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    fn map_agents(&self, region_id: Option<i64>, limit: usize) -> Result<Vec<MapAgent>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name, a.type, a.status, a.description, NULL, COALESCE(r.name, '') \
             FROM map_agents a LEFT JOIN map_regions r ON r.id = a.region_id \
             WHERE ?1 IS NULL OR a.region_id = ?1 ORDER BY a.id LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![region_id, sql_limit(limit)], agent_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn shop_categories(&self, limit: usize) -> Result<Vec<Category>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.description, (SELECT COUNT(*) FROM shop_products p WHERE p.category_id = c.id) \
             FROM shop_categories c ORDER BY c.order_num, c.id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![sql_limit(limit)], category_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn shop_products(
        &self,
        category_id: Option<i64>,
        keyword: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ShopProduct>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "{SHOP_PRODUCT_COLUMNS} WHERE sp.is_active = 1 \
             AND (?1 IS NULL OR sp.category_id = ?1) \
             AND (?2 IS NULL OR sp.name LIKE '%' || ?2 || '%') \
             ORDER BY sp.create_time DESC, sp.id DESC LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![category_id, keyword, sql_limit(limit)],
            shop_product_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn shop_product(&self, id: i64) -> Result<Option<ShopProduct>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("{SHOP_PRODUCT_COLUMNS} WHERE sp.id = ?1");
        Ok(conn.query_row(&sql, params![id], shop_product_from_row).optional()?)
    }

    fn merchants(&self, limit: usize) -> Result<Vec<Merchant>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.name, m.description, (SELECT COUNT(*) FROM shop_products p WHERE p.merchant_id = m.id) \
             FROM shop_merchants m ORDER BY m.order_num, m.id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![sql_limit(limit)], |row| {
            Ok(Merchant {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                product_count: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn new_post(board_id: i64, author: &str) -> NewPost {
        NewPost {
            title: "标题".to_string(),
            content: "内容".to_string(),
            author: author.to_string(),
            board_id,
            create_time: now(),
        }
    }

    #[test]
    fn test_create_post_and_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let board_id = store.create_board("技术讨论区", "").unwrap();
        let post = store.create_post(&new_post(board_id, "路人甲")).unwrap();
        assert!(post.id > 0);
        assert_eq!(post.board_name, "技术讨论区");

        let fetched = store.post(post.id).unwrap().unwrap();
        assert_eq!(fetched.author, "路人甲");
        assert_eq!(fetched.reply_count, 0);
        assert!(store.post(999).unwrap().is_none());
    }

    #[test]
    fn test_post_on_missing_board_is_rejected_without_partial_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.create_post(&new_post(42, "路人甲")).is_err());
        assert!(store.search_posts(None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_distinct_authors_merge_posts_and_replies() {
        let store = SqliteStore::open_in_memory().unwrap();
        let board_id = store.create_board("生活闲聊区", "").unwrap();
        let post = store.create_post(&new_post(board_id, "吃货小张")).unwrap();
        store
            .create_reply(&NewReply {
                content: "同意".to_string(),
                author: " 闲聊达人 ".to_string(),
                signature: String::new(),
                post_id: post.id,
                create_time: now(),
            })
            .unwrap();
        store
            .create_reply(&NewReply {
                content: "+1".to_string(),
                author: "吃货小张".to_string(),
                signature: String::new(),
                post_id: post.id,
                create_time: now(),
            })
            .unwrap();

        let authors = store.distinct_authors().unwrap();
        assert_eq!(authors, vec!["吃货小张".to_string(), "闲聊达人".to_string()]);

        let stats = store.author_stats(Some("吃货"), 10).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].post_count, 1);
        assert_eq!(stats[0].reply_count, 1);
    }

    #[test]
    fn test_share_id_uniqueness() {
        let store = SqliteStore::open_in_memory().unwrap();
        let share = NewDiskShare {
            share_id: "abcd1234".to_string(),
            password: "123456".to_string(),
            file_name: "a.txt".to_string(),
            file_path: "/static/files/online_disk/a.txt".to_string(),
            create_time: now(),
        };
        assert!(!store.share_exists("abcd1234").unwrap());
        store.create_disk_share(&share).unwrap();
        assert!(store.share_exists("abcd1234").unwrap());
        assert!(store.create_disk_share(&share).is_err());
    }

    #[test]
    fn test_posts_since_filters_old_posts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let board_id = store.create_board("游戏娱乐区", "").unwrap();
        let mut old = new_post(board_id, "路人甲");
        old.create_time = now() - chrono::Duration::hours(48);
        store.create_post(&old).unwrap();
        let fresh = store.create_post(&new_post(board_id, "路人乙")).unwrap();

        let recent = store.posts_since(now() - chrono::Duration::hours(24)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, fresh.id);
    }

    #[test]
    fn test_open_reports_unusable_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = SqliteStore::open(blocker.join("forum.db")).err().unwrap();
        assert!(matches!(err, StoreError::Io(_)), "{err:?}");
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("forum.db");
        SqliteStore::open(&path).unwrap();
        assert!(path.exists());
    }
}
