//! Server configuration
//!
//! # 环境变量
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | ./data | 工作目录 (redb 数据库、日志) |
//! | HTTP_PORT | 3000 | HTTP/WebSocket 服务端口 |
//! | STORE_TZ | Asia/Ho_Chi_Minh | 业务时区 |
//! | LOG_LEVEL | info | 日志级别 |
//! | LOG_DIR | (无) | 滚动日志目录，缺省仅输出到终端 |
//! | ENVIRONMENT | development | 运行环境 |

use chrono_tz::Tz;

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the redb database and logs
    pub work_dir: String,
    /// HTTP API + WebSocket port
    pub http_port: u16,
    /// Business timezone: order-number resets and happy-hour windows
    pub timezone: Tz,
    /// Log level (trace|debug|info|warn|error)
    pub log_level: String,
    /// Optional directory for daily-rolling log files
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let timezone = std::env::var("STORE_TZ")
            .ok()
            .and_then(|tz| {
                tz.parse::<Tz>()
                    .map_err(|_| tracing::warn!(tz, "Invalid STORE_TZ, using default"))
                    .ok()
            })
            .unwrap_or(chrono_tz::Asia::Ho_Chi_Minh);

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            timezone,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Path of the order database inside the working directory
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("orders.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "./data".into(),
            http_port: 3000,
            timezone: chrono_tz::Asia::Ho_Chi_Minh,
            log_level: "info".into(),
            log_dir: None,
            environment: "development".into(),
        }
    }
}
