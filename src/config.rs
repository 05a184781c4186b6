use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;

/// 示例配置里的占位密钥，任何人都可以用它签发管理员 token
const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub ops: OpsEnvConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 管理后台凭据与紧急冻结开关
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// bcrypt 哈希后的管理员密码；为空时拒绝登录
    #[serde(default)]
    pub password_hash: String,
    /// 冻结后所有管理操作在触碰数据前直接失败
    #[serde(default)]
    pub frozen: bool,
}

/// 外部定时触发器使用的共享密钥（与管理员凭据相互独立）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CronConfig {
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// IANA 时区名，日切按该时区的墙上时间计算
    pub timezone: String,
    pub cutover_hour: u32,
    pub cutover_minute: u32,
    /// 新一期开奖池初始金额（最小货币单位）
    pub base_pool_amount: i64,
    /// 每张票为奖池增加的金额
    pub entry_contribution: i64,
    /// 认领超过该秒数仍无结果，视为可重试
    pub stale_claim_after_secs: i64,
    /// 每轮最多处理的 bonus drop 数量
    pub bonus_batch_limit: u64,
    /// 每轮最多自动开奖的期数
    pub draw_batch_limit: u64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Paris".to_string(),
            cutover_hour: 22,
            cutover_minute: 0,
            base_pool_amount: 0,
            entry_contribution: 0,
            stale_claim_after_secs: 300,
            bonus_batch_limit: 25,
            draw_batch_limit: 10,
        }
    }
}

/// 部署级自动化开关（AUTO_DRAW_ENABLED），优先级高于数据库中的期望模式
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpsEnvConfig {
    #[serde(default)]
    pub auto_allowed: bool,
}

/// 进程内触发器；0 表示关闭，完全依赖外部 cron 调用
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub interval_secs: u64,
}

/// 布尔环境变量: 1 / true / yes / on 视为开启
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET").unwrap_or_default(),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    admin: AdminConfig::default(),
                    cron: CronConfig::default(),
                    draw: DrawConfig::default(),
                    ops: OpsEnvConfig::default(),
                    scheduler: SchedulerConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// 启动前检查必须提供的密钥；失败时不会触碰任何数据
    pub fn validate(&self) -> Result<(), AppError> {
        let secret = self.jwt.secret.trim();
        if secret.is_empty() {
            return Err(AppError::ConfigError("JWT_SECRET is not configured".into()));
        }
        if secret == PLACEHOLDER_JWT_SECRET {
            return Err(AppError::ConfigError(
                "JWT_SECRET still uses the example placeholder".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = env_parse("SERVER_PORT") {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = env_parse("DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(n) = env_parse("JWT_ACCESS_EXPIRES_IN") {
            self.jwt.access_token_expires_in = n;
        }

        // Admin / cron
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            self.admin.password_hash = v;
        }
        if let Ok(v) = env::var("ADMIN_FROZEN") {
            self.admin.frozen = parse_flag(&v);
        }
        if let Ok(v) = env::var("CRON_SECRET") {
            self.cron.secret = v;
        }

        // Draw
        if let Ok(v) = env::var("DRAW_TIMEZONE") {
            self.draw.timezone = v;
        }
        if let Some(h) = env_parse("DRAW_CUTOVER_HOUR") {
            self.draw.cutover_hour = h;
        }
        if let Some(m) = env_parse("DRAW_CUTOVER_MINUTE") {
            self.draw.cutover_minute = m;
        }
        if let Some(n) = env_parse("DRAW_BASE_POOL") {
            self.draw.base_pool_amount = n;
        }
        if let Some(n) = env_parse("DRAW_ENTRY_CONTRIBUTION") {
            self.draw.entry_contribution = n;
        }
        if let Some(n) = env_parse("DRAW_STALE_CLAIM_SECS") {
            self.draw.stale_claim_after_secs = n;
        }
        if let Some(n) = env_parse("BONUS_BATCH_LIMIT") {
            self.draw.bonus_batch_limit = n;
        }
        if let Some(n) = env_parse("DRAW_BATCH_LIMIT") {
            self.draw.draw_batch_limit = n;
        }

        // 部署级自动化开关
        if let Ok(v) = env::var("AUTO_DRAW_ENABLED") {
            self.ops.auto_allowed = parse_flag(&v);
        }

        if let Some(n) = env_parse("SCHEDULER_INTERVAL_SECS") {
            self.scheduler.interval_secs = n;
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}
