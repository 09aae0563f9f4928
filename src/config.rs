use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub min_spacing_ms: i64,
    pub sweep_interval_ms: u64,
    pub accounts: Vec<AccountConfig>,
    pub extract_url: String,
    pub render_url: String,
    pub post_url: String,
    pub log_level: String,
}

/// One publishing account, listed in router priority order. The single
/// account without a daily cap is the overflow account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub name: String,
    pub daily_cap: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("REELQUEUE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid REELQUEUE_HOST: {e}"))?;

        let port: u16 = env_or("REELQUEUE_PORT", "3001")
            .parse()
            .map_err(|e| format!("Invalid REELQUEUE_PORT: {e}"))?;

        let data_dir = PathBuf::from(env_or("REELQUEUE_DATA_DIR", "./data"));

        // 20 minutes between items in the same account's queue
        let min_spacing_ms: i64 = env_or("REELQUEUE_MIN_SPACING_MS", "1200000")
            .parse()
            .map_err(|e| format!("Invalid REELQUEUE_MIN_SPACING_MS: {e}"))?;

        let sweep_interval_ms: u64 = env_or("REELQUEUE_SWEEP_INTERVAL_MS", "60000")
            .parse()
            .map_err(|e| format!("Invalid REELQUEUE_SWEEP_INTERVAL_MS: {e}"))?;

        let accounts = parse_accounts(&env_or("REELQUEUE_ACCOUNTS", "main:3,backup"))?;

        let extract_url = env_or("REELQUEUE_EXTRACT_URL", "http://localhost:3002/api/extract");
        let render_url = env_or("REELQUEUE_RENDER_URL", "http://localhost:3002/api/render");
        let post_url = env_or("REELQUEUE_POST_URL", "http://localhost:3002/api/post");

        let log_level = env_or("REELQUEUE_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            data_dir,
            min_spacing_ms,
            sweep_interval_ms,
            accounts,
            extract_url,
            render_url,
            post_url,
            log_level,
        })
    }
}

/// Parse `REELQUEUE_ACCOUNTS`: a comma list in priority order, `name:cap`
/// for capped accounts, a bare `name` for the overflow account. Exactly one
/// overflow account is required.
fn parse_accounts(raw: &str) -> Result<Vec<AccountConfig>, String> {
    let mut accounts: Vec<AccountConfig> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let account = match entry.split_once(':') {
            Some((name, cap)) => AccountConfig {
                name: name.trim().to_string(),
                daily_cap: Some(cap.trim().parse().map_err(|e| {
                    format!("Invalid cap in REELQUEUE_ACCOUNTS entry '{entry}': {e}")
                })?),
            },
            None => AccountConfig {
                name: entry.to_string(),
                daily_cap: None,
            },
        };

        if accounts.iter().any(|a| a.name == account.name) {
            return Err(format!(
                "Duplicate account in REELQUEUE_ACCOUNTS: {}",
                account.name
            ));
        }

        accounts.push(account);
    }

    if accounts.is_empty() {
        return Err("REELQUEUE_ACCOUNTS must name at least one account".to_string());
    }

    let overflow_count = accounts.iter().filter(|a| a.daily_cap.is_none()).count();
    if overflow_count != 1 {
        return Err(format!(
            "REELQUEUE_ACCOUNTS must have exactly one uncapped (overflow) account, found {overflow_count}"
        ));
    }

    Ok(accounts)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
