use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub valuation_base_url: String,
    pub valuation_api_key: String,
    pub valuation_api_host: Option<String>, // RapidAPI host header, only needed behind the gateway
    pub assessment_base_url: String,
    pub assessment_api_key: String,
    pub store_base_url: String,
    pub store_base_id: String,
    pub store_table: String,
    pub store_token: String,
    pub http_timeout_secs: u64,
    pub is_buying_home_default: Option<bool>, // unset leaves the field null
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            valuation_base_url: required_url("VALUATION_BASE_URL")?,
            valuation_api_key: required("VALUATION_API_KEY")?,
            valuation_api_host: std::env::var("VALUATION_API_HOST")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            assessment_base_url: required_url("ASSESSMENT_BASE_URL")?,
            assessment_api_key: required("ASSESSMENT_API_KEY")?,
            store_base_url: match std::env::var("STORE_BASE_URL") {
                Ok(_) => required_url("STORE_BASE_URL")?,
                Err(_) => "https://api.airtable.com/v0".to_string(),
            },
            store_base_id: required("STORE_BASE_ID")?,
            store_table: std::env::var("STORE_TABLE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Properties".to_string()),
            store_token: required("STORE_TOKEN")?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a whole number of seconds"))?,
            is_buying_home_default: std::env::var("IS_BUYING_HOME_DEFAULT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<bool>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("IS_BUYING_HOME_DEFAULT must be true or false"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Valuation Base URL: {}", config.valuation_base_url);
        if let Some(ref host) = config.valuation_api_host {
            tracing::info!("Valuation API host header configured: {}", host);
        }
        tracing::debug!("Assessment Base URL: {}", config.assessment_base_url);
        tracing::debug!(
            "Record store: {} (table '{}')",
            config.store_base_url,
            config.store_table
        );
        if let Some(flag) = config.is_buying_home_default {
            tracing::info!("is_buying_home default configured: {}", flag);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

fn required_url(name: &str) -> anyhow::Result<String> {
    let url = required(name)?;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}
