use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default page size for app queries
pub const DEFAULT_APP_LIMIT: i64 = 10;
/// Largest page size a client may request
pub const MAX_APP_LIMIT: i64 = 100;

/// `[key, description]` pair describing an environment variable an app needs
pub type EnvVarSpec = Vec<String>;

/// A published application owned by a Telegram user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserApp {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub description: String,
    pub required_env_vars: Vec<EnvVarSpec>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_telegram_id: String,
}

/// Body of `POST /api/v1/user-apps`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAppCreate {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub required_env_vars: Vec<EnvVarSpec>,
    pub telegram_id: String,
}

/// Body of `PATCH /api/v1/user-apps/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAppUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub required_env_vars: Option<Vec<EnvVarSpec>>,
    pub is_active: Option<bool>,
}

/// Query string of `GET /api/v1/user-apps`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAppFilter {
    pub telegram_id: Option<String>,
    pub is_active: Option<bool>,
    pub name_contains: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_app_limit")]
    pub limit: i64,
}

fn default_app_limit() -> i64 {
    DEFAULT_APP_LIMIT
}

impl Default for UserAppFilter {
    fn default() -> Self {
        Self {
            telegram_id: None,
            is_active: None,
            name_contains: None,
            skip: 0,
            limit: DEFAULT_APP_LIMIT,
        }
    }
}

impl UserAppFilter {
    pub fn validate(&self) -> Result<(), String> {
        if self.skip < 0 {
            return Err("skip must be greater than or equal to 0".to_string());
        }
        if !(1..=MAX_APP_LIMIT).contains(&self.limit) {
            return Err(format!("limit must be between 1 and {}", MAX_APP_LIMIT));
        }
        Ok(())
    }

    /// Case-insensitive substring match used by in-memory filtering
    pub fn name_matches(&self, name: &str) -> bool {
        match &self.name_contains {
            Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Validated values for inserting an app
#[derive(Debug, Clone)]
pub struct NewUserApp {
    pub name: String,
    pub url: String,
    pub description: String,
    pub required_env_vars: Vec<EnvVarSpec>,
}

/// Accept only absolute http(s) URLs
pub fn validate_app_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("Invalid URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url.to_string()),
        _ => Err(format!("URL must use http or https: {}", raw)),
    }
}

fn validate_env_vars(vars: &[EnvVarSpec]) -> Result<(), String> {
    for pair in vars {
        match pair.first() {
            Some(key) if !key.trim().is_empty() && pair.len() <= 2 => {}
            _ => {
                return Err(
                    "required_env_vars entries must be [key, description] pairs".to_string(),
                )
            }
        }
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Application name must not be empty".to_string());
    }
    Ok(())
}

impl UserAppCreate {
    /// Validate and normalize into insertable values
    pub fn into_new_app(self) -> Result<(String, NewUserApp), String> {
        validate_name(&self.name)?;
        if self.telegram_id.trim().is_empty() {
            return Err("telegram_id must not be empty".to_string());
        }
        let url = validate_app_url(&self.url)?;
        validate_env_vars(&self.required_env_vars)?;

        Ok((
            self.telegram_id.trim().to_string(),
            NewUserApp {
                name: self.name.trim().to_string(),
                url,
                description: self.description,
                required_env_vars: self.required_env_vars,
            },
        ))
    }
}

impl UserAppUpdate {
    /// Validate present fields, normalizing the URL in place
    pub fn validated(mut self) -> Result<Self, String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(url) = &self.url {
            self.url = Some(validate_app_url(url)?);
        }
        if let Some(vars) = &self.required_env_vars {
            validate_env_vars(vars)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.required_env_vars.is_none()
            && self.is_active.is_none()
    }

    /// Apply the present fields to an app, bumping `updated_at`
    pub fn apply_to(&self, app: &mut UserApp, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            app.name = name.trim().to_string();
        }
        if let Some(url) = &self.url {
            app.url = url.clone();
        }
        if let Some(description) = &self.description {
            app.description = description.clone();
        }
        if let Some(vars) = &self.required_env_vars {
            app.required_env_vars = vars.clone();
        }
        if let Some(is_active) = self.is_active {
            app.is_active = is_active;
        }
        app.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(url: &str) -> UserAppCreate {
        UserAppCreate {
            name: "My Weather App".into(),
            url: url.into(),
            description: "Shows current weather".into(),
            required_env_vars: vec![vec!["API_KEY".into(), "Your OpenWeather API key".into()]],
            telegram_id: "123456789".into(),
        }
    }

    #[test]
    fn test_create_validation() {
        let (telegram_id, app) = create("https://weather-app.example.com").into_new_app().unwrap();
        assert_eq!(telegram_id, "123456789");
        assert_eq!(app.url, "https://weather-app.example.com/");
        assert_eq!(app.required_env_vars.len(), 1);
    }

    #[test]
    fn test_url_must_be_http() {
        assert!(create("ftp://files.example.com").into_new_app().is_err());
        assert!(create("not a url").into_new_app().is_err());
    }

    #[test]
    fn test_env_var_pairs() {
        let mut bad = create("https://example.com");
        bad.required_env_vars = vec![vec![]];
        assert!(bad.into_new_app().is_err());
    }

    #[test]
    fn test_filter_limits() {
        assert!(UserAppFilter::default().validate().is_ok());
        let filter = UserAppFilter { limit: 0, ..Default::default() };
        assert!(filter.validate().is_err());
        let filter = UserAppFilter { limit: 101, ..Default::default() };
        assert!(filter.validate().is_err());
        let filter = UserAppFilter { skip: -1, ..Default::default() };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_name_matching_is_case_insensitive() {
        let filter = UserAppFilter {
            name_contains: Some("WEATHER".into()),
            ..Default::default()
        };
        assert!(filter.name_matches("My weather app"));
        assert!(!filter.name_matches("Calendar"));
    }

    #[test]
    fn test_update_applies_present_fields() {
        let now = Utc::now();
        let mut app = UserApp {
            id: Uuid::new_v4(),
            name: "Old".into(),
            url: "https://old.example.com/".into(),
            description: "d".into(),
            required_env_vars: vec![],
            is_active: true,
            created_at: now,
            updated_at: now,
            owner_telegram_id: "1".into(),
        };
        let update = UserAppUpdate {
            is_active: Some(false),
            url: Some("https://new.example.com".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();

        update.apply_to(&mut app, now + chrono::Duration::seconds(5));
        assert!(!app.is_active);
        assert_eq!(app.name, "Old");
        assert_eq!(app.url, "https://new.example.com/");
        assert!(app.updated_at > app.created_at);
    }
}
