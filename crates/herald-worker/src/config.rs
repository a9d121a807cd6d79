// Service configuration
// Decision: Option fields populated from the environment, defaults applied in
//           accessor methods so callers never see a half-configured value

use chrono_tz::Tz;

/// Configuration for the Herald service
#[derive(Debug, Clone, Default)]
pub struct HeraldConfig {
    /// Topic all broadcast notifications go to
    pub topic: Option<String>,
    /// IANA timezone name for date formatting and digest day boundaries
    pub timezone: Option<String>,
    /// Local hour (0-23) at which the daily digest fires
    pub reminder_hour: Option<u32>,
}

impl HeraldConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            topic: std::env::var("HERALD_TOPIC").ok(),
            timezone: std::env::var("HERALD_TIMEZONE").ok(),
            reminder_hour: std::env::var("HERALD_REMINDER_HOUR")
                .ok()
                .and_then(|value| value.parse().ok()),
        }
    }

    /// Get the broadcast topic with default
    pub fn topic(&self) -> String {
        self.topic.clone().unwrap_or_else(|| "events".to_string())
    }

    /// Get the deployment timezone with default.
    ///
    /// An unparseable name falls back to the default zone; recipients are
    /// assumed co-located with the deployment.
    pub fn timezone(&self) -> Tz {
        self.timezone
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or(chrono_tz::America::New_York)
    }

    /// Get the daily reminder hour with default
    pub fn reminder_hour(&self) -> u32 {
        self.reminder_hour.unwrap_or(8).min(23)
    }
}
