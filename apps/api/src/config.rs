use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, Weekday};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    /// Base URL of the analytics backend. Unset means no trend signal.
    pub analytics_url: Option<String>,
    pub port: u16,
    pub rust_log: String,

    /// Target language codes; one generation job per language.
    pub languages: Vec<String>,
    /// Upper bound on jobs in flight during a planning cycle.
    pub max_concurrent_jobs: usize,
    /// A failed job below this count is re-queued on the next planning cycle.
    pub max_job_attempts: i32,
    /// Validity window applied at save time. Unset means no expiry.
    pub content_validity_days: Option<i64>,
    pub podcast_voice: String,

    pub planning_weekday: Weekday,
    pub planning_hour: u32,
    pub publish_delay_hours: i64,
    /// Fixed reference offset for the weekly schedule (default UTC+7).
    pub schedule_offset: FixedOffset,

    pub trend_crop_weight: f64,
    pub trend_region_weight: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let planning_hour = env_parse("PLANNING_HOUR", 0u32)?;
        if planning_hour > 23 {
            bail!("PLANNING_HOUR must be 0..=23, got {planning_hour}");
        }

        let offset_hours = env_parse("SCHEDULE_UTC_OFFSET_HOURS", 7i32)?;
        let schedule_offset = FixedOffset::east_opt(offset_hours * 3600)
            .with_context(|| format!("SCHEDULE_UTC_OFFSET_HOURS {offset_hours} out of range"))?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            analytics_url: std::env::var("ANALYTICS_URL").ok().filter(|s| !s.is_empty()),
            port: env_parse("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            languages: parse_languages(
                &std::env::var("CONTENT_LANGUAGES").unwrap_or_else(|_| "vi".to_string()),
            )?,
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS", 3usize)?,
            max_job_attempts: env_parse("MAX_JOB_ATTEMPTS", 3i32)?,
            content_validity_days: match std::env::var("CONTENT_VALIDITY_DAYS") {
                Ok(v) => Some(
                    v.parse::<i64>()
                        .context("CONTENT_VALIDITY_DAYS must be a whole number of days")?,
                ),
                Err(_) => None,
            },
            podcast_voice: std::env::var("PODCAST_VOICE").unwrap_or_else(|_| "Kore".to_string()),
            planning_weekday: match std::env::var("PLANNING_WEEKDAY") {
                Ok(raw) => parse_weekday(&raw)?,
                Err(_) => Weekday::Sun,
            },
            planning_hour,
            publish_delay_hours: env_parse("PUBLISH_DELAY_HOURS", 24i64)?,
            schedule_offset,
            trend_crop_weight: env_parse("TREND_CROP_WEIGHT", 1.0f64)?,
            trend_region_weight: env_parse("TREND_REGION_WEIGHT", 0.5f64)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses an optional env var, falling back to `default` when unset.
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

fn parse_weekday(raw: &str) -> Result<Weekday> {
    match raw.to_ascii_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => bail!("PLANNING_WEEKDAY must be a weekday name, got '{raw}'"),
    }
}

fn parse_languages(raw: &str) -> Result<Vec<String>> {
    let languages: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if languages.is_empty() {
        bail!("CONTENT_LANGUAGES must name at least one language code");
    }
    Ok(languages)
}
