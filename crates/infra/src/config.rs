use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use shopfloor_core::{CompanyId, PeriodId, UserId};
use shopfloor_queries::FilterConfig;

use crate::confirmation::DEFAULT_WINDOW;
use crate::dispatcher::ErrorPolicy;

/// Dispatcher configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub company_id: CompanyId,
    pub period_id: PeriodId,
    /// Recorded as `INSERTUSERID` on queue rows.
    pub user_id: UserId,
    /// `"<code>|<label>"`; when set, its code replaces the request's mode.
    pub mode_option: Option<String>,
    pub confirm_window: Duration,
    pub error_policy: ErrorPolicy,
    pub filter: FilterConfig,
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => bail!("{key} must be a boolean (1/0/true/false/yes/no), got {other:?}"),
    }
}

impl Settings {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let flag = |key: &str| -> Result<bool> {
            lookup(key).map_or(Ok(false), |raw| parse_bool(key, &raw))
        };

        let confirm_window = match lookup("SHOPFLOOR_CONFIRM_WINDOW_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .context("SHOPFLOOR_CONFIRM_WINDOW_MS must be a valid number")?,
            ),
            None => DEFAULT_WINDOW,
        };

        let error_policy = if flag("SHOPFLOOR_THROW_ERRORS")? {
            ErrorPolicy::Raise
        } else {
            ErrorPolicy::Deliver
        };

        Ok(Self {
            company_id: required("SHOPFLOOR_COMPANY_ID")?
                .parse()
                .context("SHOPFLOOR_COMPANY_ID must be a valid number")?,
            period_id: required("SHOPFLOOR_PERIOD_ID")?
                .parse()
                .context("SHOPFLOOR_PERIOD_ID must be a valid number")?,
            user_id: required("SHOPFLOOR_USER_ID")?
                .parse()
                .context("SHOPFLOOR_USER_ID must be a valid number")?,
            mode_option: lookup("SHOPFLOOR_MODE").filter(|m| !m.trim().is_empty()),
            confirm_window,
            error_policy,
            filter: FilterConfig {
                show_only_upcoming: flag("SHOPFLOOR_SHOW_ONLY_UPCOMING")?,
                show_only_past: flag("SHOPFLOOR_SHOW_ONLY_PAST")?,
                scope_by_same_station_group: flag("SHOPFLOOR_SCOPE_BY_STATION_GROUP")?,
                scope_by_same_work_center: flag("SHOPFLOOR_SCOPE_BY_WORK_CENTER")?,
                ignore_quantity_exhausted: flag("SHOPFLOOR_IGNORE_QUANTITY_EXHAUSTED")?,
                line_production_finish_on_complete: flag("SHOPFLOOR_LINE_PRODUCTION_FINISH_ON_COMPLETE")?,
                gate_previous_operation_working: flag("SHOPFLOOR_GATE_PREVIOUS_WORKING")?,
                gate_previous_operation_production: flag("SHOPFLOOR_GATE_PREVIOUS_PRODUCTION")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SHOPFLOOR_COMPANY_ID", "1"),
        ("SHOPFLOOR_PERIOD_ID", "2024"),
        ("SHOPFLOOR_USER_ID", "7"),
    ];

    #[test]
    fn defaults() {
        let s = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(s.company_id, CompanyId::new(1));
        assert_eq!(s.period_id, PeriodId::new(2024));
        assert_eq!(s.user_id, UserId::new(7));
        assert_eq!(s.confirm_window, Duration::from_millis(2000));
        assert_eq!(s.error_policy, ErrorPolicy::Deliver);
        assert_eq!(s.filter, FilterConfig::default());
        assert_eq!(s.mode_option, None);
    }

    #[test]
    fn toggles_and_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("SHOPFLOOR_THROW_ERRORS", "TRUE"),
            ("SHOPFLOOR_CONFIRM_WINDOW_MS", "5000"),
            ("SHOPFLOOR_MODE", "100|Get open jobs"),
            ("SHOPFLOOR_SCOPE_BY_WORK_CENTER", "yes"),
            ("SHOPFLOOR_IGNORE_QUANTITY_EXHAUSTED", "1"),
        ]);
        let s = Settings::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(s.error_policy, ErrorPolicy::Raise);
        assert_eq!(s.confirm_window, Duration::from_secs(5));
        assert_eq!(s.mode_option.as_deref(), Some("100|Get open jobs"));
        assert!(s.filter.scope_by_same_work_center);
        assert!(s.filter.ignore_quantity_exhausted);
        assert!(!s.filter.show_only_past);
    }

    #[test]
    fn missing_and_malformed_values_name_the_variable() {
        let err = Settings::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("SHOPFLOOR_USER_ID"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SHOPFLOOR_SHOW_ONLY_PAST", "maybe"));
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("SHOPFLOOR_SHOW_ONLY_PAST"));

        let pairs = [("SHOPFLOOR_COMPANY_ID", "acme"), REQUIRED[1], REQUIRED[2]];
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("SHOPFLOOR_COMPANY_ID"));
    }
}
