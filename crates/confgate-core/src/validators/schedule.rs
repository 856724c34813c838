//! Cron special times and IANA timezones

use super::expect_str;
use crate::registry::{CheckResult, ValidatorContext};
use crate::value::Value;
use std::path::{Path, PathBuf};

/// `@`-less special schedule names understood by cron
pub const CRON_SPECIAL_TIMES: [&str; 7] = ["annually", "daily", "hourly", "monthly", "reboot", "weekly", "yearly"];

const DEFAULT_ZONEINFO: &str = "/usr/share/zoneinfo";

pub fn cron_special_time(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    let name = expect_str(value)?;
    if CRON_SPECIAL_TIMES.contains(&name) {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not a cron special time; expected one of {}",
            name,
            CRON_SPECIAL_TIMES.join(", ")
        ))
    }
}

fn zoneinfo_dir() -> PathBuf {
    std::env::var_os("ZONEINFO")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ZONEINFO))
}

/// `Area/Location[/Sub]` made of letters, digits, `_`, `-` and `+`
fn has_zone_shape(name: &str) -> bool {
    let mut parts = name.split('/');
    let area_ok = parts
        .next()
        .is_some_and(|area| !area.is_empty() && area.chars().all(|c| c.is_ascii_alphabetic()));
    let mut rest = parts.peekable();
    area_ok
        && rest.peek().is_some()
        && rest.all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
        })
}

fn check_timezone(name: &str, zoneinfo: &Path, ctx: &ValidatorContext<'_>) -> CheckResult {
    if name == "UTC" || name == "Local" {
        return Ok(());
    }
    if !has_zone_shape(name) {
        return Err(format!(
            "'{}' is not a valid timezone; expected an IANA name such as Europe/Berlin",
            name
        ));
    }
    if !zoneinfo.is_dir() {
        ctx.warn(format!(
            "timezone database not found at {}; '{}' was only checked for shape",
            zoneinfo.display(),
            name
        ));
        return Ok(());
    }
    if zoneinfo.join(name).is_file() {
        Ok(())
    } else {
        Err(format!("unknown timezone '{}'", name))
    }
}

/// `UTC`, `Local`, or an IANA zone present in the system timezone database
pub fn timezone(value: &Value, ctx: &ValidatorContext<'_>) -> CheckResult {
    check_timezone(expect_str(value)?, &zoneinfo_dir(), ctx)
}
