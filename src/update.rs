//! Update notification check
//!
//! After a successful run, Remake may ask the GitHub releases API whether a
//! newer version exists and print a one-line notice. The check is best
//! effort: any network, decode, or filesystem problem silently produces no
//! notice. Checks are rate-limited to once per day through a stamp file in
//! the user cache directory.

use directories::ProjectDirs;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

const CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const HTTP_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
    html_url: Option<String>,
}

/// Return an update notice when a newer release exists, else None.
///
/// Disabled for dev builds, when `REMAKE_NO_UPDATE_CHECK=1`, when no repo is
/// configured, or when a check already ran within the last day.
pub fn check_latest(current_version: &str, default_repo: Option<&str>) -> Option<String> {
    if current_version.is_empty() || current_version == "dev" {
        return None;
    }
    if env::var("REMAKE_NO_UPDATE_CHECK").ok().as_deref() == Some("1") {
        return None;
    }

    let repo = env::var("REMAKE_UPDATE_REPO")
        .ok()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .or_else(|| default_repo.map(str::to_string))?;
    if repo.matches('/').count() != 1 {
        return None;
    }

    if !stamp_due() {
        return None;
    }
    touch_stamp();

    let latest = fetch_latest(&repo)?;
    if latest.tag_name.is_empty() || !is_newer(&latest.tag_name, current_version) {
        return None;
    }

    let url = latest
        .html_url
        .unwrap_or_else(|| format!("https://github.com/{}/releases/latest", repo));
    Some(format!(
        "New remake version available: {} (current {})\nUpdate: {}",
        latest.tag_name, current_version, url
    ))
}

fn fetch_latest(repo: &str) -> Option<LatestRelease> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .ok()?;
    let response = client
        .get(format!(
            "https://api.github.com/repos/{}/releases/latest",
            repo
        ))
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .header(reqwest::header::USER_AGENT, "remake-cli")
        .send()
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    serde_json::from_reader(response).ok()
}

fn stamp_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "remake")?;
    Some(dirs.cache_dir().join("update-check"))
}

fn stamp_due() -> bool {
    let Some(path) = stamp_path() else {
        return true;
    };
    let Ok(meta) = fs::metadata(&path) else {
        return true;
    };
    let Ok(modified) = meta.modified() else {
        return true;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age >= CHECK_INTERVAL,
        Err(_) => true,
    }
}

fn touch_stamp() {
    let Some(path) = stamp_path() else { return };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = fs::write(&path, b"");
}

/// Compare two version strings, semver when possible
fn is_newer(latest: &str, current: &str) -> bool {
    match (parse_semver(latest), parse_semver(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => normalize(latest) != normalize(current),
    }
}

fn parse_semver(version: &str) -> Option<[u64; 3]> {
    let normalized = normalize(version);
    let mut parts = [0u64; 3];
    for (i, piece) in normalized.split('.').enumerate() {
        if i >= 3 {
            break;
        }
        parts[i] = piece.parse().ok()?;
    }
    Some(parts)
}

fn normalize(version: &str) -> &str {
    version.trim().trim_start_matches('v')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_comparison() {
        assert!(is_newer("v1.2.0", "v1.1.9"));
        assert!(is_newer("2.0.0", "1.9.9"));
        assert!(!is_newer("v1.1.9", "v1.2.0"));
        assert!(!is_newer("v1.2.0", "1.2.0"));
    }

    #[test]
    fn test_partial_versions() {
        assert!(is_newer("v1.1", "1.0.5"));
        assert!(!is_newer("1", "1.0.0"));
    }

    #[test]
    fn test_non_semver_falls_back_to_inequality() {
        assert!(is_newer("nightly-2", "nightly-1"));
        assert!(!is_newer("nightly-1", "nightly-1"));
    }

    #[test]
    fn test_dev_build_never_checks() {
        assert_eq!(check_latest("dev", Some("owner/repo")), None);
        assert_eq!(check_latest("", Some("owner/repo")), None);
    }

    #[test]
    fn test_unconfigured_repo_never_checks() {
        env::remove_var("REMAKE_UPDATE_REPO");
        assert_eq!(check_latest("1.0.0", None), None);
        assert_eq!(check_latest("1.0.0", Some("not-a-repo")), None);
    }
}
