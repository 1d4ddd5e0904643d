//! App directory refresh.
//!
//! The client caches its app list and sends it back with each refresh
//! request; the agent answers with a diff so icons are only shipped when
//! an app is new or actually changed. Icon equality is decided by SHA-256
//! digest, never by shipping the bytes both ways.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use vphone_types::{AppEntry, AppSummary, AppsResponse};

pub fn icon_hash(icon: &[u8]) -> Vec<u8> {
    Sha256::digest(icon).to_vec()
}

/// Diff the installed app set against the client's cached view.
///
/// An app counts as updated when its label changed or its icon digest no
/// longer matches the client's cached digest. Removed apps are reported
/// by package name only.
pub fn diff_installed(installed: Vec<AppEntry>, current: &[AppSummary]) -> AppsResponse {
    let cached: HashMap<&str, &AppSummary> = current
        .iter()
        .map(|summary| (summary.package.as_str(), summary))
        .collect();

    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut seen = Vec::with_capacity(installed.len());

    for entry in installed {
        seen.push(entry.package.clone());
        match cached.get(entry.package.as_str()) {
            None => added.push(entry),
            Some(summary) => {
                if entry.label != summary.label || !icon_matches(&entry, summary) {
                    updated.push(entry);
                }
            }
        }
    }

    let removed = current
        .iter()
        .filter(|summary| !seen.iter().any(|package| *package == summary.package))
        .map(|summary| summary.package.clone())
        .collect();

    AppsResponse::Refresh {
        added,
        updated,
        removed,
    }
}

fn icon_matches(entry: &AppEntry, summary: &AppSummary) -> bool {
    match (&entry.icon, &summary.icon_hash) {
        (Some(icon), Some(hash)) => icon_hash(icon) == *hash,
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(package: &str, label: &str, icon: Option<&[u8]>) -> AppEntry {
        AppEntry {
            package: package.to_string(),
            label: label.to_string(),
            icon: icon.map(<[u8]>::to_vec),
        }
    }

    fn summary(package: &str, label: &str, icon: Option<&[u8]>) -> AppSummary {
        AppSummary {
            package: package.to_string(),
            label: label.to_string(),
            icon_hash: icon.map(icon_hash),
        }
    }

    #[test]
    fn empty_cache_reports_everything_added() {
        let installed = vec![
            entry("com.a", "A", Some(b"icon-a")),
            entry("com.b", "B", None),
        ];
        match diff_installed(installed.clone(), &[]) {
            AppsResponse::Refresh {
                added,
                updated,
                removed,
            } => {
                assert_eq!(added, installed);
                assert!(updated.is_empty());
                assert!(removed.is_empty());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn unchanged_apps_are_omitted() {
        let installed = vec![entry("com.a", "A", Some(b"icon-a"))];
        let cached = vec![summary("com.a", "A", Some(b"icon-a"))];
        match diff_installed(installed, &cached) {
            AppsResponse::Refresh {
                added,
                updated,
                removed,
            } => {
                assert!(added.is_empty());
                assert!(updated.is_empty());
                assert!(removed.is_empty());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn label_change_marks_updated() {
        let installed = vec![entry("com.a", "A v2", Some(b"icon-a"))];
        let cached = vec![summary("com.a", "A", Some(b"icon-a"))];
        match diff_installed(installed, &cached) {
            AppsResponse::Refresh { updated, .. } => {
                assert_eq!(updated.len(), 1);
                assert_eq!(updated[0].label, "A v2");
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn icon_change_marks_updated() {
        let installed = vec![entry("com.a", "A", Some(b"icon-new"))];
        let cached = vec![summary("com.a", "A", Some(b"icon-old"))];
        match diff_installed(installed, &cached) {
            AppsResponse::Refresh { updated, .. } => assert_eq!(updated.len(), 1),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn uninstalled_apps_are_reported_by_package() {
        let cached = vec![
            summary("com.a", "A", None),
            summary("com.gone", "Gone", None),
        ];
        let installed = vec![entry("com.a", "A", None)];
        match diff_installed(installed, &cached) {
            AppsResponse::Refresh { removed, .. } => {
                assert_eq!(removed, vec!["com.gone".to_string()]);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
