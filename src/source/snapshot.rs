//! Page snapshots and the lifecycle signals derived from them.
//!
//! A snapshot is the full state of a server-driven page at one point in time:
//! its mount points with their string attributes, its hidden form fields and
//! its inline scripts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chart::RawAttributes;
use crate::hook::editor::companion_ids;
use crate::hook::{HookKind, HostSignal, MountId};

/// A mount point as published by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountSnapshot {
    pub id: MountId,
    pub hook: HookKind,
    #[serde(default)]
    pub attrs: RawAttributes,
}

/// Complete state of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub mounts: Vec<MountSnapshot>,
    /// Hidden form inputs, keyed by element id.
    pub fields: BTreeMap<String, String>,
    /// Inline script contents, keyed by element id.
    pub scripts: BTreeMap<String, String>,
}

impl PageSnapshot {
    pub fn mount(&self, id: &MountId) -> Option<&MountSnapshot> {
        self.mounts.iter().find(|m| &m.id == id)
    }

    pub fn field(&self, id: &str) -> Option<&str> {
        self.fields.get(id).map(String::as_str)
    }

    pub fn script(&self, id: &str) -> Option<&str> {
        self.scripts.get(id).map(String::as_str)
    }

    /// Mount points keyed by id. Later duplicates of an id are dropped.
    fn by_id(&self) -> BTreeMap<&MountId, &MountSnapshot> {
        let mut map = BTreeMap::new();
        for mount in &self.mounts {
            if map.contains_key(&mount.id) {
                warn!(mount = %mount.id, "duplicate mount id in page, ignoring");
                continue;
            }
            map.insert(&mount.id, mount);
        }
        map
    }

    fn mounted_signal(&self, mount: &MountSnapshot) -> HostSignal {
        let (field, schema) = match mount.hook {
            HookKind::SqlEditor => {
                let (field_id, schema_id) = companion_ids(&mount.id);
                (
                    Some(self.field(&field_id).unwrap_or_default().to_string()),
                    self.script(&schema_id).map(str::to_string),
                )
            }
            HookKind::CheckChart | HookKind::HomeChart => (None, None),
        };
        HostSignal::Mounted {
            id: mount.id.clone(),
            kind: mount.hook,
            attrs: mount.attrs.clone(),
            field,
            schema,
        }
    }

    /// Lifecycle signals that take a page from `prev` to `next`.
    ///
    /// Destroys come first, then mounts and updates in page order. A mount
    /// point whose hook kind changed is destroyed and mounted again.
    pub fn diff(prev: &PageSnapshot, next: &PageSnapshot) -> Vec<HostSignal> {
        let before = prev.by_id();
        let after = next.by_id();
        let mut signals = Vec::new();

        for (id, old) in &before {
            let replaced = after.get(id).is_some_and(|new| new.hook != old.hook);
            if !after.contains_key(id) || replaced {
                signals.push(HostSignal::Destroyed { id: (*id).clone() });
            }
        }

        let mut seen = BTreeSet::new();
        for mount in &next.mounts {
            if !seen.insert(&mount.id) {
                continue;
            }
            match before.get(&mount.id) {
                Some(old) if old.hook == mount.hook => {
                    if old.attrs != mount.attrs {
                        signals.push(HostSignal::Updated {
                            id: mount.id.clone(),
                            attrs: mount.attrs.clone(),
                        });
                    }
                }
                _ => signals.push(next.mounted_signal(mount)),
            }
        }
        signals
    }

    /// Signals for a transport reconnect: one per mount point.
    pub fn reconnected(&self) -> Vec<HostSignal> {
        self.by_id()
            .into_keys()
            .map(|id| HostSignal::Reconnected { id: id.clone() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: &str) -> PageSnapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deserialize_page() {
        let snapshot = page(
            r#"{
                "mounts": [
                    {"id": "latency-chart", "hook": "CheckChart",
                     "attrs": {"labels": "[\"a\"]", "values": "[1]", "success": "[1]",
                               "average": "1", "alertThreshold": "null"}},
                    {"id": "query-editor", "hook": "SQLEditor", "attrs": {"dialect": "postgres"}}
                ],
                "fields": {"query-input": "select 1"},
                "scripts": {"query-schema": "{\"users\": [\"id\"]}"}
            }"#,
        );

        assert_eq!(snapshot.mounts.len(), 2);
        let chart = snapshot.mount(&"latency-chart".into()).unwrap();
        assert_eq!(chart.hook, HookKind::CheckChart);
        assert_eq!(chart.attrs.get("values").map(String::as_str), Some("[1]"));
        assert_eq!(snapshot.field("query-input"), Some("select 1"));
        assert!(snapshot.script("query-schema").is_some());
    }

    #[test]
    fn test_empty_page() {
        let snapshot = page("{}");
        assert!(snapshot.mounts.is_empty());
        assert!(PageSnapshot::diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn test_diff_mount_update_destroy() {
        let first = page(
            r#"{"mounts": [
                {"id": "a", "hook": "CheckChart", "attrs": {"values": "[1]"}},
                {"id": "b", "hook": "CheckChart", "attrs": {"values": "[1]"}}
            ]}"#,
        );
        let second = page(
            r#"{"mounts": [
                {"id": "a", "hook": "CheckChart", "attrs": {"values": "[2]"}},
                {"id": "c", "hook": "CheckChart"}
            ]}"#,
        );

        let signals = PageSnapshot::diff(&first, &second);
        assert_eq!(signals.len(), 3);
        assert_eq!(signals[0], HostSignal::Destroyed { id: "b".into() });
        assert!(matches!(
            &signals[1],
            HostSignal::Updated { id, attrs } if id.as_str() == "a" && attrs["values"] == "[2]"
        ));
        assert!(matches!(&signals[2], HostSignal::Mounted { id, .. } if id.as_str() == "c"));
    }

    #[test]
    fn test_diff_unchanged_attrs_emit_nothing() {
        let snapshot = page(r#"{"mounts": [{"id": "a", "hook": "CheckChart", "attrs": {"x": "1"}}]}"#);
        assert!(PageSnapshot::diff(&snapshot, &snapshot.clone()).is_empty());
    }

    #[test]
    fn test_diff_from_empty_mounts_editor_with_companions() {
        let next = page(
            r#"{
                "mounts": [{"id": "query-editor", "hook": "SQLEditor"}],
                "fields": {"query-input": "select 1"},
                "scripts": {"query-schema": "{}"}
            }"#,
        );

        let signals = PageSnapshot::diff(&PageSnapshot::default(), &next);
        assert_eq!(
            signals,
            vec![HostSignal::Mounted {
                id: "query-editor".into(),
                kind: HookKind::SqlEditor,
                attrs: RawAttributes::new(),
                field: Some("select 1".into()),
                schema: Some("{}".into()),
            }]
        );
    }

    #[test]
    fn test_diff_hook_kind_change_remounts() {
        let first = page(r#"{"mounts": [{"id": "x", "hook": "CheckChart"}]}"#);
        let second = page(r#"{"mounts": [{"id": "x", "hook": "SQLEditor"}]}"#);

        let signals = PageSnapshot::diff(&first, &second);
        assert_eq!(signals[0], HostSignal::Destroyed { id: "x".into() });
        assert!(matches!(
            &signals[1],
            HostSignal::Mounted { kind: HookKind::SqlEditor, .. }
        ));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let snapshot = page(
            r#"{"mounts": [
                {"id": "a", "hook": "CheckChart", "attrs": {"v": "1"}},
                {"id": "a", "hook": "CheckChart", "attrs": {"v": "2"}}
            ]}"#,
        );
        let signals = PageSnapshot::diff(&PageSnapshot::default(), &snapshot);
        assert_eq!(signals.len(), 1);
        assert!(matches!(
            &signals[0],
            HostSignal::Mounted { attrs, .. } if attrs["v"] == "1"
        ));
    }

    #[test]
    fn test_reconnected_covers_every_mount() {
        let snapshot = page(
            r#"{"mounts": [{"id": "b", "hook": "CheckChart"}, {"id": "a", "hook": "SQLEditor"}]}"#,
        );
        assert_eq!(
            snapshot.reconnected(),
            vec![
                HostSignal::Reconnected { id: "a".into() },
                HostSignal::Reconnected { id: "b".into() },
            ]
        );
    }
}
