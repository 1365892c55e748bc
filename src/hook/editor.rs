//! Lifecycle controller for SQL editor mount points.
//!
//! The editor is bound to a hidden form field. Every document change is
//! mirrored into the field and announced with a [`FieldChange`], so the form
//! submits what the user typed.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::{HookError, HookState, MountId, RenderError};
use crate::chart::RawAttributes;
use crate::sql::{Dialect, Schema};

/// Everything an editor instance is created from.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub doc: String,
    pub dialect: Dialect,
    pub schema: Schema,
}

/// External text-editing backend.
pub trait EditorBackend {
    type Handle;

    fn create(&mut self, mount: &MountId, config: EditorConfig) -> Result<Self::Handle, RenderError>;

    /// Current document text of an instance.
    fn document(&self, handle: &Self::Handle) -> String;

    fn destroy(&mut self, handle: Self::Handle);
}

/// Change notification dispatched when a form field's value changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub value: String,
}

/// A hidden form input mirrored by an editor.
#[derive(Debug, Clone)]
pub struct FormField {
    id: String,
    value: String,
    notifier: Option<UnboundedSender<FieldChange>>,
}

impl FormField {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            notifier: None,
        }
    }

    /// Dispatch change notifications to `notifier`.
    pub fn with_notifier(mut self, notifier: UnboundedSender<FieldChange>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and dispatch a change notification.
    pub fn set_value(&mut self, value: String) {
        self.value = value;
        if let Some(ref notifier) = self.notifier {
            let change = FieldChange {
                field: self.id.clone(),
                value: self.value.clone(),
            };
            if notifier.send(change).is_err() {
                debug!(field = %self.id, "change listener gone");
            }
        }
    }
}

/// Ids of the hidden input and schema script belonging to an editor mount.
///
/// The first `-editor` in the id is dropped: `query-editor` pairs with
/// `query-input` and `query-schema`, `orders-editor-main` with
/// `orders-main-input`.
pub fn companion_ids(mount: &MountId) -> (String, String) {
    let base = mount.as_str().replacen("-editor", "", 1);
    (format!("{}-input", base), format!("{}-schema", base))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unmounted,
    Mounted,
    Destroyed,
}

/// Owns the single editor instance of one mount point.
pub struct EditorHook<B: EditorBackend> {
    mount: MountId,
    phase: Phase,
    field: Option<FormField>,
    instance: Option<B::Handle>,
}

impl<B: EditorBackend> EditorHook<B> {
    pub fn new(mount: MountId) -> Self {
        Self {
            mount,
            phase: Phase::Unmounted,
            field: None,
            instance: None,
        }
    }

    pub fn mount_id(&self) -> &MountId {
        &self.mount
    }

    pub fn state(&self) -> HookState {
        match (self.phase, &self.instance) {
            (Phase::Unmounted, _) => HookState::Unmounted,
            (Phase::Mounted, None) => HookState::Mounted,
            (Phase::Mounted, Some(_)) => HookState::Live,
            (Phase::Destroyed, _) => HookState::Destroyed,
        }
    }

    pub fn field(&self) -> Option<&FormField> {
        self.field.as_ref()
    }

    pub fn instance(&self) -> Option<&B::Handle> {
        self.instance.as_ref()
    }

    /// Create the editor, seeded from the bound field.
    ///
    /// A malformed schema script is logged and replaced by an empty schema.
    pub fn on_mount(
        &mut self,
        backend: &mut B,
        attrs: &RawAttributes,
        field: FormField,
        schema_script: Option<&str>,
    ) -> Result<(), HookError> {
        if self.phase != Phase::Unmounted {
            warn!(mount = %self.mount, "mount signal ignored, editor already mounted");
            return Ok(());
        }
        self.phase = Phase::Mounted;

        let config = EditorConfig {
            doc: field.value().to_string(),
            dialect: Dialect::from_attribute(attrs.get("dialect").map(String::as_str)),
            schema: Schema::parse_or_empty(schema_script),
        };
        debug!(mount = %self.mount, dialect = config.dialect.name(), "editor mounting");
        self.field = Some(field);

        let handle = backend.create(&self.mount, config).inspect_err(|e| {
            warn!(mount = %self.mount, error = %e, "editor backend refused mount");
        })?;
        self.instance = Some(handle);
        Ok(())
    }

    /// The form owns resets, so attribute patches leave the editor alone.
    pub fn on_data_changed(&mut self) {
        debug!(mount = %self.mount, "editor update ignored");
    }

    pub fn on_reconnect(&mut self) {
        debug!(mount = %self.mount, "editor reconnect ignored");
    }

    /// Apply an edit through the backend and mirror the document into the
    /// bound field.
    ///
    /// Returns whether the document changed.
    pub fn edit<F>(&mut self, backend: &mut B, f: F) -> bool
    where
        F: FnOnce(&mut B, &mut B::Handle),
    {
        let (Some(handle), Some(field)) = (self.instance.as_mut(), self.field.as_mut()) else {
            return false;
        };
        f(backend, handle);

        let doc = backend.document(handle);
        if doc == field.value() {
            return false;
        }
        field.set_value(doc);
        true
    }

    /// Destroy the editor instance. Safe to call any number of times.
    pub fn on_destroy(&mut self, backend: &mut B) {
        if let Some(handle) = self.instance.take() {
            backend.destroy(handle);
            debug!(mount = %self.mount, "editor destroyed");
        }
        self.phase = Phase::Destroyed;
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::hook::testing::FakeEditor;

    fn attrs(dialect: &str) -> RawAttributes {
        [("dialect".to_string(), dialect.to_string())].into_iter().collect()
    }

    #[test]
    fn test_companion_ids() {
        assert_eq!(
            companion_ids(&"query-editor".into()),
            ("query-input".to_string(), "query-schema".to_string())
        );
        assert_eq!(
            companion_ids(&"sql".into()),
            ("sql-input".to_string(), "sql-schema".to_string())
        );
        assert_eq!(
            companion_ids(&"orders-editor-main".into()),
            ("orders-main-input".to_string(), "orders-main-schema".to_string())
        );
        assert_eq!(companion_ids(&"a-editor-editor".into()).0, "a-editor-input");
    }

    #[test]
    fn test_mount_seeds_from_field() {
        let mut backend = FakeEditor::default();
        let mut hook = EditorHook::new("query-editor".into());
        let field = FormField::new("query-input", "select 1");

        hook.on_mount(&mut backend, &attrs("postgres"), field, Some(r#"{"users": ["id"]}"#))
            .unwrap();

        assert_eq!(hook.state(), HookState::Live);
        let config = backend.config(hook.instance().unwrap()).unwrap();
        assert_eq!(config.doc, "select 1");
        assert_eq!(config.dialect, Dialect::PostgreSql);
        assert_eq!(config.schema.columns("users"), ["id".to_string()]);
    }

    #[test]
    fn test_malformed_schema_still_mounts() {
        let mut backend = FakeEditor::default();
        let mut hook = EditorHook::new("query-editor".into());

        hook.on_mount(&mut backend, &attrs("mysql"), FormField::new("query-input", ""), Some("{"))
            .unwrap();

        assert_eq!(hook.state(), HookState::Live);
        assert!(backend.config(hook.instance().unwrap()).unwrap().schema.is_empty());
    }

    #[test]
    fn test_edits_are_mirrored_and_dispatched() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut backend = FakeEditor::default();
        let mut hook = EditorHook::new("query-editor".into());
        let field = FormField::new("query-input", "select 1").with_notifier(tx);
        hook.on_mount(&mut backend, &attrs("postgres"), field, None).unwrap();

        let changed = hook.edit(&mut backend, |b, h| b.set_text(h, "select 2"));
        assert!(changed);
        assert_eq!(hook.field().unwrap().value(), "select 2");
        assert_eq!(
            rx.try_recv().unwrap(),
            FieldChange {
                field: "query-input".into(),
                value: "select 2".into()
            }
        );

        // Unchanged document dispatches nothing
        assert!(!hook.edit(&mut backend, |b, h| b.set_text(h, "select 2")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_updates_leave_editor_untouched() {
        let mut backend = FakeEditor::default();
        let mut hook = EditorHook::new("query-editor".into());
        hook.on_mount(&mut backend, &attrs("postgres"), FormField::new("query-input", "x"), None)
            .unwrap();

        hook.on_data_changed();
        hook.on_reconnect();
        assert_eq!(backend.live(), 1);
        assert_eq!(hook.state(), HookState::Live);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut backend = FakeEditor::default();
        let mut hook = EditorHook::new("query-editor".into());
        hook.on_mount(&mut backend, &attrs("postgres"), FormField::new("query-input", ""), None)
            .unwrap();

        hook.on_destroy(&mut backend);
        hook.on_destroy(&mut backend);
        assert_eq!(backend.live(), 0);
        assert_eq!(hook.state(), HookState::Destroyed);
        assert!(!hook.edit(&mut backend, |b, h| b.set_text(h, "ignored")));
    }
}
