//! Source editor
//!
//! Same pattern as the job editor, driven by the database type: file-based
//! engines use the path field, every other engine uses the connection group.
//! Changing the type clears the group that is no longer active.

use strata_core::domain::source::{BackupSource, DatabaseType};
use strata_core::dto::source::BackupSourceRequest;
use uuid::Uuid;

use crate::EditorMode;
use crate::error::{EditorError, Result};
use crate::field::{Field, SourceFieldFlags, source_field_flags};
use crate::store::SourceStore;

pub const DEFAULT_DB_HOST: &str = "localhost";

const TEST_SUCCEEDED: &str = "Connection successful";
const TEST_FAILED: &str = "Failed to connect. Check the connection settings.";

/// Editable fields of a backup source
///
/// The port is kept as typed text and only parsed on submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFields {
    pub name: Field<String>,
    pub database_type: Field<Option<DatabaseType>>,
    pub db_dump_tool_path: Field<String>,
    pub source_path: Field<String>,
    pub db_host: Field<String>,
    pub db_port: Field<String>,
    pub db_name: Field<String>,
    pub db_user: Field<String>,
    pub db_password: Field<String>,
}

impl SourceFields {
    fn defaults() -> Self {
        let flags = source_field_flags(None);

        Self {
            name: Field::new(String::new(), flags.name),
            database_type: Field::new(None, flags.database_type),
            db_dump_tool_path: Field::new(String::new(), flags.db_dump_tool_path),
            source_path: Field::new(String::new(), flags.source_path),
            db_host: Field::new(DEFAULT_DB_HOST.to_string(), flags.db_host),
            db_port: Field::new(String::new(), flags.db_port),
            db_name: Field::new(String::new(), flags.db_name),
            db_user: Field::new(String::new(), flags.db_user),
            db_password: Field::new(String::new(), flags.db_password),
        }
    }

    fn apply(&mut self, flags: &SourceFieldFlags) {
        self.name.apply(flags.name);
        self.database_type.apply(flags.database_type);
        self.db_dump_tool_path.apply(flags.db_dump_tool_path);
        self.source_path.apply(flags.source_path);
        self.db_host.apply(flags.db_host);
        self.db_port.apply(flags.db_port);
        self.db_name.apply(flags.db_name);
        self.db_user.apply(flags.db_user);
        self.db_password.apply(flags.db_password);
    }

    fn connection_group_mut(&mut self) -> [&mut Field<String>; 5] {
        [
            &mut self.db_host,
            &mut self.db_port,
            &mut self.db_name,
            &mut self.db_user,
            &mut self.db_password,
        ]
    }

    /// Parsed port; `Ok(None)` for an empty field
    fn port(&self) -> std::result::Result<Option<u16>, std::num::ParseIntError> {
        let port = self.db_port.value.trim();
        if !self.db_port.enabled || port.is_empty() {
            return Ok(None);
        }
        port.parse().map(Some)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();

        if self.name.is_missing() {
            invalid.push("name");
        }
        if self.database_type.is_missing() {
            invalid.push("database type");
        }
        if self.db_dump_tool_path.is_missing() {
            invalid.push("dump tool path");
        }
        if self.source_path.is_missing() {
            invalid.push("source path");
        }
        if self.port().is_err() {
            invalid.push("port");
        }

        invalid
    }
}

/// `None` for a disabled or blank field
fn text(field: &Field<String>) -> Option<String> {
    let value = field.value.trim();
    (field.enabled && !value.is_empty()).then(|| value.to_string())
}

/// Outcome of a connection test, ready to show to an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
}

/// Editing session for one backup source
#[derive(Debug, Clone)]
pub struct SourceEditor {
    mode: EditorMode,
    fields: SourceFields,
}

impl Default for SourceEditor {
    fn default() -> Self {
        Self::create()
    }
}

impl SourceEditor {
    /// Starts a new source with no database type chosen
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            fields: SourceFields::defaults(),
        }
    }

    /// Starts editing an already loaded source
    ///
    /// The stored password is never shown: leaving it blank keeps it.
    pub fn edit(source: &BackupSource) -> Self {
        let mut editor = Self {
            mode: EditorMode::Edit(source.id),
            fields: SourceFields::defaults(),
        };

        let fields = &mut editor.fields;
        fields.name.set(source.name.clone());
        fields.db_dump_tool_path.set(source.db_dump_tool_path.clone());
        fields
            .source_path
            .set(source.source_path.clone().unwrap_or_default());
        fields.db_host.set(source.db_host.clone().unwrap_or_default());
        fields
            .db_port
            .set(source.db_port.map(|p| p.to_string()).unwrap_or_default());
        fields.db_name.set(source.db_name.clone().unwrap_or_default());
        fields.db_user.set(source.db_user.clone().unwrap_or_default());
        editor.set_database_type(Some(source.database_type));

        editor
    }

    /// Opens an editor: create mode without an id, edit mode (after loading
    /// the source) with one
    pub async fn open<S: SourceStore + ?Sized>(store: &S, source_id: Option<Uuid>) -> Result<Self> {
        let Some(id) = source_id else {
            return Ok(Self::create());
        };

        let source = store.find_source(id).await.map_err(|e| {
            tracing::warn!("Failed to load source {}: {}", id, e);
            EditorError::remote(&e, "Failed to load backup source")
        })?;

        Ok(Self::edit(&source))
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn fields(&self) -> &SourceFields {
        &self.fields
    }

    /// Sets the database type and recomputes field state
    ///
    /// Both groups are disabled first, then the active one is enabled and
    /// the inactive one cleared. Clearing back to no type only disables.
    pub fn set_database_type(&mut self, database_type: Option<DatabaseType>) {
        let fields = &mut self.fields;
        fields.database_type.set(database_type);
        fields.apply(&source_field_flags(database_type));

        match database_type {
            Some(t) if t.is_file_based() => {
                for field in fields.connection_group_mut() {
                    field.clear();
                }
            }
            Some(_) => fields.source_path.clear(),
            None => {}
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.fields.name.set(name.into());
    }

    pub fn set_dump_tool_path(&mut self, path: impl Into<String>) {
        self.fields.db_dump_tool_path.set(path.into());
    }

    pub fn set_source_path(&mut self, path: impl Into<String>) {
        self.fields.source_path.set(path.into());
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.fields.db_host.set(host.into());
    }

    pub fn set_port(&mut self, port: impl Into<String>) {
        self.fields.db_port.set(port.into());
    }

    pub fn set_database_name(&mut self, name: impl Into<String>) {
        self.fields.db_name.set(name.into());
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.fields.db_user.set(user.into());
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.fields.db_password.set(password.into());
    }

    /// Checks the form and builds the save request
    ///
    /// A blank password is left out so the server keeps the stored one.
    pub fn validate(&self) -> Result<BackupSourceRequest> {
        self.request()
    }

    fn request(&self) -> Result<BackupSourceRequest> {
        let fields = &self.fields;

        let invalid = fields.invalid_fields();
        if !invalid.is_empty() {
            return Err(EditorError::invalid(invalid));
        }

        let (Some(database_type), Ok(db_port)) = (fields.database_type.value, fields.port())
        else {
            return Err(EditorError::invalid(vec!["database type"]));
        };

        Ok(BackupSourceRequest {
            name: fields.name.value.trim().to_string(),
            database_type,
            db_dump_tool_path: fields.db_dump_tool_path.value.trim().to_string(),
            source_path: text(&fields.source_path),
            db_host: text(&fields.db_host),
            db_port,
            db_name: text(&fields.db_name),
            db_user: text(&fields.db_user),
            db_password: (fields.db_password.enabled && !fields.db_password.value.is_empty())
                .then(|| fields.db_password.value.clone()),
        })
    }

    /// Validates and saves the source, creating or updating by mode
    pub async fn submit<S: SourceStore + ?Sized>(self, store: &S) -> Result<BackupSource> {
        let req = self.validate()?;

        let saved = match self.mode {
            EditorMode::Create => store.insert_source(&req).await,
            EditorMode::Edit(id) => store.replace_source(id, &req).await,
        }
        .map_err(|e| {
            tracing::warn!("Failed to save source '{}': {}", req.name, e);
            EditorError::remote(&e, "Failed to save backup source")
        })?;

        tracing::info!("Saved backup source {} ({})", saved.name, saved.id);

        Ok(saved)
    }

    /// Asks the server to connect with the current settings
    ///
    /// An invalid form fails the test without contacting the server.
    pub async fn test_connection<S: SourceStore + ?Sized>(&self, store: &S) -> ConnectionTest {
        let req = match self.request() {
            Ok(req) => req,
            Err(e) => {
                return ConnectionTest {
                    success: false,
                    message: format!("{}. Fill in the required fields to test the connection.", e),
                };
            }
        };

        match store.probe_source(&req).await {
            Ok(message) if !message.trim().is_empty() => ConnectionTest {
                success: true,
                message,
            },
            Ok(_) => ConnectionTest {
                success: true,
                message: TEST_SUCCEEDED.to_string(),
            },
            Err(e) => {
                tracing::debug!("Connection test for '{}' failed: {}", req.name, e);
                ConnectionTest {
                    success: false,
                    message: e.user_message(TEST_FAILED),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldFlags;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use strata_client::ClientError;

    #[derive(Default)]
    struct FakeSourceStore {
        source: Option<BackupSource>,
        probe_reply: Option<std::result::Result<String, String>>,
        saved: Mutex<Vec<(Option<Uuid>, BackupSourceRequest)>>,
        probes: Mutex<usize>,
    }

    impl FakeSourceStore {
        fn save(
            &self,
            id: Option<Uuid>,
            req: &BackupSourceRequest,
        ) -> strata_client::Result<BackupSource> {
            self.saved.lock().unwrap().push((id, req.clone()));
            Ok(BackupSource {
                id: id.unwrap_or_else(|| Uuid::from_u128(99)),
                name: req.name.clone(),
                database_type: req.database_type,
                db_dump_tool_path: req.db_dump_tool_path.clone(),
                source_path: req.source_path.clone(),
                db_host: req.db_host.clone(),
                db_port: req.db_port,
                db_name: req.db_name.clone(),
                db_user: req.db_user.clone(),
                db_password: None,
            })
        }
    }

    #[async_trait]
    impl SourceStore for FakeSourceStore {
        async fn find_source(&self, id: Uuid) -> strata_client::Result<BackupSource> {
            self.source
                .clone()
                .filter(|s| s.id == id)
                .ok_or_else(|| ClientError::api_error(404, "Source not found"))
        }

        async fn insert_source(
            &self,
            req: &BackupSourceRequest,
        ) -> strata_client::Result<BackupSource> {
            self.save(None, req)
        }

        async fn replace_source(
            &self,
            id: Uuid,
            req: &BackupSourceRequest,
        ) -> strata_client::Result<BackupSource> {
            self.save(Some(id), req)
        }

        async fn probe_source(&self, _req: &BackupSourceRequest) -> strata_client::Result<String> {
            *self.probes.lock().unwrap() += 1;
            match self.probe_reply.clone() {
                Some(Ok(message)) => Ok(message),
                Some(Err(message)) => Err(ClientError::api_error(400, message)),
                None => Ok(String::new()),
            }
        }
    }

    fn postgres_editor() -> SourceEditor {
        let mut editor = SourceEditor::create();
        editor.set_name("erp");
        editor.set_dump_tool_path("/usr/bin/pg_dump");
        editor.set_database_type(Some(DatabaseType::Postgres));
        editor.set_host("db.internal");
        editor.set_database_name("erp");
        editor.set_user("backup");
        editor
    }

    fn stored_source() -> BackupSource {
        BackupSource {
            id: Uuid::from_u128(7),
            name: "erp".to_string(),
            database_type: DatabaseType::Mysql,
            db_dump_tool_path: "/usr/bin/mysqldump".to_string(),
            source_path: None,
            db_host: Some("db.internal".to_string()),
            db_port: Some(3306),
            db_name: Some("erp".to_string()),
            db_user: Some("backup".to_string()),
            db_password: None,
        }
    }

    #[test]
    fn test_create_mode_defaults() {
        let editor = SourceEditor::create();
        let fields = editor.fields();

        assert_eq!(editor.mode(), EditorMode::Create);
        assert_eq!(fields.database_type.value, None);
        assert_eq!(fields.db_host.value, "localhost");
        assert!(!fields.db_host.enabled);
        assert!(!fields.source_path.enabled);
    }

    #[test]
    fn test_h2_enables_path_and_clears_connection_group() {
        let mut editor = postgres_editor();
        editor.set_port("5432");
        editor.set_password("s3cret");

        editor.set_database_type(Some(DatabaseType::H2));
        let fields = editor.fields();

        assert_eq!(fields.source_path.flags(), FieldFlags::REQUIRED);
        for field in [
            &fields.db_host,
            &fields.db_port,
            &fields.db_name,
            &fields.db_user,
            &fields.db_password,
        ] {
            assert_eq!(field.flags(), FieldFlags::DISABLED);
            assert!(field.value.is_empty());
        }
    }

    #[test]
    fn test_connection_type_clears_source_path() {
        let mut editor = SourceEditor::create();
        editor.set_database_type(Some(DatabaseType::H2));
        editor.set_source_path("/data/app.mv.db");

        editor.set_database_type(Some(DatabaseType::Oracle));
        assert!(editor.fields().source_path.value.is_empty());
        assert!(!editor.fields().source_path.enabled);
        assert!(editor.fields().db_host.enabled);
    }

    #[test]
    fn test_type_switch_restores_enablement() {
        for a in DatabaseType::ALL {
            for b in DatabaseType::ALL {
                let mut editor = SourceEditor::create();
                editor.set_database_type(Some(a));
                let before = source_field_flags(Some(a));

                editor.set_database_type(Some(b));
                editor.set_database_type(Some(a));

                let fields = editor.fields();
                assert_eq!(fields.source_path.flags(), before.source_path);
                assert_eq!(fields.db_host.flags(), before.db_host);
                assert_eq!(fields.db_password.flags(), before.db_password);
            }
        }
    }

    #[test]
    fn test_round_trip_through_h2_leaves_host_optional() {
        let mut editor = SourceEditor::create();
        editor.set_name("erp");
        editor.set_dump_tool_path("/usr/bin/pg_dump");
        editor.set_database_type(Some(DatabaseType::Postgres));
        editor.set_database_type(Some(DatabaseType::H2));
        editor.set_database_type(Some(DatabaseType::Postgres));
        assert!(editor.fields().db_host.value.is_empty());

        let req = editor.validate().unwrap();
        assert_eq!(req.database_type, DatabaseType::Postgres);
        assert_eq!(req.db_host, None);
    }

    #[test]
    fn test_blank_password_is_omitted() {
        let mut editor = postgres_editor();
        editor.set_password("");
        assert_eq!(editor.validate().unwrap().db_password, None);

        editor.set_password("s3cret");
        assert_eq!(
            editor.validate().unwrap().db_password.as_deref(),
            Some("s3cret")
        );
    }

    #[test]
    fn test_port_normalization() {
        let mut editor = postgres_editor();
        assert_eq!(editor.validate().unwrap().db_port, None);

        editor.set_port(" 5433 ");
        assert_eq!(editor.validate().unwrap().db_port, Some(5433));

        editor.set_port("fifty");
        assert_eq!(
            editor.validate(),
            Err(EditorError::invalid(vec!["port"]))
        );
    }

    #[test]
    fn test_missing_type_and_required_fields() {
        let editor = SourceEditor::create();
        assert_eq!(
            editor.validate(),
            Err(EditorError::invalid(vec!["name", "database type", "dump tool path"]))
        );

        let mut editor = SourceEditor::create();
        editor.set_name("files");
        editor.set_dump_tool_path("/opt/h2/bin/backup");
        editor.set_database_type(Some(DatabaseType::H2));
        assert_eq!(
            editor.validate(),
            Err(EditorError::invalid(vec!["source path"]))
        );
    }

    #[test]
    fn test_h2_request_has_no_connection_fields() {
        let mut editor = SourceEditor::create();
        editor.set_name("files");
        editor.set_dump_tool_path("/opt/h2/bin/backup");
        editor.set_database_type(Some(DatabaseType::H2));
        editor.set_source_path("/data/app.mv.db");

        let req = editor.validate().unwrap();
        assert_eq!(req.source_path.as_deref(), Some("/data/app.mv.db"));
        assert_eq!(req.db_host, None);
        assert_eq!(req.db_port, None);
        assert_eq!(req.db_password, None);
    }

    #[tokio::test]
    async fn test_edit_keeps_stored_password() {
        let store = FakeSourceStore {
            source: Some(stored_source()),
            ..Default::default()
        };

        let editor = SourceEditor::open(&store, Some(Uuid::from_u128(7)))
            .await
            .unwrap();
        assert_eq!(editor.fields().db_port.value, "3306");

        editor.submit(&store).await.unwrap();

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved[0].0, Some(Uuid::from_u128(7)));
        assert_eq!(saved[0].1.db_password, None);
        assert_eq!(saved[0].1.db_port, Some(3306));
        assert_eq!(saved[0].1.db_host.as_deref(), Some("db.internal"));
    }

    #[tokio::test]
    async fn test_create_dispatches_insert() {
        let store = FakeSourceStore::default();
        let saved = postgres_editor().submit(&store).await.unwrap();

        assert_eq!(saved.id, Uuid::from_u128(99));
        assert_eq!(store.saved.lock().unwrap()[0].0, None);
    }

    #[tokio::test]
    async fn test_invalid_form_skips_connection_test() {
        let store = FakeSourceStore::default();
        let result = SourceEditor::create().test_connection(&store).await;

        assert!(!result.success);
        assert!(result.message.starts_with("invalid form"));
        assert_eq!(*store.probes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connection_test_messages() {
        let store = FakeSourceStore {
            probe_reply: Some(Ok("Connected to PostgreSQL 16".to_string())),
            ..Default::default()
        };
        let result = postgres_editor().test_connection(&store).await;
        assert_eq!(
            result,
            ConnectionTest {
                success: true,
                message: "Connected to PostgreSQL 16".to_string()
            }
        );

        let store = FakeSourceStore::default();
        let result = postgres_editor().test_connection(&store).await;
        assert!(result.success);
        assert_eq!(result.message, "Connection successful");

        let store = FakeSourceStore {
            probe_reply: Some(Err("password authentication failed".to_string())),
            ..Default::default()
        };
        let result = postgres_editor().test_connection(&store).await;
        assert!(!result.success);
        assert_eq!(result.message, "password authentication failed");

        let store = FakeSourceStore {
            probe_reply: Some(Err(String::new())),
            ..Default::default()
        };
        let result = postgres_editor().test_connection(&store).await;
        assert_eq!(result.message, TEST_FAILED);
    }
}
