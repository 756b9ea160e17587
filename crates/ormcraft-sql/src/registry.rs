//! Dialect registry (§4.4): a process-wide, mutex-protected mapping from
//! driver name to `Dialect`, ported from the original's
//! `orm/core/dialects.go`. Writers (register/clear) are rare; readers
//! (get) are frequent, so a single `Mutex` guarding a plain `HashMap` is
//! enough — no need for a reader/writer lock.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use ormcraft_core::{OrmError, OrmResult};

use crate::dialect::Dialect;

struct Entry {
    dialect: Arc<dyn Dialect>,
    type_id: TypeId,
}

struct Registry {
    entries: Mutex<HashMap<String, Entry>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        entries: Mutex::new(HashMap::new()),
    })
}

/// Registers `dialect` under `name`. Fails if `name` is already taken, or
/// if a dialect of the same concrete type is already registered under a
/// different name (the original's `reflect.TypeOf(d) == reflect.TypeOf(v)`
/// check, ported to `Any::type_id()`).
pub fn register<D: Dialect + 'static>(name: &str, dialect: D) -> OrmResult<()> {
    let type_id = TypeId::of::<D>();
    let dialect: Arc<dyn Dialect> = Arc::new(dialect);
    register_typed(name, dialect, type_id)
}

/// Like [`register`], for callers that already hold an `Arc<dyn Dialect>`
/// and its original concrete `TypeId` (e.g. the built-in dialects, whose
/// `Arc`s are constructed once and reused).
pub fn register_typed(name: &str, dialect: Arc<dyn Dialect>, type_id: TypeId) -> OrmResult<()> {
    let mut entries = registry().entries.lock().expect("dialect registry poisoned");

    if entries.contains_key(name) {
        return Err(OrmError::dialect(format!("dialect name {name:?} is already registered")));
    }
    if let Some((existing_name, _)) = entries.iter().find(|(_, e)| e.type_id == type_id) {
        return Err(OrmError::dialect(format!(
            "a dialect of this concrete type is already registered as {existing_name:?}"
        )));
    }

    entries.insert(name.to_string(), Entry { dialect, type_id });
    tracing::info!(dialect = name, "registered dialect");
    Ok(())
}

/// Looks up a registered dialect by name.
pub fn get(name: &str) -> Option<Arc<dyn Dialect>> {
    registry()
        .entries
        .lock()
        .expect("dialect registry poisoned")
        .get(name)
        .map(|e| e.dialect.clone())
}

/// Reports whether `name` has a registered dialect.
pub fn is_registered(name: &str) -> bool {
    registry().entries.lock().expect("dialect registry poisoned").contains_key(name)
}

/// Lists every currently registered dialect name, in no particular order.
pub fn registered() -> Vec<String> {
    registry().entries.lock().expect("dialect registry poisoned").keys().cloned().collect()
}

/// Removes every registered dialect. Test-only: production callers should
/// never need to un-register a dialect once the process has started.
pub fn clear() {
    registry().entries.lock().expect("dialect registry poisoned").clear();
    tracing::info!("cleared dialect registry");
}

/// Registers the four built-in dialects under their conventional driver
/// names, unless already registered. Idempotent: a second call is a no-op
/// once the names are taken.
pub fn register_builtins() {
    let _ = register("postgres", crate::postgres::PostgresDialect);
    let _ = register("mysql", crate::mysql::MySqlDialect);
    let _ = register("sqlite", crate::sqlite::SqliteDialect);
    let _ = register("sqlserver", crate::sqlserver::SqlServerDialect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    static TEST_GUARD: StdMutex<()> = StdMutex::new(());

    struct FakeA;
    #[async_trait::async_trait]
    impl Dialect for FakeA {
        fn quote_chars(&self) -> (char, char) {
            ('"', '"')
        }
        fn db_name_from_dsn(&self, _dsn: &str) -> OrmResult<String> {
            Ok("fake".to_string())
        }
        fn limit_clause(&self, limit: u64, offset: u64) -> (String, Vec<ormcraft_core::Value>) {
            (
                " LIMIT ? OFFSET ? ".to_string(),
                vec![ormcraft_core::Value::UInt(limit), ormcraft_core::Value::UInt(offset)],
            )
        }
        fn supports_last_insert_id(&self) -> bool {
            true
        }
        fn sql_type_for(&self, _col: &crate::dialect::ColumnSpec) -> String {
            "TEXT".to_string()
        }
        async fn create_table(
            &self,
            _backend: &dyn ormcraft_core::Backend,
            _table: &crate::dialect::TableSpec,
        ) -> OrmResult<()> {
            Ok(())
        }
    }

    struct FakeB;
    #[async_trait::async_trait]
    impl Dialect for FakeB {
        fn quote_chars(&self) -> (char, char) {
            ('`', '`')
        }
        fn db_name_from_dsn(&self, _dsn: &str) -> OrmResult<String> {
            Ok("fake".to_string())
        }
        fn limit_clause(&self, limit: u64, offset: u64) -> (String, Vec<ormcraft_core::Value>) {
            (
                " LIMIT ? OFFSET ? ".to_string(),
                vec![ormcraft_core::Value::UInt(limit), ormcraft_core::Value::UInt(offset)],
            )
        }
        fn supports_last_insert_id(&self) -> bool {
            true
        }
        fn sql_type_for(&self, _col: &crate::dialect::ColumnSpec) -> String {
            "TEXT".to_string()
        }
        async fn create_table(
            &self,
            _backend: &dyn ormcraft_core::Backend,
            _table: &crate::dialect::TableSpec,
        ) -> OrmResult<()> {
            Ok(())
        }
    }

    #[test]
    fn registration_collision_rules() {
        let _guard = TEST_GUARD.lock().unwrap();
        clear();

        register("x", FakeA).unwrap();
        assert!(register("y", FakeA).is_err(), "same concrete type under a new name must fail");
        assert!(register("x", FakeB).is_err(), "name already taken must fail");

        register("z", FakeB).unwrap();
        assert!(is_registered("x"));
        assert!(is_registered("z"));
        assert!(get("missing").is_none());

        clear();
        assert!(registered().is_empty());
    }
}
