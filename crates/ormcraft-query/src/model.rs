//! Model derivation (§3 Data Model, §4.1 tag grammar applied to record
//! metadata, component D).
//!
//! Go reflects over a record's fields at runtime and reads a `orm:"..."`
//! struct tag off each one; Rust has no equivalent struct-tag reflection
//! (REDESIGN FLAGS). The hand-written substitute is [`Entity`]: a record
//! type implements it once, returning a `&'static [FieldSpec]` — the
//! field-descriptor table the flag calls for — which [`Model::build`] folds
//! through the same tag grammar (`ormcraft_core::tag`) the original used.
//!
//! Anonymous embedded-struct flattening (§3 invariant 5) has no runtime
//! counterpart here either: an `Entity` impl for an outer type that embeds
//! another simply lists the embedded type's fields directly in its own
//! `fields()` — the flattening happens once, by hand, at the call site that
//! would otherwise need a derive macro.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock};

use ormcraft_core::{tag, OrmError, OrmResult, SqlType};
use ormcraft_sql::{ColumnSpec, TableSpec};

/// One field's static metadata, as an `Entity` impl hands it to
/// [`Model::build`]. `name` is the exported field name and `tag` is its raw
/// `ormcraft` tag text (possibly empty).
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub tag: &'static str,
    pub sql_type: SqlType,
}

impl FieldSpec {
    pub const fn new(name: &'static str, tag: &'static str, sql_type: SqlType) -> Self {
        Self { name, tag, sql_type }
    }
}

/// Implemented once, by hand, for every record type a [`Model`] can be
/// derived from — the static equivalent of the original's runtime
/// `reflect.StructField` scan plus its optional `Metaer.Meta()` method.
pub trait Entity: 'static {
    /// The record's table name before prefix substitution; may be
    /// overridden by a `name(...)` entry in [`Entity::meta`].
    fn table_name() -> &'static str;

    /// Field descriptors in declaration order.
    fn fields() -> &'static [FieldSpec];

    /// Table-level tag text (engine, charset, constraint names not tied to
    /// one column). Empty string if the record has none.
    fn meta() -> &'static str {
        ""
    }
}

/// One column's schema within a [`Model`] (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub len1: i64,
    pub len2: i64,
    pub nullable: bool,
    pub has_default: bool,
    pub default: Option<String>,
    pub sql_type: SqlType,
}

impl Column {
    fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            len1: 0,
            len2: 0,
            nullable: false,
            has_default: false,
            default: None,
            sql_type,
        }
    }
}

/// Auto-increment descriptor: the column plus its starting value and step,
/// both ≥ 1 (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct AutoIncr {
    pub col: Column,
    pub start: i64,
    pub step: i64,
}

/// A foreign-key constraint: the local column plus the referenced
/// table/column and optional update/delete rules (§3, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_col: String,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintKind {
    KeyIndex,
    UniqueIndex,
    ForeignKey,
    Check,
}

/// The derived, immutable schema of one table (§3). Built once per record
/// type via [`Model::of`] and cached; reads need no synchronisation once
/// construction completes.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    cols: Vec<(String, Column)>,
    pub pk: Vec<Column>,
    pub ai: Option<AutoIncr>,
    key_indexes: Vec<(String, Vec<Column>)>,
    unique_indexes: Vec<(String, Vec<Column>)>,
    fks: Vec<(String, ForeignKey)>,
    checks: Vec<(String, String)>,
    pub meta: BTreeMap<String, Vec<String>>,
    constraint_names: HashMap<String, ConstraintKind>,
}

impl Model {
    /// Looks up a column by its resolved (post-tag) name.
    pub fn col(&self, name: &str) -> Option<&Column> {
        self.cols.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Columns in declaration order.
    pub fn cols(&self) -> impl Iterator<Item = &Column> {
        self.cols.iter().map(|(_, c)| c)
    }

    pub fn key_indexes(&self) -> &[(String, Vec<Column>)] {
        &self.key_indexes
    }

    pub fn unique_indexes(&self) -> &[(String, Vec<Column>)] {
        &self.unique_indexes
    }

    pub fn fks(&self) -> &[(String, ForeignKey)] {
        &self.fks
    }

    pub fn checks(&self) -> &[(String, String)] {
        &self.checks
    }

    /// Builds a `Model` from a flat field-descriptor table plus an optional
    /// table-level tag string, applying the grammar of §4.1 and the
    /// invariants of §3. This is the engine behind [`Model::of`]; exposed
    /// directly for tests that don't want to route through the type cache.
    pub fn build(table_name: &str, fields: &[FieldSpec], meta_text: &str) -> OrmResult<Model> {
        let mut model = Model {
            name: table_name.to_string(),
            cols: Vec::new(),
            pk: Vec::new(),
            ai: None,
            key_indexes: Vec::new(),
            unique_indexes: Vec::new(),
            fks: Vec::new(),
            checks: Vec::new(),
            meta: BTreeMap::new(),
            constraint_names: HashMap::new(),
        };

        for field in fields {
            model.parse_field(field)?;
        }

        if !meta_text.is_empty() {
            let parsed = tag::parse(meta_text)?;
            for (key, values) in parsed.iter() {
                match key {
                    "name" => {
                        if let Some(v) = values.first() {
                            model.name = v.clone();
                        }
                    }
                    "check" => {
                        if values.len() < 2 {
                            return Err(OrmError::tag_syntax("check() requires a name and an expression"));
                        }
                        model.register_constraint(&values[0], ConstraintKind::Check)?;
                        model.checks.push((values[0].clone(), values[1].clone()));
                    }
                    other => {
                        model.meta.insert(other.to_string(), values.to_vec());
                    }
                }
            }
        }

        Ok(model)
    }

    fn register_constraint(&mut self, name: &str, kind: ConstraintKind) -> OrmResult<()> {
        let key = name.to_ascii_lowercase();
        match self.constraint_names.get(&key) {
            Some(existing) if *existing != kind => Err(OrmError::model(format!(
                "constraint name {name:?} is already used by a different kind of constraint"
            ))),
            _ => {
                self.constraint_names.insert(key, kind);
                Ok(())
            }
        }
    }

    fn parse_field(&mut self, field: &FieldSpec) -> OrmResult<()> {
        if field.name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Ok(());
        }
        if field.tag.starts_with('-') {
            return Ok(());
        }

        let mut col = Column::new(field.name, field.sql_type);
        let tags = tag::parse(field.tag)?;

        let mut wants_pk = false;
        let mut nullable_explicit: Option<bool> = None;

        for (key, values) in tags.iter() {
            match key {
                "name" => {
                    col.name = values.first().cloned().ok_or_else(|| {
                        OrmError::tag_syntax("name() requires exactly one value")
                    })?;
                }
                "pk" => wants_pk = true,
                "index" => {
                    let idx_name = values.first().ok_or_else(|| {
                        OrmError::tag_syntax("index() requires a name")
                    })?;
                    self.register_constraint(idx_name, ConstraintKind::KeyIndex)?;
                    push_indexed(&mut self.key_indexes, idx_name, col.clone());
                }
                "unique" => {
                    let idx_name = values.first().ok_or_else(|| {
                        OrmError::tag_syntax("unique() requires a name")
                    })?;
                    self.register_constraint(idx_name, ConstraintKind::UniqueIndex)?;
                    push_indexed(&mut self.unique_indexes, idx_name, col.clone());
                }
                "fk" => {
                    if values.len() < 3 {
                        return Err(OrmError::tag_syntax(
                            "fk() requires at least name, refTable, refCol",
                        ));
                    }
                    self.register_constraint(&values[0], ConstraintKind::ForeignKey)?;
                    self.fks.push((
                        values[0].clone(),
                        ForeignKey {
                            column: col.name.clone(),
                            ref_table: values[1].clone(),
                            ref_col: values[2].clone(),
                            update_rule: values.get(3).cloned(),
                            delete_rule: values.get(4).cloned(),
                        },
                    ));
                }
                "nullable" => {
                    nullable_explicit = Some(match values.first() {
                        None => true,
                        Some(v) => v.parse::<bool>().unwrap_or(v == "1"),
                    });
                }
                "len" => {
                    match values.len() {
                        0 => {}
                        1 => {
                            col.len1 = parse_len(&values[0])?;
                        }
                        2 => {
                            col.len1 = parse_len(&values[0])?;
                            col.len2 = parse_len(&values[1])?;
                        }
                        _ => return Err(OrmError::tag_syntax("len() accepts at most two values")),
                    }
                }
                "default" => {
                    let v = values.first().ok_or_else(|| {
                        OrmError::tag_syntax("default() requires exactly one value")
                    })?;
                    col.has_default = true;
                    col.default = Some(v.clone());
                }
                "ai" => {
                    if !field.sql_type.is_integer() {
                        return Err(OrmError::model(format!(
                            "auto-increment column {:?} must be an integer type",
                            col.name
                        )));
                    }
                    let (start, step) = parse_ai_args(values)?;
                    self.ai = Some(AutoIncr { col: col.clone(), start, step });
                    // overrides any other PK designation, globally (§3 invariant 1)
                    self.pk = vec![col.clone()];
                }
                _ => {}
            }
        }

        if let Some(nullable) = nullable_explicit {
            col.nullable = nullable;
        }

        if self.ai.as_ref().map(|ai| ai.col.name == col.name).unwrap_or(false) {
            if col.nullable {
                return Err(OrmError::model(format!(
                    "auto-increment column {:?} cannot be nullable",
                    col.name
                )));
            }
            if col.has_default {
                return Err(OrmError::model(format!(
                    "auto-increment column {:?} cannot carry a default",
                    col.name
                )));
            }
            // Column may have been cloned into `ai`/`pk` before nullable/default
            // were resolved above; keep them in sync.
            if let Some(ai) = &mut self.ai {
                ai.col = col.clone();
            }
            self.pk = vec![col.clone()];
        } else if wants_pk && self.ai.is_none() {
            self.pk.push(col.clone());
        }

        self.cols.push((col.name.clone(), col));
        Ok(())
    }

    pub fn is_immutable_after_build(&self) -> bool {
        true
    }

    /// Projects this schema into the dialect-agnostic shape
    /// `Dialect::create_table` consumes (§4.3). Constraints are carried as
    /// the unique-index list only — `Dialect::create_table` derives the
    /// inline `PRIMARY KEY`/`AUTOINCREMENT` syntax itself from each
    /// `ColumnSpec::is_ai` and `TableSpec::primary_key`.
    pub fn to_table_spec(&self) -> TableSpec {
        let ai_col = self.ai.as_ref().map(|ai| ai.col.name.clone());
        TableSpec {
            name: self.name.clone(),
            columns: self
                .cols()
                .map(|c| ColumnSpec {
                    name: c.name.clone(),
                    sql_type: c.sql_type,
                    is_ai: ai_col.as_deref() == Some(c.name.as_str()),
                    nullable: c.nullable,
                })
                .collect(),
            primary_key: self.pk.iter().map(|c| c.name.clone()).collect(),
            unique: self.unique_indexes.iter().map(|(n, cols)| (n.clone(), cols.iter().map(|c| c.name.clone()).collect())).collect(),
            meta: self.meta.clone(),
        }
    }
}

fn push_indexed(map: &mut Vec<(String, Vec<Column>)>, name: &str, col: Column) {
    if let Some((_, cols)) = map.iter_mut().find(|(n, _)| n == name) {
        cols.push(col);
    } else {
        map.push((name.to_string(), vec![col]));
    }
}

fn parse_len(v: &str) -> OrmResult<i64> {
    v.parse::<i64>().map_err(|_| OrmError::tag_syntax(format!("{v:?} is not a valid len() value")))
}

fn parse_ai_args(values: &[String]) -> OrmResult<(i64, i64)> {
    match values.len() {
        0 => Ok((1, 1)),
        1 => {
            let start = values[0]
                .parse::<i64>()
                .map_err(|_| OrmError::tag_syntax(format!("{:?} is not a valid ai() start", values[0])))?;
            Ok((start, 1))
        }
        2 => {
            let start = values[0]
                .parse::<i64>()
                .map_err(|_| OrmError::tag_syntax(format!("{:?} is not a valid ai() start", values[0])))?;
            let step = values[1]
                .parse::<i64>()
                .map_err(|_| OrmError::tag_syntax(format!("{:?} is not a valid ai() step", values[1])))?;
            Ok((start, step))
        }
        _ => Err(OrmError::tag_syntax("ai() accepts at most two values")),
    }
}

/// Process-wide model cache, keyed by the record type's `TypeId` (§3
/// Lifecycle). Two concurrent builds of the same type are tolerated — last
/// one to insert wins, which is fine since a `Model` for a given type is
/// always built the same way.
fn model_cache() -> &'static Mutex<HashMap<TypeId, Arc<Model>>> {
    static CACHE: OnceLock<Mutex<HashMap<TypeId, Arc<Model>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

impl Model {
    /// Returns the cached `Model` for `T`, building and inserting it on
    /// first use.
    pub fn of<T: Entity>() -> OrmResult<Arc<Model>> {
        let type_id = TypeId::of::<T>();
        if let Some(m) = model_cache().lock().expect("model cache poisoned").get(&type_id) {
            return Ok(m.clone());
        }
        let built = Arc::new(Model::build(T::table_name(), T::fields(), T::meta())?);
        model_cache().lock().expect("model cache poisoned").insert(type_id, built.clone());
        Ok(built)
    }
}

/// Clears the process-wide model cache. Test-only in practice: production
/// callers never need to forget a `Model` once the process is running
/// (§3 Lifecycle).
pub fn free_models() {
    model_cache().lock().expect("model cache poisoned").clear();
}
