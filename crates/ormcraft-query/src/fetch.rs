//! Row-to-destination materialisation (§4.10, §4.11, components C/K).
//!
//! Grounded in `orm/core/fetch.go`'s `parseObj`/`Fetch2Objs`/`Fetch2Maps`/
//! `FetchColumns`. The original dispatches on `reflect.Kind` at runtime to
//! decide whether the destination is a mapping, a single record, a growable
//! sequence, or a fixed array; Rust has no such dispatch; it replaces it with
//! one function per destination shape. [`FromRow`] stands in for `parseObj`
//! — implemented once per record type, it is the hand-written equivalent of
//! the reflective field walk (`name` tag, `-` skip, embedded-field flatten)
//! the original performs at materialisation time.

use std::collections::HashMap;

use ormcraft_core::{convert, FromValue, OrmError, OrmResult, RowView, Value};

/// Implemented once per record type: writes one row's columns into a fresh
/// value of `Self`. Columns absent from the row leave the corresponding
/// field at its default (§4.10 "non-present source columns leave destination
/// fields unchanged").
pub trait FromRow: Sized {
    fn from_row(row: &RowView) -> OrmResult<Self>;
}

/// One row as a name→value mapping, in column order.
pub fn row_to_map(row: &RowView) -> HashMap<String, Value> {
    row.columns.iter().cloned().zip(row.values.iter().cloned()).collect()
}

/// All rows as mappings ("sequence of mapping", §4.10).
pub fn fetch_maps(rows: &[RowView]) -> Vec<HashMap<String, Value>> {
    rows.iter().map(row_to_map).collect()
}

/// The first row as a mapping, or `None` if the result set is empty
/// ("mapping", single-row mode).
pub fn fetch_map(rows: &[RowView]) -> Option<HashMap<String, Value>> {
    rows.first().map(row_to_map)
}

/// All rows materialised as `T` ("sequence of record").
pub fn fetch_records<T: FromRow>(rows: &[RowView]) -> OrmResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// The first row materialised as `T`, or `None` if the result set is empty
/// ("single record").
pub fn fetch_record<T: FromRow>(rows: &[RowView]) -> OrmResult<Option<T>> {
    rows.first().map(T::from_row).transpose()
}

/// Materialises into a caller-owned, resizable destination, replacing its
/// contents so its final length matches `rows` — the growable-sequence case
/// of §4.10 ("a destination sequence of length 1 is grown to 2").
pub fn fetch_into<T: FromRow>(dest: &mut Vec<T>, rows: &[RowView]) -> OrmResult<()> {
    *dest = fetch_records(rows)?;
    Ok(())
}

/// Materialises into a fixed-length destination slice (an array, or a
/// pre-sized `Vec` slice), filling at most `min(dest.len(), rows.len())`
/// entries front-to-back and leaving any surplus destination elements
/// untouched — the fixed-array case of §4.10 ("a fixed array of length 3
/// leaves the 3rd element unchanged"). Returns the number of entries filled.
pub fn fetch_into_slice<T: FromRow>(dest: &mut [T], rows: &[RowView]) -> OrmResult<usize> {
    let n = dest.len().min(rows.len());
    for i in 0..n {
        dest[i] = T::from_row(&rows[i])?;
    }
    Ok(n)
}

/// All values of one named column, in row order ("single column",
/// sequence form). Fails with [`OrmError::unknown_column`] if the column is
/// not present in the first row; an empty result set passes trivially since
/// there is no row to check the name against.
pub fn fetch_column<T: FromValue>(rows: &[RowView], column: &str) -> OrmResult<Vec<T>> {
    if let Some(first) = rows.first() {
        if !first.columns.iter().any(|c| c == column) {
            return Err(OrmError::unknown_column(column));
        }
    }
    rows.iter()
        .map(|row| {
            let value = row.get(column).ok_or_else(|| OrmError::unknown_column(column))?;
            convert::<T>(value)
        })
        .collect()
}

/// The named column's value from the first row only ("single column",
/// single-row mode).
pub fn fetch_column_one<T: FromValue>(rows: &[RowView], column: &str) -> OrmResult<Option<T>> {
    match rows.first() {
        None => Ok(None),
        Some(row) => {
            let value = row.get(column).ok_or_else(|| OrmError::unknown_column(column))?;
            Ok(Some(convert::<T>(value)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Default)]
    struct FetchUser {
        id: i64,
        email: String,
    }

    impl FromRow for FetchUser {
        fn from_row(row: &RowView) -> OrmResult<Self> {
            let mut rec = FetchUser::default();
            if let Some(v) = row.get("id") {
                rec.id = convert::<i64>(v)?;
            }
            if let Some(v) = row.get("Email") {
                rec.email = convert::<String>(v)?;
            }
            Ok(rec)
        }
    }

    fn sample_rows() -> Vec<RowView> {
        vec![
            RowView::new(
                vec!["id".into(), "Email".into()],
                vec![Value::Int(0), Value::Text("email-0".into())],
            ),
            RowView::new(
                vec!["id".into(), "Email".into()],
                vec![Value::Int(1), Value::Text("email-1".into())],
            ),
        ]
    }

    #[test]
    fn scenario_4_growable_sequence_is_grown_to_row_count() {
        let rows = sample_rows();
        let mut dest = vec![FetchUser::default()];
        fetch_into(&mut dest, &rows).unwrap();
        assert_eq!(dest.len(), 2);
        assert_eq!(dest[0], FetchUser { id: 0, email: "email-0".into() });
        assert_eq!(dest[1], FetchUser { id: 1, email: "email-1".into() });
    }

    #[test]
    fn scenario_4_fixed_array_leaves_surplus_unchanged() {
        let rows = sample_rows();
        let mut dest = [
            FetchUser { id: 9, email: "stale".into() },
            FetchUser { id: 9, email: "stale".into() },
            FetchUser { id: 9, email: "stale".into() },
        ];
        let filled = fetch_into_slice(&mut dest, &rows).unwrap();
        assert_eq!(filled, 2);
        assert_eq!(dest[0].email, "email-0");
        assert_eq!(dest[1].email, "email-1");
        assert_eq!(dest[2].email, "stale");
    }

    #[test]
    fn fetch_maps_preserves_row_order() {
        let rows = sample_rows();
        let maps = fetch_maps(&rows);
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].get("id"), Some(&Value::Int(0)));
    }

    #[test]
    fn fetch_column_reports_unknown_column() {
        let rows = sample_rows();
        assert!(fetch_column::<i64>(&rows, "missing").is_err());
        let ids: Vec<i64> = fetch_column(&rows, "id").unwrap();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn fetch_column_on_empty_rows_is_not_an_error() {
        let empty: Vec<RowView> = vec![];
        let ids = fetch_column::<i64>(&empty, "id").unwrap();
        assert!(ids.is_empty());
    }
}
