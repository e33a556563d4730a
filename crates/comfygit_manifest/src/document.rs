//! Low-level helpers for navigating and mutating the `pyproject.toml`
//! [`toml_edit::DocumentMut`] while preserving comments and key order.

use toml_edit::{Array, ArrayOfTables, Item, Table, Value};

/// Gets or creates an implicit (non-rendered-as-header) sub-table under
/// `parent[key]`. Used for the dotted path segments of `tool.<product>.*`
/// tables so that only the leaf table gets an explicit `[a.b.c]` header.
pub fn get_or_insert_implicit_table<'a>(parent: &'a mut Table, key: &str) -> &'a mut Table {
    if parent.get(key).is_none() {
        let mut table = Table::new();
        table.set_implicit(true);
        parent.insert(key, Item::Table(table));
    }
    parent
        .get_mut(key)
        .and_then(Item::as_table_mut)
        .expect("just inserted a table")
}

/// Like [`get_or_insert_implicit_table`] but the resulting table is rendered
/// with an explicit header (used for leaf tables that hold actual data).
pub fn get_or_insert_table<'a>(parent: &'a mut Table, key: &str) -> &'a mut Table {
    if parent.get(key).is_none() {
        parent.insert(key, Item::Table(Table::new()));
    }
    parent
        .get_mut(key)
        .and_then(Item::as_table_mut)
        .expect("just inserted a table")
}

pub fn get_or_insert_array<'a>(parent: &'a mut Table, key: &str) -> &'a mut Array {
    if parent.get(key).is_none() {
        parent.insert(key, Item::Value(Value::Array(Array::new())));
    }
    parent
        .get_mut(key)
        .and_then(Item::as_array_mut)
        .expect("just inserted an array")
}

pub fn get_or_insert_array_of_tables<'a>(parent: &'a mut Table, key: &str) -> &'a mut ArrayOfTables {
    if parent.get(key).is_none() {
        parent.insert(key, Item::ArrayOfTables(ArrayOfTables::new()));
    }
    parent
        .get_mut(key)
        .and_then(Item::as_array_of_tables_mut)
        .expect("just inserted an array of tables")
}

/// Removes `parent[key]` if present; a no-op otherwise, so setters stay
/// idempotent when called against already-clean state.
pub fn remove_if_present(parent: &mut Table, key: &str) {
    parent.remove(key);
}

/// Appends a string to an array if it isn't already present (case-sensitive).
pub fn array_push_unique(array: &mut Array, value: &str) {
    let already_present = array
        .iter()
        .any(|v| v.as_str().map(|s| s == value).unwrap_or(false));
    if !already_present {
        array.push(value);
    }
}

/// Removes every string equal to `value` from the array.
pub fn array_remove_value(array: &mut Array, value: &str) {
    let indices: Vec<usize> = array
        .iter()
        .enumerate()
        .filter(|(_, v)| v.as_str().map(|s| s == value).unwrap_or(false))
        .map(|(i, _)| i)
        .collect();
    for idx in indices.into_iter().rev() {
        array.remove(idx);
    }
}
