//! SQL-looking strings for logs and copy/paste into `psql`.
//!
//! These are never executed. Values are interpolated verbatim with no escaping, so
//! the output must not be fed to a database by anything in this crate.

use tracing::debug;

fn table_name(model: &str) -> String {
    model.replace('.', "_")
}

/// `gen_select("name", "stock.production.lot", "WHERE name='x'")` gives
/// `SELECT name FROM stock_production_lot WHERE name='x';`.
pub fn gen_select(fields: &str, model: &str, where_clause: &str) -> String {
    let query = format!("SELECT {fields} FROM {} {where_clause};", table_name(model));
    debug!(%query, "generated select");
    query
}

pub fn gen_update(field: &str, value: &str, model: &str, where_clause: &str) -> String {
    let query = format!(
        "UPDATE {} SET {field}='{value}' {where_clause};",
        table_name(model)
    );
    debug!(%query, "generated update");
    query
}

pub fn gen_delete(model: &str, where_clause: &str) -> String {
    let query = format!("DELETE FROM {} {where_clause};", table_name(model));
    debug!(%query, "generated delete");
    query
}
