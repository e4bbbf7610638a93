//! SQLite implementation of the position store collaborators.

use super::{GroupScope, OrderingResult, PositionShift, PositionStore};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Position store over one connection. Pass a `Transaction` (through
/// deref) so shifts commit together with the record write.
pub struct SqlitePositionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePositionStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PositionStore for SqlitePositionStore<'_> {
    fn count_live(&self, scope: &GroupScope) -> OrderingResult<i64> {
        let mut sql = format!(
            "SELECT COUNT(*) FROM {} WHERE is_deleted = 0",
            scope.table().table_name()
        );
        let mut bind_values: Vec<Value> = Vec::new();
        push_group_filters(&mut sql, &mut bind_values, scope);

        let count = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        Ok(count)
    }

    fn shift(&self, shift: &PositionShift<'_>) -> OrderingResult<usize> {
        let mut sql = format!(
            "UPDATE {}
             SET position = position + ?,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE is_deleted = 0
               AND position >= ?",
            shift.scope.table().table_name()
        );
        let mut bind_values = vec![Value::Integer(shift.delta), Value::Integer(shift.from)];

        if let Some(to) = shift.to {
            sql.push_str(" AND position <= ?");
            bind_values.push(Value::Integer(to));
        }
        if let Some(exclude) = shift.exclude {
            sql.push_str(" AND uuid <> ?");
            bind_values.push(Value::Text(exclude.to_string()));
        }
        push_group_filters(&mut sql, &mut bind_values, shift.scope);

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }
}

fn push_group_filters(sql: &mut String, bind_values: &mut Vec<Value>, scope: &GroupScope) {
    for (column, value) in scope.keys() {
        sql.push_str(" AND ");
        sql.push_str(column);
        sql.push_str(" = ?");
        bind_values.push(Value::Text(value.clone()));
    }
}
