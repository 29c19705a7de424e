//! Backend-independent statement builders.
//!
//! Table and column names come from a [`SequenceSpec`] at runtime, so every
//! identifier is an [`Alias`]. Values are inlined by the query builder.

use sea_query::{
    Alias, ColumnDef, Cond, Condition, DeleteStatement, Expr, Func, Index, IndexCreateStatement,
    InsertStatement, Order, Query, SelectStatement, SimpleExpr, Table, TableCreateStatement,
    UpdateStatement, Value,
};

use crate::config::SequenceSpec;
use crate::interfaces::{PositionRange, RecordKey, Scope, ScopeValue, Shift, ShiftDirection};
use crate::position::PositionOrder;

/// Result column holding `MAX(position)`.
pub const MAX_POSITION: &str = "max_position";
/// Result column holding `COUNT(key)`.
pub const ROW_COUNT: &str = "row_count";
/// Result column holding a row's position.
pub const POSITION: &str = "seq_position";
/// Result column holding a row's key.
pub const RECORD_KEY: &str = "record_key";

/// Column type used when creating a sequence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

impl From<PositionOrder> for Order {
    fn from(order: PositionOrder) -> Self {
        match order {
            PositionOrder::Ascending => Order::Asc,
            PositionOrder::Descending => Order::Desc,
        }
    }
}

/// Append `ORDER BY position` to a caller's query.
///
/// This is the query-side counterpart of `PositionMaintainer::ordered` for
/// callers composing their own selects against a sequence table.
pub fn order_by_position(select: &mut SelectStatement, spec: &SequenceSpec, order: PositionOrder) {
    select.order_by(Alias::new(spec.position_column.as_str()), order.into());
}

pub fn key_value(key: &RecordKey) -> Value {
    match key {
        RecordKey::Int(id) => (*id).into(),
        RecordKey::Text(id) => id.clone().into(),
    }
}

/// `Some` for concrete scope values, `None` for SQL NULL.
fn scope_value(value: &ScopeValue) -> Option<Value> {
    match value {
        ScopeValue::Int(v) => Some((*v).into()),
        ScopeValue::Text(v) => Some(v.clone().into()),
        ScopeValue::Null => None,
    }
}

fn col(name: &str) -> Expr {
    Expr::col(Alias::new(name))
}

fn column(name: &str) -> SimpleExpr {
    SimpleExpr::from(col(name))
}

/// `col = value AND ...` over every scope column; NULL compares with IS NULL.
pub fn scope_condition(scope: &Scope) -> Condition {
    scope
        .columns()
        .iter()
        .fold(Cond::all(), |cond, (column, value)| {
            match scope_value(value) {
                Some(value) => cond.add(col(column).eq(value)),
                None => cond.add(col(column).is_null()),
            }
        })
}

fn key_condition(spec: &SequenceSpec, scope: &Scope, key: &RecordKey) -> Condition {
    scope_condition(scope).add(col(&spec.key_column).eq(key_value(key)))
}

fn position_as_bigint(expr: SimpleExpr) -> SimpleExpr {
    Func::cast_as(expr, Alias::new("BIGINT")).into()
}

pub fn max_position(spec: &SequenceSpec, scope: &Scope) -> SelectStatement {
    Query::select()
        .expr_as(
            position_as_bigint(col(&spec.position_column).max()),
            Alias::new(MAX_POSITION),
        )
        .from(Alias::new(spec.table.as_str()))
        .cond_where(scope_condition(scope))
        .to_owned()
}

pub fn count(spec: &SequenceSpec, scope: &Scope) -> SelectStatement {
    Query::select()
        .expr_as(Func::count(column(&spec.key_column)), Alias::new(ROW_COUNT))
        .from(Alias::new(spec.table.as_str()))
        .cond_where(scope_condition(scope))
        .to_owned()
}

pub fn position_of(spec: &SequenceSpec, scope: &Scope, key: &RecordKey) -> SelectStatement {
    Query::select()
        .expr_as(
            position_as_bigint(column(&spec.position_column)),
            Alias::new(POSITION),
        )
        .from(Alias::new(spec.table.as_str()))
        .cond_where(key_condition(spec, scope, key))
        .to_owned()
}

pub fn entries(
    spec: &SequenceSpec,
    scope: &Scope,
    order: Option<PositionOrder>,
) -> SelectStatement {
    let mut select = Query::select()
        .expr_as(column(&spec.key_column), Alias::new(RECORD_KEY))
        .expr_as(
            position_as_bigint(column(&spec.position_column)),
            Alias::new(POSITION),
        )
        .from(Alias::new(spec.table.as_str()))
        .cond_where(scope_condition(scope))
        .to_owned();
    if let Some(order) = order {
        order_by_position(&mut select, spec, order);
        // Ties keep a stable order so normalize is deterministic.
        select.order_by(Alias::new(spec.key_column.as_str()), Order::Asc);
    }
    select
}

/// `INSERT (key, scope columns..., position)`.
pub fn insert(
    spec: &SequenceSpec,
    scope: &Scope,
    key: &RecordKey,
    position: i64,
) -> Result<InsertStatement, sea_query::error::Error> {
    let mut columns = vec![Alias::new(spec.key_column.as_str())];
    let mut values: Vec<SimpleExpr> = vec![key_value(key).into()];
    for (column, value) in scope.columns() {
        columns.push(Alias::new(column.as_str()));
        values.push(match scope_value(value) {
            Some(value) => value.into(),
            None => SimpleExpr::Keyword(sea_query::Keyword::Null),
        });
    }
    columns.push(Alias::new(spec.position_column.as_str()));
    values.push(position.into());

    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(spec.table.as_str()))
        .columns(columns)
        .values(values)?;
    Ok(stmt)
}

/// Single bulk `UPDATE ... SET position = position ± 1` over a range.
pub fn shift(spec: &SequenceSpec, scope: &Scope, shift: &Shift) -> UpdateStatement {
    let position = col(&spec.position_column);
    let range = match shift.range {
        PositionRange::Between(from, to) => col(&spec.position_column).between(from, to),
        PositionRange::After(after) => col(&spec.position_column).gt(after),
    };
    let mut cond = scope_condition(scope).add(range);
    if let Some(key) = &shift.exclude {
        cond = cond.add(col(&spec.key_column).ne(key_value(key)));
    }
    let value = match shift.direction {
        ShiftDirection::Increment => position.add(1),
        ShiftDirection::Decrement => position.sub(1),
    };

    Query::update()
        .table(Alias::new(spec.table.as_str()))
        .value(Alias::new(spec.position_column.as_str()), value)
        .cond_where(cond)
        .to_owned()
}

/// Write `position` on a single row.
pub fn set_position(
    spec: &SequenceSpec,
    scope: &Scope,
    key: &RecordKey,
    position: i64,
) -> UpdateStatement {
    Query::update()
        .table(Alias::new(spec.table.as_str()))
        .value(Alias::new(spec.position_column.as_str()), position)
        .cond_where(key_condition(spec, scope, key))
        .to_owned()
}

pub fn delete(spec: &SequenceSpec, scope: &Scope, key: &RecordKey) -> DeleteStatement {
    Query::delete()
        .from_table(Alias::new(spec.table.as_str()))
        .cond_where(key_condition(spec, scope, key))
        .to_owned()
}

fn column_def(name: &str, kind: ColumnKind) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(name));
    match kind {
        ColumnKind::Integer => def.big_integer(),
        ColumnKind::Text => def.text(),
    };
    def
}

/// `CREATE TABLE IF NOT EXISTS` with key, scope and position columns.
pub fn create_table(
    spec: &SequenceSpec,
    key: ColumnKind,
    scope_columns: &[(&str, ColumnKind)],
) -> TableCreateStatement {
    let mut table = Table::create();
    table
        .table(Alias::new(spec.table.as_str()))
        .if_not_exists()
        .col(column_def(&spec.key_column, key).not_null().primary_key());
    for (name, kind) in scope_columns {
        table.col(&mut column_def(name, *kind));
    }
    table.col(
        ColumnDef::new(Alias::new(spec.position_column.as_str()))
            .big_integer()
            .not_null(),
    );
    table.to_owned()
}

/// Non-unique index over `(scope columns..., position)`.
///
/// Not unique: a move passes through transient duplicate positions.
pub fn create_position_index(spec: &SequenceSpec, scope_columns: &[&str]) -> IndexCreateStatement {
    let mut index = Index::create();
    index
        .if_not_exists()
        .name(format!("idx_{}_{}", spec.table, spec.position_column))
        .table(Alias::new(spec.table.as_str()));
    for name in scope_columns {
        index.col(Alias::new(*name));
    }
    index.col(Alias::new(spec.position_column.as_str()));
    index.to_owned()
}
