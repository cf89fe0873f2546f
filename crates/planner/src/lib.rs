//! Statement dispatch: turns a parsed [`Statement`] into catalog/data-manager
//! calls and a textual response, per the planner/executor table.
//!
//! ```no_run
//! use catalog::Catalog;
//!
//! let mut catalog = Catalog::new("./db_data", 50);
//! let response = planner::execute(&mut catalog, "SELECT * FROM t").unwrap();
//! ```


use catalog::{Catalog, Column, TableSchema};
use common::{DbError, DbResult};
use expr::{Expr, check_predicate, eval};
use parser::{SelectFields, Statement, parse};
use types::{SqlType, Value};

/// Parse and execute one SQL statement against `catalog`, returning the
/// textual response a client would see on the wire.
pub fn execute(catalog: &mut Catalog, sql: &str) -> DbResult<String> {
    let stmt = parse(sql)?;
    dispatch(catalog, stmt)
}

fn dispatch(catalog: &mut Catalog, stmt: Statement) -> DbResult<String> {
    match stmt {
        Statement::Create { table, columns } => create(catalog, &table, columns),
        Statement::Drop { table } => drop_table(catalog, &table),
        Statement::Insert { table, values } => insert(catalog, &table, values),
        Statement::Select {
            fields,
            table,
            where_clause,
        } => select(catalog, &table, fields, where_clause),
        Statement::Update {
            table,
            column,
            value,
            where_clause,
        } => update(catalog, &table, &column, value, where_clause),
        Statement::Delete { table, where_clause } => delete(catalog, &table, where_clause),
    }
}

fn create(catalog: &mut Catalog, table: &str, columns: Vec<parser::ColumnDecl>) -> DbResult<String> {
    let columns = columns
        .into_iter()
        .map(|c| Column::new(c.name, c.ty, c.nullable))
        .collect();
    catalog.create_table(table, columns)?;
    Ok("OK".to_string())
}

fn drop_table(catalog: &mut Catalog, table: &str) -> DbResult<String> {
    catalog.drop_table(table)?;
    Ok("OK".to_string())
}

/// `(name, type)` pairs for [`check_predicate`]/[`eval`], in declared order.
fn column_kinds(schema: &TableSchema) -> Vec<(String, SqlType)> {
    schema
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.ty))
        .collect()
}

/// Decode an `Insert`/`Update` literal token into a `Value`. The v1 grammar's
/// `Value` production never yields a literal `NULL` (see the Insert grammar),
/// so an `Ident` token reaching here (a bare column name where a literal was
/// expected) has no decoded value.
fn literal_or_unsupported(token: &expr::Token) -> DbResult<Value> {
    token
        .literal_value()
        .ok_or_else(|| DbError::Unsupported("expected a literal value, found an identifier".into()))
}

fn insert(catalog: &mut Catalog, table: &str, values: Vec<expr::Token>) -> DbResult<String> {
    let meta = catalog.table(table)?;
    let schema = meta.schema.clone();

    if values.len() != schema.columns().len() {
        return Err(DbError::Unsupported(format!(
            "expected {} values, got {}",
            schema.columns().len(),
            values.len()
        )));
    }

    let decoded: DbResult<Vec<Value>> = values.iter().map(literal_or_unsupported).collect();
    let packed = schema.pack(&decoded?)?;
    catalog.manager(table)?.insert(&packed)?;
    Ok("OK".to_string())
}

fn select(
    catalog: &mut Catalog,
    table: &str,
    fields: SelectFields,
    where_clause: Option<Expr>,
) -> DbResult<String> {
    let meta = catalog.table(table)?;
    let schema = meta.schema.clone();
    let kinds = column_kinds(&schema);

    let field_names: Vec<String> = match fields {
        SelectFields::Star | SelectFields::All | SelectFields::Unique => {
            schema.columns().iter().map(|c| c.name.clone()).collect()
        }
        SelectFields::List(names) => {
            for name in &names {
                if schema.column_index(name).is_none() {
                    return Err(DbError::NoSuchCol(name.clone()));
                }
            }
            names
        }
    };

    if let Some(expr) = &where_clause {
        check_predicate(expr, &kinds)?;
    }

    let rows = match where_clause {
        Some(expr) => {
            let unpack_schema = schema.clone();
            catalog
                .manager(table)?
                .retrieve_by(move |bytes| eval(&expr, &kinds, &unpack_schema.unpack(bytes)))?
        }
        None => catalog.manager(table)?.scan_all()?,
    };

    let mut out = String::from("{ ");
    for (_, bytes) in &rows {
        let values = schema.unpack(bytes);
        out.push('[');
        for name in &field_names {
            let idx = schema.column_index(name).expect("validated above");
            out.push_str(&format_value(&values[idx]));
            out.push(',');
        }
        out.push(']');
    }
    out.push_str(" }");
    Ok(out)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Text(s) => s.clone(),
        Value::Null => String::new(),
    }
}

fn update(
    catalog: &mut Catalog,
    table: &str,
    column: &str,
    value: expr::Token,
    where_clause: Expr,
) -> DbResult<String> {
    let meta = catalog.table(table)?;
    let schema = meta.schema.clone();
    let kinds = column_kinds(&schema);

    check_predicate(&where_clause, &kinds)?;

    let col_index = schema
        .column_index(column)
        .ok_or_else(|| DbError::NoSuchCol(column.to_string()))?;
    let new_value = literal_or_unsupported(&value)?;
    let col_ty = schema.column(col_index).ty;
    match (col_ty, &new_value) {
        (SqlType::Int, Value::Int(v)) => {
            i16::try_from(*v).map_err(|_| DbError::OutOfRange(*v as u64))?;
        }
        (SqlType::Double, Value::Double(_)) => {}
        (SqlType::String(k), Value::Text(s)) => {
            if s.len() > k as usize {
                return Err(DbError::TooLong {
                    col: column.to_string(),
                    max: k as usize,
                    got: s.len(),
                });
            }
        }
        _ => {
            return Err(DbError::WrongType {
                col: column.to_string(),
                expected: col_ty.name().into(),
                got: new_value.sql_type().map(|t| t.name()).unwrap_or("NULL").into(),
            });
        }
    }

    let schema_for_pred = schema.clone();
    let schema_for_mutate = schema.clone();
    catalog.manager(table)?.update_by(
        move |bytes| eval(&where_clause, &kinds, &schema_for_pred.unpack(bytes)),
        move |bytes| {
            let mut values = schema_for_mutate.unpack(bytes);
            values[col_index] = new_value.clone();
            *bytes = schema_for_mutate
                .pack(&values)
                .expect("values were just unpacked from a record of this schema");
        },
    )?;
    Ok("OK".to_string())
}

fn delete(catalog: &mut Catalog, table: &str, where_clause: Option<Expr>) -> DbResult<String> {
    let meta = catalog.table(table)?;
    let schema = meta.schema.clone();
    let kinds = column_kinds(&schema);

    match where_clause {
        Some(expr) => {
            check_predicate(&expr, &kinds)?;
            catalog
                .manager(table)?
                .delete_by(move |bytes| eval(&expr, &kinds, &schema.unpack(bytes)))?;
        }
        None => {
            let positions: Vec<_> = catalog
                .manager(table)?
                .scan_all()?
                .into_iter()
                .map(|(pos, _)| pos)
                .collect();
            let manager = catalog.manager(table)?;
            for pos in positions {
                manager.delete(pos)?;
            }
        }
    }
    Ok("OK".to_string())
}
