//! Lexer tokens and the predicate expression tree.
//!
//! `Token` is shared between the lexer and the parser: a `Cond` keeps the
//! two full tokens it was built from (not just their decoded values) so a
//! literal's lexed type can be checked against a column's declared type
//! without re-deriving it from the value's shape.
//!
//! `Expr` models the full boolean tree (`And`/`Or`/`Not`) the grammar's
//! `Expr` production could in principle produce, but the accepted grammar
//! only ever builds a flat AND-joined chain of `Cond`s. [`check_predicate`]
//! enforces that at plan time; [`eval`] assumes it already passed.


use common::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use types::{SqlType, Value};

/// A reserved word recognized by the lexer's keyword table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Select,
    From,
    Where,
    Create,
    Table,
    Insert,
    Into,
    Values,
    Update,
    Delete,
    Drop,
    And,
    Or,
    Not,
    Unique,
    All,
    Null,
    Index,
    Int,
    Double,
    String,
}

impl Keyword {
    /// Look up a keyword by its case-insensitive spelling.
    pub fn lookup(word: &str) -> Option<Self> {
        Some(match word.to_ascii_uppercase().as_str() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "UPDATE" => Keyword::Update,
            "DELETE" => Keyword::Delete,
            "DROP" => Keyword::Drop,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "UNIQUE" => Keyword::Unique,
            "ALL" => Keyword::All,
            "NULL" => Keyword::Null,
            "INDEX" => Keyword::Index,
            "INT" => Keyword::Int,
            "DOUBLE" => Keyword::Double,
            "STRING" => Keyword::String,
            _ => return None,
        })
    }
}

/// One lexical token. `Quote`/`Quos` are vestigial single-character quote
/// tokens the lexer can in principle emit but the grammar never consumes;
/// kept for token-set completeness, same as the bare `Eq`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Token {
    Int(i64),
    Double(f64),
    Str(String),
    Ident(String),
    Keyword(Keyword),
    Comma,
    Semi,
    Star,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Eq,
    EqEq,
    Lt,
    Gt,
    Le,
    Ge,
    Quote,
    Quos,
    Eof,
}

impl Token {
    /// The `Value` a literal token decodes to, or `None` for a non-literal
    /// token such as `Ident` or a punctuation mark.
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            Token::Int(v) => Some(Value::Int(*v)),
            Token::Double(v) => Some(Value::Double(*v)),
            Token::Str(v) => Some(Value::Text(v.clone())),
            _ => None,
        }
    }
}

/// The five comparators the grammar's `Op` production accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Comparator {
    /// The comparator that holds when the two sides of a `Cond` are swapped.
    fn flip(self) -> Self {
        match self {
            Comparator::Eq => Comparator::Eq,
            Comparator::Ge => Comparator::Le,
            Comparator::Le => Comparator::Ge,
            Comparator::Gt => Comparator::Lt,
            Comparator::Lt => Comparator::Gt,
        }
    }
}

/// One `Value Op Value` condition, holding the full lexed token on each
/// side rather than just its decoded value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cond {
    pub left: Token,
    pub op: Comparator,
    pub right: Token,
}

/// A parsed `WHERE` predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Cond(Cond),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

enum Side<'a> {
    Column(&'a str),
    Literal(Value),
    Other,
}

fn resolve(token: &Token) -> Side<'_> {
    match token {
        Token::Ident(name) => Side::Column(name),
        _ => match token.literal_value() {
            Some(v) => Side::Literal(v),
            None => Side::Other,
        },
    }
}

fn same_kind(a: SqlType, b: SqlType) -> bool {
    matches!(
        (a, b),
        (SqlType::Int, SqlType::Int)
            | (SqlType::Double, SqlType::Double)
            | (SqlType::String(_), SqlType::String(_))
    )
}

/// Plan-time validation: every `Cond` must compare a known column against a
/// literal of the column's declared type, with `==` as the only comparator
/// allowed against a `STRING` column. Any `Or`/`Not` node anywhere in the
/// tree is rejected, since the accepted grammar never produces one.
pub fn check_predicate(expr: &Expr, columns: &[(String, SqlType)]) -> DbResult<()> {
    match expr {
        Expr::Cond(cond) => check_cond(cond, columns),
        Expr::And(left, right) => {
            check_predicate(left, columns)?;
            check_predicate(right, columns)
        }
        Expr::Or(..) | Expr::Not(_) => {
            Err(DbError::Unsupported("OR/NOT predicates are not supported".into()))
        }
    }
}

fn check_cond(cond: &Cond, columns: &[(String, SqlType)]) -> DbResult<()> {
    let (name, literal_ty) = match (resolve(&cond.left), resolve(&cond.right)) {
        (Side::Column(name), Side::Literal(v)) | (Side::Literal(v), Side::Column(name)) => {
            (name, v.sql_type().expect("literal token always decodes to a typed Value"))
        }
        // Neither side (or both sides) a column: the row-level predicate
        // always rejects this shape, nothing to validate ahead of time.
        _ => return Ok(()),
    };

    let (_, col_ty) = columns
        .iter()
        .find(|(col_name, _)| col_name == name)
        .ok_or_else(|| DbError::NoSuchCol(name.to_string()))?;

    if !same_kind(*col_ty, literal_ty) {
        return Err(DbError::WrongType {
            col: name.to_string(),
            expected: col_ty.name().into(),
            got: literal_ty.name().into(),
        });
    }

    if matches!(literal_ty, SqlType::String(_)) && cond.op != Comparator::Eq {
        return Err(DbError::WrongType {
            col: name.to_string(),
            expected: "comparable with == only".into(),
            got: "STRING with a non-== comparator".into(),
        });
    }

    Ok(())
}

/// Row-level predicate evaluation. Assumes [`check_predicate`] already
/// passed for this `expr` against this `columns`; any shape `check_cond`
/// would have rejected simply evaluates to `false` here rather than
/// panicking, since a row that can't be judged is a row that doesn't match.
pub fn eval(expr: &Expr, columns: &[(String, SqlType)], values: &[Value]) -> bool {
    match expr {
        Expr::Cond(cond) => eval_cond(cond, columns, values),
        Expr::And(left, right) => eval(left, columns, values) && eval(right, columns, values),
        Expr::Or(..) | Expr::Not(_) => false,
    }
}

fn eval_cond(cond: &Cond, columns: &[(String, SqlType)], values: &[Value]) -> bool {
    let (name, literal, op) = match (resolve(&cond.left), resolve(&cond.right)) {
        (Side::Column(name), Side::Literal(v)) => (name, v, cond.op),
        (Side::Literal(v), Side::Column(name)) => (name, v, cond.op.flip()),
        _ => return false,
    };

    let Some(idx) = columns.iter().position(|(col_name, _)| col_name == name) else {
        return false;
    };

    match values[idx].cmp_same_type(&literal) {
        None => false,
        Some(ord) => match op {
            Comparator::Eq => ord == std::cmp::Ordering::Equal,
            Comparator::Ge => ord != std::cmp::Ordering::Less,
            Comparator::Le => ord != std::cmp::Ordering::Greater,
            Comparator::Gt => ord == std::cmp::Ordering::Greater,
            Comparator::Lt => ord == std::cmp::Ordering::Less,
        },
    }
}
