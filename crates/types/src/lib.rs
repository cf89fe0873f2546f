use std::cmp::Ordering;

/// A column's declared SQL type, as it appears after `CREATE`.
///
/// `String` carries its declared width `k` (`1 <= k <= 1024`), since the
/// record layout needs it to compute offsets; `Int` and `Double` are always
/// 2 and 8 bytes respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    Int,
    Double,
    String(u16),
}

impl SqlType {
    /// Byte width of a column's packed value, before 4-byte alignment.
    pub fn raw_width(&self) -> u16 {
        match self {
            SqlType::Int => 2,
            SqlType::Double => 8,
            SqlType::String(k) => *k,
        }
    }

    /// Byte width after rounding up to a multiple of 4.
    pub fn aligned_width(&self) -> u16 {
        let w = self.raw_width();
        w.div_ceil(4) * 4
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Int => "INT",
            SqlType::Double => "DOUBLE",
            SqlType::String(_) => "STRING",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Double(f64),
    Text(String),
    Null,
}

impl Value {
    /// The `SqlType` a literal lexes as, used to type-check against a column's
    /// declared type without re-deriving it from the literal's shape.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Value::Int(_) => Some(SqlType::Int),
            Value::Double(_) => Some(SqlType::Double),
            Value::Text(s) => Some(SqlType::String(s.len() as u16)),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.eq(b)),
            (Value::Double(a), Value::Double(b)) => Some(a.eq(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.eq(b)),
            _ => None,
        }
    }
}
