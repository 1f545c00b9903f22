//! SQL 参数值类型。

use std::borrow::Cow;
use std::fmt;

/// 可绑定的 SQL 参数值。
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(Cow<'static, str>),
    Bytes(Vec<u8>),
    DateTime(time::OffsetDateTime),
    /// 枚举值；字面量输出时按 `EnumPolicy` 选择序号或名称。
    Enum(SqlEnum),
}

/// 枚举值的名称与序号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlEnum {
    pub name: Cow<'static, str>,
    pub ordinal: i64,
}

impl SqlValue {
    /// 将 `Option<T>` 映射为 `SqlValue`：`None => Null`，`Some(v) => v.into()`。
    pub fn from_option<T: Into<SqlValue>>(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }

    pub fn enumeration(name: impl Into<Cow<'static, str>>, ordinal: i64) -> Self {
        Self::Enum(SqlEnum {
            name: name.into(),
            ordinal,
        })
    }

    /// 空白值：Null 或仅含空白字符的字符串。
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 解析“类布尔”值，用于 IsNull/IsNotNull 的极性参数。
    pub fn as_bool_flag(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::I64(n) => Some(*n != 0),
            Self::U64(n) => Some(*n != 0),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
                "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 数值的符号与绝对值；非数值返回 None。
    pub(crate) fn split_sign(&self) -> Option<(bool, SqlValue)> {
        match self {
            Self::I64(n) if *n < 0 => Some((true, Self::U64(n.unsigned_abs()))),
            Self::I64(n) => Some((false, Self::I64(*n))),
            Self::U64(n) => Some((false, Self::U64(*n))),
            Self::F64(n) if *n < 0.0 => Some((true, Self::F64(-*n))),
            Self::F64(n) => Some((false, Self::F64(*n))),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::I64(n) => write!(f, "{n}"),
            Self::U64(n) => write!(f, "{n}"),
            Self::F64(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Enum(e) => f.write_str(&e.name),
        }
    }
}

impl From<()> for SqlValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! signed_value {
    ($($t:ty),+ $(,)?) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                Self::I64(v as i64)
            }
        })+
    };
}

macro_rules! unsigned_value {
    ($($t:ty),+ $(,)?) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                Self::U64(v as u64)
            }
        })+
    };
}

signed_value!(i8, i16, i32, i64, isize);
unsigned_value!(u8, u16, u32, u64, usize);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::F64(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(Cow::Owned(v))
    }
}

impl From<&'static str> for SqlValue {
    fn from(v: &'static str) -> Self {
        Self::String(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<time::OffsetDateTime> for SqlValue {
    fn from(v: time::OffsetDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<time::PrimitiveDateTime> for SqlValue {
    fn from(v: time::PrimitiveDateTime) -> Self {
        Self::DateTime(v.assume_utc())
    }
}

impl From<SqlEnum> for SqlValue {
    fn from(v: SqlEnum) -> Self {
        Self::Enum(v)
    }
}

#[cfg(test)]
mod tests {
    use super::SqlValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_option_some() {
        assert_eq!(SqlValue::from_option(Some(123_i64)), SqlValue::I64(123));
    }

    #[test]
    fn from_option_none() {
        assert_eq!(SqlValue::from_option::<i64>(None), SqlValue::Null);
    }

    #[test]
    fn blank_values() {
        assert!(SqlValue::Null.is_blank());
        assert!(SqlValue::from("  ").is_blank());
        assert!(!SqlValue::from("a").is_blank());
        assert!(!SqlValue::from(0).is_blank());
    }

    #[test]
    fn bool_flags() {
        assert_eq!(SqlValue::from(false).as_bool_flag(), Some(false));
        assert_eq!(SqlValue::from("Yes").as_bool_flag(), Some(true));
        assert_eq!(SqlValue::from("0").as_bool_flag(), Some(false));
        assert_eq!(SqlValue::from(1).as_bool_flag(), Some(true));
        assert_eq!(SqlValue::from("maybe").as_bool_flag(), None);
    }

    #[test]
    fn split_sign_of_numbers() {
        assert_eq!(
            SqlValue::from(-5).split_sign(),
            Some((true, SqlValue::U64(5)))
        );
        assert_eq!(
            SqlValue::from(2.5).split_sign(),
            Some((false, SqlValue::F64(2.5)))
        );
        assert_eq!(SqlValue::from("x").split_sign(), None);
    }
}
