//! 条件参数与展开规则：数组、Vec、Map、Set、元组都会被展开成参数列表。

use crate::value::{SqlEnum, SqlValue};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// 条件运算符接收的参数。
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// 普通值，编译为绑定参数。
    Value(SqlValue),
    /// 字段引用：编译为另一列的列名（经 schema 解析，不做字符串拼接）。
    Field(String),
}

/// 标记参数为字段引用，如 `SET a = b`、`ON u.id = r.userId`。
pub fn field_ref(name: impl Into<String>) -> Arg {
    Arg::Field(name.into())
}

impl Arg {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Value(v) => v.is_blank(),
            Self::Field(name) => name.trim().is_empty(),
        }
    }

    pub fn as_value(&self) -> Option<&SqlValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Field(_) => None,
        }
    }
}

macro_rules! value_arg {
    ($($t:ty),+ $(,)?) => {
        $(impl From<$t> for Arg {
            fn from(v: $t) -> Self {
                Self::Value(v.into())
            }
        })+
    };
}

value_arg!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &'static str,
    Vec<u8>,
    SqlValue,
    SqlEnum,
    time::OffsetDateTime,
    time::PrimitiveDateTime,
);

impl<T: Into<SqlValue>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Self::Value(SqlValue::from_option(v))
    }
}

/// Flatten：把任意参数递归展开成 `Vec<Arg>`。
pub fn flatten<T: FlattenIntoArgs>(v: T) -> Vec<Arg> {
    let mut out = Vec::new();
    v.flatten_into(&mut out);
    out
}

/// 用 trait 实现“递归展开”：集合类型展开为多个参数，标量为一个参数。
pub trait FlattenIntoArgs {
    fn flatten_into(self, out: &mut Vec<Arg>);
}

macro_rules! flatten_scalar {
    ($($t:ty),+ $(,)?) => {
        $(impl FlattenIntoArgs for $t {
            fn flatten_into(self, out: &mut Vec<Arg>) {
                out.push(Arg::Value(self.into()));
            }
        })+
    };
}

flatten_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    SqlValue,
    SqlEnum,
    time::OffsetDateTime,
    time::PrimitiveDateTime,
);

impl FlattenIntoArgs for &str {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        out.push(Arg::Value(SqlValue::from(self.to_string())));
    }
}

impl FlattenIntoArgs for &String {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        out.push(Arg::Value(SqlValue::from(self.clone())));
    }
}

impl FlattenIntoArgs for Arg {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        out.push(self);
    }
}

/// 无参数。
impl FlattenIntoArgs for () {
    fn flatten_into(self, _out: &mut Vec<Arg>) {}
}

/// `None` 展开为一个空白值（计入参数个数，但视为 blank）。
impl<T: FlattenIntoArgs> FlattenIntoArgs for Option<T> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        match self {
            Some(v) => v.flatten_into(out),
            None => out.push(Arg::Value(SqlValue::Null)),
        }
    }
}

impl<T: FlattenIntoArgs> FlattenIntoArgs for Vec<T> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.flatten_into(out);
        }
    }
}

impl<T: FlattenIntoArgs, const N: usize> FlattenIntoArgs for [T; N] {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.flatten_into(out);
        }
    }
}

impl<T: FlattenIntoArgs + Clone> FlattenIntoArgs for &[T] {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.clone().flatten_into(out);
        }
    }
}

impl<T: FlattenIntoArgs, S> FlattenIntoArgs for HashSet<T, S> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.flatten_into(out);
        }
    }
}

impl<T: FlattenIntoArgs> FlattenIntoArgs for BTreeSet<T> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self {
            v.flatten_into(out);
        }
    }
}

/// Map 只展开 value。
impl<K, V: FlattenIntoArgs, S> FlattenIntoArgs for HashMap<K, V, S> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self.into_values() {
            v.flatten_into(out);
        }
    }
}

impl<K, V: FlattenIntoArgs> FlattenIntoArgs for BTreeMap<K, V> {
    fn flatten_into(self, out: &mut Vec<Arg>) {
        for v in self.into_values() {
            v.flatten_into(out);
        }
    }
}

macro_rules! flatten_tuple {
    ($($name:ident),+) => {
        impl<$($name: FlattenIntoArgs),+> FlattenIntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn flatten_into(self, out: &mut Vec<Arg>) {
                let ($($name,)+) = self;
                $($name.flatten_into(out);)+
            }
        }
    };
}

flatten_tuple!(A, B);
flatten_tuple!(A, B, C);
flatten_tuple!(A, B, C, D);
