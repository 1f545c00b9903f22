//! 排序字段：`name asc, createTime desc, title(pinyin)`。

use crate::error::{SqlError, SqlResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderType {
    #[default]
    Asc,
    Desc,
}

impl OrderType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field_name: String,
    pub order: OrderType,
    /// 按拼音排序（中文列）。
    pub pinyin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Orderings(Vec<Ordering>);

impl Orderings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(self, field: &str) -> Self {
        self.push(field, OrderType::Asc, false)
    }

    pub fn desc(self, field: &str) -> Self {
        self.push(field, OrderType::Desc, false)
    }

    pub fn pinyin_asc(self, field: &str) -> Self {
        self.push(field, OrderType::Asc, true)
    }

    pub fn pinyin_desc(self, field: &str) -> Self {
        self.push(field, OrderType::Desc, true)
    }

    fn push(mut self, field: &str, order: OrderType, pinyin: bool) -> Self {
        self.0.push(Ordering {
            field_name: field.trim().to_string(),
            order,
            pinyin,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ordering> {
        self.0.iter()
    }

    /// 解析 `field [asc|desc]` 列表；字段名后紧跟 `(pinyin)` 表示按拼音排序。
    pub fn parse(text: &str) -> SqlResult<Self> {
        let mut out = Self::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut tokens = part.split_whitespace();
            let Some(mut field) = tokens.next() else {
                continue;
            };
            let order = match tokens.next() {
                None => OrderType::Asc,
                Some(t) if t.eq_ignore_ascii_case("asc") => OrderType::Asc,
                Some(t) if t.eq_ignore_ascii_case("desc") => OrderType::Desc,
                Some(_) => return Err(invalid(part)),
            };
            if tokens.next().is_some() {
                return Err(invalid(part));
            }
            let mut pinyin = false;
            if let Some(open) = field.find('(') {
                let option = &field[open..];
                if !option.eq_ignore_ascii_case("(pinyin)") {
                    return Err(invalid(part));
                }
                pinyin = true;
                field = &field[..open];
            }
            out = out.push(field, order, pinyin);
        }
        Ok(out)
    }
}

fn invalid(part: &str) -> SqlError {
    SqlError::InvalidValue {
        kind: "ordering",
        value: part.to_string(),
    }
}

impl FromStr for Orderings {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a Orderings {
    type Item = &'a Ordering;
    type IntoIter = std::slice::Iter<'a, Ordering>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
