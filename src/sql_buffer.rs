//! SqlBuffer：字面文本与参数占位符交替的 SQL 片段。
//!
//! 占位符按追加顺序从 1 开始编号；拼接/前置其他片段时会重新编号，
//! 保证编号始终与占位符在文本中的先后顺序一致。

use crate::config::EnumPolicy;
use crate::dialect::DialectStrategy;
use crate::string_builder::StringBuilder;
use crate::value::SqlValue;
use std::collections::BTreeMap;
use std::fmt;

/// 占位符。
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub index: usize,
    pub name: Option<String>,
    pub value: SqlValue,
}

impl Placeholder {
    /// 渲染时的参数名：`$1` 或 `$1$Name`。
    pub fn key(&self) -> String {
        match &self.name {
            Some(name) => format!("${}${}", self.index, name),
            None => format!("${}", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlItem {
    Literal(String),
    Placeholder(Placeholder),
}

/// 命名参数形式的 SQL：`:$1$Name` 占位符 + 参数表。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedSql {
    pub sql: String,
    pub params: BTreeMap<String, SqlValue>,
}

impl NamedSql {
    pub fn param(&self, key: &str) -> Option<&SqlValue> {
        self.params.get(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlBuffer {
    items: Vec<SqlItem>,
    count: usize,
}

impl SqlBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut b = Self::new();
        b.append(text);
        b
    }

    pub fn items(&self) -> &[SqlItem] {
        &self.items
    }

    /// 占位符个数。
    pub fn placeholder_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 没有占位符且文本全为空白。
    pub fn is_blank(&self) -> bool {
        self.items.iter().all(|item| match item {
            SqlItem::Literal(s) => s.trim().is_empty(),
            SqlItem::Placeholder(_) => false,
        })
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if let Some(SqlItem::Literal(last)) = self.items.last_mut() {
            last.push_str(text);
        } else {
            self.items.push(SqlItem::Literal(text.to_string()));
        }
        self
    }

    pub fn append_char(&mut self, c: char) -> &mut Self {
        let mut tmp = [0u8; 4];
        self.append(c.encode_utf8(&mut tmp))
    }

    /// `append(' ', "AND")` 的简写：先写 `prefix` 再写 `text`。
    pub fn append_prefixed(&mut self, prefix: char, text: &str) -> &mut Self {
        self.append_char(prefix).append(text)
    }

    pub fn append_suffixed(&mut self, text: &str, suffix: char) -> &mut Self {
        self.append(text).append_char(suffix)
    }

    /// 拼接另一个片段，其占位符按当前编号顺延。
    pub fn append_buffer(&mut self, other: &SqlBuffer) -> &mut Self {
        let offset = self.count;
        for item in &other.items {
            match item {
                SqlItem::Literal(s) => {
                    self.append(s);
                }
                SqlItem::Placeholder(p) => {
                    let mut p = p.clone();
                    p.index += offset;
                    self.items.push(SqlItem::Placeholder(p));
                }
            }
        }
        self.count += other.count;
        self
    }

    pub fn prepend(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if let Some(SqlItem::Literal(first)) = self.items.first_mut() {
            first.insert_str(0, text);
        } else {
            self.items.insert(0, SqlItem::Literal(text.to_string()));
        }
        self
    }

    pub fn prepend_char(&mut self, c: char) -> &mut Self {
        let mut tmp = [0u8; 4];
        self.prepend(c.encode_utf8(&mut tmp))
    }

    /// 前置：先写 `text` 再写 `suffix`，整体放到最前面。
    pub fn prepend_suffixed(&mut self, text: &str, suffix: char) -> &mut Self {
        self.prepend_char(suffix).prepend(text)
    }

    /// 前置另一个片段：已有占位符的编号整体后移 `other` 的占位符个数。
    pub fn prepend_buffer(&mut self, other: &SqlBuffer) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        let shift = other.count;
        for item in &mut self.items {
            if let SqlItem::Placeholder(p) = item {
                p.index += shift;
            }
        }
        let mut merged = SqlBuffer {
            items: other.items.clone(),
            count: other.count,
        };
        for item in self.items.drain(..) {
            match item {
                SqlItem::Literal(s) => {
                    merged.append(&s);
                }
                p @ SqlItem::Placeholder(_) => merged.items.push(p),
            }
        }
        self.items = merged.items;
        self.count += shift;
        self
    }

    pub fn add_variable(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.push_placeholder(None, value.into())
    }

    pub fn add_named_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> &mut Self {
        let name = name.into();
        let name = if name.is_empty() { None } else { Some(name) };
        self.push_placeholder(name, value.into())
    }

    fn push_placeholder(&mut self, name: Option<String>, value: SqlValue) -> &mut Self {
        self.count += 1;
        self.items.push(SqlItem::Placeholder(Placeholder {
            index: self.count,
            name,
            value,
        }));
        self
    }

    /// 缩进：每个换行符后插入 `n` 个制表符；`leading` 时开头也插入。仅用于格式化输出。
    pub fn indent(&mut self, n: usize, leading: bool) -> &mut Self {
        if n == 0 {
            return self;
        }
        let tabs = "\t".repeat(n);
        let newline = format!("\n{tabs}");
        for item in &mut self.items {
            if let SqlItem::Literal(s) = item
                && s.contains('\n')
            {
                *s = s.replace('\n', &newline);
            }
        }
        if leading {
            self.prepend(&tabs);
        }
        self
    }

    /// 文本片段中是否包含 `keyword`（忽略大小写，不检查占位符）。
    pub(crate) fn contains_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_ascii_uppercase();
        self.items.iter().any(|item| match item {
            SqlItem::Literal(s) => s.to_ascii_uppercase().contains(&keyword),
            SqlItem::Placeholder(_) => false,
        })
    }

    /// 按编号顺序返回全部参数值。
    pub fn values(&self) -> Vec<SqlValue> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SqlItem::Placeholder(p) => Some(p.value.clone()),
                SqlItem::Literal(_) => None,
            })
            .collect()
    }

    /// 渲染为命名参数 SQL：`:$1` / `:$1$Name`。
    pub fn to_named_sql(&self) -> NamedSql {
        let mut buf = StringBuilder::with_capacity(self.estimated_len());
        let mut params = BTreeMap::new();
        for item in &self.items {
            match item {
                SqlItem::Literal(s) => buf.write_str(s),
                SqlItem::Placeholder(p) => {
                    let key = p.key();
                    buf.write_char(':');
                    buf.write_str(&key);
                    params.insert(key, p.value.clone());
                }
            }
        }
        NamedSql {
            sql: buf.into_string(),
            params,
        }
    }

    /// 渲染为字面量 SQL（日志，或递归查询模板中内联的条件）。
    pub fn to_literal_sql(&self, dialect: &dyn DialectStrategy, policy: EnumPolicy) -> String {
        let mut buf = StringBuilder::with_capacity(self.estimated_len());
        for item in &self.items {
            match item {
                SqlItem::Literal(s) => buf.write_str(s),
                SqlItem::Placeholder(p) => {
                    buf.write_str(&dialect.variable_to_string(&p.value, policy))
                }
            }
        }
        buf.into_string()
    }

    fn estimated_len(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                SqlItem::Literal(s) => s.len(),
                SqlItem::Placeholder(_) => 8,
            })
            .sum()
    }
}

impl fmt::Display for SqlBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_named_sql().sql)
    }
}
