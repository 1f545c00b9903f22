//! DbWhere：WHERE 条件树。
//!
//! 条件项有三种：字段条件、嵌套子条件（自带 AND/OR 与 NOT）、自定义条件。
//! `DbWhere::NONE` 表示“显式不加条件”（如全表删除），它是只读的。

use crate::custom::{WhereCondition, tag_matches};
use crate::error::{SqlError, SqlResult};
use crate::field::{DbField, LogicType};
use crate::modifiers::FlattenIntoArgs;

#[derive(Debug, Clone)]
pub enum Condition {
    Field(DbField),
    Nested(DbWhere),
    Custom(Box<dyn WhereCondition>),
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Field(f) => f.is_empty(),
            Self::Nested(w) => w.is_empty(),
            Self::Custom(c) => c.is_empty(),
        }
    }
}

impl From<DbField> for Condition {
    fn from(f: DbField) -> Self {
        Self::Field(f)
    }
}

#[derive(Debug, Clone)]
pub struct DbWhere {
    items: Vec<Condition>,
    logic: LogicType,
    positive: bool,
    readonly: bool,
}

impl Default for DbWhere {
    fn default() -> Self {
        Self::new()
    }
}

impl DbWhere {
    /// 显式的“无条件”，任何修改都会失败。
    pub const NONE: DbWhere = DbWhere {
        items: Vec::new(),
        logic: LogicType::And,
        positive: true,
        readonly: true,
    };

    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            logic: LogicType::And,
            positive: true,
            readonly: false,
        }
    }

    /// 以 `logic` 连接顶层条件项。
    pub fn with_logic(logic: LogicType) -> Self {
        Self {
            logic,
            ..Self::new()
        }
    }

    fn nested(logic: LogicType, positive: bool) -> Self {
        Self {
            logic,
            positive,
            ..Self::new()
        }
    }

    pub fn is_none(&self) -> bool {
        self.readonly
    }

    pub fn logic(&self) -> LogicType {
        self.logic
    }

    /// false 表示整体取反（`NOT ( ... )`）。
    pub fn positive(&self) -> bool {
        self.positive
    }

    pub fn items(&self) -> &[Condition] {
        &self.items
    }

    /// 所有条件项都为空（含空白参数的字段条件）时为 true。
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(Condition::is_empty)
    }

    fn check_writable(&self) -> SqlResult<()> {
        if self.readonly {
            Err(SqlError::ImmutableCondition)
        } else {
            Ok(())
        }
    }

    /// 链式添加字段条件：`DbWhere::new().on("id", "=", 1)?.on("name", "like", "a")?`。
    pub fn on(mut self, field: &str, operator: &str, values: impl FlattenIntoArgs) -> SqlResult<Self> {
        self.add(field, operator, values)?;
        Ok(self)
    }

    pub fn add(
        &mut self,
        field: &str,
        operator: &str,
        values: impl FlattenIntoArgs,
    ) -> SqlResult<&mut Self> {
        self.check_writable()?;
        let f = DbField::parse_where(field, operator, values)?;
        self.items.push(Condition::Field(f));
        Ok(self)
    }

    pub fn put(&mut self, condition: impl Into<Condition>) -> SqlResult<&mut Self> {
        self.check_writable()?;
        self.items.push(condition.into());
        Ok(self)
    }

    pub fn put_custom(&mut self, condition: impl WhereCondition) -> SqlResult<&mut Self> {
        self.put(Condition::Custom(Box::new(condition)))
    }

    /// 开始一个子条件，`end()` 回到当前条件。
    pub fn sub(self, logic: LogicType) -> SqlResult<SubWhere<Self>> {
        self.check_writable()?;
        Ok(SubWhere::new(self, logic, true))
    }

    /// 开始一个取反的子条件：`NOT ( ... )`。
    pub fn sub_not(self, logic: LogicType) -> SqlResult<SubWhere<Self>> {
        self.check_writable()?;
        Ok(SubWhere::new(self, logic, false))
    }

    /// 以闭包方式添加子条件。
    pub fn sub_with(
        &mut self,
        logic: LogicType,
        positive: bool,
        f: impl FnOnce(DbWhere) -> SqlResult<DbWhere>,
    ) -> SqlResult<&mut Self> {
        self.check_writable()?;
        let sub = f(Self::nested(logic, positive))?;
        self.items.push(Condition::Nested(sub));
        Ok(self)
    }

    /// 递归查找字段名（字段条件）或类型标识（自定义条件）。
    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|item| match item {
            Condition::Field(f) => f.field_name() == key,
            Condition::Nested(w) => w.contains(key),
            Condition::Custom(c) => tag_matches(c.type_tag(), key),
        })
    }

    /// 递归删除匹配 `key` 的条件项，返回被删除的项。
    pub fn remove(&mut self, key: &str) -> SqlResult<Vec<Condition>> {
        self.check_writable()?;
        let mut removed = Vec::new();
        self.remove_into(key, &mut removed);
        Ok(removed)
    }

    fn remove_into(&mut self, key: &str, removed: &mut Vec<Condition>) {
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            let matched = match &item {
                Condition::Field(f) => f.field_name() == key,
                Condition::Custom(c) => tag_matches(c.type_tag(), key),
                Condition::Nested(_) => false,
            };
            if matched {
                removed.push(item);
            } else {
                kept.push(item);
            }
        }
        for item in &mut kept {
            if let Condition::Nested(w) = item {
                w.remove_into(key, removed);
            }
        }
        self.items = kept;
    }

    /// 替换第一个同名字段条件（递归查找），找不到时追加到末尾。
    pub fn replace(&mut self, field: DbField) -> SqlResult<&mut Self> {
        self.check_writable()?;
        if let Some(rest) = self.replace_first(field) {
            self.items.push(Condition::Field(rest));
        }
        Ok(self)
    }

    // 找到时返回 None，否则把字段原样交还
    fn replace_first(&mut self, field: DbField) -> Option<DbField> {
        let mut field = Some(field);
        for item in &mut self.items {
            let Some(f) = field.take() else {
                break;
            };
            match item {
                Condition::Field(existing) if existing.field_name() == f.field_name() => {
                    *existing = f;
                }
                Condition::Nested(w) => field = w.replace_first(f),
                _ => field = Some(f),
            }
        }
        field
    }

    /// 清空当前层的条件项（嵌套子条件随之丢弃）。
    pub fn clear(&mut self) -> SqlResult<()> {
        self.check_writable()?;
        self.items.clear();
        Ok(())
    }
}

/// 子条件的上级：`DbWhere` 或另一个 `SubWhere`。
pub trait WhereParent: Sized {
    fn attach(self, sub: DbWhere) -> Self;
}

impl WhereParent for DbWhere {
    fn attach(mut self, sub: DbWhere) -> Self {
        self.items.push(Condition::Nested(sub));
        self
    }
}

/// 链式构建中的子条件，`end()` 把它挂到上级并返回上级。
#[derive(Debug, Clone)]
pub struct SubWhere<P> {
    parent: P,
    inner: DbWhere,
}

impl<P: WhereParent> SubWhere<P> {
    fn new(parent: P, logic: LogicType, positive: bool) -> Self {
        Self {
            parent,
            inner: DbWhere::nested(logic, positive),
        }
    }

    pub fn on(mut self, field: &str, operator: &str, values: impl FlattenIntoArgs) -> SqlResult<Self> {
        self.inner.add(field, operator, values)?;
        Ok(self)
    }

    pub fn put(mut self, condition: impl Into<Condition>) -> SqlResult<Self> {
        self.inner.put(condition)?;
        Ok(self)
    }

    pub fn put_custom(mut self, condition: impl WhereCondition) -> SqlResult<Self> {
        self.inner.put_custom(condition)?;
        Ok(self)
    }

    pub fn sub(self, logic: LogicType) -> SubWhere<Self> {
        SubWhere::new(self, logic, true)
    }

    pub fn sub_not(self, logic: LogicType) -> SubWhere<Self> {
        SubWhere::new(self, logic, false)
    }

    pub fn end(self) -> P {
        self.parent.attach(self.inner)
    }
}

impl<P: WhereParent> WhereParent for SubWhere<P> {
    fn attach(mut self, sub: DbWhere) -> Self {
        self.inner.items.push(Condition::Nested(sub));
        self
    }
}
