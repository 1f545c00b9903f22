//! DbUpdate：UPDATE 的 SET 子句条件。

use crate::custom::{UpdateCondition, tag_matches};
use crate::error::SqlResult;
use crate::field::DbField;
use crate::modifiers::{Arg, FlattenIntoArgs};
use crate::operator::Arity;

#[derive(Debug, Clone)]
pub enum UpdateItem {
    Field(DbField),
    Custom(Box<dyn UpdateCondition>),
}

impl UpdateItem {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Field(f) => f.field_name().trim().is_empty(),
            Self::Custom(c) => c.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DbUpdate {
    items: Vec<UpdateItem>,
}

impl DbUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `COLUMN = value`；value 可以是 `field_ref("other")`。
    pub fn set(mut self, field: &str, value: impl Into<Arg>) -> Self {
        self.push_field(field, "Set", Arity::Binary, vec![value.into()]);
        self
    }

    /// `COLUMN = COLUMN + value`
    pub fn add(mut self, field: &str, value: impl Into<Arg>) -> Self {
        self.push_field(field, "Add", Arity::Binary, vec![value.into()]);
        self
    }

    /// `COLUMN = NULL`
    pub fn to_null(mut self, field: &str) -> Self {
        self.push_field(field, "ToNull", Arity::Unary, Vec::new());
        self
    }

    /// 按运算符名添加，如 `on("count", "+=", 1)`。
    pub fn on(mut self, field: &str, operator: &str, values: impl FlattenIntoArgs) -> SqlResult<Self> {
        let f = DbField::parse_update(field, operator, values)?;
        self.items.push(UpdateItem::Field(f));
        Ok(self)
    }

    pub fn put(mut self, field: DbField) -> Self {
        self.items.push(UpdateItem::Field(field));
        self
    }

    pub fn put_custom(mut self, condition: impl UpdateCondition) -> Self {
        self.items.push(UpdateItem::Custom(Box::new(condition)));
        self
    }

    fn push_field(&mut self, field: &str, operator: &str, arity: Arity, values: Vec<Arg>) {
        self.items
            .push(UpdateItem::Field(DbField::new(field.trim(), operator, arity, values)));
    }

    pub fn items(&self) -> &[UpdateItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(UpdateItem::is_empty)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|item| matches_key(item, key))
    }

    pub fn remove(&mut self, key: &str) -> Vec<UpdateItem> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .items
            .drain(..)
            .partition(|item| matches_key(item, key));
        self.items = kept;
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

fn matches_key(item: &UpdateItem, key: &str) -> bool {
    match item {
        UpdateItem::Field(f) => f.field_name() == key,
        UpdateItem::Custom(c) => tag_matches(c.type_tag(), key),
    }
}
