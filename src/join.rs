//! TableJoin：多表关联描述。
//!
//! ```ignore
//! let join = TableJoin::new("User", "u")
//!     .inner_join("Role", "r")
//!     .on("u.roleId", "=", field_ref("r.id"))?
//!     .and("r.deleted", "=", false)?
//!     .end();
//! ```

use crate::db_where::DbWhere;
use crate::error::SqlResult;
use crate::modifiers::FlattenIntoArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

/// 参与关联的表：实体标识 + 别名；`result_field` 不为空时该表的列出现在查询结果中。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub entity: String,
    pub alias: String,
    pub result_field: Option<String>,
}

impl TableRef {
    pub fn new(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            alias: alias.into(),
            result_field: None,
        }
    }

    pub fn with_result(mut self, result_field: impl Into<String>) -> Self {
        self.result_field = Some(result_field.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct JoinEdge {
    pub table: TableRef,
    pub join_type: JoinType,
    pub on: DbWhere,
}

#[derive(Debug, Clone)]
pub struct TableJoin {
    major: TableRef,
    joins: Vec<JoinEdge>,
}

impl TableJoin {
    pub fn new(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::of(TableRef::new(entity, alias))
    }

    pub fn of(major: TableRef) -> Self {
        Self {
            major,
            joins: Vec::new(),
        }
    }

    pub fn major(&self) -> &TableRef {
        &self.major
    }

    pub fn joins(&self) -> &[JoinEdge] {
        &self.joins
    }

    /// 主表在前的全部表。
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        std::iter::once(&self.major).chain(self.joins.iter().map(|j| &j.table))
    }

    pub fn join(self, join_type: JoinType, table: TableRef) -> JoinStart {
        JoinStart {
            join: self,
            table,
            join_type,
        }
    }

    pub fn inner_join(self, entity: &str, alias: &str) -> JoinStart {
        self.join(JoinType::Inner, TableRef::new(entity, alias))
    }

    pub fn left_join(self, entity: &str, alias: &str) -> JoinStart {
        self.join(JoinType::Left, TableRef::new(entity, alias))
    }

    pub fn right_join(self, entity: &str, alias: &str) -> JoinStart {
        self.join(JoinType::Right, TableRef::new(entity, alias))
    }

    pub fn full_join(self, entity: &str, alias: &str) -> JoinStart {
        self.join(JoinType::Full, TableRef::new(entity, alias))
    }

    /// 同 `inner_join`，关联表的列放入结果字段 `result_field`。
    pub fn inner_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.join(
            JoinType::Inner,
            TableRef::new(entity, alias).with_result(result_field),
        )
    }

    pub fn left_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.join(
            JoinType::Left,
            TableRef::new(entity, alias).with_result(result_field),
        )
    }

    pub fn right_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.join(
            JoinType::Right,
            TableRef::new(entity, alias).with_result(result_field),
        )
    }

    pub fn full_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.join(
            JoinType::Full,
            TableRef::new(entity, alias).with_result(result_field),
        )
    }
}

/// 已指定关联表、等待 `on` 条件。
#[derive(Debug, Clone)]
pub struct JoinStart {
    join: TableJoin,
    table: TableRef,
    join_type: JoinType,
}

impl JoinStart {
    pub fn on(self, field: &str, operator: &str, values: impl FlattenIntoArgs) -> SqlResult<JoinOn> {
        let on = DbWhere::new().on(field, operator, values)?;
        Ok(JoinOn {
            join: self.join,
            edge: JoinEdge {
                table: self.table,
                join_type: self.join_type,
                on,
            },
        })
    }
}

/// 正在追加 `on` 条件的关联。
#[derive(Debug, Clone)]
pub struct JoinOn {
    join: TableJoin,
    edge: JoinEdge,
}

impl JoinOn {
    pub fn and(mut self, field: &str, operator: &str, values: impl FlattenIntoArgs) -> SqlResult<Self> {
        self.edge.on.add(field, operator, values)?;
        Ok(self)
    }

    pub fn join(self, join_type: JoinType, table: TableRef) -> JoinStart {
        self.end().join(join_type, table)
    }

    pub fn inner_join(self, entity: &str, alias: &str) -> JoinStart {
        self.end().inner_join(entity, alias)
    }

    pub fn left_join(self, entity: &str, alias: &str) -> JoinStart {
        self.end().left_join(entity, alias)
    }

    pub fn right_join(self, entity: &str, alias: &str) -> JoinStart {
        self.end().right_join(entity, alias)
    }

    pub fn full_join(self, entity: &str, alias: &str) -> JoinStart {
        self.end().full_join(entity, alias)
    }

    pub fn inner_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.end().inner_join_as(entity, alias, result_field)
    }

    pub fn left_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.end().left_join_as(entity, alias, result_field)
    }

    pub fn right_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.end().right_join_as(entity, alias, result_field)
    }

    pub fn full_join_as(self, entity: &str, alias: &str, result_field: &str) -> JoinStart {
        self.end().full_join_as(entity, alias, result_field)
    }

    pub fn end(mut self) -> TableJoin {
        self.join.joins.push(self.edge);
        self.join
    }
}
