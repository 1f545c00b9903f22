//! 自定义条件：条件对象只描述“是什么”，SQL 由按类型标识注册的构建器生成。
//!
//! 查找顺序：先精确匹配 `type_tag`，再按 `super_tags` 的顺序依次回退，
//! 都找不到时报 [`SqlError::SqlBuilderNotFound`]。

use crate::config::SqlConfig;
use crate::dialect::DialectStrategy;
use crate::error::{SqlError, SqlResult};
use crate::schema::ColumnMapping;
use crate::sql_buffer::SqlBuffer;
use dyn_clone::DynClone;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 可以放进 `DbWhere` 的自定义条件。
pub trait WhereCondition: DynClone + fmt::Debug + Send + Sync + 'static {
    /// 稳定的类型标识，如 `"acme.condition.Exists"`。
    fn type_tag(&self) -> &'static str;

    /// 回退查找用的上级类型标识，由近及远。
    fn super_tags(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

dyn_clone::clone_trait_object!(WhereCondition);

/// 可以放进 `DbUpdate` 的自定义更新项。
pub trait UpdateCondition: DynClone + fmt::Debug + Send + Sync + 'static {
    fn type_tag(&self) -> &'static str;

    fn super_tags(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

dyn_clone::clone_trait_object!(UpdateCondition);

/// 自定义构建器可用的上下文。
#[derive(Clone, Copy)]
pub struct ConditionContext<'a> {
    pub dialect: &'a dyn DialectStrategy,
    pub mapping: &'a dyn ColumnMapping,
    pub config: &'a SqlConfig,
}

impl fmt::Debug for ConditionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionContext")
            .field("dialect", &self.dialect)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// 构建器返回 `SqlError::UnsupportedField` 时，其字段明细并入当前子句的聚合错误；
/// 其他错误立即返回。
pub trait WhereSqlBuilder: Send + Sync {
    fn build_sql(
        &self,
        condition: &dyn WhereCondition,
        ctx: &ConditionContext<'_>,
    ) -> SqlResult<SqlBuffer>;
}

pub trait UpdateSqlBuilder: Send + Sync {
    fn build_sql(
        &self,
        condition: &dyn UpdateCondition,
        ctx: &ConditionContext<'_>,
    ) -> SqlResult<SqlBuffer>;
}

#[derive(Clone, Default)]
pub struct CustomSqlBuilders {
    where_builders: HashMap<String, Arc<dyn WhereSqlBuilder>>,
    update_builders: HashMap<String, Arc<dyn UpdateSqlBuilder>>,
}

impl fmt::Debug for CustomSqlBuilders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut where_tags: Vec<&String> = self.where_builders.keys().collect();
        where_tags.sort();
        let mut update_tags: Vec<&String> = self.update_builders.keys().collect();
        update_tags.sort();
        f.debug_struct("CustomSqlBuilders")
            .field("where", &where_tags)
            .field("update", &update_tags)
            .finish()
    }
}

impl CustomSqlBuilders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_where(
        &mut self,
        tag: impl Into<String>,
        builder: Arc<dyn WhereSqlBuilder>,
    ) -> &mut Self {
        self.where_builders.insert(tag.into(), builder);
        self
    }

    pub fn register_update(
        &mut self,
        tag: impl Into<String>,
        builder: Arc<dyn UpdateSqlBuilder>,
    ) -> &mut Self {
        self.update_builders.insert(tag.into(), builder);
        self
    }

    pub fn find_where(&self, condition: &dyn WhereCondition) -> SqlResult<&Arc<dyn WhereSqlBuilder>> {
        lookup(
            &self.where_builders,
            condition.type_tag(),
            condition.super_tags(),
        )
    }

    pub fn find_update(
        &self,
        condition: &dyn UpdateCondition,
    ) -> SqlResult<&Arc<dyn UpdateSqlBuilder>> {
        lookup(
            &self.update_builders,
            condition.type_tag(),
            condition.super_tags(),
        )
    }
}

fn lookup<'a, B: ?Sized>(
    builders: &'a HashMap<String, Arc<B>>,
    tag: &str,
    super_tags: &[&str],
) -> SqlResult<&'a Arc<B>> {
    std::iter::once(tag)
        .chain(super_tags.iter().copied())
        .find_map(|t| builders.get(t))
        .ok_or_else(|| SqlError::SqlBuilderNotFound {
            tag: tag.to_string(),
        })
}

/// `remove(key)` 按类型标识匹配自定义条件：含 `.` 时比较完整标识，否则比较最后一段。
pub(crate) fn tag_matches(tag: &str, key: &str) -> bool {
    if key.contains('.') {
        tag == key
    } else {
        tag.rsplit(['.', ':']).next() == Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DbType, Dialect};
    use crate::schema::TableSchema;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone)]
    struct Exists;

    impl WhereCondition for Exists {
        fn type_tag(&self) -> &'static str {
            "acme.condition.ExistsById"
        }

        fn super_tags(&self) -> &'static [&'static str] {
            &["acme.condition.Exists"]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct ExistsBuilder;

    impl WhereSqlBuilder for ExistsBuilder {
        fn build_sql(
            &self,
            _condition: &dyn WhereCondition,
            _ctx: &ConditionContext<'_>,
        ) -> SqlResult<SqlBuffer> {
            Ok(SqlBuffer::from_text("EXISTS (SELECT 1 FROM DUAL)"))
        }
    }

    #[test]
    fn lookup_falls_back_to_super_tags() {
        let mut builders = CustomSqlBuilders::new();
        builders.register_where("acme.condition.Exists", Arc::new(ExistsBuilder));

        let schema = TableSchema::builder("User", "T_USER").field("id").build();
        let dialect = Dialect::of(DbType::MySQL);
        let config = SqlConfig::default();
        let ctx = ConditionContext {
            dialect: &dialect,
            mapping: &schema,
            config: &config,
        };
        let builder = builders.find_where(&Exists).unwrap();
        let sql = builder.build_sql(&Exists, &ctx).unwrap();
        assert_eq!(sql.to_string(), "EXISTS (SELECT 1 FROM DUAL)");
    }

    #[test]
    fn missing_builder_names_the_tag() {
        let err = CustomSqlBuilders::new().find_where(&Exists).err();
        assert_eq!(
            err,
            Some(SqlError::SqlBuilderNotFound {
                tag: "acme.condition.ExistsById".to_string()
            })
        );
    }

    #[test]
    fn tag_matching() {
        assert!(tag_matches("acme.condition.Exists", "Exists"));
        assert!(tag_matches("acme.condition.Exists", "acme.condition.Exists"));
        assert!(!tag_matches("acme.condition.Exists", "other.Exists"));
    }
}
