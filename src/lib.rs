//! halo-sql-condition：条件树到多方言参数化 SQL 的编译库。

pub mod compiler;
#[cfg(test)]
mod compiler_tests;
pub mod config;
pub mod crud;
pub mod custom;
pub mod db_where;
#[cfg(test)]
mod db_where_tests;
pub mod dialect;
pub mod error;
pub mod field;
pub mod field_mapper;
mod interpolate;
pub mod join;
pub mod modifiers;
pub mod operator;
pub mod ordering;
pub mod paging;
pub mod recursive;
pub mod schema;
pub mod sql_buffer;
mod string_builder;
#[cfg(test)]
mod test_support;
pub mod update;
pub mod value;

pub use crate::compiler::{QueryCompiler, SqlContext};
pub use crate::config::{EnumPolicy, SqlConfig};
pub use crate::custom::{
    ConditionContext, CustomSqlBuilders, UpdateCondition, UpdateSqlBuilder, WhereCondition,
    WhereSqlBuilder,
};
pub use crate::db_where::{Condition, DbWhere, SubWhere, WhereParent};
pub use crate::dialect::{
    DbType, DbVersion, DefaultDialectCreator, Dialect, DialectCreator, DialectStrategy,
};
pub use crate::error::{FieldError, FieldErrorReason, FieldErrors, SqlError, SqlResult};
pub use crate::field::{DbField, LogicType};
pub use crate::field_mapper::{
    FieldMapperFunc, default_column_mapper, prefix_mapper, snake_case_mapper,
    upper_snake_case_mapper,
};
pub use crate::join::{JoinEdge, JoinOn, JoinStart, JoinType, TableJoin, TableRef};
pub use crate::modifiers::{Arg, FlattenIntoArgs, field_ref, flatten};
pub use crate::operator::{
    Arity, Operand, OperatorContext, OperatorRegistry, OperatorResult, UpdateOperator,
    WhereOperator,
};
pub use crate::ordering::{OrderType, Ordering, Orderings};
pub use crate::paging::Paging;
pub use crate::recursive::{FindChildrenParams, RECURSIVE_PROCEDURE, RecursiveStrategy};
pub use crate::schema::{
    ColumnInfo, ColumnMapping, Entity, FieldKind, FieldScene, JoinColumns, PrimaryKey,
    SchemaRegistry, SchemaResolver, TableSchema, TableSchemaBuilder,
};
pub use crate::sql_buffer::{NamedSql, Placeholder, SqlBuffer, SqlItem};
pub use crate::update::{DbUpdate, UpdateItem};
pub use crate::value::{SqlEnum, SqlValue};
