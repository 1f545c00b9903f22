//! 测试共用的实体与上下文。

use crate::compiler::SqlContext;
use crate::dialect::{DbType, DbVersion, Dialect};
use crate::schema::{ColumnInfo, Entity, FieldKind, SchemaRegistry, TableSchema};
use std::sync::Arc;

pub(crate) struct User;

impl Entity for User {
    const ENTITY: &'static str = "User";

    fn table_schema() -> TableSchema {
        TableSchema::builder(Self::ENTITY, "T_USER")
            .column(ColumnInfo::new("id").primary_key())
            .fields(["userName", "email", "deptCode", "roleId", "state", "loginTimes", "remark"])
            .column(
                ColumnInfo::new("createTime")
                    .kind(FieldKind::Trailing)
                    .updatable(false),
            )
            .build()
    }
}

pub(crate) struct Role;

impl Entity for Role {
    const ENTITY: &'static str = "Role";

    fn table_schema() -> TableSchema {
        TableSchema::builder(Self::ENTITY, "T_ROLE")
            .column(ColumnInfo::new("id").primary_key())
            .fields(["roleName", "deptCode"])
            .build()
    }
}

pub(crate) struct Dept;

impl Entity for Dept {
    const ENTITY: &'static str = "Dept";

    fn table_schema() -> TableSchema {
        TableSchema::builder(Self::ENTITY, "T_DEPT")
            .column(ColumnInfo::new("deptCode").primary_key())
            .fields(["deptName", "parentCode", "sortIndex"])
            .build()
    }
}

pub(crate) fn registry() -> Arc<SchemaRegistry> {
    let registry = SchemaRegistry::new();
    registry
        .register_entity::<User>()
        .register_entity::<Role>()
        .register_entity::<Dept>();
    Arc::new(registry)
}

pub(crate) fn context(db: DbType) -> SqlContext {
    context_for(DbVersion::new(db))
}

pub(crate) fn context_for(version: DbVersion) -> SqlContext {
    SqlContext::new(Arc::new(Dialect::new(version)), registry())
}
