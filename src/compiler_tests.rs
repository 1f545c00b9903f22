#[cfg(test)]
mod tests {
    use crate::compiler::SqlContext;
    use crate::custom::{ConditionContext, CustomSqlBuilders, WhereCondition, WhereSqlBuilder};
    use crate::db_where::DbWhere;
    use crate::dialect::DbType;
    use crate::error::{SqlError, SqlResult};
    use crate::field::{DbField, LogicType};
    use crate::join::{TableJoin, TableRef};
    use crate::modifiers::{Arg, field_ref};
    use crate::operator::{Arity, Operand, OperatorContext, OperatorRegistry, OperatorResult, WhereOperator};
    use crate::ordering::Orderings;
    use crate::schema::FieldScene;
    use crate::sql_buffer::SqlBuffer;
    use crate::test_support::context;
    use crate::update::DbUpdate;
    use crate::value::SqlValue;
    use pretty_assertions::assert_eq;
    use std::any::Any;
    use std::sync::Arc;

    fn where_sql(ctx: &SqlContext, w: &DbWhere) -> SqlResult<String> {
        Ok(ctx.compiler("User")?.build_where_sql(w, true)?.to_string())
    }

    #[test]
    fn simple_equals() {
        let ctx = context(DbType::MySQL);
        let w = DbWhere::new().on("id", "=", 42).unwrap();
        let sql = ctx.compiler("User").unwrap().build_where_sql(&w, true).unwrap();
        let named = sql.to_named_sql();
        assert_eq!(named.sql, "WHERE ID = :$1$Id");
        assert_eq!(named.param("$1$Id"), Some(&SqlValue::I64(42)));
    }

    #[test]
    fn nested_or_is_parenthesized() {
        let ctx = context(DbType::MySQL);
        let w = DbWhere::new()
            .on("state", "=", 1)
            .unwrap()
            .sub(LogicType::Or)
            .unwrap()
            .on("userName", "like", "tom")
            .unwrap()
            .on("email", "starts", "tom")
            .unwrap()
            .end();
        assert_eq!(
            where_sql(&ctx, &w).unwrap(),
            "WHERE STATE = :$1$State AND ( USER_NAME LIKE CONCAT('%',:$2$UserName,'%') \
             OR EMAIL LIKE CONCAT(:$3$Email,'%') )"
        );
    }

    #[test]
    fn top_level_or() {
        let ctx = context(DbType::PostgreSQL);
        let w = DbWhere::with_logic(LogicType::Or)
            .on("state", "=", 1)
            .unwrap()
            .on("state", "=", 2)
            .unwrap();
        assert_eq!(
            where_sql(&ctx, &w).unwrap(),
            "WHERE STATE = :$1$State OR STATE = :$2$State"
        );
    }

    #[test]
    fn negated_sub_wraps_the_positive_form() {
        let ctx = context(DbType::Oracle);
        let positive = DbWhere::new()
            .sub(LogicType::And)
            .unwrap()
            .on("deptCode", "in", ["D1", "D2"])
            .unwrap()
            .end();
        let negative = DbWhere::new()
            .sub_not(LogicType::And)
            .unwrap()
            .on("deptCode", "in", ["D1", "D2"])
            .unwrap()
            .end();
        let positive = where_sql(&ctx, &positive).unwrap();
        let negative = where_sql(&ctx, &negative).unwrap();
        assert_eq!(positive, "WHERE ( DEPT_CODE IN (:$1$DeptCode, :$2$DeptCode) )");
        assert_eq!(
            negative,
            format!("WHERE NOT {}", positive.trim_start_matches("WHERE "))
        );
    }

    #[test]
    fn is_null_polarity_is_equivalent() {
        let ctx = context(DbType::MySQL);
        let a = DbWhere::new().on("remark", "isNull", false).unwrap();
        let b = DbWhere::new().on("remark", "isNotNull", ()).unwrap();
        assert_eq!(where_sql(&ctx, &a).unwrap(), where_sql(&ctx, &b).unwrap());
        assert_eq!(where_sql(&ctx, &b).unwrap(), "WHERE REMARK IS NOT NULL");
    }

    #[test]
    fn errors_are_aggregated() {
        let ctx = context(DbType::MySQL);
        let w = DbWhere::new()
            .on("foo", "=", 1)
            .unwrap()
            .on("email", "like", "")
            .unwrap()
            .on("state", "between", (1, None::<i32>))
            .unwrap();
        let err = where_sql(&ctx, &w).unwrap_err();
        assert_eq!(
            err.to_string(),
            "where sql build failed: [foo#UnsupportedField, email$Like(#IsBlank)]"
        );
        assert_eq!(err.field_errors().map(|e| e.len()), Some(2));
    }

    #[test]
    fn unresolved_field_is_never_dropped() {
        let ctx = context(DbType::MySQL);
        let w = DbWhere::new().on("foo", "=", 1).unwrap();
        assert!(matches!(
            where_sql(&ctx, &w),
            Err(SqlError::UnsupportedField { clause: "where", .. })
        ));
    }

    #[test]
    fn blank_only_conditions_compile_to_nothing() {
        let ctx = context(DbType::MySQL);
        let w = DbWhere::new()
            .on("email", "like", "")
            .unwrap()
            .on("userName", "=", None::<&str>)
            .unwrap();
        assert_eq!(where_sql(&ctx, &w).unwrap(), "");
        assert_eq!(where_sql(&ctx, &DbWhere::NONE).unwrap(), "");
    }

    #[test]
    fn field_references_resolve_to_columns() {
        let ctx = context(DbType::MySQL);
        let w = DbWhere::new()
            .on("roleId", "=", field_ref("deptCode"))
            .unwrap();
        assert_eq!(where_sql(&ctx, &w).unwrap(), "WHERE ROLE_ID = DEPT_CODE");

        let w = DbWhere::new()
            .on("roleId", "=", field_ref("nothing"))
            .unwrap();
        assert_eq!(
            where_sql(&ctx, &w).unwrap_err().to_string(),
            "where sql build failed: [roleId$Equals(#UnresolvedReference)]"
        );
    }

    #[test]
    fn unregistered_operator_is_reported() {
        let ctx = context(DbType::MySQL);
        let mut w = DbWhere::new();
        w.put(DbField::new("email", "Regexp", Arity::Binary, vec![Arg::from("^a")]))
            .unwrap();
        assert_eq!(
            where_sql(&ctx, &w).unwrap_err().to_string(),
            "where sql build failed: [email#UnsupportedOperate]"
        );
    }

    #[derive(Debug)]
    struct Regexp;

    impl WhereOperator for Regexp {
        fn name(&self) -> &'static str {
            "Regexp"
        }

        fn arity(&self) -> Arity {
            Arity::Binary
        }

        fn build_sql(
            &self,
            column: &str,
            var_name: &str,
            values: &[Operand],
            _ctx: &OperatorContext<'_>,
        ) -> OperatorResult {
            let mut sql = SqlBuffer::new();
            sql.append(column).append(" REGEXP ");
            values[0].append_to(&mut sql, var_name);
            Ok(sql)
        }
    }

    #[test]
    fn context_operators_are_used() {
        let mut operators = OperatorRegistry::with_defaults();
        operators.register_where(Arc::new(Regexp));
        let ctx = context(DbType::MySQL).with_operators(Arc::new(operators));

        let mut w = DbWhere::new();
        w.put(DbField::new("email", "regexp", Arity::Binary, vec![Arg::from("^a")]))
            .unwrap();
        assert_eq!(where_sql(&ctx, &w).unwrap(), "WHERE EMAIL REGEXP :$1$Email");
    }

    #[test]
    fn update_set_clause() {
        let ctx = context(DbType::MySQL);
        let u = DbUpdate::new()
            .set("userName", "Tom")
            .add("loginTimes", 1)
            .to_null("remark")
            .set("deptCode", field_ref("roleId"));
        let sql = ctx
            .compiler("User")
            .unwrap()
            .build_update_set_sql(&u, true)
            .unwrap();
        assert_eq!(
            sql.to_string(),
            "SET USER_NAME = :$1$UserName, LOGIN_TIMES = LOGIN_TIMES + :$2$LoginTimes, \
             REMARK = NULL, DEPT_CODE = ROLE_ID"
        );
    }

    #[test]
    fn update_set_rejects_non_updatable_columns() {
        let ctx = context(DbType::MySQL);
        let u = DbUpdate::new()
            .set("id", 1)
            .set("createTime", "2024-01-01")
            .set("userName", "Tom");
        let err = ctx
            .compiler("User")
            .unwrap()
            .build_update_set_sql(&u, true)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "update set sql build failed: [id#UnsupportedField, createTime#UnsupportedField]"
        );
    }

    #[test]
    fn order_by_clause() {
        let ctx = context(DbType::MySQL);
        let compiler = ctx.compiler("User").unwrap();
        let orderings = Orderings::parse("userName desc, deptCode(pinyin)").unwrap();
        assert_eq!(
            compiler
                .build_order_by_sql(&orderings, true)
                .unwrap()
                .to_string(),
            "ORDER BY USER_NAME DESC, CONVERT(DEPT_CODE USING GBK) ASC"
        );
        assert_eq!(
            compiler
                .build_order_by_sql(&Orderings::new(), true)
                .unwrap()
                .to_string(),
            ""
        );
        let err = compiler
            .build_order_by_sql(&Orderings::new().asc("foo"), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "order by sql build failed: [foo#UnsupportedField]");
    }

    #[test]
    fn field_lists() {
        let ctx = context(DbType::MySQL);
        let compiler = ctx.compiler("User").unwrap();
        assert_eq!(
            compiler.build_select_fields_sql(&[]).unwrap().to_string(),
            "ID, USER_NAME, EMAIL, DEPT_CODE, ROLE_ID, STATE, LOGIN_TIMES, REMARK, CREATE_TIME"
        );
        assert_eq!(
            compiler
                .build_select_fields_sql(&["id", "userName"])
                .unwrap()
                .to_string(),
            "ID, USER_NAME"
        );
        assert_eq!(
            compiler
                .build_insert_fields_sql(&["userName", "createTime"])
                .unwrap()
                .to_string(),
            "(USER_NAME, CREATE_TIME)"
        );
        assert_eq!(
            compiler
                .build_by_fields_sql(FieldScene::Update, &["userName", "state"])
                .unwrap()
                .to_string(),
            "USER_NAME, STATE"
        );
        assert!(
            compiler
                .build_by_fields_sql(FieldScene::Update, &["id"])
                .is_err()
        );
        assert_eq!(
            compiler.build_from_sql().unwrap().to_string(),
            "T_USER"
        );
    }

    fn user_role_join() -> TableJoin {
        TableJoin::of(TableRef::new("User", "u").with_result("user"))
            .inner_join("Role", "r")
            .on("u.roleId", "=", field_ref("r.id"))
            .unwrap()
            .end()
    }

    #[test]
    fn join_from_clause() {
        let ctx = context(DbType::MySQL);
        let compiler = ctx.join_compiler(&user_role_join()).unwrap();
        assert_eq!(
            compiler.build_from_sql().unwrap().to_string(),
            "T_USER U INNER JOIN T_ROLE R ON U.ROLE_ID = R.ID"
        );
    }

    #[test]
    fn join_on_alias_strings_are_column_references() {
        let ctx = context(DbType::MySQL);
        let join = TableJoin::new("User", "u")
            .left_join("Role", "r")
            .on("u.roleId", "=", "r.id")
            .unwrap()
            .and("r.roleName", "=", "a.b")
            .unwrap()
            .end();
        let sql = ctx.join_compiler(&join).unwrap().build_from_sql().unwrap();
        assert_eq!(
            sql.to_string(),
            "T_USER U LEFT JOIN T_ROLE R ON U.ROLE_ID = R.ID AND R.ROLE_NAME = :$1$RoleName"
        );
    }

    #[test]
    fn join_without_usable_on_fails() {
        let ctx = context(DbType::MySQL);
        let join = TableJoin::new("User", "u")
            .inner_join("Role", "r")
            .on("r.roleName", "=", "")
            .unwrap()
            .end();
        let err = ctx
            .join_compiler(&join)
            .unwrap()
            .build_from_sql()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "from sql build failed: [r.roleName$Equals(#IsBlank), r$On(#MissingArguments)]"
        );
    }

    #[test]
    fn join_where_and_select() {
        let ctx = context(DbType::MySQL);
        let join = TableJoin::of(TableRef::new("User", "u").with_result("user"))
            .join(
                crate::join::JoinType::Inner,
                TableRef::new("Role", "r").with_result("role"),
            )
            .on("u.roleId", "=", field_ref("r.id"))
            .unwrap()
            .end();
        let compiler = ctx.join_compiler(&join).unwrap();

        let w = DbWhere::new()
            .on("r.roleName", "=", "admin")
            .unwrap()
            .on("state", "=", 1)
            .unwrap();
        assert_eq!(
            compiler.build_where_sql(&w, true).unwrap().to_string(),
            "WHERE R.ROLE_NAME = :$1$RoleName AND U.STATE = :$2$State"
        );
        assert_eq!(
            compiler.build_select_fields_sql(&[]).unwrap().to_string(),
            "U.ID AS U_ID, U.USER_NAME, U.EMAIL, U.DEPT_CODE AS U_DEPT_CODE, U.ROLE_ID, U.STATE, \
             U.LOGIN_TIMES, U.REMARK, U.CREATE_TIME, R.ID AS R_ID, R.ROLE_NAME, R.DEPT_CODE AS R_DEPT_CODE"
        );
    }

    #[test]
    fn join_rejects_unqualified_fields_shared_by_tables() {
        let ctx = context(DbType::MySQL);
        let compiler = ctx.join_compiler(&user_role_join()).unwrap();

        let w = DbWhere::new().on("deptCode", "=", "D01").unwrap();
        let err = compiler.build_where_sql(&w, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "where sql build failed: [deptCode#AmbiguousField]"
        );

        let w = DbWhere::new().on("u.deptCode", "=", "D01").unwrap();
        assert_eq!(
            compiler.build_where_sql(&w, true).unwrap().to_string(),
            "WHERE U.DEPT_CODE = :$1$DeptCode"
        );
    }

    #[test]
    fn join_select_without_result_fields_uses_major_table() {
        let ctx = context(DbType::MySQL);
        let join = TableJoin::new("Role", "r")
            .inner_join("User", "u")
            .on("u.roleId", "=", field_ref("r.id"))
            .unwrap()
            .end();
        assert_eq!(
            ctx.join_compiler(&join)
                .unwrap()
                .build_select_fields_sql(&[])
                .unwrap()
                .to_string(),
            "R.ID, R.ROLE_NAME, R.DEPT_CODE"
        );
    }

    #[derive(Debug, Clone)]
    struct DataScope {
        user_id: i64,
        field: &'static str,
    }

    impl WhereCondition for DataScope {
        fn type_tag(&self) -> &'static str {
            "acme.auth.UserDataScope"
        }

        fn super_tags(&self) -> &'static [&'static str] {
            &["acme.auth.DataScope"]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct DataScopeBuilder;

    impl WhereSqlBuilder for DataScopeBuilder {
        fn build_sql(
            &self,
            condition: &dyn WhereCondition,
            ctx: &ConditionContext<'_>,
        ) -> SqlResult<SqlBuffer> {
            let Some(scope) = condition.as_any().downcast_ref::<DataScope>() else {
                return Err(SqlError::SqlBuilderNotFound {
                    tag: condition.type_tag().to_string(),
                });
            };
            let column = ctx
                .mapping
                .resolve_column(FieldScene::Condition, scope.field, true)?
                .unwrap_or_default();
            let mut sql = SqlBuffer::new();
            sql.append(&column)
                .append(" IN (SELECT DEPT_CODE FROM T_SCOPE WHERE USER_ID = ")
                .add_named_variable("UserId", scope.user_id)
                .append(")");
            Ok(sql)
        }
    }

    fn scoped_context() -> SqlContext {
        let mut builders = CustomSqlBuilders::new();
        builders.register_where("acme.auth.DataScope", Arc::new(DataScopeBuilder));
        context(DbType::MySQL).with_builders(Arc::new(builders))
    }

    #[test]
    fn custom_conditions_use_registered_builder() {
        let ctx = scoped_context();
        let mut w = DbWhere::new().on("state", "=", 1).unwrap();
        w.put_custom(DataScope {
            user_id: 7,
            field: "deptCode",
        })
        .unwrap();
        let sql = ctx.compiler("User").unwrap().build_where_sql(&w, true).unwrap();
        assert_eq!(
            sql.to_string(),
            "WHERE STATE = :$1$State AND DEPT_CODE IN (SELECT DEPT_CODE FROM T_SCOPE WHERE USER_ID = :$2$UserId)"
        );
        assert_eq!(sql.values(), vec![SqlValue::I64(1), SqlValue::I64(7)]);
    }

    #[test]
    fn custom_builder_field_errors_are_merged() {
        let ctx = scoped_context();
        let mut w = DbWhere::new().on("foo", "=", 1).unwrap();
        w.put_custom(DataScope {
            user_id: 7,
            field: "scope",
        })
        .unwrap();
        assert_eq!(
            where_sql(&ctx, &w).unwrap_err().to_string(),
            "where sql build failed: [foo#UnsupportedField, scope#UnsupportedField]"
        );
    }

    #[test]
    fn missing_custom_builder_fails_immediately() {
        let ctx = context(DbType::MySQL);
        let mut w = DbWhere::new().on("foo", "=", 1).unwrap();
        w.put_custom(DataScope {
            user_id: 7,
            field: "deptCode",
        })
        .unwrap();
        assert_eq!(
            where_sql(&ctx, &w).unwrap_err(),
            SqlError::SqlBuilderNotFound {
                tag: "acme.auth.UserDataScope".to_string()
            }
        );
    }

    #[test]
    fn unknown_entity() {
        let ctx = context(DbType::MySQL);
        assert_eq!(
            ctx.compiler("Nope").unwrap_err(),
            SqlError::UnknownEntity("Nope".to_string())
        );
    }
}
