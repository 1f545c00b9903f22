//! 完整语句：查询、计数、插入、更新、删除与递归查询子节点。
//!
//! 更新/删除的条件为空时报错，只有显式传入 `DbWhere::NONE` 才会生成不带 WHERE 的语句。

use crate::compiler::{LOG_TARGET, QueryCompiler};
use crate::db_where::DbWhere;
use crate::error::{FieldError, FieldErrorReason, FieldErrors, SqlError, SqlResult};
use crate::field_mapper::variable_name;
use crate::ordering::Orderings;
use crate::paging::Paging;
use crate::recursive::FindChildrenParams;
use crate::schema::{ColumnMapping, FieldScene};
use crate::sql_buffer::SqlBuffer;
use crate::update::DbUpdate;
use crate::value::SqlValue;

impl QueryCompiler<'_> {
    /// `SELECT fields FROM table [WHERE ..] [ORDER BY ..]`，有分页时交给方言处理。
    pub fn build_find_list_sql(
        &self,
        fields: &[&str],
        where_: &DbWhere,
        orderings: &Orderings,
        paging: Option<&Paging>,
    ) -> SqlResult<SqlBuffer> {
        let mut sql = SqlBuffer::new();
        sql.append("SELECT ")
            .append_buffer(&self.build_select_fields_sql(fields)?)
            .append(" FROM ")
            .append_buffer(&self.build_from_sql()?);
        append_clause(&mut sql, self.build_where_sql(where_, true)?);
        append_clause(&mut sql, self.build_order_by_sql(orderings, true)?);
        if let Some(paging) = paging {
            self.context()
                .dialect()
                .process_paging_sql(&mut sql, paging)?;
        }
        self.log_sql("select", &sql);
        Ok(sql)
    }

    /// `SELECT COUNT(*) FROM table [WHERE ..]`
    pub fn build_count_sql(&self, where_: &DbWhere) -> SqlResult<SqlBuffer> {
        let mut sql = SqlBuffer::new();
        sql.append("SELECT COUNT(*) FROM ")
            .append_buffer(&self.build_from_sql()?);
        append_clause(&mut sql, self.build_where_sql(where_, true)?);
        self.log_sql("count", &sql);
        Ok(sql)
    }

    /// `INSERT INTO T(A, B) VALUES(:$1$A, :$2$B)`；空白值不插入。
    pub fn build_insert_sql(&self, values: &[(&str, SqlValue)]) -> SqlResult<SqlBuffer> {
        let schema = self.table_schema("insert")?;
        let mut errors = FieldErrors::new();
        let mut columns = Vec::with_capacity(values.len());
        let mut params = SqlBuffer::new();
        for (field, value) in values {
            if value.is_blank() {
                continue;
            }
            let Some(column) = schema.column_name(FieldScene::Insert, field) else {
                errors.push(FieldError::new(*field, FieldErrorReason::UnsupportedField));
                continue;
            };
            if !columns.is_empty() {
                params.append(", ");
            }
            columns.push(column);
            params.add_named_variable(variable_name(field), value.clone());
        }
        if !errors.is_empty() {
            tracing::warn!(target: LOG_TARGET, clause = "insert", details = %errors, "sql build failed");
            return Err(SqlError::UnsupportedField {
                clause: "insert",
                details: errors,
            });
        }
        if columns.is_empty() {
            return Err(SqlError::EmptyCondition("insert"));
        }

        let mut sql = SqlBuffer::new();
        sql.append("INSERT INTO ")
            .append(schema.table_name())
            .append("(")
            .append(&columns.join(", "))
            .append(") VALUES(")
            .append_buffer(&params)
            .append(")");
        self.log_sql("insert", &sql);
        Ok(sql)
    }

    /// `UPDATE T SET .. WHERE ..`
    pub fn build_update_sql(&self, update: &DbUpdate, where_: &DbWhere) -> SqlResult<SqlBuffer> {
        let schema = self.table_schema("update")?;
        let set = self.build_update_set_sql(update, true)?;
        if set.is_blank() {
            return Err(SqlError::EmptyCondition("update set"));
        }
        let condition = self.required_where("update", where_)?;

        let mut sql = SqlBuffer::new();
        sql.append("UPDATE ")
            .append(schema.table_name())
            .append(" ")
            .append_buffer(&set);
        append_clause(&mut sql, condition);
        self.log_sql("update", &sql);
        Ok(sql)
    }

    /// `DELETE FROM T WHERE ..`
    pub fn build_delete_sql(&self, where_: &DbWhere) -> SqlResult<SqlBuffer> {
        let schema = self.table_schema("delete")?;
        let condition = self.required_where("delete", where_)?;

        let mut sql = SqlBuffer::new();
        sql.append("DELETE FROM ").append(schema.table_name());
        append_clause(&mut sql, condition);
        self.log_sql("delete", &sql);
        Ok(sql)
    }

    fn required_where(&self, statement: &'static str, where_: &DbWhere) -> SqlResult<SqlBuffer> {
        if where_.is_none() {
            return Ok(SqlBuffer::new());
        }
        let sql = self.build_where_sql(where_, true)?;
        if sql.is_blank() {
            return Err(SqlError::EmptyCondition(statement));
        }
        Ok(sql)
    }

    /// 递归查询 `start_codes` 及其全部子节点。`where_` 与排序以字面量形式内联到语句中。
    pub fn build_find_children_sql(
        &self,
        start_codes: &[String],
        code_field: &str,
        parent_field: &str,
        fields: &[&str],
        where_: &DbWhere,
        orderings: &Orderings,
    ) -> SqlResult<SqlBuffer> {
        let schema = self.table_schema("find children")?;
        let dialect = self.context().dialect();
        let policy = self.context().config().enum_policy;

        let resolve = |field: &str| -> SqlResult<String> {
            Ok(schema
                .resolve_column(FieldScene::Condition, field, true)?
                .unwrap_or_default())
        };
        let code_column = resolve(code_field)?;
        let parent_column = resolve(parent_field)?;
        let select_columns = self.build_select_fields_sql(fields)?.to_literal_sql(dialect, policy);
        let where_sql = self.build_where_sql(where_, false)?.to_literal_sql(dialect, policy);
        let order_by_sql = self
            .build_order_by_sql(orderings, false)?
            .to_literal_sql(dialect, policy);

        let params = FindChildrenParams {
            table_name: schema.table_name(),
            start_codes,
            code_column: &code_column,
            parent_column: &parent_column,
            select_columns: &select_columns,
            where_sql: Some(where_sql.as_str()),
            order_by_sql: Some(order_by_sql.as_str()),
        };
        let sql = dialect.build_find_children_sql(&params)?;
        self.log_sql("find children", &sql);
        Ok(sql)
    }

    fn log_sql(&self, statement: &'static str, sql: &SqlBuffer) {
        if self.context().config().log_sql {
            tracing::debug!(
                target: LOG_TARGET,
                statement,
                sql = %sql.to_literal_sql(self.context().dialect(), self.context().config().enum_policy),
                "sql compiled"
            );
        }
    }
}

fn append_clause(sql: &mut SqlBuffer, clause: SqlBuffer) {
    if !clause.is_blank() {
        sql.append_char(' ').append_buffer(&clause);
    }
}
