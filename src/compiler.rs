//! QueryCompiler：把条件模型编译为带占位符的 SQL 片段。
//!
//! 同一子句内的字段错误（列不存在、运算符未注册、参数为空白等）先收集，
//! 遍历结束后一次性抛出 [`SqlError::UnsupportedField`]；如果去掉空白项后
//! 条件本身为空，则不抛错，返回空片段。

use crate::config::SqlConfig;
use crate::custom::{ConditionContext, CustomSqlBuilders, UpdateCondition, WhereCondition};
use crate::db_where::{Condition, DbWhere};
use crate::dialect::DialectStrategy;
use crate::error::{FieldError, FieldErrorReason, FieldErrors, SqlError, SqlResult};
use crate::field::DbField;
use crate::field_mapper::variable_name;
use crate::join::TableJoin;
use crate::modifiers::Arg;
use crate::operator::{Arity, Operand, OperatorContext, OperatorRegistry, OperatorResult};
use crate::ordering::Orderings;
use crate::schema::{ColumnMapping, FieldScene, JoinColumns, SchemaResolver, TableSchema};
use crate::sql_buffer::SqlBuffer;
use crate::string_builder::StringBuilder;
use crate::update::{DbUpdate, UpdateItem};
use crate::value::SqlValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub(crate) const LOG_TARGET: &str = "halo_condition::compiler";

/// 编译所需的全部协作者，显式传入，不依赖全局状态。
#[derive(Clone)]
pub struct SqlContext {
    dialect: Arc<dyn DialectStrategy>,
    resolver: Arc<dyn SchemaResolver>,
    operators: Arc<OperatorRegistry>,
    builders: Arc<CustomSqlBuilders>,
    config: SqlConfig,
}

impl fmt::Debug for SqlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlContext")
            .field("dialect", &self.dialect)
            .field("builders", &self.builders)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqlContext {
    pub fn new(dialect: Arc<dyn DialectStrategy>, resolver: Arc<dyn SchemaResolver>) -> Self {
        Self {
            dialect,
            resolver,
            operators: Arc::new(OperatorRegistry::with_defaults()),
            builders: Arc::new(CustomSqlBuilders::new()),
            config: SqlConfig::default(),
        }
    }

    pub fn with_operators(mut self, operators: Arc<OperatorRegistry>) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_builders(mut self, builders: Arc<CustomSqlBuilders>) -> Self {
        self.builders = builders;
        self
    }

    pub fn with_config(mut self, config: SqlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn dialect(&self) -> &dyn DialectStrategy {
        self.dialect.as_ref()
    }

    pub fn resolver(&self) -> &dyn SchemaResolver {
        self.resolver.as_ref()
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    /// 单表编译器。
    pub fn compiler(&self, entity: &str) -> SqlResult<QueryCompiler<'_>> {
        QueryCompiler::for_entity(self, entity)
    }

    /// 多表关联编译器。
    pub fn join_compiler(&self, join: &TableJoin) -> SqlResult<QueryCompiler<'_>> {
        QueryCompiler::for_join(self, join)
    }
}

#[derive(Debug, Clone)]
enum Target {
    Table(Arc<TableSchema>),
    Join { join: TableJoin, columns: JoinColumns },
}

#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    ctx: &'a SqlContext,
    target: Target,
}

impl<'a> QueryCompiler<'a> {
    pub fn for_entity(ctx: &'a SqlContext, entity: &str) -> SqlResult<Self> {
        let schema = ctx.resolver.table_schema(entity)?;
        Ok(Self {
            ctx,
            target: Target::Table(schema),
        })
    }

    /// 关联表的别名统一转为大写。
    pub fn for_join(ctx: &'a SqlContext, join: &TableJoin) -> SqlResult<Self> {
        let mut tables = Vec::with_capacity(join.joins().len() + 1);
        for t in join.tables() {
            let schema = ctx.resolver.table_schema(&t.entity)?;
            tables.push((t.alias.trim().to_ascii_uppercase(), schema));
        }
        Ok(Self {
            ctx,
            target: Target::Join {
                join: join.clone(),
                columns: JoinColumns::new(tables),
            },
        })
    }

    pub fn context(&self) -> &'a SqlContext {
        self.ctx
    }

    pub fn mapping(&self) -> &dyn ColumnMapping {
        match &self.target {
            Target::Table(schema) => &**schema,
            Target::Join { columns, .. } => columns,
        }
    }

    /// 单表语句（insert/update/delete/递归查询）使用的表结构。
    pub(crate) fn table_schema(&self, statement: &'static str) -> SqlResult<&Arc<TableSchema>> {
        match &self.target {
            Target::Table(schema) => Ok(schema),
            Target::Join { .. } => Err(SqlError::UnsupportedStatement(statement)),
        }
    }

    fn operator_context(&self) -> OperatorContext<'_> {
        OperatorContext {
            dialect: self.ctx.dialect(),
            config: &self.ctx.config,
        }
    }

    fn condition_context(&self) -> ConditionContext<'_> {
        ConditionContext {
            dialect: self.ctx.dialect(),
            mapping: self.mapping(),
            config: &self.ctx.config,
        }
    }

    /// WHERE 条件；`wrap_with_keyword` 时非空结果以 `WHERE ` 开头。
    pub fn build_where_sql(&self, where_: &DbWhere, wrap_with_keyword: bool) -> SqlResult<SqlBuffer> {
        let mut errors = FieldErrors::new();
        let mut sql = self.build_where_items(where_, &mut errors)?;
        raise_if_failed("where", errors, where_.is_empty())?;
        if wrap_with_keyword && !sql.is_blank() {
            sql.prepend("WHERE ");
        }
        Ok(sql)
    }

    fn build_where_items(&self, where_: &DbWhere, errors: &mut FieldErrors) -> SqlResult<SqlBuffer> {
        let mut sql = SqlBuffer::new();
        for item in where_.items() {
            let fragment = match item {
                Condition::Field(f) => self.build_where_field(f, errors),
                Condition::Nested(sub) => {
                    let inner = self.build_where_items(sub, errors)?;
                    if inner.is_blank() {
                        None
                    } else {
                        let mut b = SqlBuffer::new();
                        if !sub.positive() {
                            b.append("NOT ");
                        }
                        b.append("( ").append_buffer(&inner).append(" )");
                        Some(b)
                    }
                }
                Condition::Custom(c) => self.build_custom_where(c.as_ref(), errors)?,
            };
            if let Some(fragment) = fragment
                && !fragment.is_blank()
            {
                if !sql.is_empty() {
                    sql.append_prefixed(' ', where_.logic().as_sql())
                        .append_char(' ');
                }
                sql.append_buffer(&fragment);
            }
        }
        Ok(sql)
    }

    fn build_where_field(&self, f: &DbField, errors: &mut FieldErrors) -> Option<SqlBuffer> {
        if f.field_name().is_empty() {
            return None;
        }
        let Some(op) = self.ctx.operators.where_operator(f.operator()) else {
            errors.push(FieldError::new(
                f.field_name(),
                FieldErrorReason::UnsupportedOperate,
            ));
            return None;
        };
        self.build_field_sql(
            f,
            FieldScene::Condition,
            op.name(),
            op.arity(),
            errors,
            |column, var_name, operands, octx| op.build_sql(column, var_name, operands, octx),
        )
    }

    fn build_custom_where(
        &self,
        condition: &dyn WhereCondition,
        errors: &mut FieldErrors,
    ) -> SqlResult<Option<SqlBuffer>> {
        if condition.is_empty() {
            return Ok(None);
        }
        let builder = self.ctx.builders.find_where(condition)?;
        merge_custom_result(builder.build_sql(condition, &self.condition_context()), errors)
    }

    /// UPDATE SET 子句；`wrap_with_keyword` 时以 `SET ` 开头。
    pub fn build_update_set_sql(
        &self,
        update: &DbUpdate,
        wrap_with_keyword: bool,
    ) -> SqlResult<SqlBuffer> {
        let mut errors = FieldErrors::new();
        let mut sql = SqlBuffer::new();
        for item in update.items() {
            let fragment = match item {
                UpdateItem::Field(f) => self.build_update_field(f, &mut errors),
                UpdateItem::Custom(c) => self.build_custom_update(c.as_ref(), &mut errors)?,
            };
            if let Some(fragment) = fragment
                && !fragment.is_blank()
            {
                if !sql.is_empty() {
                    sql.append(", ");
                }
                sql.append_buffer(&fragment);
            }
        }
        raise_if_failed("update set", errors, update.is_empty())?;
        if wrap_with_keyword && !sql.is_blank() {
            sql.prepend("SET ");
        }
        Ok(sql)
    }

    fn build_update_field(&self, f: &DbField, errors: &mut FieldErrors) -> Option<SqlBuffer> {
        if f.field_name().is_empty() {
            return None;
        }
        let Some(op) = self.ctx.operators.update_operator(f.operator()) else {
            errors.push(FieldError::new(
                f.field_name(),
                FieldErrorReason::UnsupportedOperate,
            ));
            return None;
        };
        self.build_field_sql(
            f,
            FieldScene::Update,
            op.name(),
            op.arity(),
            errors,
            |column, var_name, operands, octx| op.build_sql(column, var_name, operands, octx),
        )
    }

    fn build_custom_update(
        &self,
        condition: &dyn UpdateCondition,
        errors: &mut FieldErrors,
    ) -> SqlResult<Option<SqlBuffer>> {
        if condition.is_empty() {
            return Ok(None);
        }
        let builder = self.ctx.builders.find_update(condition)?;
        merge_custom_result(builder.build_sql(condition, &self.condition_context()), errors)
    }

    fn build_field_sql(
        &self,
        f: &DbField,
        scene: FieldScene,
        operator: &str,
        arity: Arity,
        errors: &mut FieldErrors,
        build: impl FnOnce(&str, &str, &[Operand], &OperatorContext<'_>) -> OperatorResult,
    ) -> Option<SqlBuffer> {
        let field = f.field_name();
        let fail = |reason| FieldError::with_operator(field, operator, reason);

        if let Some(reason) = arity.reason(f.values().len()) {
            errors.push(fail(reason));
            return None;
        }
        let Some(column) = self.mapping().column_name(scene, field) else {
            errors.push(FieldError::new(field, self.mapping().missing_reason(scene, field)));
            return None;
        };
        let operands = match self.resolve_operands(f.values(), arity == Arity::Binary) {
            Ok(operands) => operands,
            Err(reason) => {
                errors.push(fail(reason));
                return None;
            }
        };
        match build(
            &column,
            &variable_name(field),
            &operands,
            &self.operator_context(),
        ) {
            Ok(sql) => Some(sql),
            Err(reason) => {
                errors.push(fail(reason));
                None
            }
        }
    }

    // 关联查询中，二元运算符的字符串参数若是 `alias.field` 且能解析为列，按列引用处理
    fn resolve_operands(&self, values: &[Arg], binary: bool) -> Result<Vec<Operand>, FieldErrorReason> {
        values
            .iter()
            .map(|arg| match arg {
                Arg::Field(name) => self
                    .mapping()
                    .column_name(FieldScene::Condition, name)
                    .map(Operand::Column)
                    .ok_or(FieldErrorReason::UnresolvedReference),
                Arg::Value(SqlValue::String(s)) if binary && s.contains('.') => {
                    Ok(match &self.target {
                        Target::Join { columns, .. } => columns
                            .column_name(FieldScene::Condition, s)
                            .map(Operand::Column)
                            .unwrap_or_else(|| Operand::Value(SqlValue::String(s.clone()))),
                        Target::Table(_) => Operand::Value(SqlValue::String(s.clone())),
                    })
                }
                Arg::Value(v) => Ok(Operand::Value(v.clone())),
            })
            .collect()
    }

    /// ORDER BY 子句；`wrap_with_keyword` 时以 `ORDER BY ` 开头。
    pub fn build_order_by_sql(
        &self,
        orderings: &Orderings,
        wrap_with_keyword: bool,
    ) -> SqlResult<SqlBuffer> {
        let mut errors = FieldErrors::new();
        let mut parts = Vec::new();
        for o in orderings {
            match self.mapping().column_name(FieldScene::Condition, &o.field_name) {
                Some(column) => {
                    let column = if o.pinyin {
                        self.ctx.dialect.build_pinyin_order_sql(&column)
                    } else {
                        column
                    };
                    parts.push(format!("{column} {}", o.order.as_sql()));
                }
                None => errors.push(FieldError::new(
                    &o.field_name,
                    self.mapping()
                        .missing_reason(FieldScene::Condition, &o.field_name),
                )),
            }
        }
        raise_if_failed("order by", errors, false)?;

        if parts.is_empty() {
            return Ok(SqlBuffer::new());
        }
        let mut buf = StringBuilder::with_capacity(64);
        if wrap_with_keyword {
            buf.write_str("ORDER BY ");
        }
        buf.write_strings(&parts, ", ");
        Ok(SqlBuffer::from_text(&buf.into_string()))
    }

    /// 查询列。`fields` 为空时取全部列；关联查询取有 `result_field` 的表
    /// （都没有时取主表），不同表的同名列追加 `AS ALIAS_COLUMN`。
    pub fn build_select_fields_sql(&self, fields: &[&str]) -> SqlResult<SqlBuffer> {
        if !fields.is_empty() {
            return self.build_by_fields_sql(FieldScene::Condition, fields);
        }
        let columns = match &self.target {
            Target::Table(schema) => schema
                .columns()
                .iter()
                .map(|c| c.column_name.clone())
                .collect::<Vec<_>>(),
            Target::Join { join, columns } => join_select_columns(join, columns),
        };
        Ok(SqlBuffer::from_text(&columns.join(", ")))
    }

    /// `(A, B, C)`，按 Insert 场景解析。
    pub fn build_insert_fields_sql(&self, fields: &[&str]) -> SqlResult<SqlBuffer> {
        self.table_schema("insert")?;
        let mut sql = self.build_by_fields_sql(FieldScene::Insert, fields)?;
        sql.prepend("(").append(")");
        Ok(sql)
    }

    /// `A, B, C`：逐个解析字段，失败的字段一起报错。
    pub fn build_by_fields_sql(&self, scene: FieldScene, fields: &[&str]) -> SqlResult<SqlBuffer> {
        let mut errors = FieldErrors::new();
        let mut columns = Vec::with_capacity(fields.len());
        for field in fields {
            match self.mapping().column_name(scene, field) {
                Some(c) => columns.push(c),
                None => errors.push(FieldError::new(
                    *field,
                    self.mapping().missing_reason(scene, field),
                )),
            }
        }
        raise_if_failed("fields", errors, false)?;
        Ok(SqlBuffer::from_text(&columns.join(", ")))
    }

    /// FROM 子句内容（不含 `FROM` 关键字）：单表为表名，关联为
    /// `T_USER U INNER JOIN T_ROLE R ON U.ROLE_ID = R.ID`。
    pub fn build_from_sql(&self) -> SqlResult<SqlBuffer> {
        let (join, columns) = match &self.target {
            Target::Table(schema) => return Ok(SqlBuffer::from_text(schema.table_name())),
            Target::Join { join, columns } => (join, columns),
        };

        let tables = columns.tables();
        let mut errors = FieldErrors::new();
        let mut sql = SqlBuffer::new();
        if let Some((alias, schema)) = tables.first() {
            sql.append(schema.table_name()).append_prefixed(' ', alias);
        }
        for (edge, (alias, schema)) in join.joins().iter().zip(tables.iter().skip(1)) {
            sql.append_prefixed(' ', edge.join_type.as_sql())
                .append_prefixed(' ', schema.table_name())
                .append_prefixed(' ', alias);
            let on = self.build_where_items(&edge.on, &mut errors)?;
            if on.is_blank() {
                errors.push(FieldError::with_operator(
                    &edge.table.alias,
                    "On",
                    FieldErrorReason::MissingArguments,
                ));
            } else {
                sql.append(" ON ").append_buffer(&on);
            }
        }
        raise_if_failed("from", errors, false)?;
        Ok(sql)
    }
}

fn merge_custom_result(
    result: SqlResult<SqlBuffer>,
    errors: &mut FieldErrors,
) -> SqlResult<Option<SqlBuffer>> {
    match result {
        Ok(sql) => Ok(Some(sql)),
        Err(SqlError::UnsupportedField { details, .. }) => {
            errors.extend(details);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn raise_if_failed(clause: &'static str, errors: FieldErrors, empty: bool) -> SqlResult<()> {
    if errors.is_empty() || empty {
        return Ok(());
    }
    tracing::warn!(target: LOG_TARGET, clause, details = %errors, "sql build failed");
    Err(SqlError::UnsupportedField {
        clause,
        details: errors,
    })
}

fn join_select_columns(join: &TableJoin, columns: &JoinColumns) -> Vec<String> {
    let mut selected: Vec<(&str, &TableSchema)> = join
        .tables()
        .zip(columns.tables())
        .filter(|(t, _)| t.result_field.is_some())
        .map(|(_, (alias, schema))| (alias.as_str(), &**schema))
        .collect();
    if selected.is_empty()
        && let Some((alias, schema)) = columns.tables().first()
    {
        selected.push((alias.as_str(), &**schema));
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (_, schema) in &selected {
        for c in schema.columns() {
            *seen.entry(c.column_name.as_str()).or_default() += 1;
        }
    }
    let mut out = Vec::new();
    for (alias, schema) in &selected {
        for c in schema.columns() {
            let column = c.column_name.as_str();
            if seen.get(column).copied().unwrap_or(0) > 1 {
                out.push(format!("{alias}.{column} AS {alias}_{column}"));
            } else {
                out.push(format!("{alias}.{column}"));
            }
        }
    }
    out
}
