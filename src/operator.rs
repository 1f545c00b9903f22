//! 运算符注册表：运算符名（含别名，忽略大小写）到 SQL 片段生成器的映射。
//!
//! 每个运算符预先声明参数个数约定（[`Arity`]），编译器调用前先校验参数个数。

use crate::config::SqlConfig;
use crate::dialect::DialectStrategy;
use crate::error::{FieldErrorReason, SqlError, SqlResult};
use crate::sql_buffer::SqlBuffer;
use crate::value::SqlValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// 参数个数约定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// 0 或 1 个参数（如 IsNull 的极性参数）
    Unary,
    /// 恰好 1 个参数
    Binary,
    /// 恰好 2 个参数
    Ternary,
    /// 至少 1 个参数
    Multivariate,
}

impl Arity {
    pub fn check(self, field: &str, operator: &str, count: usize) -> SqlResult<()> {
        match self {
            Self::Unary if count > 1 => Err(SqlError::too_many(field, operator, 1, count)),
            Self::Binary if count == 0 => Err(SqlError::missing(field, operator)),
            Self::Binary if count > 1 => Err(SqlError::too_many(field, operator, 1, count)),
            Self::Ternary if count < 2 => Err(SqlError::missing(field, operator)),
            Self::Ternary if count > 2 => Err(SqlError::too_many(field, operator, 2, count)),
            Self::Multivariate if count == 0 => Err(SqlError::missing(field, operator)),
            _ => Ok(()),
        }
    }

    /// 与 `check` 相同的规则，失败时返回字段错误原因。
    pub(crate) fn reason(self, count: usize) -> Option<FieldErrorReason> {
        match self.check("", "", count) {
            Ok(()) => None,
            Err(SqlError::TooManyArguments { .. }) => Some(FieldErrorReason::TooManyArguments),
            Err(_) => Some(FieldErrorReason::MissingArguments),
        }
    }
}

/// 已解析的操作数：绑定参数，或另一列的列名。
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(SqlValue),
    Column(String),
}

impl Operand {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Value(v) => v.is_blank(),
            Self::Column(c) => c.trim().is_empty(),
        }
    }

    pub fn append_to(&self, sql: &mut SqlBuffer, var_name: &str) {
        match self {
            Self::Value(v) => {
                sql.add_named_variable(var_name, v.clone());
            }
            Self::Column(c) => {
                sql.append(c);
            }
        }
    }

    pub fn to_buffer(&self, var_name: &str) -> SqlBuffer {
        let mut b = SqlBuffer::new();
        self.append_to(&mut b, var_name);
        b
    }
}

/// 运算符生成 SQL 时可用的上下文。
#[derive(Debug, Clone, Copy)]
pub struct OperatorContext<'a> {
    pub dialect: &'a dyn DialectStrategy,
    pub config: &'a SqlConfig,
}

pub type OperatorResult = Result<SqlBuffer, FieldErrorReason>;

/// WHERE 条件运算符。
pub trait WhereOperator: Send + Sync + fmt::Debug {
    /// 规范名，如 `Equals`。
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn arity(&self) -> Arity;

    /// 生成 `COLUMN ...` 片段；`var_name` 用作占位符参数名。
    fn build_sql(
        &self,
        column: &str,
        var_name: &str,
        values: &[Operand],
        ctx: &OperatorContext<'_>,
    ) -> OperatorResult;
}

/// UPDATE SET 运算符，生成 `COLUMN = ...`。
pub trait UpdateOperator: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn arity(&self) -> Arity;

    fn build_sql(
        &self,
        column: &str,
        var_name: &str,
        values: &[Operand],
        ctx: &OperatorContext<'_>,
    ) -> OperatorResult;
}

#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    where_ops: HashMap<String, Arc<dyn WhereOperator>>,
    update_ops: HashMap<String, Arc<dyn UpdateOperator>>,
}

static DEFAULT_OPERATORS: OnceLock<OperatorRegistry> = OnceLock::new();

impl OperatorRegistry {
    /// 空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 包含全部内置运算符的注册表，可继续注册自定义运算符。
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        for op in [
            CompareOperator::new("Equals", &["=", "==", "eq"], "="),
            CompareOperator::new("NotEquals", &["!=", "<>", "ne"], "!="),
            CompareOperator::new("GreaterThen", &[">", "gt"], ">"),
            CompareOperator::new("LessThen", &["<", "lt"], "<"),
            CompareOperator::new("GreaterEqualsThen", &[">=", "ge"], ">="),
            CompareOperator::new("LessEqualsThen", &["<=", "le"], "<="),
        ] {
            r.register_where(Arc::new(op));
        }
        for op in [
            PatternOperator::new("Like", &[], PatternKind::Contains, false),
            PatternOperator::new("NotLike", &[], PatternKind::Contains, true),
            PatternOperator::new("Starts", &["StartsWith"], PatternKind::Starts, false),
            PatternOperator::new("Ends", &["EndsWith"], PatternKind::Ends, false),
        ] {
            r.register_where(Arc::new(op));
        }
        r.register_where(Arc::new(IsNullOperator { negate: false }));
        r.register_where(Arc::new(IsNullOperator { negate: true }));
        r.register_where(Arc::new(BetweenOperator { negate: false }));
        r.register_where(Arc::new(BetweenOperator { negate: true }));
        r.register_where(Arc::new(InOperator { negate: false }));
        r.register_where(Arc::new(InOperator { negate: true }));

        r.register_update(Arc::new(SetOperator));
        r.register_update(Arc::new(AddOperator));
        r.register_update(Arc::new(ToNullOperator));
        r
    }

    /// 只读的内置运算符表，供条件构建时解析运算符名。
    pub fn defaults() -> &'static OperatorRegistry {
        DEFAULT_OPERATORS.get_or_init(Self::with_defaults)
    }

    pub fn register_where(&mut self, op: Arc<dyn WhereOperator>) -> &mut Self {
        for key in std::iter::once(op.name()).chain(op.aliases().iter().copied()) {
            self.where_ops.insert(key.to_ascii_lowercase(), op.clone());
        }
        self
    }

    pub fn register_update(&mut self, op: Arc<dyn UpdateOperator>) -> &mut Self {
        for key in std::iter::once(op.name()).chain(op.aliases().iter().copied()) {
            self.update_ops.insert(key.to_ascii_lowercase(), op.clone());
        }
        self
    }

    pub fn where_operator(&self, token: &str) -> Option<&Arc<dyn WhereOperator>> {
        self.where_ops.get(&token.trim().to_ascii_lowercase())
    }

    pub fn update_operator(&self, token: &str) -> Option<&Arc<dyn UpdateOperator>> {
        self.update_ops.get(&token.trim().to_ascii_lowercase())
    }
}

/// `COLUMN <symbol> value`
#[derive(Debug, Clone)]
struct CompareOperator {
    name: &'static str,
    aliases: &'static [&'static str],
    symbol: &'static str,
}

impl CompareOperator {
    fn new(name: &'static str, aliases: &'static [&'static str], symbol: &'static str) -> Self {
        Self {
            name,
            aliases,
            symbol,
        }
    }
}

impl WhereOperator for CompareOperator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
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
        let value = single_value(values)?;
        let mut sql = SqlBuffer::new();
        sql.append(column).append(" ").append(self.symbol).append(" ");
        value.append_to(&mut sql, var_name);
        Ok(sql)
    }
}

fn single_value(values: &[Operand]) -> Result<&Operand, FieldErrorReason> {
    match values {
        [v] if v.is_blank() => Err(FieldErrorReason::IsBlank),
        [v] => Ok(v),
        [] => Err(FieldErrorReason::MissingArguments),
        _ => Err(FieldErrorReason::TooManyArguments),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Contains,
    Starts,
    Ends,
}

/// `COLUMN [NOT] LIKE <dialect pattern>`
#[derive(Debug, Clone)]
struct PatternOperator {
    name: &'static str,
    aliases: &'static [&'static str],
    kind: PatternKind,
    negate: bool,
}

impl PatternOperator {
    fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        kind: PatternKind,
        negate: bool,
    ) -> Self {
        Self {
            name,
            aliases,
            kind,
            negate,
        }
    }
}

impl WhereOperator for PatternOperator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn build_sql(
        &self,
        column: &str,
        var_name: &str,
        values: &[Operand],
        ctx: &OperatorContext<'_>,
    ) -> OperatorResult {
        let value = single_value(values)?.to_buffer(var_name);
        let pattern = match self.kind {
            PatternKind::Contains => ctx.dialect.build_like_sql(value),
            PatternKind::Starts => ctx.dialect.build_starts_with_sql(value),
            PatternKind::Ends => ctx.dialect.build_ends_with_sql(value),
        };
        let mut sql = SqlBuffer::new();
        sql.append(column);
        sql.append(if self.negate { " NOT LIKE " } else { " LIKE " });
        sql.append_buffer(&pattern);
        Ok(sql)
    }
}

/// IsNull/IsNotNull：可选的布尔参数是极性标记，`IsNull(false)` 等同 `IsNotNull`。
#[derive(Debug, Clone)]
struct IsNullOperator {
    negate: bool,
}

impl WhereOperator for IsNullOperator {
    fn name(&self) -> &'static str {
        if self.negate { "IsNotNull" } else { "IsNull" }
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn build_sql(
        &self,
        column: &str,
        _var_name: &str,
        values: &[Operand],
        _ctx: &OperatorContext<'_>,
    ) -> OperatorResult {
        let flag = match values.first() {
            None => true,
            Some(v) if v.is_blank() => true,
            Some(Operand::Value(v)) => v.as_bool_flag().ok_or(FieldErrorReason::NotBoolean)?,
            Some(Operand::Column(_)) => return Err(FieldErrorReason::NotBoolean),
        };
        let mut sql = SqlBuffer::new();
        sql.append(column);
        if flag != self.negate {
            sql.append(" IS NULL");
        } else {
            sql.append(" IS NOT NULL");
        }
        Ok(sql)
    }
}

/// `COLUMN [NOT] BETWEEN a AND b`；只有一端有值时退化为 `>=`/`<=`。
#[derive(Debug, Clone)]
struct BetweenOperator {
    negate: bool,
}

impl WhereOperator for BetweenOperator {
    fn name(&self) -> &'static str {
        if self.negate { "NotBetween" } else { "Between" }
    }

    fn arity(&self) -> Arity {
        Arity::Ternary
    }

    fn build_sql(
        &self,
        column: &str,
        var_name: &str,
        values: &[Operand],
        _ctx: &OperatorContext<'_>,
    ) -> OperatorResult {
        let (min, max) = match values {
            [min, max] => (min, max),
            [] | [_] => return Err(FieldErrorReason::MissingArguments),
            _ => return Err(FieldErrorReason::TooManyArguments),
        };
        let mut sql = SqlBuffer::new();
        sql.append(column);
        match (min.is_blank(), max.is_blank()) {
            (true, true) => return Err(FieldErrorReason::IsBlank),
            (false, true) => {
                sql.append(if self.negate { " < " } else { " >= " });
                min.append_to(&mut sql, var_name);
            }
            (true, false) => {
                sql.append(if self.negate { " > " } else { " <= " });
                max.append_to(&mut sql, var_name);
            }
            (false, false) => {
                sql.append(if self.negate {
                    " NOT BETWEEN "
                } else {
                    " BETWEEN "
                });
                min.append_to(&mut sql, var_name);
                sql.append(" AND ");
                max.append_to(&mut sql, var_name);
            }
        }
        Ok(sql)
    }
}

/// `COLUMN [NOT] IN (...)`；空白元素被丢弃，过长的列表按配置拆分。
#[derive(Debug, Clone)]
struct InOperator {
    negate: bool,
}

impl WhereOperator for InOperator {
    fn name(&self) -> &'static str {
        if self.negate { "NotIn" } else { "In" }
    }

    fn arity(&self) -> Arity {
        Arity::Multivariate
    }

    fn build_sql(
        &self,
        column: &str,
        var_name: &str,
        values: &[Operand],
        ctx: &OperatorContext<'_>,
    ) -> OperatorResult {
        let items: Vec<&Operand> = values.iter().filter(|v| !v.is_blank()).collect();
        if items.is_empty() {
            return Err(if values.is_empty() {
                FieldErrorReason::MissingArguments
            } else {
                FieldErrorReason::IsBlank
            });
        }

        let chunk_size = match ctx.config.max_in_items {
            0 => items.len(),
            n => n,
        };
        let keyword = if self.negate { " NOT IN (" } else { " IN (" };
        let connective = if self.negate { " AND " } else { " OR " };
        let chunks: Vec<&[&Operand]> = items.chunks(chunk_size).collect();

        let mut sql = SqlBuffer::new();
        if chunks.len() > 1 {
            sql.append("( ");
        }
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                sql.append(connective);
            }
            sql.append(column).append(keyword);
            for (j, v) in chunk.iter().enumerate() {
                if j > 0 {
                    sql.append(", ");
                }
                v.append_to(&mut sql, var_name);
            }
            sql.append(")");
        }
        if chunks.len() > 1 {
            sql.append(" )");
        }
        Ok(sql)
    }
}

/// `COLUMN = value`
#[derive(Debug, Clone)]
struct SetOperator;

impl UpdateOperator for SetOperator {
    fn name(&self) -> &'static str {
        "Set"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["="]
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
        let value = match values {
            [Operand::Value(SqlValue::Null)] => return Err(FieldErrorReason::IsBlank),
            [v] => v,
            [] => return Err(FieldErrorReason::MissingArguments),
            _ => return Err(FieldErrorReason::TooManyArguments),
        };
        let mut sql = SqlBuffer::new();
        sql.append(column).append(" = ");
        value.append_to(&mut sql, var_name);
        Ok(sql)
    }
}

/// `COLUMN = COLUMN + value`，负数转为减法。
#[derive(Debug, Clone)]
struct AddOperator;

impl UpdateOperator for AddOperator {
    fn name(&self) -> &'static str {
        "Add"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["+="]
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
        sql.append(column).append(" = ").append(column);
        match single_value(values)? {
            Operand::Value(v) => {
                let (negative, abs) = v.split_sign().ok_or(FieldErrorReason::NotNumber)?;
                sql.append(if negative { " - " } else { " + " });
                sql.add_named_variable(var_name, abs);
            }
            Operand::Column(c) => {
                sql.append(" + ").append(c);
            }
        }
        Ok(sql)
    }
}

/// `COLUMN = NULL`
#[derive(Debug, Clone)]
struct ToNullOperator;

impl UpdateOperator for ToNullOperator {
    fn name(&self) -> &'static str {
        "ToNull"
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn build_sql(
        &self,
        column: &str,
        _var_name: &str,
        _values: &[Operand],
        _ctx: &OperatorContext<'_>,
    ) -> OperatorResult {
        let mut sql = SqlBuffer::new();
        sql.append(column).append(" = NULL");
        Ok(sql)
    }
}
