//! 错误类型：字段级错误聚合后一次性抛出，方言/类型级错误立即失败。

use std::fmt;

pub type SqlResult<T> = Result<T, SqlError>;

/// 字段错误的原因（渲染为 `#Reason`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldErrorReason {
    /// 字段在当前场景下没有对应的列。
    UnsupportedField,
    /// 运算符未注册。
    UnsupportedOperate,
    /// 条件值为空白（None/Null/空白字符串）。
    IsBlank,
    MissingArguments,
    TooManyArguments,
    /// IsNull/IsNotNull 的极性参数无法解析为布尔值。
    NotBoolean,
    /// Add 运算需要数值。
    NotNumber,
    /// 字段引用（`field_ref`）无法解析为列。
    UnresolvedReference,
    /// 关联查询中未带别名的字段同时存在于多张表。
    AmbiguousField,
}

impl FieldErrorReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedField => "UnsupportedField",
            Self::UnsupportedOperate => "UnsupportedOperate",
            Self::IsBlank => "IsBlank",
            Self::MissingArguments => "MissingArguments",
            Self::TooManyArguments => "TooManyArguments",
            Self::NotBoolean => "NotBoolean",
            Self::NotNumber => "NotNumber",
            Self::UnresolvedReference => "UnresolvedReference",
            Self::AmbiguousField => "AmbiguousField",
        }
    }
}

/// 单个字段错误，渲染为 `field$Op(#Reason)` 或 `field#Reason`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub operator: Option<String>,
    pub reason: FieldErrorReason,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: FieldErrorReason) -> Self {
        Self {
            field: field.into(),
            operator: None,
            reason,
        }
    }

    pub fn with_operator(
        field: impl Into<String>,
        operator: impl Into<String>,
        reason: FieldErrorReason,
    ) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator.into()),
            reason,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operator {
            Some(op) => write!(f, "{}${}(#{})", self.field, op, self.reason.as_str()),
            None => write!(f, "{}#{}", self.field, self.reason.as_str()),
        }
    }
}

/// 一次遍历中收集到的全部字段错误。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, e: FieldError) {
        self.0.push(e);
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl From<Vec<FieldError>> for FieldErrors {
    fn from(v: Vec<FieldError>) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    #[error("{clause} sql build failed: [{details}]")]
    UnsupportedField {
        clause: &'static str,
        details: FieldErrors,
    },
    #[error("missing arguments: {field}${operator}")]
    MissingArguments { field: String, operator: String },
    #[error("too many arguments: {field}${operator}, expected {expected}, actual {actual}")]
    TooManyArguments {
        field: String,
        operator: String,
        expected: usize,
        actual: usize,
    },
    #[error("unsupported operator: {field}${operator}")]
    UnsupportedOperator { field: String, operator: String },
    #[error("unsupported db type {db_type} for {feature}")]
    UnsupportedDbType {
        db_type: String,
        feature: &'static str,
    },
    #[error("sql builder not found for condition type {tag}")]
    SqlBuilderNotFound { tag: String },
    #[error("condition is immutable")]
    ImmutableCondition,
    #[error("{0} condition must not be empty, use DbWhere::NONE to match all rows")]
    EmptyCondition(&'static str),
    #[error("unknown entity type {0}")]
    UnknownEntity(String),
    #[error("{0} is not supported on joined tables")]
    UnsupportedStatement(&'static str),
    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}

impl SqlError {
    pub(crate) fn missing(field: &str, operator: &str) -> Self {
        Self::MissingArguments {
            field: field.to_string(),
            operator: operator.to_string(),
        }
    }

    pub(crate) fn too_many(field: &str, operator: &str, expected: usize, actual: usize) -> Self {
        Self::TooManyArguments {
            field: field.to_string(),
            operator: operator.to_string(),
            expected,
            actual,
        }
    }

    pub(crate) fn unsupported_db(db_type: impl fmt::Display, feature: &'static str) -> Self {
        Self::UnsupportedDbType {
            db_type: db_type.to_string(),
            feature,
        }
    }

    /// 聚合错误中的字段明细（非聚合错误返回 None）。
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::UnsupportedField { details, .. } => Some(details),
            _ => None,
        }
    }
}
