//! 单个字段条件：`fieldName` + 运算符 + 参数列表。

use crate::error::{SqlError, SqlResult};
use crate::modifiers::{Arg, FlattenIntoArgs, flatten};
use crate::operator::{Arity, OperatorRegistry};
use std::fmt;
use std::str::FromStr;

/// 条件之间的连接方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicType {
    #[default]
    And,
    Or,
}

impl LogicType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LogicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for LogicType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" | "&&" => Ok(Self::And),
            "or" | "||" => Ok(Self::Or),
            _ => Err(SqlError::InvalidValue {
                kind: "logic type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbField {
    field_name: String,
    /// 运算符规范名（如 `Equals`）。
    operator: String,
    arity: Arity,
    values: Vec<Arg>,
}

impl DbField {
    /// 按内置 WHERE 运算符解析 `operator`（忽略大小写，支持别名），并校验参数个数。
    pub fn parse_where(
        field_name: &str,
        operator: &str,
        values: impl FlattenIntoArgs,
    ) -> SqlResult<Self> {
        let op = OperatorRegistry::defaults()
            .where_operator(operator)
            .ok_or_else(|| SqlError::UnsupportedOperator {
                field: field_name.to_string(),
                operator: operator.to_string(),
            })?;
        Self::checked(field_name, op.name(), op.arity(), flatten(values))
    }

    /// 按内置 UPDATE 运算符解析。
    pub fn parse_update(
        field_name: &str,
        operator: &str,
        values: impl FlattenIntoArgs,
    ) -> SqlResult<Self> {
        let op = OperatorRegistry::defaults()
            .update_operator(operator)
            .ok_or_else(|| SqlError::UnsupportedOperator {
                field: field_name.to_string(),
                operator: operator.to_string(),
            })?;
        Self::checked(field_name, op.name(), op.arity(), flatten(values))
    }

    fn checked(field_name: &str, operator: &str, arity: Arity, values: Vec<Arg>) -> SqlResult<Self> {
        arity.check(field_name, operator, values.len())?;
        Ok(Self {
            field_name: field_name.trim().to_string(),
            operator: operator.to_string(),
            arity,
            values,
        })
    }

    /// 直接构建，不做解析与校验；用于自定义运算符，编译时再按注册表校验。
    pub fn new(
        field_name: impl Into<String>,
        operator: impl Into<String>,
        arity: Arity,
        values: Vec<Arg>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            operator: operator.into(),
            arity,
            values,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn values(&self) -> &[Arg] {
        &self.values
    }

    /// 字段名为空，或需要参数的运算符其参数全部为空白。
    pub fn is_empty(&self) -> bool {
        if self.field_name.trim().is_empty() {
            return true;
        }
        match self.arity {
            Arity::Unary => false,
            _ => self.values.iter().all(Arg::is_blank),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlError;
    use pretty_assertions::assert_eq;

    #[test]
    fn operator_aliases_resolve_to_canonical_name() {
        for token in ["=", "equals", "EQUALS", "eq"] {
            let f = DbField::parse_where("id", token, 1).unwrap();
            assert_eq!(f.operator(), "Equals");
        }
        let f = DbField::parse_where("id", "<>", 1).unwrap();
        assert_eq!(f.operator(), "NotEquals");
        let f = DbField::parse_where("id", "notin", vec![1, 2]).unwrap();
        assert_eq!(f.operator(), "NotIn");
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = DbField::parse_where("id", "~~", 1).unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedOperator { .. }));
    }

    #[test]
    fn arity_is_checked() {
        assert!(matches!(
            DbField::parse_where("id", "=", ()).unwrap_err(),
            SqlError::MissingArguments { .. }
        ));
        assert!(matches!(
            DbField::parse_where("id", "=", (1, 2)).unwrap_err(),
            SqlError::TooManyArguments {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert!(matches!(
            DbField::parse_where("age", "between", 18).unwrap_err(),
            SqlError::MissingArguments { .. }
        ));
        assert!(matches!(
            DbField::parse_where("id", "in", Vec::<i32>::new()).unwrap_err(),
            SqlError::MissingArguments { .. }
        ));
        assert!(DbField::parse_where("deleted", "isNull", ()).is_ok());
        assert!(DbField::parse_where("deleted", "isNull", false).is_ok());
    }

    #[test]
    fn blank_values_make_field_empty() {
        assert!(DbField::parse_where("name", "like", "  ").unwrap().is_empty());
        assert!(DbField::parse_where("name", "=", None::<i32>).unwrap().is_empty());
        assert!(!DbField::parse_where("deleted", "isNull", ()).unwrap().is_empty());
        assert!(
            !DbField::parse_where("id", "in", (None::<i32>, 3))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn logic_type_parses() {
        assert_eq!("or".parse::<LogicType>().unwrap(), LogicType::Or);
        assert_eq!("AND".parse::<LogicType>().unwrap(), LogicType::And);
        assert!("xor".parse::<LogicType>().is_err());
    }
}
