//! 数据库方言：分页、LIKE 拼接、拼音排序、递归查询与字面量输出。

use crate::config::EnumPolicy;
use crate::error::{SqlError, SqlResult};
use crate::interpolate::write_literal;
use crate::paging::Paging;
use crate::recursive::{FindChildrenParams, RecursiveStrategy};
use crate::sql_buffer::SqlBuffer;
use crate::value::SqlValue;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 支持的数据库类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    Oracle,
    MySQL,
    PostgreSQL,
    DB2,
    SQLServer,
    H2,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Oracle => "Oracle",
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::DB2 => "DB2",
            Self::SQLServer => "SQLServer",
            Self::H2 => "H2",
        };
        f.write_str(s)
    }
}

impl FromStr for DbType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "mysql" => Ok(Self::MySQL),
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSQL),
            "db2" => Ok(Self::DB2),
            "sqlserver" | "mssql" => Ok(Self::SQLServer),
            "h2" => Ok(Self::H2),
            _ => Err(SqlError::unsupported_db(s.trim(), "dialect")),
        }
    }
}

/// 数据库类型 + 版本。`major == 0` 表示未指定版本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DbVersion {
    pub db_type: DbType,
    pub major: u32,
    pub minor: u32,
}

impl DbVersion {
    pub fn new(db_type: DbType) -> Self {
        Self {
            db_type,
            major: 0,
            minor: 0,
        }
    }

    pub fn with_version(db_type: DbType, major: u32, minor: u32) -> Self {
        Self {
            db_type,
            major,
            minor,
        }
    }

    /// 未指定版本视为满足任意最低版本要求。
    pub fn at_least(&self, major: u32) -> bool {
        self.major == 0 || self.major >= major
    }
}

impl fmt::Display for DbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major == 0 {
            write!(f, "{}", self.db_type)
        } else {
            write!(f, "{}.{}.{}", self.db_type, self.major, self.minor)
        }
    }
}

/// 解析 `mysql`、`mysql.8`、`mysql.5.7` 这类配置字符串。
impl FromStr for DbVersion {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(['.', ':']);
        let db_type: DbType = parts.next().unwrap_or_default().parse()?;
        let parse_num = |part: Option<&str>| -> SqlResult<u32> {
            match part {
                None => Ok(0),
                Some(p) => p.trim().parse().map_err(|_| SqlError::InvalidValue {
                    kind: "db version",
                    value: s.to_string(),
                }),
            }
        };
        let major = parse_num(parts.next())?;
        let minor = parse_num(parts.next())?;
        Ok(Self {
            db_type,
            major,
            minor,
        })
    }
}

/// 方言策略：每种数据库一份实现，创建后不可变，可跨线程共享。
pub trait DialectStrategy: Send + Sync + fmt::Debug {
    fn db_version(&self) -> DbVersion;

    /// 把分页条件注入到完整查询语句。
    fn process_paging_sql(&self, sql: &mut SqlBuffer, paging: &Paging) -> SqlResult<()>;

    /// `%value%`：返回不含字段名的片段，如 `CONCAT('%',:$1,'%')`。
    fn build_like_sql(&self, value: SqlBuffer) -> SqlBuffer;

    /// `value%`
    fn build_starts_with_sql(&self, value: SqlBuffer) -> SqlBuffer;

    /// `%value`
    fn build_ends_with_sql(&self, value: SqlBuffer) -> SqlBuffer;

    /// 按拼音排序的列表达式。
    fn build_pinyin_order_sql(&self, column: &str) -> String;

    /// 递归查询全部子节点（含起始节点）。
    fn build_find_children_sql(&self, params: &FindChildrenParams<'_>) -> SqlResult<SqlBuffer>;

    /// 参数值的字面量形式；枚举按 `policy` 输出序号或名称。
    fn variable_to_string(&self, value: &SqlValue, policy: EnumPolicy) -> String;
}

/// 按 `DbVersion` 选择行为的默认方言实现。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    version: DbVersion,
}

impl Dialect {
    pub fn new(version: DbVersion) -> Self {
        Self { version }
    }

    pub fn of(db_type: DbType) -> Self {
        Self::new(DbVersion::new(db_type))
    }

    fn wrap_pattern(&self, value: SqlBuffer, leading: bool, trailing: bool) -> SqlBuffer {
        let mut out = SqlBuffer::new();
        match self.version.db_type {
            DbType::MySQL | DbType::H2 => {
                out.append("CONCAT(");
                if leading {
                    out.append("'%',");
                }
                out.append_buffer(&value);
                if trailing {
                    out.append(",'%'");
                }
                out.append(")");
            }
            DbType::SQLServer => {
                out.append("(");
                if leading {
                    out.append("'%'+");
                }
                out.append_buffer(&value);
                if trailing {
                    out.append("+'%'");
                }
                out.append(")");
            }
            DbType::Oracle | DbType::DB2 | DbType::PostgreSQL => {
                out.append("(");
                if leading {
                    out.append("'%'||");
                }
                out.append_buffer(&value);
                if trailing {
                    out.append("||'%'");
                }
                out.append(")");
            }
        }
        out
    }

    fn oracle_paging(sql: &mut SqlBuffer, paging: &Paging) {
        if paging.start == 0 {
            sql.prepend("SELECT * FROM ( ");
            sql.append(" ) WHERE ROWNUM <= ");
            sql.add_named_variable("rows", paging.rows);
        } else {
            sql.prepend("SELECT * FROM ( SELECT T_T.*, ROWNUM R_N FROM ( ");
            sql.append(" ) T_T ) WHERE R_N > ");
            sql.add_named_variable("start", paging.start);
            sql.append(" AND ROWNUM <= ");
            sql.add_named_variable("rows", paging.rows);
        }
    }

    fn db2_paging(sql: &mut SqlBuffer, paging: &Paging) {
        if paging.start == 0 {
            sql.append(&format!(" FETCH FIRST {} ROWS ONLY", paging.rows));
        } else {
            sql.prepend(
                "SELECT * FROM ( SELECT T_T.*, ROWNUMBER() OVER(ORDER BY ORDER OF T_T) AS R_N FROM ( ",
            );
            sql.append(" ) AS T_T ) AS T_R WHERE R_N > ");
            sql.add_named_variable("start", paging.start);
            sql.append(" AND R_N <= ");
            sql.add_named_variable("end", paging.end());
        }
    }

    fn sqlserver_paging(sql: &mut SqlBuffer, paging: &Paging) {
        // OFFSET/FETCH 必须跟在 ORDER BY 之后
        if !sql.contains_keyword("ORDER BY") {
            sql.append(" ORDER BY (SELECT NULL)");
        }
        sql.append(" OFFSET ");
        sql.add_named_variable("start", paging.start);
        sql.append(" ROWS FETCH NEXT ");
        sql.add_named_variable("rows", paging.rows);
        sql.append(" ROWS ONLY");
    }
}

impl DialectStrategy for Dialect {
    fn db_version(&self) -> DbVersion {
        self.version
    }

    fn process_paging_sql(&self, sql: &mut SqlBuffer, paging: &Paging) -> SqlResult<()> {
        if !paging.is_paged() {
            return Ok(());
        }
        match self.version.db_type {
            DbType::MySQL | DbType::H2 | DbType::PostgreSQL => {
                sql.append(" LIMIT ");
                sql.add_named_variable("rows", paging.rows);
                if paging.start > 0 {
                    sql.append(" OFFSET ");
                    sql.add_named_variable("start", paging.start);
                }
            }
            DbType::Oracle => Self::oracle_paging(sql, paging),
            DbType::DB2 => Self::db2_paging(sql, paging),
            DbType::SQLServer => Self::sqlserver_paging(sql, paging),
        }
        Ok(())
    }

    fn build_like_sql(&self, value: SqlBuffer) -> SqlBuffer {
        self.wrap_pattern(value, true, true)
    }

    fn build_starts_with_sql(&self, value: SqlBuffer) -> SqlBuffer {
        self.wrap_pattern(value, false, true)
    }

    fn build_ends_with_sql(&self, value: SqlBuffer) -> SqlBuffer {
        self.wrap_pattern(value, true, false)
    }

    fn build_pinyin_order_sql(&self, column: &str) -> String {
        match self.version.db_type {
            // Oracle 默认排序规则已按拼音排序
            DbType::MySQL => format!("CONVERT({column} USING GBK)"),
            _ => column.to_string(),
        }
    }

    fn build_find_children_sql(&self, params: &FindChildrenParams<'_>) -> SqlResult<SqlBuffer> {
        RecursiveStrategy::for_version(self.version)?.build(params)
    }

    fn variable_to_string(&self, value: &SqlValue, policy: EnumPolicy) -> String {
        let mut out = String::new();
        write_literal(&mut out, value, self.version.db_type, policy);
        out
    }
}

/// 根据数据源的数据库类型与版本创建方言（每个数据源创建一次）。
pub trait DialectCreator: Send + Sync {
    fn create(&self, version: DbVersion) -> SqlResult<Arc<dyn DialectStrategy>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDialectCreator;

impl DialectCreator for DefaultDialectCreator {
    fn create(&self, version: DbVersion) -> SqlResult<Arc<dyn DialectStrategy>> {
        tracing::debug!(target: "halo_condition::dialect", %version, "create dialect");
        Ok(Arc::new(Dialect::new(version)))
    }
}
