//! 递归查询子节点的三种策略，由数据库类型与版本决定，调用方不可选择。

use crate::dialect::{DbType, DbVersion};
use crate::error::{SqlError, SqlResult};
use crate::sql_buffer::SqlBuffer;

/// MySQL 8 以下没有递归 CTE，需要预先安装的存储过程。
pub const RECURSIVE_PROCEDURE: &str = "RECURSIVE_FIND_CHILDREN";
const CTE_TABLE: &str = "recursive_sub_table";
const CTE_COLUMN: &str = "_temp_";

/// 递归查询参数。`where_sql`/`order_by_sql` 是已渲染的字面量 SQL（不含关键字）。
#[derive(Debug, Clone)]
pub struct FindChildrenParams<'a> {
    pub table_name: &'a str,
    pub start_codes: &'a [String],
    pub code_column: &'a str,
    pub parent_column: &'a str,
    pub select_columns: &'a str,
    pub where_sql: Option<&'a str>,
    pub order_by_sql: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursiveStrategy {
    /// Oracle `START WITH ... CONNECT BY PRIOR`
    ConnectBy,
    /// 标准递归 CTE；`keyword` 为 `WITH RECURSIVE` 或 `WITH`
    RecursiveCte { keyword: &'static str },
    /// 调用存储过程
    StoredProcedure,
}

impl RecursiveStrategy {
    pub fn for_version(version: DbVersion) -> SqlResult<Self> {
        match version.db_type {
            DbType::Oracle => Ok(Self::ConnectBy),
            DbType::PostgreSQL => Ok(Self::RecursiveCte {
                keyword: "WITH RECURSIVE",
            }),
            DbType::MySQL if version.at_least(8) => Ok(Self::RecursiveCte {
                keyword: "WITH RECURSIVE",
            }),
            DbType::MySQL => Ok(Self::StoredProcedure),
            DbType::DB2 | DbType::SQLServer => Ok(Self::RecursiveCte { keyword: "WITH" }),
            DbType::H2 => Err(SqlError::unsupported_db(version, "recursive query")),
        }
    }

    pub fn build(&self, params: &FindChildrenParams<'_>) -> SqlResult<SqlBuffer> {
        if params.start_codes.is_empty() {
            return Err(SqlError::missing(params.code_column, "StartCodes"));
        }
        let sql = match self {
            Self::ConnectBy => build_connect_by(params),
            Self::RecursiveCte { keyword } => build_recursive_cte(keyword, params),
            Self::StoredProcedure => build_procedure_call(params),
        };
        Ok(sql)
    }
}

fn append_codes(sql: &mut SqlBuffer, codes: &[String]) {
    for (i, code) in codes.iter().enumerate() {
        if i > 0 {
            sql.append(", ");
        }
        sql.add_variable(code.clone());
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

// SELECT .. FROM T [WHERE ..] START WITH CODE IN (..) CONNECT BY PRIOR CODE = PARENT [ORDER BY ..]
fn build_connect_by(p: &FindChildrenParams<'_>) -> SqlBuffer {
    let mut sql = SqlBuffer::new();
    sql.append("SELECT ")
        .append(p.select_columns)
        .append(" FROM ")
        .append(p.table_name);
    if let Some(w) = non_blank(p.where_sql) {
        sql.append(" WHERE ").append(w);
    }
    sql.append(" START WITH ").append(p.code_column).append(" IN (");
    append_codes(&mut sql, p.start_codes);
    sql.append(") CONNECT BY PRIOR ")
        .append(p.code_column)
        .append(" = ")
        .append(p.parent_column);
    if let Some(o) = non_blank(p.order_by_sql) {
        sql.append(" ORDER BY ").append(o);
    }
    sql
}

fn build_recursive_cte(keyword: &str, p: &FindChildrenParams<'_>) -> SqlBuffer {
    let mut sql = SqlBuffer::new();
    sql.append(keyword)
        .append(" ")
        .append(CTE_TABLE)
        .append("(")
        .append(CTE_COLUMN)
        .append(") AS ( SELECT ")
        .append(p.code_column)
        .append(" FROM ")
        .append(p.table_name)
        .append(" WHERE ")
        .append(p.code_column)
        .append(" IN (");
    append_codes(&mut sql, p.start_codes);
    sql.append(") UNION ALL SELECT A.")
        .append(p.code_column)
        .append(" FROM ")
        .append(p.table_name)
        .append(" A, ")
        .append(CTE_TABLE)
        .append(" B WHERE A.")
        .append(p.parent_column)
        .append(" = B.")
        .append(CTE_COLUMN)
        .append(" ) SELECT ")
        .append(p.select_columns)
        .append(" FROM ")
        .append(p.table_name)
        .append(" WHERE ")
        .append(p.code_column)
        .append(" IN (SELECT ")
        .append(CTE_COLUMN)
        .append(" FROM ")
        .append(CTE_TABLE)
        .append(")");
    if let Some(w) = non_blank(p.where_sql) {
        sql.append(" AND ( ").append(w).append(" )");
    }
    if let Some(o) = non_blank(p.order_by_sql) {
        sql.append(" ORDER BY ").append(o);
    }
    sql
}

fn build_procedure_call(p: &FindChildrenParams<'_>) -> SqlBuffer {
    let mut sql = SqlBuffer::new();
    sql.append("CALL ").append(RECURSIVE_PROCEDURE).append("(");
    sql.add_named_variable("tableName", p.table_name.to_string());
    sql.append(", ");
    sql.add_named_variable("startCodes", p.start_codes.join(","));
    sql.append(", ");
    sql.add_named_variable("codeField", p.code_column.to_string());
    sql.append(", ");
    sql.add_named_variable("parentField", p.parent_column.to_string());
    sql.append(", ");
    sql.add_named_variable("selectFields", p.select_columns.to_string());
    sql.append(", ");
    sql.add_named_variable("whereSql", non_blank(p.where_sql).unwrap_or("").to_string());
    sql.append(", ");
    sql.add_named_variable(
        "orderBySql",
        non_blank(p.order_by_sql).unwrap_or("").to_string(),
    );
    sql.append(")");
    sql
}
