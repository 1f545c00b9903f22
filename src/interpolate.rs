//! 字面量输出：把参数值按方言格式写成 SQL 字面量。
//!
//! 安全警告：字面量 SQL 仅用于日志与调试，执行时必须使用命名参数。

use crate::config::EnumPolicy;
use crate::dialect::DbType;
use crate::value::SqlValue;
use time::format_description::FormatItem;
use time::macros::format_description;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

pub(crate) fn write_literal(out: &mut String, v: &SqlValue, db_type: DbType, policy: EnumPolicy) {
    match v {
        SqlValue::Null => out.push_str("NULL"),
        SqlValue::Bool(b) => match db_type {
            DbType::Oracle | DbType::DB2 | DbType::SQLServer => {
                out.push_str(if *b { "1" } else { "0" })
            }
            _ => out.push_str(if *b { "true" } else { "false" }),
        },
        SqlValue::I64(n) => out.push_str(&n.to_string()),
        SqlValue::U64(n) => out.push_str(&n.to_string()),
        SqlValue::F64(n) => out.push_str(&n.to_string()),
        SqlValue::String(s) => quote_string(out, s.as_ref()),
        SqlValue::Bytes(b) => encode_bytes(out, b, db_type),
        SqlValue::DateTime(dt) => encode_datetime(out, dt, db_type),
        SqlValue::Enum(e) => match policy {
            EnumPolicy::Ordinal => out.push_str(&e.ordinal.to_string()),
            EnumPolicy::Name => quote_string(out, e.name.as_ref()),
        },
    }
}

/// 单引号包围，内部的 `'` 双写。
pub(crate) fn quote_string(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
}

fn encode_bytes(out: &mut String, data: &[u8], db_type: DbType) {
    if data.is_empty() {
        out.push_str("NULL");
        return;
    }

    match db_type {
        DbType::MySQL | DbType::H2 => {
            out.push_str("X'");
            push_hex(out, data);
            out.push('\'');
        }
        DbType::PostgreSQL => {
            out.push_str("'\\x");
            push_hex(out, data);
            out.push_str("'::bytea");
        }
        DbType::SQLServer => {
            out.push_str("0x");
            push_hex(out, data);
        }
        DbType::DB2 => {
            out.push_str("BX'");
            push_hex(out, data);
            out.push('\'');
        }
        DbType::Oracle => {
            out.push_str("HEXTORAW('");
            push_hex(out, data);
            out.push_str("')");
        }
    }
}

fn push_hex(out: &mut String, data: &[u8]) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in data {
        out.push(HEX[((b >> 4) & 0xF) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
}

fn encode_datetime(out: &mut String, dt: &time::OffsetDateTime, db_type: DbType) {
    let text = dt
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| dt.to_string());

    match db_type {
        DbType::Oracle => {
            out.push_str("TO_TIMESTAMP('");
            out.push_str(&text);
            out.push_str("', 'YYYY-MM-DD HH24:MI:SS.FF')");
        }
        DbType::MySQL => {
            out.push('\'');
            out.push_str(&text);
            out.push('\'');
        }
        DbType::PostgreSQL | DbType::H2 => {
            out.push_str("TIMESTAMP '");
            out.push_str(&text);
            out.push('\'');
        }
        DbType::DB2 => {
            out.push_str("TIMESTAMP('");
            out.push_str(&text);
            out.push_str("')");
        }
        DbType::SQLServer => {
            out.push_str("CONVERT(DATETIME, '");
            out.push_str(&text);
            out.push_str("', 121)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    fn literal(v: SqlValue, db: DbType) -> String {
        let mut out = String::new();
        write_literal(&mut out, &v, db, EnumPolicy::Name);
        out
    }

    #[test]
    fn strings_double_single_quotes() {
        assert_eq!(literal("O'Brien".into(), DbType::MySQL), "'O''Brien'");
    }

    #[test]
    fn numbers_and_booleans_are_bare() {
        assert_eq!(literal(42.into(), DbType::MySQL), "42");
        assert_eq!(literal(true.into(), DbType::MySQL), "true");
        assert_eq!(literal(true.into(), DbType::Oracle), "1");
        assert_eq!(literal(SqlValue::Null, DbType::H2), "NULL");
    }

    #[test]
    fn timestamps_follow_db_type() {
        let dt = datetime!(2024-01-02 03:04:05.678 UTC);
        assert_eq!(
            literal(dt.into(), DbType::Oracle),
            "TO_TIMESTAMP('2024-01-02 03:04:05.678', 'YYYY-MM-DD HH24:MI:SS.FF')"
        );
        assert_eq!(literal(dt.into(), DbType::MySQL), "'2024-01-02 03:04:05.678'");
        assert_eq!(
            literal(dt.into(), DbType::DB2),
            "TIMESTAMP('2024-01-02 03:04:05.678')"
        );
    }

    #[test]
    fn enums_follow_policy() {
        let v = SqlValue::enumeration("ACTIVE", 1);
        let mut out = String::new();
        write_literal(&mut out, &v, DbType::MySQL, EnumPolicy::Ordinal);
        assert_eq!(out, "1");
        assert_eq!(literal(v, DbType::MySQL), "'ACTIVE'");
    }

    #[test]
    fn bytes_hex() {
        assert_eq!(literal(vec![0x0a_u8, 0xff].into(), DbType::Oracle), "HEXTORAW('0AFF')");
    }
}
