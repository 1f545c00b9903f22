//! Field mapper：把字段名（camelCase）映射为列名。

use std::sync::Arc;

/// 字段名映射函数类型。
pub type FieldMapperFunc = Arc<dyn Fn(&str) -> String + Send + Sync + 'static>;

fn convert_with_separator(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut prev: Option<char> = None;
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let is_upper = c.is_ascii_uppercase();

        if is_upper {
            if let Some(p) = prev {
                let prev_is_lower_or_digit = p.is_ascii_lowercase() || p.is_ascii_digit();
                let prev_is_upper = p.is_ascii_uppercase();
                let next_is_lower = next.map(|n| n.is_ascii_lowercase()).unwrap_or(false);

                if prev_is_lower_or_digit || (prev_is_upper && next_is_lower) {
                    out.push(sep);
                }
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }

        prev = Some(c);
    }

    out
}

/// `userName` -> `user_name`
pub fn snake_case_mapper(s: &str) -> String {
    convert_with_separator(s, '_')
}

/// `userName` -> `USER_NAME`（默认列名规则）
pub fn upper_snake_case_mapper(s: &str) -> String {
    convert_with_separator(s, '_').to_ascii_uppercase()
}

pub fn default_column_mapper() -> FieldMapperFunc {
    Arc::new(upper_snake_case_mapper)
}

/// 返回一个在列名前添加固定前缀的 mapper。
pub fn prefix_mapper(prefix: &'static str, inner: FieldMapperFunc) -> FieldMapperFunc {
    Arc::new(move |name| format!("{prefix}{}", inner(name)))
}

/// 占位符参数名：`userName` -> `UserName`。
pub(crate) fn variable_name(field_name: &str) -> String {
    let base = field_name.rsplit('.').next().unwrap_or(field_name);
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
