//! 字符串拼接工具：SQL 渲染与字面量输出共用。

#[derive(Debug, Default, Clone)]
pub(crate) struct StringBuilder {
    buf: String,
}

impl StringBuilder {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            buf: String::with_capacity(n),
        }
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub(crate) fn write_char(&mut self, c: char) {
        self.buf.push(c);
    }

    /// 用 `sep` 连接非空字符串。
    pub(crate) fn write_strings(&mut self, items: &[String], sep: &str) {
        let mut first_added = false;
        for s in items {
            if s.is_empty() {
                continue;
            }
            if first_added {
                self.buf.push_str(sep);
            }
            self.buf.push_str(s);
            first_added = true;
        }
    }

    pub(crate) fn into_string(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::StringBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_strings_skips_empty() {
        let mut b = StringBuilder::with_capacity(8);
        b.write_str("A");
        b.write_char(':');
        b.write_strings(&["x".into(), String::new(), "y".into()], ", ");
        assert_eq!(b.into_string(), "A:x, y");
    }
}
