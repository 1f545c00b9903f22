//! 编译配置：显式传入 `SqlContext`，不使用全局可变状态。

/// 枚举值以字面量输出时使用序号还是名称。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumPolicy {
    #[default]
    Name,
    Ordinal,
}

/// SQL 编译配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlConfig {
    /// 字面量 SQL（日志）中枚举的输出方式。
    pub enum_policy: EnumPolicy,
    /// 是否以 debug 级别输出编译后的完整语句（字面量形式）。
    pub log_sql: bool,
    /// IN 列表单组最大元素数，超出后拆成 `( A IN (...) OR A IN (...) )`。
    pub max_in_items: usize,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            enum_policy: EnumPolicy::Name,
            log_sql: true,
            max_in_items: 1000,
        }
    }
}

impl SqlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enum_policy(mut self, policy: EnumPolicy) -> Self {
        self.enum_policy = policy;
        self
    }

    pub fn with_log_sql(mut self, log_sql: bool) -> Self {
        self.log_sql = log_sql;
        self
    }

    /// 0 表示不拆分。
    pub fn with_max_in_items(mut self, n: usize) -> Self {
        self.max_in_items = n;
        self
    }
}
