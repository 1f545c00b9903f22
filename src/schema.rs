//! Schema：实体字段与表列的映射。
//!
//! 每个实体类型显式描述一份 [`TableSchema`]（启动时构建或由代码生成），
//! [`SchemaRegistry`] 负责按实体类型标识缓存，读多写少，并发读安全。

use crate::error::{FieldError, FieldErrorReason, FieldErrors, SqlError, SqlResult};
use crate::field_mapper::{FieldMapperFunc, default_column_mapper};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// 字段使用场景：限制哪些列可参与对应子句。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldScene {
    Insert,
    Update,
    Condition,
}

/// 列排序分类：Leading（如主键）在前，Trailing（如公共审计字段）在后。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FieldKind {
    Leading,
    #[default]
    Normal,
    Trailing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub field_name: String,
    /// 为空时由 schema 的 mapper 生成。
    pub column_name: String,
    pub insertable: bool,
    pub updatable: bool,
    pub primary_key: bool,
    pub kind: FieldKind,
}

impl ColumnInfo {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            column_name: String::new(),
            insertable: true,
            updatable: true,
            primary_key: false,
            kind: FieldKind::Normal,
        }
    }

    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    /// 主键：不可更新，排在最前。
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.updatable = false;
        self.kind = FieldKind::Leading;
        self
    }

    pub fn insertable(mut self, v: bool) -> Self {
        self.insertable = v;
        self
    }

    pub fn updatable(mut self, v: bool) -> Self {
        self.updatable = v;
        self
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn supports(&self, scene: FieldScene) -> bool {
        match scene {
            FieldScene::Insert => self.insertable,
            FieldScene::Update => self.updatable,
            FieldScene::Condition => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub field_name: String,
    pub column_name: String,
}

/// 一个实体类型的表结构描述。
#[derive(Debug, Clone)]
pub struct TableSchema {
    entity: String,
    table_name: String,
    columns: Vec<ColumnInfo>,
    by_field: HashMap<String, usize>,
}

impl TableSchema {
    pub fn builder(entity: impl Into<String>, table_name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            entity: entity.into(),
            table_name: table_name.into(),
            columns: Vec::new(),
            mapper: default_column_mapper(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// 按 Leading/Normal/Trailing 排好序的列。
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column(&self, field_name: &str) -> Option<&ColumnInfo> {
        self.by_field.get(field_name).map(|&i| &self.columns[i])
    }

    pub fn primary_key(&self) -> Option<PrimaryKey> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| PrimaryKey {
                field_name: c.field_name.clone(),
                column_name: c.column_name.clone(),
            })
    }

    pub(crate) fn scene_column(&self, scene: FieldScene, field_name: &str) -> Option<&str> {
        self.column(field_name)
            .filter(|c| c.supports(scene))
            .map(|c| c.column_name.as_str())
    }
}

pub struct TableSchemaBuilder {
    entity: String,
    table_name: String,
    columns: Vec<ColumnInfo>,
    mapper: FieldMapperFunc,
}

impl fmt::Debug for TableSchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // mapper 无法 Debug
        f.debug_struct("TableSchemaBuilder")
            .field("entity", &self.entity)
            .field("table_name", &self.table_name)
            .field("columns", &self.columns)
            .finish()
    }
}

impl TableSchemaBuilder {
    pub fn mapper(mut self, mapper: FieldMapperFunc) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// 普通字段，列名由 mapper 生成。
    pub fn field(self, field_name: &str) -> Self {
        self.column(ColumnInfo::new(field_name))
    }

    pub fn fields<'a>(mut self, field_names: impl IntoIterator<Item = &'a str>) -> Self {
        for f in field_names {
            self = self.field(f);
        }
        self
    }

    pub fn build(self) -> TableSchema {
        let mut columns: Vec<ColumnInfo> = self
            .columns
            .into_iter()
            .map(|mut c| {
                if c.column_name.is_empty() {
                    c.column_name = (self.mapper)(&c.field_name);
                }
                c
            })
            .collect();
        columns.sort_by_key(|c| c.kind);

        let mut by_field = HashMap::with_capacity(columns.len());
        for (i, c) in columns.iter().enumerate() {
            by_field.entry(c.field_name.clone()).or_insert(i);
        }
        TableSchema {
            entity: self.entity,
            table_name: self.table_name,
            columns,
            by_field,
        }
    }
}

/// 字段名 -> 列名查询，支持 `u.userName` 形式的别名限定字段。
pub trait ColumnMapping {
    fn column_name(&self, scene: FieldScene, field_name: &str) -> Option<String>;

    /// `column_name` 返回 None 时记录的错误原因。
    fn missing_reason(&self, _scene: FieldScene, _field_name: &str) -> FieldErrorReason {
        FieldErrorReason::UnsupportedField
    }

    /// 解析失败时，`throw_if_missing` 为 true 则报错，否则返回 None。
    fn resolve_column(
        &self,
        scene: FieldScene,
        field_name: &str,
        throw_if_missing: bool,
    ) -> SqlResult<Option<String>> {
        match self.column_name(scene, field_name) {
            Some(c) => Ok(Some(c)),
            None if throw_if_missing => {
                let mut details = FieldErrors::new();
                details.push(FieldError::new(
                    field_name,
                    self.missing_reason(scene, field_name),
                ));
                Err(SqlError::UnsupportedField {
                    clause: "column",
                    details,
                })
            }
            None => Ok(None),
        }
    }
}

fn split_alias(field_name: &str) -> (Option<&str>, &str) {
    match field_name.split_once('.') {
        Some((alias, name)) => (Some(alias.trim()), name.trim()),
        None => (None, field_name.trim()),
    }
}

impl ColumnMapping for TableSchema {
    fn column_name(&self, scene: FieldScene, field_name: &str) -> Option<String> {
        let (alias, name) = split_alias(field_name);
        let column = self.scene_column(scene, name)?;
        Some(match alias {
            Some(a) => format!("{a}.{column}"),
            None => column.to_string(),
        })
    }
}

/// 多表关联时的列查询：别名限定字段按别名找表（忽略大小写）；未限定字段必须只属于一张表，
/// 多张表都有该字段时不解析，记为 `AmbiguousField`。输出的列名统一使用注册时的别名。
#[derive(Debug, Clone)]
pub struct JoinColumns {
    tables: Vec<(String, Arc<TableSchema>)>,
}

impl JoinColumns {
    pub fn new(tables: Vec<(String, Arc<TableSchema>)>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[(String, Arc<TableSchema>)] {
        &self.tables
    }

    fn unqualified_matches(&self, scene: FieldScene, name: &str) -> usize {
        self.tables
            .iter()
            .filter(|(_, schema)| schema.scene_column(scene, name).is_some())
            .count()
    }
}

impl ColumnMapping for JoinColumns {
    fn column_name(&self, scene: FieldScene, field_name: &str) -> Option<String> {
        let (alias, name) = split_alias(field_name);
        match alias {
            Some(a) => {
                let (alias, schema) = self
                    .tables
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(a))?;
                let column = schema.scene_column(scene, name)?;
                Some(format!("{alias}.{column}"))
            }
            None if self.unqualified_matches(scene, name) > 1 => None,
            None => self.tables.iter().find_map(|(alias, schema)| {
                schema
                    .scene_column(scene, name)
                    .map(|column| format!("{alias}.{column}"))
            }),
        }
    }

    fn missing_reason(&self, scene: FieldScene, field_name: &str) -> FieldErrorReason {
        match split_alias(field_name) {
            (None, name) if self.unqualified_matches(scene, name) > 1 => {
                FieldErrorReason::AmbiguousField
            }
            _ => FieldErrorReason::UnsupportedField,
        }
    }
}

/// 提供实体元数据的外部协作者。
pub trait SchemaResolver: Send + Sync {
    fn table_schema(&self, entity: &str) -> SqlResult<Arc<TableSchema>>;

    fn table_name(&self, entity: &str) -> SqlResult<String> {
        Ok(self.table_schema(entity)?.table_name().to_string())
    }

    fn primary_key(&self, entity: &str) -> SqlResult<Option<PrimaryKey>> {
        Ok(self.table_schema(entity)?.primary_key())
    }
}

/// 实体类型：以稳定的类型标识关联其表结构。
pub trait Entity {
    const ENTITY: &'static str;

    fn table_schema() -> TableSchema;
}

type SchemaFactory = fn() -> TableSchema;

/// 默认的 `SchemaResolver`：注册表结构或其构建函数，首次使用时构建并缓存。
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    factories: RwLock<HashMap<String, SchemaFactory>>,
    cache: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接注册已构建好的表结构（覆盖同名实体）。
    pub fn register(&self, schema: TableSchema) -> &Self {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(schema.entity().to_string(), Arc::new(schema));
        self
    }

    /// 注册实体类型，表结构延迟到首次使用时构建。
    pub fn register_entity<E: Entity>(&self) -> &Self {
        let mut factories = self.factories.write().unwrap_or_else(|e| e.into_inner());
        factories.insert(E::ENTITY.to_string(), E::table_schema);
        self
    }

    pub fn schema_of<E: Entity>(&self) -> SqlResult<Arc<TableSchema>> {
        self.table_schema(E::ENTITY)
    }
}

impl SchemaResolver for SchemaRegistry {
    fn table_schema(&self, entity: &str) -> SqlResult<Arc<TableSchema>> {
        if let Some(s) = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(entity)
        {
            return Ok(s.clone());
        }

        let factory = self
            .factories
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(entity)
            .copied()
            .ok_or_else(|| SqlError::UnknownEntity(entity.to_string()))?;

        // 同一实体的构建结果固定，并发时重复构建只会覆盖为相同的值
        let schema = Arc::new(factory());
        tracing::trace!(
            target: "halo_condition::schema",
            entity,
            table = schema.table_name(),
            columns = schema.columns().len(),
            "table schema cached"
        );
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entity.to_string(), schema.clone());
        Ok(schema)
    }
}
