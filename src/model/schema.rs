use crate::error::AppError;
use indexmap::IndexMap;
use serde_json::Value;

/// Which object the property schema was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    Database,
    DataSource,
}

impl SchemaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaSource::Database => "database",
            SchemaSource::DataSource => "data_source",
        }
    }
}

/// Outcome of looking up a database's property schema.
///
/// Newer workspaces keep the schema on the database's first data source
/// instead of on the database object itself.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaResolution {
    FoundOnPrimary(IndexMap<String, Value>),
    FoundOnSubresource {
        data_source_id: String,
        properties: IndexMap<String, Value>,
    },
    NotFound,
}

/// A database object together with its resolved property schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSchema {
    pub database: Value,
    pub resolution: SchemaResolution,
}

impl DatabaseSchema {
    pub fn properties(&self) -> Option<&IndexMap<String, Value>> {
        match &self.resolution {
            SchemaResolution::FoundOnPrimary(properties)
            | SchemaResolution::FoundOnSubresource { properties, .. } => Some(properties),
            SchemaResolution::NotFound => None,
        }
    }

    pub fn data_source_id(&self) -> Option<&str> {
        match &self.resolution {
            SchemaResolution::FoundOnSubresource { data_source_id, .. } => Some(data_source_id),
            _ => None,
        }
    }

    pub fn source(&self) -> SchemaSource {
        match self.resolution {
            SchemaResolution::FoundOnSubresource { .. } => SchemaSource::DataSource,
            _ => SchemaSource::Database,
        }
    }

    /// Name of the title property; a schema without one cannot be mirrored.
    pub fn title_property(&self, logical_db: &str) -> Result<String, AppError> {
        self.properties()
            .and_then(crate::extract::first_title_property)
            .ok_or_else(|| AppError::Schema {
                logical_db: logical_db.to_string(),
                reason: "No title property found in database schema".to_string(),
            })
    }

    /// The database object with its `properties` replaced by the resolved
    /// schema and provenance markers added.
    pub fn merged_json(&self) -> Value {
        let mut merged = match &self.database {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        let properties = self
            .properties()
            .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        merged.insert("properties".into(), Value::Object(properties));
        merged.insert("_schema_source".into(), Value::from(self.source().as_str()));
        if let Some(id) = self.data_source_id() {
            merged.insert("_data_source_id".into(), Value::from(id));
        }
        Value::Object(merged)
    }
}
