//! Dynamic GraphQL schema builder.
//!
//! For every GraphQL-typed API definition the builder emits a query field
//! `<table>: [<Type>]` and an object type whose fields are the exposed
//! columns, each typed as a plain `String`. The schema is built with
//! async-graphql's dynamic API and rebuilt in full whenever definitions
//! change.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{Field, FieldFuture, Object, ResolverContext, Schema, TypeRef};
use tracing::{debug, warn};

use tablegate_core::{ApiDefinition, ApiType};
use tablegate_db::query::validate_identifier;
use tablegate_storage::{ApiDefinitionStore as _, ConnectionStore as _};

use crate::context::GatewayContext;
use crate::error::GraphQLError;

/// Builds GraphQL schemas from the current API definition set.
pub struct ApiSchemaBuilder {
    context: Arc<GatewayContext>,
}

impl ApiSchemaBuilder {
    pub fn new(context: Arc<GatewayContext>) -> Self {
        Self { context }
    }

    /// Builds a complete schema from the current GraphQL-typed definitions.
    ///
    /// Tables whose columns cannot be determined are skipped (an object
    /// type with no fields is a structural error). With zero usable
    /// definitions a placeholder schema is returned so there is always
    /// something servable.
    ///
    /// # Errors
    ///
    /// Returns an error if schema construction fails.
    pub async fn build(&self) -> Result<Schema, GraphQLError> {
        debug!("Starting GraphQL schema build");

        let definitions = self
            .context
            .definitions
            .list_by_type(ApiType::GraphQL)
            .await
            .map_err(|e| GraphQLError::schema_build_failed(e.to_string()))?;

        let exposed = self.collect_exposed(definitions).await;
        if exposed.is_empty() {
            debug!("No usable GraphQL definitions, publishing placeholder schema");
            return placeholder_schema();
        }

        let mut builder = Schema::build("Query", None, None);
        let mut query = Object::new("Query").description("Dynamic data-API query root");

        for (definition, columns) in exposed {
            let type_name = capitalize(&definition.table_name);
            builder = builder.register(build_table_type(&type_name, &columns));
            query = query.field(build_table_field(&definition, &type_name));
        }

        builder = builder.register(query);
        let schema = builder
            .finish()
            .map_err(|e| GraphQLError::schema_build_failed(e.to_string()))?;

        debug!("GraphQL schema build complete");
        Ok(schema)
    }

    /// The placeholder schema, servable when nothing else is.
    pub fn placeholder(&self) -> Result<Schema, GraphQLError> {
        placeholder_schema()
    }

    /// Pairs each usable definition with the columns its type will expose:
    /// the included-columns allow-list when set, the introspected column
    /// set otherwise. Duplicate (table) definitions keep the first match.
    async fn collect_exposed(
        &self,
        definitions: Vec<ApiDefinition>,
    ) -> Vec<(ApiDefinition, Vec<String>)> {
        let mut seen_tables = HashSet::new();
        let mut exposed = Vec::new();

        for definition in definitions {
            let table_key = definition.table_name.to_ascii_lowercase();
            if !seen_tables.insert(table_key) {
                warn!(
                    table = %definition.table_name,
                    "Skipping duplicate GraphQL definition for table"
                );
                continue;
            }
            if validate_identifier(&definition.table_name).is_err() {
                warn!(
                    table = %definition.table_name,
                    "Skipping table with non-identifier name"
                );
                continue;
            }

            let Ok(Some(descriptor)) = self
                .context
                .connections
                .get(definition.connection_id)
                .await
            else {
                warn!(
                    table = %definition.table_name,
                    connection_id = %definition.connection_id,
                    "Skipping definition with missing connection"
                );
                continue;
            };

            let columns = if definition.included_columns.is_empty() {
                self.context
                    .introspector
                    .list_columns(&descriptor, &definition.table_name)
                    .await
            } else {
                definition.included_columns.clone()
            };

            if columns.is_empty() {
                warn!(
                    table = %definition.table_name,
                    "Skipping table with no introspectable columns"
                );
                continue;
            }

            exposed.push((definition, columns));
        }

        exposed
    }
}

/// Object type for one table: every exposed column as a `String` field
/// reading from the parent row object.
fn build_table_type(type_name: &str, columns: &[String]) -> Object {
    let mut object = Object::new(type_name);
    for column in columns {
        let column_name = column.clone();
        object = object.field(Field::new(
            column.as_str(),
            TypeRef::named(TypeRef::STRING),
            move |ctx| {
                let column_name = column_name.clone();
                FieldFuture::new(async move {
                    if let Some(Value::Object(row)) = ctx.parent_value.as_value() {
                        return Ok(match row.get(column_name.as_str()) {
                            None | Some(Value::Null) => None,
                            Some(Value::String(s)) => Some(Value::String(s.clone())),
                            Some(other) => Some(Value::String(other.to_string())),
                        });
                    }
                    Ok(None)
                })
            },
        ));
    }
    object
}

/// Query field `<table>: [<Type>]` whose resolver performs a gated read of
/// the table through the query executor.
fn build_table_field(definition: &ApiDefinition, type_name: &str) -> Field {
    let field_name = definition.table_name.clone();
    let definition = definition.clone();
    Field::new(field_name, TypeRef::named_list(type_name), move |ctx| {
        let definition = definition.clone();
        FieldFuture::new(async move { resolve_table(ctx, definition).await })
    })
}

async fn resolve_table(
    ctx: ResolverContext<'_>,
    definition: ApiDefinition,
) -> async_graphql::Result<Option<Value>> {
    let gateway = ctx.data::<Arc<GatewayContext>>()?;

    // Re-read the definition so mutations since the last rebuild still
    // apply; the captured copy is only a fallback for the race where the
    // schema has not been refreshed yet.
    let current = gateway
        .definitions
        .get(definition.id)
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?
        .unwrap_or(definition);

    let descriptor = gateway
        .connections
        .get(current.connection_id)
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?
        .ok_or_else(|| async_graphql::Error::new("Connection not found"))?;

    let source = gateway
        .hub
        .resolve(&descriptor)
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    let rows = gateway
        .executor
        .select_rows(&source, &current)
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    let json = serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect());
    let value =
        Value::from_json(json).map_err(|e| async_graphql::Error::new(e.to_string()))?;
    Ok(Some(value))
}

/// Minimal schema served when no GraphQL definitions exist, so the endpoint
/// never exposes an empty query type.
fn placeholder_schema() -> Result<Schema, GraphQLError> {
    let query = Object::new("Query")
        .description("Dynamic data-API query root (no GraphQL definitions yet)")
        .field(Field::new(
            "hello",
            TypeRef::named(TypeRef::STRING),
            |_| FieldFuture::new(async { Ok(Some(Value::String("World".to_string()))) }),
        ));

    Schema::build("Query", None, None)
        .register(query)
        .finish()
        .map_err(|e| GraphQLError::schema_build_failed(e.to_string()))
}

/// Table name with its first character upper-cased.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("orders"), "Orders");
        assert_eq!(capitalize("Orders"), "Orders");
        assert_eq!(capitalize("o"), "O");
        assert_eq!(capitalize(""), "");
    }
}
