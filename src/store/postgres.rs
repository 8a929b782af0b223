use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{Document, DocumentStore, MergeOutcome, Order, Query, StoreError};

/// Document store backed by a single JSONB table in PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a Query) {
    for (field, value) in &query.filters {
        builder
            .push(" AND body -> ")
            .push_bind(field.as_str())
            .push(" = ")
            .push_bind(Json(value));
    }
    if let Some(range) = &query.range {
        if let Some(from) = &range.from {
            builder
                .push(" AND body ->> ")
                .push_bind(range.field.as_str())
                .push(" >= ")
                .push_bind(from.as_str());
        }
        if let Some(to) = &range.to {
            builder
                .push(" AND body ->> ")
                .push_bind(range.field.as_str())
                .push(" <= ")
                .push_bind(to.as_str());
        }
    }
}

fn into_document(collection: &str, body: Value) -> Result<Document, StoreError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            collection: collection.to_string(),
        }),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let body = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|Json(v)| into_document(collection, v)).transpose()
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO documents (collection, id, body)
               VALUES ($1, $2, $3)
               ON CONFLICT (collection, id)
               DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()"#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(doc)))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = body || $3, updated_at = NOW() WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(patch)))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn merge_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &Value,
        patch: Document,
    ) -> Result<MergeOutcome, StoreError> {
        let result = sqlx::query(
            r#"UPDATE documents SET body = body || $3, updated_at = NOW()
               WHERE collection = $1 AND id = $2 AND body -> $4 = $5"#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(patch)))
        .bind(field)
        .bind(Json(expected))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(MergeOutcome::Applied);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2)",
        )
        .bind(collection)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(if exists {
            MergeOutcome::Mismatch
        } else {
            MergeOutcome::Missing
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT id, body FROM documents WHERE collection = ");
        builder.push_bind(collection);
        push_filters(&mut builder, query);
        match &query.order {
            Some((field, order)) => {
                builder
                    .push(" ORDER BY body ->> ")
                    .push_bind(field.as_str())
                    .push(match order {
                        Order::Asc => " ASC NULLS FIRST, id ASC",
                        Order::Desc => " DESC NULLS LAST, id ASC",
                    });
            }
            None => {
                builder.push(" ORDER BY id ASC");
            }
        }

        let rows: Vec<(String, Json<Value>)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(id, Json(body))| Ok((id, into_document(collection, body)?)))
            .collect()
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents WHERE collection = ");
        builder.push_bind(collection);
        push_filters(&mut builder, query);

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}
