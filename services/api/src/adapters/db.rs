//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `CourseRepository` and `ContentRepository` ports
//! from the `core` crate. It handles all interactions with the PostgreSQL
//! database using `sqlx`.
//!
//! Both aggregates are stored as JSONB documents alongside a handful of
//! indexed scalar columns used for filtering, sorting and aggregation. The
//! document column is authoritative; the scalar columns are denormalized
//! from it on every write.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use courseforge_core::domain::{Content, ContentKind, Course};
use courseforge_core::ports::{
    ContentFilter, ContentKindStats, ContentRepository, CourseQuery, CourseRepository, CourseSort,
    PortError, PortResult,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CourseRecord {
    doc: serde_json::Value,
}

impl CourseRecord {
    fn to_domain(self) -> PortResult<Course> {
        serde_json::from_value(self.doc).map_err(unexpected)
    }
}

#[derive(FromRow)]
struct ContentRecord {
    doc: serde_json::Value,
}

impl ContentRecord {
    fn to_domain(self) -> PortResult<Content> {
        serde_json::from_value(self.doc).map_err(unexpected)
    }
}

//=========================================================================================
// `CourseRepository` Trait Implementation
//=========================================================================================

/// Appends the optional filters of a course query to a WHERE clause that
/// already constrains `is_published`.
fn push_course_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CourseQuery) {
    if let Some(category) = query.category {
        builder.push(" AND category = ");
        builder.push_bind(category.as_str());
    }
    if let Some(level) = query.level {
        builder.push(" AND level = ");
        builder.push_bind(level.as_str());
    }
    if let Some(instructor) = query.instructor {
        builder.push(" AND instructor = ");
        builder.push_bind(instructor);
    }
    if let Some(min_price) = query.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min_price);
    }
    if let Some(max_price) = query.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max_price);
    }
    if let Some(text) = query.text.as_deref().filter(|t| !t.trim().is_empty()) {
        // Substring match across title, description and every tag.
        let pattern = format!("%{}%", text.trim());
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR doc->>'description' ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(
            " OR EXISTS (SELECT 1 FROM jsonb_array_elements_text(doc->'tags') tag \
             WHERE tag ILIKE ",
        );
        builder.push_bind(pattern);
        builder.push("))");
    }
}

fn order_clause(sort: CourseSort) -> &'static str {
    match sort {
        CourseSort::Newest => " ORDER BY created_at DESC",
        CourseSort::Oldest => " ORDER BY created_at ASC",
        CourseSort::PriceAsc => " ORDER BY price ASC",
        CourseSort::PriceDesc => " ORDER BY price DESC",
        CourseSort::TitleAsc => " ORDER BY title ASC",
    }
}

#[async_trait]
impl CourseRepository for DbAdapter {
    async fn insert(&self, course: &Course) -> PortResult<()> {
        let doc = serde_json::to_value(course).map_err(unexpected)?;
        sqlx::query(
            "INSERT INTO courses \
             (id, instructor, title, category, level, price, is_published, is_featured, \
              status, created_at, updated_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(course.id)
        .bind(course.instructor)
        .bind(&course.title)
        .bind(course.category.as_str())
        .bind(course.level.as_str())
        .bind(course.price)
        .bind(course.is_published)
        .bind(course.is_featured)
        .bind(course.status.as_str())
        .bind(course.created_at)
        .bind(course.updated_at)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> PortResult<Option<Course>> {
        let record = sqlx::query_as::<_, CourseRecord>("SELECT doc FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        record.map(CourseRecord::to_domain).transpose()
    }

    async fn save(&self, course: &Course) -> PortResult<()> {
        let doc = serde_json::to_value(course).map_err(unexpected)?;
        sqlx::query(
            "UPDATE courses SET \
             title = $2, category = $3, level = $4, price = $5, is_published = $6, \
             is_featured = $7, status = $8, updated_at = $9, doc = $10 \
             WHERE id = $1",
        )
        .bind(course.id)
        .bind(&course.title)
        .bind(course.category.as_str())
        .bind(course.level.as_str())
        .bind(course.price)
        .bind(course.is_published)
        .bind(course.is_featured)
        .bind(course.status.as_str())
        .bind(course.updated_at)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_published(&self, query: &CourseQuery) -> PortResult<(Vec<Course>, u64)> {
        let mut count_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM courses WHERE is_published = TRUE");
        push_course_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .try_get(0)
            .map_err(unexpected)?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT doc FROM courses WHERE is_published = TRUE");
        push_course_filters(&mut builder, query);
        builder.push(order_clause(query.sort));
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(query.limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(query.page.saturating_sub(1)) * i64::from(query.limit));

        let rows = builder
            .build_query_as::<CourseRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        let courses = rows
            .into_iter()
            .map(CourseRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok((courses, total as u64))
    }
}

//=========================================================================================
// `ContentRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentRepository for DbAdapter {
    async fn insert(&self, content: &Content) -> PortResult<()> {
        let doc = serde_json::to_value(content).map_err(unexpected)?;
        sqlx::query(
            "INSERT INTO contents \
             (id, course_id, created_by, kind, status, is_ai_generated, generated_at, \
              duration, size, created_at, updated_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(content.id)
        .bind(content.course)
        .bind(content.created_by)
        .bind(content.kind.as_str())
        .bind(content.status.as_str())
        .bind(content.ai_generated.is_some())
        .bind(content.ai_generated.as_ref().map(|p| p.generated_at))
        .bind(content.duration.map(i64::from))
        .bind(content.size.map(|s| s as i64))
        .bind(content.created_at)
        .bind(content.updated_at)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> PortResult<Option<Content>> {
        let record = sqlx::query_as::<_, ContentRecord>("SELECT doc FROM contents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        record.map(ContentRecord::to_domain).transpose()
    }

    async fn save(&self, content: &Content) -> PortResult<()> {
        let doc = serde_json::to_value(content).map_err(unexpected)?;
        sqlx::query(
            "UPDATE contents SET \
             kind = $2, status = $3, duration = $4, size = $5, updated_at = $6, doc = $7 \
             WHERE id = $1",
        )
        .bind(content.id)
        .bind(content.kind.as_str())
        .bind(content.status.as_str())
        .bind(content.duration.map(i64::from))
        .bind(content.size.map(|s| s as i64))
        .bind(content.updated_at)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_course(
        &self,
        course_id: Uuid,
        filter: &ContentFilter,
    ) -> PortResult<Vec<Content>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT doc FROM contents WHERE course_id = ");
        builder.push_bind(course_id);
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ");
            builder.push_bind(kind.as_str());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build_query_as::<ContentRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        rows.into_iter().map(ContentRecord::to_domain).collect()
    }

    async fn find_ai_generated(&self, limit: u32) -> PortResult<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRecord>(
            "SELECT doc FROM contents WHERE is_ai_generated = TRUE \
             ORDER BY generated_at DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter().map(ContentRecord::to_domain).collect()
    }

    async fn delete_by_course(&self, course_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM contents WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn aggregate_stats(
        &self,
        created_by: Option<Uuid>,
    ) -> PortResult<Vec<ContentKindStats>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT kind, COUNT(*) AS count, \
             COALESCE(SUM(size), 0)::bigint AS total_size, \
             AVG(duration)::double precision AS average_duration FROM contents",
        );
        if let Some(creator) = created_by {
            builder.push(" WHERE created_by = ");
            builder.push_bind(creator);
        }
        builder.push(" GROUP BY kind");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        rows.into_iter()
            .map(|row| {
                let kind: String = row.try_get("kind").map_err(unexpected)?;
                let count: i64 = row.try_get("count").map_err(unexpected)?;
                let total_size: i64 = row.try_get("total_size").map_err(unexpected)?;
                let average_duration: Option<f64> =
                    row.try_get("average_duration").map_err(unexpected)?;
                Ok(ContentKindStats {
                    kind: kind.parse::<ContentKind>().map_err(unexpected)?,
                    count: count as u64,
                    total_size: total_size as u64,
                    average_duration,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_filter_substring_matches_tags_too() {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT doc FROM courses WHERE is_published = TRUE");
        push_course_filters(
            &mut builder,
            &CourseQuery {
                text: Some("rust".to_string()),
                ..CourseQuery::default()
            },
        );
        let sql = builder.sql();
        assert!(sql.contains("title ILIKE"));
        assert!(sql.contains("doc->>'description' ILIKE"));
        // Tags are unrolled and matched with ILIKE, not exact membership.
        assert!(sql.contains("jsonb_array_elements_text(doc->'tags')"));
        assert!(sql.contains("tag ILIKE"));
        assert!(!sql.contains("doc->'tags' ?"));
    }

    #[test]
    fn blank_text_adds_no_filter() {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT doc FROM courses WHERE is_published = TRUE");
        push_course_filters(
            &mut builder,
            &CourseQuery {
                text: Some("   ".to_string()),
                ..CourseQuery::default()
            },
        );
        assert!(!builder.sql().contains("ILIKE"));
    }
}
