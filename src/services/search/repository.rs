//! `sqlx`-backed read model over `members` / `member_embeddings`.
//! The member store is treated as an external, read-only collaborator
//! elsewhere in the pipeline; this module backs it locally with SQLite
//! so the crate is runnable and testable end to end.

use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::models::member::MemberRecord;

use super::filters::SearchFilters;

#[derive(Debug, FromRow)]
struct MemberRow {
    id: i64,
    name: String,
    grad_year: i64,
    degree: String,
    branch: String,
    city: String,
    organization: String,
    designation: String,
    skills_json: String,
    services_json: String,
    turnover_crores: Option<f64>,
    contact_phone: Option<String>,
    contact_email: Option<String>,
    is_active: bool,
}

impl MemberRow {
    fn into_record(self) -> MemberRecord {
        MemberRecord {
            id: self.id,
            name: self.name,
            year: self.grad_year as i32,
            degree: self.degree,
            branch: self.branch,
            city: self.city,
            organization: self.organization,
            designation: self.designation,
            skills: serde_json::from_str(&self.skills_json).unwrap_or_default(),
            services: serde_json::from_str(&self.services_json).unwrap_or_default(),
            turnover_crores: self.turnover_crores,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            is_active: self.is_active,
        }
    }
}

const MEMBER_COLUMNS: &str = "id, name, grad_year, degree, branch, city, organization, \
     designation, skills_json, services_json, turnover_crores, contact_phone, contact_email, is_active";

/// Turnover-tier thresholds mirrored from [`crate::models::member::turnover_tier_for`],
/// translated into a crores range so the filter can be pushed into SQL.
fn turnover_range(tier: crate::models::entities::TurnoverTier) -> (f64, f64) {
    use crate::models::entities::TurnoverTier;
    match tier {
        TurnoverTier::Low => (f64::MIN, 1.0),
        TurnoverTier::Med => (1.0, 10.0),
        TurnoverTier::High => (10.0, f64::MAX),
    }
}

pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Applies the structured predicate (year/branch/city/skills/services/
    /// turnover/active) over the member store.
    pub async fn filtered(
        &self,
        filters: &SearchFilters,
        limit: i64,
    ) -> Result<Vec<MemberRecord>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MEMBER_COLUMNS} FROM members WHERE 1 = 1"));

        if filters.active_only {
            qb.push(" AND is_active = 1");
        }
        if !filters.years.is_empty() {
            qb.push(" AND grad_year IN (");
            let mut sep = qb.separated(", ");
            for year in &filters.years {
                sep.push_bind(*year);
            }
            qb.push(")");
        }
        if !filters.branch.is_empty() {
            qb.push(" AND (");
            let mut sep = qb.separated(" OR ");
            for branch in &filters.branch {
                sep.push("branch = ").push_bind_unseparated(branch);
            }
            qb.push(")");
        }
        if let Some(city) = &filters.city {
            qb.push(" AND city = ").push_bind(city);
        }
        if let Some(tier) = filters.turnover_tier {
            let (min, max) = turnover_range(tier);
            qb.push(" AND turnover_crores >= ").push_bind(min);
            qb.push(" AND turnover_crores < ").push_bind(max);
        }
        for skill in &filters.skills {
            qb.push(" AND skills_json LIKE ").push_bind(format!("%{skill}%"));
        }
        for service in &filters.services {
            qb.push(" AND services_json LIKE ").push_bind(format!("%{service}%"));
        }

        qb.push(" LIMIT ").push_bind(limit);

        let rows: Vec<MemberRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(MemberRow::into_record).collect())
    }

    /// Keyword relevance over name/organization/skills/services, scored as
    /// the fraction of query terms each row matches.
    pub async fn keyword_search(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<(i64, f64)>, sqlx::Error> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<MemberRow> =
            sqlx::query_as(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE is_active = 1"))
                .fetch_all(&self.pool)
                .await?;

        let mut scored: Vec<(i64, f64)> = rows
            .into_iter()
            .filter_map(|row| {
                let haystack = format!(
                    "{} {} {} {}",
                    row.name.to_lowercase(),
                    row.organization.to_lowercase(),
                    row.skills_json.to_lowercase(),
                    row.services_json.to_lowercase()
                );
                let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                if hits == 0 {
                    return None;
                }
                Some((row.id, hits as f64 / terms.len() as f64))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit.max(0) as usize);
        Ok(scored)
    }

    /// Raw embeddings for the active model, decoded from little-endian
    /// f32 BLOBs into `EmbeddingVector`.
    pub async fn embeddings_for_model(
        &self,
        model_tag: &str,
    ) -> Result<Vec<(i64, Vec<f32>)>, sqlx::Error> {
        let rows: Vec<(i64, Vec<u8>)> =
            sqlx::query_as("SELECT member_id, vector FROM member_embeddings WHERE model_tag = ?")
                .bind(model_tag)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id, bytes)| (id, decode_f32_le(&bytes))).collect())
    }

    pub async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<MemberRecord>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id IN ("));
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        qb.push(")");

        let rows: Vec<MemberRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(MemberRow::into_record).collect())
    }
}

fn decode_f32_le(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

pub fn encode_f32_le(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn setup_test_db() -> SqlitePool {
        let pool = db::create_pool("sqlite::memory:").await.unwrap();
        db::bootstrap_schema(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO members (name, grad_year, degree, branch, city, organization, \
             designation, skills_json, services_json, turnover_crores, contact_phone, \
             contact_email, is_active) VALUES \
             ('Siva Kumar', 1995, 'B.E', 'Mechanical', 'Chennai', 'USAM Technology', 'Founder', \
             '[]', '[\"it infrastructure\"]', 15.0, '9999999999', 'siva@example.com', 1)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn filters_by_year_branch_and_city() {
        let pool = setup_test_db().await;
        let repo = MemberRepository::new(pool);
        let mut filters = SearchFilters::default();
        filters.years.insert(1995);
        filters.branch.insert("Mechanical".to_string());
        filters.city = Some("Chennai".to_string());
        filters.active_only = true;

        let results = repo.filtered(&filters, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Siva Kumar");
    }

    #[tokio::test]
    async fn keyword_search_matches_services_field() {
        let pool = setup_test_db().await;
        let repo = MemberRepository::new(pool);
        let results = repo.keyword_search(&["infrastructure".to_string()], 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn turnover_tier_filter_matches_high_tier() {
        let pool = setup_test_db().await;
        let repo = MemberRepository::new(pool);
        let mut filters = SearchFilters::default();
        filters.turnover_tier = Some(crate::models::entities::TurnoverTier::High);
        let results = repo.filtered(&filters, 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn f32_roundtrip_through_le_bytes() {
        let original = vec![1.0f32, -2.5, 3.25];
        let bytes = encode_f32_le(&original);
        let decoded = decode_f32_le(&bytes);
        assert_eq!(original, decoded);
    }
}
