//! Category relation repository.
//!
//! Aggregates only consider relations whose `record_lang` matches the
//! language of the FAQ record they point at; mismatched rows are skipped.

use domain::models::category::build_matrix;
use domain::models::{CategoryCounts, CategoryFaqMatrix, CategoryRef, CategoryRelation, RecordMailInfo, TablePrefix};
use sqlx::PgPool;
use std::collections::BTreeMap;

use crate::entities::{
    CategoryCountEntity, CategoryRecordPairEntity, CategoryRefEntity, RecordMailInfoEntity,
};
use crate::metrics::QueryTimer;

/// Repository over one tenant's category relation tables.
#[derive(Clone)]
pub struct CategoryRelationRepository {
    pool: PgPool,
    prefix: TablePrefix,
}

impl CategoryRelationRepository {
    pub fn new(pool: PgPool, prefix: TablePrefix) -> Self {
        Self { pool, prefix }
    }

    fn table(&self, name: &str) -> String {
        self.prefix.table(name)
    }

    /// Category id -> record ids, language-consistent pairs only.
    pub async fn category_faq_matrix(&self) -> Result<CategoryFaqMatrix, sqlx::Error> {
        let timer = QueryTimer::new("category_faq_matrix");
        let sql = format!(
            r#"
            SELECT DISTINCT fcr.category_id, fcr.record_id
            FROM {relations} fcr
            INNER JOIN {faq_data} fd
                ON fcr.record_id = fd.id AND fcr.record_lang = fd.lang
            ORDER BY fcr.category_id, fcr.record_id
            "#,
            relations = self.table("category_relations"),
            faq_data = self.table("faq_data"),
        );
        let result = sqlx::query_as::<_, CategoryRecordPairEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        Ok(build_matrix(
            result?.into_iter().map(|row| (row.category_id, row.record_id)),
        ))
    }

    /// Number of language-consistent records per category, optionally only
    /// records visible to `restrict_to_group`.
    pub async fn faq_count_per_category(
        &self,
        restrict_to_group: Option<i64>,
    ) -> Result<CategoryCounts, sqlx::Error> {
        let timer = QueryTimer::new("faq_count_per_category");
        let group_join = match restrict_to_group {
            Some(_) => format!(
                "INNER JOIN {} fdg ON fdg.record_id = fcr.record_id AND fdg.group_id = $1",
                self.table("faq_data_groups")
            ),
            None => String::new(),
        };
        let sql = format!(
            r#"
            SELECT fcr.category_id, COUNT(fcr.record_id) AS record_count
            FROM {relations} fcr
            INNER JOIN {faq_data} fd
                ON fcr.record_id = fd.id AND fcr.record_lang = fd.lang
            {group_join}
            GROUP BY fcr.category_id
            ORDER BY fcr.category_id
            "#,
            relations = self.table("category_relations"),
            faq_data = self.table("faq_data"),
            group_join = group_join,
        );

        let mut query = sqlx::query_as::<_, CategoryCountEntity>(&sql);
        if let Some(group_id) = restrict_to_group {
            query = query.bind(group_id);
        }
        let result = query.fetch_all(&self.pool).await;
        timer.record();

        Ok(result?
            .into_iter()
            .map(|row| (row.category_id, row.record_count))
            .collect())
    }

    /// Categories a record belongs to in `lang`, keyed by category id.
    pub async fn categories_for_record(
        &self,
        record_id: i64,
        lang: &str,
    ) -> Result<BTreeMap<i64, CategoryRef>, sqlx::Error> {
        let timer = QueryTimer::new("categories_for_record");
        let sql = format!(
            r#"
            SELECT category_id, category_lang
            FROM {}
            WHERE record_id = $1 AND record_lang = $2
            ORDER BY category_id
            "#,
            self.table("category_relations")
        );
        let result = sqlx::query_as::<_, CategoryRefEntity>(&sql)
            .bind(record_id)
            .bind(lang)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        Ok(result?
            .into_iter()
            .map(|row| (row.category_id, CategoryRef::from(row)))
            .collect())
    }

    /// Removes the relations of a category in one language, or in all of
    /// them. Returns rows removed.
    pub async fn delete_relations(
        &self,
        category_id: i64,
        lang: &str,
        all_languages: bool,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_category_relations");
        let table = self.table("category_relations");
        let result = if all_languages {
            let sql = format!("DELETE FROM {} WHERE category_id = $1", table);
            sqlx::query(&sql).bind(category_id).execute(&self.pool).await
        } else {
            let sql = format!(
                "DELETE FROM {} WHERE category_id = $1 AND category_lang = $2",
                table
            );
            sqlx::query(&sql)
                .bind(category_id)
                .bind(lang)
                .execute(&self.pool)
                .await
        };
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Adds a relation; returns false if it already existed.
    pub async fn add_relation(&self, relation: &CategoryRelation) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("add_category_relation");
        let sql = format!(
            r#"
            INSERT INTO {} (category_id, category_lang, record_id, record_lang)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
            self.table("category_relations")
        );
        let result = sqlx::query(&sql)
            .bind(relation.category_id)
            .bind(&relation.category_lang)
            .bind(relation.record_id)
            .bind(&relation.record_lang)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Subject, content, author, email and notes of a record in `lang`.
    pub async fn record_mail_info(
        &self,
        record_id: i64,
        lang: &str,
    ) -> Result<Option<RecordMailInfo>, sqlx::Error> {
        let timer = QueryTimer::new("record_mail_info");
        let sql = format!(
            r#"
            SELECT thema AS subject, content, author, email, notes
            FROM {}
            WHERE id = $1 AND lang = $2
            "#,
            self.table("faq_data")
        );
        let result = sqlx::query_as::<_, RecordMailInfoEntity>(&sql)
            .bind(record_id)
            .bind(lang)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(RecordMailInfo::from))
    }
}
