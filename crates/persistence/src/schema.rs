//! Table set owned by each tenant.
//!
//! Every table name is `<prefix><name>`. The prefix comes from a validated
//! [`TablePrefix`], which is the only value ever interpolated into SQL here.

use domain::models::TablePrefix;

/// Current version of the tenant table layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Tenant tables in creation order. `{table}` is replaced by the prefixed name.
pub const TENANT_TABLES: &[(&str, &str)] = &[
    (
        "config",
        r#"{table} (
            config_key VARCHAR(255) NOT NULL PRIMARY KEY,
            config_value TEXT
        )"#,
    ),
    (
        "rights",
        r#"{table} (
            right_id BIGINT NOT NULL PRIMARY KEY,
            name VARCHAR(50),
            description TEXT,
            for_users SMALLINT DEFAULT 1,
            for_groups SMALLINT DEFAULT 1
        )"#,
    ),
    (
        "users",
        r#"{table} (
            user_id BIGINT NOT NULL PRIMARY KEY,
            login VARCHAR(128) NOT NULL,
            session_id VARCHAR(150),
            session_timestamp BIGINT,
            ip VARCHAR(15),
            account_status VARCHAR(50),
            last_login VARCHAR(14),
            auth_source VARCHAR(100),
            member_since VARCHAR(14),
            remember_me VARCHAR(150),
            success SMALLINT DEFAULT 1,
            is_superadmin SMALLINT DEFAULT 0
        )"#,
    ),
    (
        "user_login",
        r#"{table} (
            login VARCHAR(128) NOT NULL,
            pass VARCHAR(255),
            domain VARCHAR(255)
        )"#,
    ),
    (
        "user_rights",
        r#"{table} (
            user_id BIGINT NOT NULL,
            right_id BIGINT NOT NULL,
            PRIMARY KEY (user_id, right_id)
        )"#,
    ),
    (
        "groups",
        r#"{table} (
            group_id BIGINT NOT NULL PRIMARY KEY,
            name VARCHAR(25),
            description TEXT,
            auto_join SMALLINT
        )"#,
    ),
    (
        "user_groups",
        r#"{table} (
            user_id BIGINT NOT NULL,
            group_id BIGINT NOT NULL,
            PRIMARY KEY (user_id, group_id)
        )"#,
    ),
    (
        "categories",
        r#"{table} (
            id BIGINT NOT NULL,
            lang VARCHAR(5) NOT NULL,
            parent_id BIGINT,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            user_id BIGINT NOT NULL,
            group_id BIGINT NOT NULL DEFAULT -1,
            active SMALLINT DEFAULT 1,
            image VARCHAR(255),
            show_home SMALLINT,
            PRIMARY KEY (id, lang)
        )"#,
    ),
    (
        "faq_data",
        r#"{table} (
            id BIGINT NOT NULL,
            lang VARCHAR(5) NOT NULL,
            solution_id BIGINT NOT NULL,
            revision_id BIGINT NOT NULL DEFAULT 0,
            active CHAR(3) NOT NULL,
            sticky SMALLINT NOT NULL DEFAULT 0,
            keywords TEXT,
            thema TEXT NOT NULL,
            content TEXT,
            author VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            comment CHAR(1) DEFAULT 'y',
            updated VARCHAR(15) NOT NULL,
            date_start VARCHAR(14) NOT NULL DEFAULT '00000000000000',
            date_end VARCHAR(14) NOT NULL DEFAULT '99991231235959',
            created TIMESTAMPTZ DEFAULT NOW(),
            notes TEXT,
            PRIMARY KEY (id, lang)
        )"#,
    ),
    (
        "category_relations",
        r#"{table} (
            category_id BIGINT NOT NULL,
            category_lang VARCHAR(5) NOT NULL,
            record_id BIGINT NOT NULL,
            record_lang VARCHAR(5) NOT NULL,
            PRIMARY KEY (category_id, category_lang, record_id, record_lang)
        )"#,
    ),
    (
        "faq_data_groups",
        r#"{table} (
            record_id BIGINT NOT NULL,
            group_id BIGINT NOT NULL,
            PRIMARY KEY (record_id, group_id)
        )"#,
    ),
    (
        "questions",
        r#"{table} (
            id BIGINT NOT NULL PRIMARY KEY,
            username VARCHAR(100) NOT NULL,
            email VARCHAR(100) NOT NULL,
            category_id BIGINT NOT NULL,
            question TEXT NOT NULL,
            created VARCHAR(20) NOT NULL,
            is_visible CHAR(1) DEFAULT 'Y',
            answer_id BIGINT NOT NULL DEFAULT 0,
            lang VARCHAR(5) NOT NULL
        )"#,
    ),
];

/// Secondary indexes, created after the tables.
const TENANT_INDEXES: &[(&str, &str)] = &[
    ("user_login_login_idx", "user_login (login)"),
    ("category_relations_record_idx", "category_relations (record_id, record_lang)"),
];

/// One DDL statement for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlStatement {
    /// Prefixed table the statement creates or indexes.
    pub table: String,
    pub sql: String,
}

/// Full DDL for a tenant table set.
///
/// The master is bootstrapped with `if_not_exists` so restarts are no-ops;
/// client clones fail on any existing table.
pub fn tenant_ddl(prefix: &TablePrefix, if_not_exists: bool) -> Vec<DdlStatement> {
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };

    let tables = TENANT_TABLES.iter().map(|(name, body)| {
        let table = prefix.table(name);
        DdlStatement {
            sql: format!("CREATE TABLE {}{}", guard, body.replace("{table}", &table)),
            table,
        }
    });

    let indexes = TENANT_INDEXES.iter().map(|(name, target)| {
        let (table, columns) = target.split_once(' ').unwrap_or((target, ""));
        let table = prefix.table(table);
        DdlStatement {
            sql: format!(
                "CREATE INDEX {}{} ON {} {}",
                guard,
                prefix.table(name),
                table,
                columns
            ),
            table,
        }
    });

    tables.chain(indexes).collect()
}

/// Prefixed table names in reverse creation order, for dropping.
pub fn tenant_tables_for_drop(prefix: &TablePrefix) -> Vec<String> {
    TENANT_TABLES
        .iter()
        .rev()
        .map(|(name, _)| prefix.table(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix() -> TablePrefix {
        TablePrefix::new("supp_").unwrap()
    }

    #[test]
    fn test_every_table_is_prefixed() {
        let ddl = tenant_ddl(&prefix(), false);
        assert_eq!(ddl.len(), TENANT_TABLES.len() + TENANT_INDEXES.len());
        for statement in &ddl {
            assert!(statement.table.starts_with("supp_"), "{}", statement.table);
            assert!(statement.sql.contains(&statement.table));
            assert!(!statement.sql.contains("{table}"));
        }
    }

    #[test]
    fn test_twelve_tables_in_order() {
        let names: Vec<&str> = TENANT_TABLES.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "config",
                "rights",
                "users",
                "user_login",
                "user_rights",
                "groups",
                "user_groups",
                "categories",
                "faq_data",
                "category_relations",
                "faq_data_groups",
                "questions",
            ]
        );
    }

    #[test]
    fn test_if_not_exists_guard() {
        let ddl = tenant_ddl(&prefix(), true);
        assert!(ddl[0].sql.starts_with("CREATE TABLE IF NOT EXISTS supp_config ("));
        let ddl = tenant_ddl(&prefix(), false);
        assert!(ddl[0].sql.starts_with("CREATE TABLE supp_config ("));
    }

    #[test]
    fn test_index_statements() {
        let ddl = tenant_ddl(&prefix(), false);
        let index = ddl.iter().find(|s| s.sql.starts_with("CREATE INDEX")).unwrap();
        assert_eq!(
            index.sql,
            "CREATE INDEX supp_user_login_login_idx ON supp_user_login (login)"
        );
    }

    #[test]
    fn test_drop_order_is_reversed() {
        let tables = tenant_tables_for_drop(&prefix());
        assert_eq!(tables.first().map(String::as_str), Some("supp_questions"));
        assert_eq!(tables.last().map(String::as_str), Some("supp_config"));
    }
}
