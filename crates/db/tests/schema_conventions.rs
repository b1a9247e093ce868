use sqlx::PgPool;

/// All `id` columns must be bigint.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_bigint(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert_eq!(data_type, "bigint", "Table {table}.id should be bigint");
    }
}

/// Every table (except _sqlx_migrations) must have created_at and updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (table,) in &tables {
        for col in ["created_at", "updated_at"] {
            let result: Option<(String,)> = sqlx::query_as(&format!(
                "SELECT data_type
                 FROM information_schema.columns
                 WHERE table_schema = 'public'
                   AND table_name = '{table}'
                   AND column_name = '{col}'"
            ))
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) =
                result.unwrap_or_else(|| panic!("Table {table} is missing column {col}"));
            assert_eq!(
                data_type, "timestamp with time zone",
                "Table {table}.{col} should be timestamptz, got {data_type}"
            );
        }
    }
}

/// Every reaction table must carry a `uq_` unique constraint so concurrent
/// toggles cannot create duplicates.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reaction_tables_have_unique_constraints(pool: PgPool) {
    for table in ["video_likes", "video_favorites", "comment_likes", "post_likes"] {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*)
             FROM information_schema.table_constraints
             WHERE table_schema = 'public'
               AND table_name = $1
               AND constraint_type = 'UNIQUE'
               AND constraint_name LIKE 'uq\\_%'",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "{table} should have exactly one uq_ constraint");
    }
}

/// The thumbnail check rejects rows holding both a timestamp and a key.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_thumbnail_columns_are_exclusive(pool: PgPool) {
    let (user_id,): (i64,) =
        sqlx::query_as("INSERT INTO users (name, role) VALUES ('u', 'viewer') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();

    let result = sqlx::query(
        "INSERT INTO videos (title, game_type, video_type, thumbnail_source,
                             thumbnail_timestamp, custom_thumbnail_key, uploaded_by)
         VALUES ('t', 'g', 'normal', 'custom', 1.0, 'thumbnails/normal/x.png', $1)",
    )
    .bind(user_id)
    .execute(&pool)
    .await;

    let err = result.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("ck_videos_thumbnail"));
}
