//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (name, sql_content), applied in name order.

/// Creates the `sys_migrations` bookkeeping table
pub const BOOTSTRAP_MIGRATION: &str = "000_migrations.sql";

/// All migrations, embedded at compile time.
/// Format: (filename, sql_content)
///
/// When adding a migration, create `NNN_description.sql` next to this file
/// and append it here.
pub const MIGRATIONS: &[(&str, &str)] = &[
    (BOOTSTRAP_MIGRATION, include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
