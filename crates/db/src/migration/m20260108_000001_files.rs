//! Files migration.
//!
//! Creates the files table holding one record per successful upload.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FILES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS files CASCADE;")
            .await?;
        Ok(())
    }
}

const FILES_SQL: &str = r"
-- Uploaded file records. path is the storage key at upload time.
CREATE TABLE files (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    filename TEXT NOT NULL,
    path TEXT NOT NULL,
    mime_type VARCHAR(255),
    size BIGINT NOT NULL,
    uploaded_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_files_size CHECK (size >= 0)
);

-- Lookup by storage key
CREATE INDEX idx_files_path ON files(path);

-- A user's uploads, newest first
CREATE INDEX idx_files_uploaded_by ON files(uploaded_by, created_at DESC);
";
