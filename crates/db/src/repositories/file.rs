//! File record repository for database operations.
//!
//! Implements `File` record persistence using SeaORM.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::files;
use depot_core::files::{FileRecord, FileRepository, MetadataError, NewFile};

/// File record repository implementation.
#[derive(Debug)]
pub struct FileRecordRepository {
    db: DatabaseConnection,
}

impl FileRecordRepository {
    /// Create a new file record repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl FileRepository for FileRecordRepository {
    async fn create(&self, input: NewFile) -> Result<FileRecord, MetadataError> {
        let active_model = files::ActiveModel {
            id: Set(Uuid::new_v4()),
            filename: Set(input.filename),
            path: Set(input.path),
            mime_type: Set(input.mime_type),
            size: Set(input.size),
            uploaded_by: Set(input.uploaded_by),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| MetadataError::database(e.to_string()))?;

        tracing::debug!(file_id = %model.id, path = %model.path, "File record created");

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, MetadataError> {
        let model = files::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| MetadataError::database(e.to_string()))?;

        Ok(model.map(to_domain))
    }
}

/// Convert database model to domain record.
fn to_domain(model: files::Model) -> FileRecord {
    FileRecord {
        id: model.id,
        filename: model.filename,
        path: model.path,
        mime_type: model.mime_type,
        size: model.size,
        uploaded_by: model.uploaded_by,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
