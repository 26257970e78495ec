//! SQLite-backed document store.
//!
//! Each collection is a table holding one JSON document per row, with the
//! lookup keys mirrored into indexed columns. The document column is
//! authoritative; the key columns exist only for filtering.

use async_trait::async_trait;
use entities::{ChatRoom, PreRegistration, Project, ProjectFile, ProjectFolder, User};
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::{DocStore, DocStoreError, DocStoreResult};

/// SQLite document store.
#[derive(Clone)]
pub struct SqliteDocStore {
    pool: Pool<Sqlite>,
}

impl SqliteDocStore {
    /// Creates a new SQLite store.
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Initializes the database tables.
    pub async fn init(&self) -> DocStoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                username TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pre_registrations (
                id TEXT PRIMARY KEY,
                email TEXT,
                username TEXT,
                token_hash TEXT,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS project_folders (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS project_files (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_rooms (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_projects_project_id ON projects (project_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_folders_project_id ON project_folders (project_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_files_project_id ON project_files (project_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: String) -> DocStoreResult<T> {
    Ok(serde_json::from_str(&data)?)
}

fn encode<T: serde::Serialize>(value: &T) -> DocStoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

#[async_trait]
impl DocStore for SqliteDocStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> DocStoreResult<User> {
        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user.id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(DocStoreError::already_exists("User", user.id.to_string()));
        }
        sqlx::query("INSERT INTO users (id, email, username, data) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(&user.username)
            .bind(encode(&user)?)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> DocStoreResult<Option<User>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> DocStoreResult<Option<User>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> DocStoreResult<Option<User>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn update_user(&self, user: User) -> DocStoreResult<User> {
        let result =
            sqlx::query("UPDATE users SET email = ?, username = ?, data = ? WHERE id = ?")
                .bind(&user.email)
                .bind(&user.username)
                .bind(encode(&user)?)
                .bind(user.id.to_string())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("User", user.id.to_string()));
        }
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> DocStoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Pre-registration operations
    // =========================================================================

    async fn create_pre_registration(
        &self,
        pre: PreRegistration,
    ) -> DocStoreResult<PreRegistration> {
        sqlx::query(
            "INSERT INTO pre_registrations (id, email, username, token_hash, data) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(pre.id.to_string())
        .bind(&pre.email)
        .bind(&pre.username)
        .bind(&pre.token_hash)
        .bind(encode(&pre)?)
        .execute(&self.pool)
        .await?;
        Ok(pre)
    }

    async fn get_pre_registration_by_token_hash(
        &self,
        token_hash: &str,
    ) -> DocStoreResult<Option<PreRegistration>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM pre_registrations WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn get_pre_registration_by_email(
        &self,
        email: &str,
    ) -> DocStoreResult<Option<PreRegistration>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM pre_registrations WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn get_pre_registration_by_username(
        &self,
        username: &str,
    ) -> DocStoreResult<Option<PreRegistration>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM pre_registrations WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn update_pre_registration(
        &self,
        pre: PreRegistration,
    ) -> DocStoreResult<PreRegistration> {
        let result = sqlx::query(
            "UPDATE pre_registrations SET email = ?, username = ?, token_hash = ?, data = ? WHERE id = ?",
        )
        .bind(&pre.email)
        .bind(&pre.username)
        .bind(&pre.token_hash)
        .bind(encode(&pre)?)
        .bind(pre.id.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found(
                "PreRegistration",
                pre.id.to_string(),
            ));
        }
        Ok(pre)
    }

    // =========================================================================
    // Project operations
    // =========================================================================

    async fn create_project(&self, project: Project) -> DocStoreResult<Project> {
        sqlx::query("INSERT INTO projects (id, project_id, owner_id, data) VALUES (?, ?, ?, ?)")
            .bind(project.id.to_string())
            .bind(project.project_id.to_string())
            .bind(project.owner_id.to_string())
            .bind(encode(&project)?)
            .execute(&self.pool)
            .await?;
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> DocStoreResult<Option<Project>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn get_project_by_project_id(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Option<Project>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM projects WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn list_projects_by_owner(&self, owner_id: Uuid) -> DocStoreResult<Vec<Project>> {
        let rows = sqlx::query("SELECT data FROM projects WHERE owner_id = ?")
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| decode(row.get::<String, _>("data")))
            .collect()
    }

    async fn list_projects_by_collaborator(
        &self,
        user_id: Uuid,
    ) -> DocStoreResult<Vec<Project>> {
        // Collaborators live inside the document; filter after decoding.
        let rows = sqlx::query("SELECT data FROM projects")
            .fetch_all(&self.pool)
            .await?;
        let mut projects = Vec::new();
        for row in rows {
            let project: Project = decode(row.get::<String, _>("data"))?;
            if project.collaborators.contains(&user_id) {
                projects.push(project);
            }
        }
        Ok(projects)
    }

    async fn update_project(&self, project: Project) -> DocStoreResult<Project> {
        let result = sqlx::query("UPDATE projects SET data = ? WHERE id = ?")
            .bind(encode(&project)?)
            .bind(project.id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("Project", project.id.to_string()));
        }
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> DocStoreResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("Project", id.to_string()));
        }
        Ok(())
    }

    async fn add_project_collaborator(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DocStoreResult<Project> {
        // Check-then-append inside one transaction so two concurrent calls
        // for the same pair cannot both pass the membership check.
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM projects WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let mut project: Project = match row {
            Some((data,)) => decode(data)?,
            None => {
                return Err(DocStoreError::not_found("Project", project_id.to_string()));
            }
        };

        if project.collaborators.contains(&user_id) {
            return Err(DocStoreError::already_exists(
                "Collaborator",
                user_id.to_string(),
            ));
        }
        project.collaborators.push(user_id);
        project.touch();

        sqlx::query("UPDATE projects SET data = ? WHERE id = ?")
            .bind(encode(&project)?)
            .bind(project.id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(project)
    }

    async fn remove_project_collaborator(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DocStoreResult<Project> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM projects WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let mut project: Project = match row {
            Some((data,)) => decode(data)?,
            None => {
                return Err(DocStoreError::not_found("Project", project_id.to_string()));
            }
        };

        project.collaborators.retain(|c| *c != user_id);
        project.touch();

        sqlx::query("UPDATE projects SET data = ? WHERE id = ?")
            .bind(encode(&project)?)
            .bind(project.id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(project)
    }

    // =========================================================================
    // Folder operations
    // =========================================================================

    async fn create_folder(&self, folder: ProjectFolder) -> DocStoreResult<ProjectFolder> {
        sqlx::query("INSERT INTO project_folders (id, project_id, data) VALUES (?, ?, ?)")
            .bind(folder.id.to_string())
            .bind(folder.project_id.to_string())
            .bind(encode(&folder)?)
            .execute(&self.pool)
            .await?;
        Ok(folder)
    }

    async fn get_folder(&self, id: Uuid) -> DocStoreResult<Option<ProjectFolder>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM project_folders WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn list_folders_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Vec<ProjectFolder>> {
        let rows = sqlx::query("SELECT data FROM project_folders WHERE project_id = ?")
            .bind(project_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| decode(row.get::<String, _>("data")))
            .collect()
    }

    async fn update_folder(&self, folder: ProjectFolder) -> DocStoreResult<ProjectFolder> {
        let result = sqlx::query("UPDATE project_folders SET data = ? WHERE id = ?")
            .bind(encode(&folder)?)
            .bind(folder.id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found(
                "ProjectFolder",
                folder.id.to_string(),
            ));
        }
        Ok(folder)
    }

    async fn delete_folder(&self, id: Uuid) -> DocStoreResult<()> {
        let result = sqlx::query("DELETE FROM project_folders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("ProjectFolder", id.to_string()));
        }
        Ok(())
    }

    async fn delete_folders_by_project(&self, project_id: Uuid) -> DocStoreResult<usize> {
        let result = sqlx::query("DELETE FROM project_folders WHERE project_id = ?")
            .bind(project_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    // =========================================================================
    // File operations
    // =========================================================================

    async fn create_file(&self, file: ProjectFile) -> DocStoreResult<ProjectFile> {
        sqlx::query("INSERT INTO project_files (id, project_id, data) VALUES (?, ?, ?)")
            .bind(file.id.to_string())
            .bind(file.project_id.to_string())
            .bind(encode(&file)?)
            .execute(&self.pool)
            .await?;
        Ok(file)
    }

    async fn get_file(&self, id: Uuid) -> DocStoreResult<Option<ProjectFile>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM project_files WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn list_files_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Vec<ProjectFile>> {
        let rows = sqlx::query("SELECT data FROM project_files WHERE project_id = ?")
            .bind(project_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| decode(row.get::<String, _>("data")))
            .collect()
    }

    async fn update_file(&self, file: ProjectFile) -> DocStoreResult<ProjectFile> {
        let result = sqlx::query("UPDATE project_files SET data = ? WHERE id = ?")
            .bind(encode(&file)?)
            .bind(file.id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("ProjectFile", file.id.to_string()));
        }
        Ok(file)
    }

    async fn delete_files_by_project(&self, project_id: Uuid) -> DocStoreResult<usize> {
        let result = sqlx::query("DELETE FROM project_files WHERE project_id = ?")
            .bind(project_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    // =========================================================================
    // Chat room operations
    // =========================================================================

    async fn create_chat_room(&self, room: ChatRoom) -> DocStoreResult<ChatRoom> {
        let result = sqlx::query("INSERT INTO chat_rooms (id, project_id, data) VALUES (?, ?, ?)")
            .bind(room.id.to_string())
            .bind(room.project_id.to_string())
            .bind(encode(&room)?)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(room),
            // The UNIQUE constraint on project_id enforces one room per
            // project.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                DocStoreError::already_exists("ChatRoom", room.project_id.to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_chat_room_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Option<ChatRoom>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM chat_rooms WHERE project_id = ?")
                .bind(project_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(data,)| decode(data)).transpose()
    }

    async fn update_chat_room(&self, room: ChatRoom) -> DocStoreResult<ChatRoom> {
        let result = sqlx::query("UPDATE chat_rooms SET data = ? WHERE id = ?")
            .bind(encode(&room)?)
            .bind(room.id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DocStoreError::not_found("ChatRoom", room.id.to_string()));
        }
        Ok(room)
    }

    async fn delete_chat_room_by_project(&self, project_id: Uuid) -> DocStoreResult<bool> {
        let result = sqlx::query("DELETE FROM chat_rooms WHERE project_id = ?")
            .bind(project_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
