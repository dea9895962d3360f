//! Handle PostgreSQL requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::friend::{
    ALREADY_ACCEPTED, FriendRequest, FriendRequestRepository, REQUEST_EXISTS,
    REQUEST_NOT_FOUND, RequestStatus,
};
use crate::user::{EMAIL_TAKEN, Profile, PublicProfile, User, UserRepository};

const USER_COLUMNS: &str = r#"
    u.id,
    u.email,
    u.password,
    u.name,
    u.bio,
    u.profile_picture,
    u.native_language,
    u.learning_language,
    u.country,
    u.is_verified,
    u.is_admin,
    ARRAY(
        SELECT f.friend_id FROM friendships f
        WHERE f.user_id = u.id
        ORDER BY f.friend_id
    ) AS friends,
    u.created_at,
    u.updated_at"#;

const PROFILE_COLUMNS: &str =
    "u.id, u.name, u.profile_picture, u.native_language, u.learning_language";

const REQUEST_COLUMNS: &str =
    "id, sender_id, recipient_id, status, created_at, updated_at";

/// PostgreSQL-backed [`UserRepository`] and [`FriendRequestRepository`].
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    /// Create a new [`PgStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Turn unique violations into a conflict carrying `message`.
fn conflict_on_unique(err: sqlx::Error, message: &'static str) -> ServerError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return ServerError::Conflict(message);
        }
    }

    ServerError::Sql(err)
}

#[derive(sqlx::FromRow)]
struct FriendRequestRecord {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FriendRequestRecord> for FriendRequest {
    type Error = ServerError;

    fn try_from(record: FriendRequestRecord) -> Result<Self> {
        let status = record
            .status
            .parse::<RequestStatus>()
            .map_err(|err| ServerError::internal_from("corrupted request row", err))?;

        Ok(FriendRequest {
            id: record.id,
            sender: record.sender_id,
            recipient: record.recipient_id,
            status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn into_requests(records: Vec<FriendRequestRecord>) -> Result<Vec<FriendRequest>> {
    records.into_iter().map(FriendRequest::try_from).collect()
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, email, password, name, bio, profile_picture,
                native_language, learning_language, country, is_verified, is_admin,
                created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.profile_picture)
        .bind(&user.native_language)
        .bind(&user.learning_language)
        .bind(&user.country)
        .bind(user.is_verified)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| conflict_on_unique(err, EMAIL_TAKEN))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn complete_profile(
        &self,
        id: Uuid,
        profile: &Profile,
    ) -> Result<Option<User>> {
        let result = sqlx::query(
            r#"UPDATE users
                SET name = $2, bio = $3, native_language = $4, learning_language = $5,
                    country = $6, profile_picture = COALESCE($7, profile_picture),
                    is_verified = TRUE, updated_at = NOW()
                WHERE id = $1"#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.bio)
        .bind(&profile.native_language)
        .bind(&profile.learning_language)
        .bind(&profile.country)
        .bind(profile.profile_picture.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn find_friends(&self, id: Uuid) -> Result<Vec<User>> {
        let query = format!(
            r#"SELECT {USER_COLUMNS} FROM users u
                JOIN friendships fs ON fs.friend_id = u.id
                WHERE fs.user_id = $1
                ORDER BY u.id"#
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn recommend(&self, id: Uuid, limit: usize) -> Result<Vec<User>> {
        let query = format!(
            r#"SELECT {USER_COLUMNS} FROM users u
                WHERE u.id <> $1
                    AND u.is_verified
                    AND NOT EXISTS (
                        SELECT 1 FROM friendships fs
                        WHERE fs.user_id = $1 AND fs.friend_id = u.id
                    )
                ORDER BY u.id
                LIMIT $2"#
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<PublicProfile>> {
        let query =
            format!("SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = ANY($1)");

        Ok(sqlx::query_as::<_, PublicProfile>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl FriendRequestRepository for PgStore {
    async fn insert_request(&self, request: &FriendRequest) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO friend_requests (id, sender_id, recipient_id, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(request.id)
        .bind(request.sender)
        .bind(request.recipient)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| conflict_on_unique(err, REQUEST_EXISTS))?;

        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<FriendRequest>> {
        let query =
            format!("SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = $1");

        sqlx::query_as::<_, FriendRequestRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(FriendRequest::try_from)
            .transpose()
    }

    async fn find_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<FriendRequest>> {
        let query = format!(
            r#"SELECT {REQUEST_COLUMNS} FROM friend_requests
                WHERE (sender_id = $1 AND recipient_id = $2)
                    OR (sender_id = $2 AND recipient_id = $1)
                LIMIT 1"#
        );

        sqlx::query_as::<_, FriendRequestRecord>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await?
            .map(FriendRequest::try_from)
            .transpose()
    }

    async fn accept_request(&self, id: Uuid) -> Result<FriendRequest> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"UPDATE friend_requests SET status = 'accepted', updated_at = NOW()
                WHERE id = $1 AND status = 'pending'
                RETURNING {REQUEST_COLUMNS}"#
        );
        let record = sqlx::query_as::<_, FriendRequestRecord>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(record) = record else {
            let exists = sqlx::query("SELECT 1 FROM friend_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            tx.rollback().await?;

            return Err(if exists {
                ServerError::Conflict(ALREADY_ACCEPTED)
            } else {
                ServerError::NotFound(REQUEST_NOT_FOUND)
            });
        };
        let request = FriendRequest::try_from(record)?;

        sqlx::query(
            r#"INSERT INTO friendships (user_id, friend_id)
                VALUES ($1, $2), ($2, $1)
                ON CONFLICT DO NOTHING"#,
        )
        .bind(request.sender)
        .bind(request.recipient)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET updated_at = NOW() WHERE id = $1 OR id = $2")
            .bind(request.sender)
            .bind(request.recipient)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    async fn find_received(
        &self,
        recipient: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<FriendRequest>> {
        let query = format!(
            r#"SELECT {REQUEST_COLUMNS} FROM friend_requests
                WHERE recipient_id = $1 AND status = $2
                ORDER BY created_at, id"#
        );

        into_requests(
            sqlx::query_as::<_, FriendRequestRecord>(&query)
                .bind(recipient)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_sent(
        &self,
        sender: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<FriendRequest>> {
        let query = format!(
            r#"SELECT {REQUEST_COLUMNS} FROM friend_requests
                WHERE sender_id = $1 AND status = $2
                ORDER BY created_at, id"#
        );

        into_requests(
            sqlx::query_as::<_, FriendRequestRecord>(&query)
                .bind(sender)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
