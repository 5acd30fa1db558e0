//! User repository for database operations

use super::{map_sqlx, StoreError, StoreResult, UserRepository};
use async_trait::async_trait;
use blog_shared::{Role, UserProfile, UserStats};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, role, \
     is_active, refresh_token, phone, address, website, bio, created_at, updated_at";

/// User as stored, secrets included. Never serialized; use [`UserRecord::profile`].
#[derive(Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    /// The single live refresh token, if any
    pub refresh_token: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Sanitized projection without the password hash or refresh token
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            is_active: self.is_active,
            phone: self.phone.clone(),
            address: self.address.clone(),
            website: self.website.clone(),
            bio: self.bio.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Input for creating a user; fields are already normalized
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Editable profile fields; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sortable user columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    FirstName,
    LastName,
    Email,
    Username,
}

impl UserSortField {
    pub fn column(&self) -> &'static str {
        match self {
            UserSortField::CreatedAt => "created_at",
            UserSortField::UpdatedAt => "updated_at",
            UserSortField::FirstName => "first_name",
            UserSortField::LastName => "last_name",
            UserSortField::Email => "email",
            UserSortField::Username => "username",
        }
    }
}

impl FromStr for UserSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(UserSortField::CreatedAt),
            "updatedAt" => Ok(UserSortField::UpdatedAt),
            "firstName" => Ok(UserSortField::FirstName),
            "lastName" => Ok(UserSortField::LastName),
            "email" => Ok(UserSortField::Email),
            "username" => Ok(UserSortField::Username),
            _ => Err(format!("Cannot sort by {}", s)),
        }
    }
}

/// Filter for the admin user listing
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    /// Matched case-insensitively against names, email and username
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
    pub sort: UserSortField,
    pub descending: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    refresh_token: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    website: Option<String>,
    bio: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse().unwrap_or_default(),
            is_active: row.is_active,
            refresh_token: row.refresh_token,
            phone: row.phone,
            address: row.address,
            website: row.website,
            bio: row.bio,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserListRow {
    #[sqlx(flatten)]
    user: UserRow,
    post_count: i64,
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    active: i64,
    inactive: i64,
    users: i64,
    moderators: i64,
    admins: i64,
    super_admins: i64,
}

/// PostgreSQL-backed [`UserRepository`]
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, clause);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

/// Substring `LIKE` pattern for `search`, matching `%`, `_` and `\` literally.
/// Pair with `ESCAPE '\'`.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserListFilter) {
    qb.push(" WHERE TRUE");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (LOWER(first_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(last_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(email) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(username) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new: NewUser) -> StoreResult<UserRecord> {
        let sql = format!(
            "INSERT INTO users (email, username, password_hash, first_name, last_name, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new.email)
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, "User already exists"))?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_where("LOWER(email) = LOWER($1)", email.trim()).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_where("LOWER(username) = LOWER($1)", username.trim()).await
    }

    async fn find_by_login(&self, identifier: &str) -> StoreResult<Option<UserRecord>> {
        self.fetch_one_where(
            "LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($1) LIMIT 1",
            identifier.trim(),
        )
        .await
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<UserRecord> {
        let sql = format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                website = COALESCE($6, website),
                bio = COALESCE($7, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.phone)
            .bind(changes.address)
            .bind(changes.website)
            .bind(changes.bio)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        Ok(row.into())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<UserRecord> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        Ok(row.into())
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> StoreResult<UserRecord> {
        let sql = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn list(&self, filter: &UserListFilter) -> StoreResult<(Vec<(UserRecord, i64)>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}, (SELECT COUNT(*) FROM posts p WHERE p.author_id = users.id) AS post_count \
             FROM users",
            USER_COLUMNS
        ));
        push_filters(&mut page, filter);
        page.push(format!(
            " ORDER BY {} {}",
            filter.sort.column(),
            if filter.descending { "DESC" } else { "ASC" }
        ));
        page.push(" LIMIT ").push_bind(filter.limit);
        page.push(" OFFSET ").push_bind(filter.offset);

        let rows: Vec<UserListRow> = page.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(|r| (UserRecord::from(r.user), r.post_count))
            .collect();

        Ok((items, total))
    }

    async fn stats(&self) -> StoreResult<UserStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_active) AS active,
                COUNT(*) FILTER (WHERE NOT is_active) AS inactive,
                COUNT(*) FILTER (WHERE role = 'USER') AS users,
                COUNT(*) FILTER (WHERE role = 'MODERATOR') AS moderators,
                COUNT(*) FILTER (WHERE role = 'ADMIN') AS admins,
                COUNT(*) FILTER (WHERE role = 'SUPERADMIN') AS super_admins
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            total: row.total,
            active: row.active,
            inactive: row.inactive,
            users: row.users,
            moderators: row.moderators,
            admins: row.admins,
            super_admins: row.super_admins,
        })
    }
}
