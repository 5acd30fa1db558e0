//! User management: own profile edits and privileged account administration
//!
//! Every privileged action goes through [`Role::outranks`]: an actor may only
//! touch accounts strictly below their own role.

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::repositories::{ProfileChanges, UserListFilter, UserRecord, UserRepository, UserSortField};
use blog_shared::validation::validate_name;
use blog_shared::{
    PaginationInfo, Role, RoleChangeResponse, UpdateProfileRequest, UpdateRoleRequest,
    UserListItem, UserListQuery, UserListResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::ValidateUrl;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// User management service
pub struct UserService;

impl UserService {
    /// Filtered, paginated listing with per-user post counts and role stats
    pub async fn list(users: &dyn UserRepository, query: UserListQuery) -> ApiResult<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let is_active = match query.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            Some(_) => return Err(ApiError::field("status", "Status must be active or inactive")),
        };
        let role = match query.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None => None,
            Some(r) => Some(r.parse::<Role>().map_err(|e| ApiError::field("role", e))?),
        };
        let sort = match query.sort_by.as_deref() {
            None | Some("") => UserSortField::default(),
            Some(s) => s.parse().map_err(|e: String| ApiError::field("sortBy", e))?,
        };
        let descending = !matches!(query.sort_order.as_deref(), Some(o) if o.eq_ignore_ascii_case("asc"));

        let filter = UserListFilter {
            search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            is_active,
            role,
            sort,
            descending,
            limit: i64::from(limit),
            offset: i64::from((page - 1) * limit),
        };

        let (rows, total_count) = users.list(&filter).await?;
        let stats = users.stats().await?;

        let total_pages = u32::try_from((total_count + i64::from(limit) - 1) / i64::from(limit))
            .unwrap_or(u32::MAX);

        Ok(UserListResponse {
            items: rows
                .into_iter()
                .map(|(user, post_count)| UserListItem {
                    user: user.profile(),
                    post_count,
                })
                .collect(),
            pagination: PaginationInfo {
                current_page: page,
                total_pages,
                total_count,
                has_next: page < total_pages,
                has_prev: page > 1,
                limit,
            },
            stats,
        })
    }

    /// A single account, visible to its owner and to staff
    pub async fn get(users: &dyn UserRepository, actor: &CurrentUser, id: Uuid) -> ApiResult<UserRecord> {
        if actor.id != id {
            actor.require_role(&Role::STAFF)?;
        }
        Self::load(users, id).await
    }

    /// Edit the caller's own profile
    pub async fn update_own_profile(
        users: &dyn UserRepository,
        actor: &CurrentUser,
        req: UpdateProfileRequest,
    ) -> ApiResult<UserRecord> {
        let changes = profile_changes(req)?;
        let user = users.update_profile(actor.id, changes).await?;
        info!(user_id = %actor.id, "Profile updated");
        Ok(user)
    }

    /// Staff edit of another account's profile
    pub async fn update_user(
        users: &dyn UserRepository,
        actor: &CurrentUser,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> ApiResult<UserRecord> {
        actor.require_role(&Role::STAFF)?;
        let changes = profile_changes(req)?;
        let target = Self::load(users, id).await?;
        ensure_manageable(actor, &target, "update")?;

        let user = users.update_profile(id, changes).await?;
        info!(actor_id = %actor.id, user_id = %id, "User profile updated by staff");
        Ok(user)
    }

    /// Change another account's role
    pub async fn change_role(
        users: &dyn UserRepository,
        actor: &CurrentUser,
        id: Uuid,
        req: UpdateRoleRequest,
    ) -> ApiResult<RoleChangeResponse> {
        actor.require_role(&Role::STAFF)?;
        let new_role: Role = req
            .role
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ApiError::field("role", "Role is required"))?
            .parse()
            .map_err(|e: String| ApiError::field("role", e))?;

        if actor.id == id {
            return Err(ApiError::forbidden(if actor.role == Role::SuperAdmin {
                "Super admins cannot demote themselves"
            } else {
                "You cannot change your own role"
            }));
        }
        if new_role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
            return Err(ApiError::forbidden("Only super admins can assign the SUPERADMIN role"));
        }
        if new_role > actor.role {
            return Err(ApiError::forbidden("You cannot assign a role higher than your own"));
        }

        let target = Self::load(users, id).await?;
        if !actor.role.outranks(target.role) {
            return Err(ApiError::forbidden(
                "You can only change the role of users below your own role",
            ));
        }
        if target.role == new_role {
            return Err(ApiError::field("role", format!("User already has the {} role", new_role)));
        }

        let updated = users.set_role(id, new_role).await?;
        info!(
            actor_id = %actor.id,
            actor_role = %actor.role,
            target_id = %id,
            from = %target.role,
            to = %new_role,
            "Role changed"
        );

        Ok(RoleChangeResponse {
            user: updated.profile(),
            previous_role: target.role,
            new_role,
            updated_by: actor.id,
            timestamp: Utc::now(),
        })
    }

    /// Flip an account between active and inactive
    pub async fn toggle_status(
        users: &dyn UserRepository,
        actor: &CurrentUser,
        id: Uuid,
    ) -> ApiResult<UserRecord> {
        actor.require_role(&Role::STAFF)?;
        if actor.id == id && actor.role == Role::SuperAdmin {
            return Err(ApiError::forbidden("Super admins cannot deactivate themselves"));
        }
        let target = Self::load(users, id).await?;
        ensure_manageable(actor, &target, "change the status of")?;

        let updated = users.set_active(id, !target.is_active).await?;
        info!(actor_id = %actor.id, target_id = %id, is_active = updated.is_active, "User status changed");
        Ok(updated)
    }

    /// Delete an account and, by cascade, its posts
    pub async fn delete(users: &dyn UserRepository, actor: &CurrentUser, id: Uuid) -> ApiResult<()> {
        actor.require_role(&Role::STAFF)?;
        if actor.id == id && actor.role == Role::SuperAdmin {
            return Err(ApiError::forbidden("Super admins cannot delete themselves"));
        }
        let target = Self::load(users, id).await?;
        ensure_manageable(actor, &target, "delete")?;

        users.delete(id).await?;
        info!(actor_id = %actor.id, target_id = %id, "User deleted");
        Ok(())
    }

    async fn load(users: &dyn UserRepository, id: Uuid) -> ApiResult<UserRecord> {
        users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }
}

fn ensure_manageable(actor: &CurrentUser, target: &UserRecord, action: &str) -> ApiResult<()> {
    if actor.role.outranks(target.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "You can only {} users below your own role",
            action
        )))
    }
}

/// Trim and validate profile input
fn profile_changes(req: UpdateProfileRequest) -> ApiResult<ProfileChanges> {
    fn trimmed(value: Option<String>) -> Option<String> {
        value.map(|v| v.trim().to_string())
    }

    let changes = ProfileChanges {
        first_name: trimmed(req.first_name),
        last_name: trimmed(req.last_name),
        phone: trimmed(req.phone),
        address: trimmed(req.address),
        website: trimmed(req.website),
        bio: trimmed(req.bio),
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let mut errors = std::collections::BTreeMap::new();
    for (field, value) in [("firstName", &changes.first_name), ("lastName", &changes.last_name)] {
        if let Some(Err(message)) = value.as_deref().map(validate_name) {
            errors.insert(field.to_string(), message);
        }
    }
    if let Some(website) = changes.website.as_deref().filter(|w| !w.is_empty()) {
        if !website.validate_url() {
            errors.insert("website".to_string(), "Website must be a valid URL".to_string());
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    Ok(changes)
}
