use actix_web::{post, web, HttpResponse, Scope};

use coursedeck::domain::Role;
use coursedeck::repo::UsersRepo;

use serde::Deserialize;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::{Administrator, LeaderPrincipal};
use crate::controller::{decline, ok};
use crate::error::{RestError, RestResult};

pub fn scope() -> Scope {
    web::scope("/admin/roles").service(update_role)
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    user_id: Uuid,
    role: Role,
}

/// Role administration, restricted to the leader. The LEADER role is
/// pinned to the configured identity: it can neither be granted to
/// anyone else nor stripped from its holder.
#[tracing::instrument(name = "Update user role", skip(pool, admin, leader))]
#[post("")]
async fn update_role(
    admin: Administrator,
    pool: web::Data<PgPool>,
    leader: web::Data<LeaderPrincipal>,
    body: web::Json<UpdateRoleRequest>,
) -> RestResult<HttpResponse> {
    admin.require_leader(&leader)?;

    let Some(target) = UsersRepo::fetch_by_id(pool.get_ref(), body.user_id).await? else {
        return Ok(decline("USER_NOT_FOUND", "User not found"));
    };

    if leader.matches(&target.email) && body.role != Role::Leader {
        return Err(RestError::Forbidden("Cannot change the leader's role".into()));
    }
    if body.role == Role::Leader && !leader.matches(&target.email) {
        return Err(RestError::Forbidden(
            "The leader role cannot be reassigned".into(),
        ));
    }

    UsersRepo::update_role(pool.get_ref(), target.id, body.role).await?;

    Ok(ok(json!({
        "user_id": target.id,
        "role": body.role,
    })))
}
