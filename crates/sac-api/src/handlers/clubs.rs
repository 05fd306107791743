use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use sac_db::entities::club::ClubDomain;
use sac_db::entities::{club, club_category, lead, project};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

use super::require_admin;

/// Query parameters for the project list
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProjectListQuery {
    /// Filter by owning club
    pub club: Option<String>,
}

fn parse_domain(value: &str) -> Result<ClubDomain, ApiError> {
    ClubDomain::parse(value).ok_or_else(|| {
        sac_core::Error::validation("domain", format!("unknown program track {}", value)).into()
    })
}

fn club_view(model: club::Model, categories: Vec<String>) -> ClubView {
    ClubView {
        id: model.id,
        name: model.name,
        description: model.description,
        domain: model.domain.as_str().to_string(),
        member_limit: model.member_limit,
        member_count: model.member_count,
        categories,
    }
}

async fn categories_of(state: &AppState, club_id: &str) -> Result<Vec<String>, ApiError> {
    Ok(club_category::Entity::find()
        .filter(club_category::Column::ClubId.eq(club_id))
        .order_by_asc(club_category::Column::Position)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect())
}

/// List all clubs
#[utoipa::path(
    get,
    path = "/api/clubs",
    responses(
        (status = 200, description = "All clubs", body = ClubList)
    ),
    tag = "clubs"
)]
pub async fn list_clubs(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<ClubList>, ApiError> {
    let clubs = club::Entity::find()
        .order_by_asc(club::Column::Id)
        .all(&state.db)
        .await?;

    // One query for every club's labels, grouped in memory
    let mut by_club: HashMap<String, Vec<(i32, String)>> = HashMap::new();
    for row in club_category::Entity::find().all(&state.db).await? {
        by_club
            .entry(row.club_id)
            .or_default()
            .push((row.position, row.name));
    }

    let views: Vec<ClubView> = clubs
        .into_iter()
        .map(|c| {
            let mut labels = by_club.remove(&c.id).unwrap_or_default();
            labels.sort_by_key(|(position, _)| *position);
            club_view(c, labels.into_iter().map(|(_, name)| name).collect())
        })
        .collect();

    let total = views.len();
    Ok(Json(ClubList {
        clubs: views,
        total,
    }))
}

/// Get one club
#[utoipa::path(
    get,
    path = "/api/clubs/{id}",
    params(
        ("id" = String, Path, description = "Club id")
    ),
    responses(
        (status = 200, description = "Club information", body = ClubView),
        (status = 404, description = "Club not found", body = ErrorResponse)
    ),
    tag = "clubs"
)]
pub async fn get_club(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ClubView>, ApiError> {
    let model = club::Entity::find_by_id(id.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("club {}", id)))?;

    let categories = categories_of(&state, &id).await?;
    Ok(Json(club_view(model, categories)))
}

/// Create a club (admin)
#[utoipa::path(
    post,
    path = "/api/clubs",
    request_body = CreateClubRequest,
    responses(
        (status = 201, description = "Club created", body = ClubView),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 409, description = "Club id already taken", body = ErrorResponse)
    ),
    tag = "clubs"
)]
pub async fn create_club(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateClubRequest>,
) -> Result<(StatusCode, Json<ClubView>), ApiError> {
    require_admin(&user)?;

    let id = payload.id.trim().to_string();
    if id.is_empty() || id.len() > 4 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(sac_core::Error::validation(
            "id",
            "club id must be 1..=4 alphanumeric characters",
        )
        .into());
    }
    if payload.name.trim().is_empty() {
        return Err(sac_core::Error::validation("name", "required").into());
    }

    let domain = parse_domain(&payload.domain)?;
    let member_limit = payload.member_limit.unwrap_or(50);
    if member_limit <= 0 {
        return Err(sac_core::Error::validation(
            "member_limit",
            "member limit must be positive",
        )
        .into());
    }

    if club::Entity::find_by_id(id.clone())
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(sac_core::Error::Conflict(format!("club {} already exists", id)).into());
    }

    let created = state
        .db
        .transaction::<_, club::Model, sac_core::Error>(|txn| {
            let payload = payload.clone();
            let id = id.clone();
            Box::pin(async move {
                let created = club::ActiveModel {
                    id: Set(id.clone()),
                    name: Set(payload.name.trim().to_string()),
                    description: Set(payload.description),
                    domain: Set(domain),
                    member_limit: Set(member_limit),
                    member_count: Set(0),
                    created_at: Set(chrono::Utc::now()),
                }
                .insert(txn)
                .await?;

                for (position, name) in payload.categories.iter().enumerate() {
                    if name.trim().is_empty() {
                        return Err(sac_core::Error::validation(
                            "categories",
                            "category labels cannot be blank",
                        ));
                    }
                    club_category::ActiveModel {
                        club_id: Set(id.clone()),
                        name: Set(name.trim().to_string()),
                        position: Set(position as i32),
                    }
                    .insert(txn)
                    .await?;
                }

                Ok(created)
            })
        })
        .await
        .map_err(sac_core::Error::from)?;

    info!("club {} created", created.id);
    let categories = categories_of(&state, &created.id).await?;
    Ok((StatusCode::CREATED, Json(club_view(created, categories))))
}

/// Delete a club (admin). Refused while projects or a lead reference it.
#[utoipa::path(
    delete,
    path = "/api/clubs/{id}",
    params(
        ("id" = String, Path, description = "Club id")
    ),
    responses(
        (status = 204, description = "Club deleted"),
        (status = 404, description = "Club not found", body = ErrorResponse),
        (status = 409, description = "Projects or leads still reference the club", body = ErrorResponse)
    ),
    tag = "clubs"
)]
pub async fn delete_club(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;

    if club::Entity::find_by_id(id.clone())
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(sac_core::Error::NotFound(format!("club {}", id)).into());
    }

    let projects = project::Entity::find()
        .filter(project::Column::ClubId.eq(id.as_str()))
        .count(&state.db)
        .await?;
    if projects > 0 {
        return Err(sac_core::Error::Conflict(format!(
            "club {} still owns {} project(s)",
            id, projects
        ))
        .into());
    }

    let leads = lead::Entity::find()
        .filter(lead::Column::ClubId.eq(id.as_str()))
        .count(&state.db)
        .await?;
    if leads > 0 {
        return Err(
            sac_core::Error::Conflict(format!("club {} still has a lead assigned", id)).into(),
        );
    }

    club::Entity::delete_by_id(id.clone()).exec(&state.db).await?;

    info!("club {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

/// List projects, optionally for one club
#[utoipa::path(
    get,
    path = "/api/projects",
    params(
        ("club" = Option<String>, Query, description = "Filter by owning club")
    ),
    responses(
        (status = 200, description = "Projects", body = ProjectList)
    ),
    tag = "clubs"
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthUser>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ProjectList>, ApiError> {
    let mut select = project::Entity::find().order_by_asc(project::Column::Id);
    if let Some(ref club_id) = query.club {
        select = select.filter(project::Column::ClubId.eq(club_id.as_str()));
    }

    let projects: Vec<ProjectView> = select
        .all(&state.db)
        .await?
        .into_iter()
        .map(ProjectView::from)
        .collect();

    let total = projects.len();
    Ok(Json(ProjectList { projects, total }))
}

/// Create a project under a club (admin)
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectView),
        (status = 400, description = "Category not offered by the club", body = ErrorResponse),
        (status = 404, description = "Club not found", body = ErrorResponse),
        (status = 409, description = "Project id already taken", body = ErrorResponse)
    ),
    tag = "clubs"
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectView>), ApiError> {
    require_admin(&user)?;

    if payload.id.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(sac_core::Error::validation("id", "id and name are required").into());
    }

    let owner = club::Entity::find_by_id(payload.club_id.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| sac_core::Error::NotFound(format!("club {}", payload.club_id)))?;

    let categories = categories_of(&state, &owner.id).await?;
    if !categories.iter().any(|c| c == &payload.category) {
        return Err(sac_core::Error::validation(
            "category",
            format!("club {} does not offer category {}", owner.id, payload.category),
        )
        .into());
    }

    if project::Entity::find_by_id(payload.id.trim().to_string())
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(
            sac_core::Error::Conflict(format!("project {} already exists", payload.id)).into(),
        );
    }

    let created = project::ActiveModel {
        id: Set(payload.id.trim().to_string()),
        club_id: Set(owner.id.clone()),
        domain: Set(owner.domain),
        category: Set(payload.category),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        rural: Set(payload.rural),
        rural_category: Set(payload.rural_category),
        image_path: Set(payload.image_path),
        member_count: Set(0),
    }
    .insert(&state.db)
    .await?;

    info!("project {} created under club {}", created.id, owner.id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Delete a project (admin). Member profiles fall back to club-only membership.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = String, Path, description = "Project id")
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "clubs"
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;

    if project::Entity::find_by_id(id.clone())
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(sac_core::Error::NotFound(format!("project {}", id)).into());
    }

    project::Entity::delete_by_id(id.clone())
        .exec(&state.db)
        .await?;

    info!("project {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
