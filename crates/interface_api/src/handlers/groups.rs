//! Group handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::GroupId;
use domain_groups::{BalanceSummary, GroupOverview, MemberTotals, SettlementSuggestion};

use crate::dto::groups::*;
use crate::{error::ApiError, AppState};

/// Creates a new group
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    request.validate()?;

    let group = state.service.create_group(&request.name, request.members).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(&group))))
}

/// Lists groups, newest first
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = state.service.list_groups().await?;
    Ok(Json(groups.iter().map(GroupResponse::from).collect()))
}

/// Gets a group by ID
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = state.service.get_group(parse_group_id(&id)?).await?;
    Ok(Json(GroupResponse::from(&group)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_group(parse_group_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Adds a member with a zero balance
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    request.validate()?;

    let group = state
        .service
        .add_member(parse_group_id(&id)?, &request.member)
        .await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(&group))))
}

/// Records an expense
pub async fn add_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<EntryCreatedResponse>), ApiError> {
    request.validate()?;

    let (group, entry_id) = state
        .service
        .add_expense(parse_group_id(&id)?, request.into_expense())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(EntryCreatedResponse {
            entry_id,
            group: GroupResponse::from(&group),
        }),
    ))
}

/// Records a settlement
pub async fn settle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SettleRequest>,
) -> Result<(StatusCode, Json<EntryCreatedResponse>), ApiError> {
    request.validate()?;

    let (group, entry_id) = state
        .service
        .settle(parse_group_id(&id)?, &request.payer, &request.receiver, request.amount)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(EntryCreatedResponse {
            entry_id,
            group: GroupResponse::from(&group),
        }),
    ))
}

/// Rebuilds balances from the entry log
pub async fn recalculate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecalculateResponse>, ApiError> {
    let result = state.service.recalculate(parse_group_id(&id)?).await?;
    Ok(Json(RecalculateResponse {
        drift: result.drift,
        group: GroupResponse::from(&result.group),
    }))
}

pub async fn get_overview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GroupOverview>, ApiError> {
    let overview = state.service.overview(parse_group_id(&id)?).await?;
    Ok(Json(overview))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path((id, member)): Path<(String, String)>,
) -> Result<Json<BalanceSummary>, ApiError> {
    let summary = state
        .service
        .balance_summary(parse_group_id(&id)?, &member)
        .await?;
    Ok(Json(summary))
}

/// Suggested settlement for a member; `null` when they owe nothing
pub async fn get_suggestion(
    State(state): State<AppState>,
    Path((id, member)): Path<(String, String)>,
) -> Result<Json<Option<SettlementSuggestion>>, ApiError> {
    let suggestion = state
        .service
        .suggest_settlement(parse_group_id(&id)?, &member)
        .await?;
    Ok(Json(suggestion))
}

/// What a member owes and is owed across all groups
pub async fn get_member_totals(
    State(state): State<AppState>,
    Path(member): Path<String>,
) -> Result<Json<MemberTotals>, ApiError> {
    let totals = state.service.member_totals(&member).await?;
    Ok(Json(totals))
}

fn parse_group_id(raw: &str) -> Result<GroupId, ApiError> {
    GroupId::from_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid group id '{}'", raw)))
}
