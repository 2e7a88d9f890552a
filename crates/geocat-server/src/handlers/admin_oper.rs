//! `metadata.admin` handler: the privilege matrix of one metadata record.
//!
//! The record is addressed by `id` or `uuid` (`id` wins when both are
//! present). The rendered document keeps the legacy field names, and
//! every flag is the string `"true"` or `"false"`.

use std::sync::Arc;

use geocat_domain::{
    AccessProvider, DomainError, PermissionReport, PermissionResolver, Requester,
};
use geocat_storage::{CatalogStore, MetadataId};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{HandlerError, HandlerResult};

/// Request parameters.
#[derive(Debug, Clone, Default)]
pub struct AdminOperParams {
    pub id: Option<String>,
    pub uuid: Option<String>,
}

impl AdminOperParams {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            uuid: None,
        }
    }

    pub fn by_uuid(uuid: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: Some(uuid.into()),
        }
    }
}

/// One entry of the operation catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationElement {
    pub id: String,
    pub name: String,
    pub isreserved: String,
}

/// Grant flag of one operation inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperElement {
    pub id: String,
    pub on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupElement {
    pub id: String,
    pub name: String,
    #[serde(rename = "userGroup")]
    pub user_group: String,
    #[serde(rename = "userProfile")]
    pub user_profile: Vec<String>,
    pub oper: Vec<OperElement>,
}

/// The `response` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOperResponse {
    pub id: String,
    pub operations: Vec<OperationElement>,
    pub groups: Vec<GroupElement>,
    pub ownerid: String,
    pub owner: String,
    #[serde(rename = "groupOwner")]
    pub group_owner: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    response: &'a AdminOperResponse,
}

fn flag(value: bool) -> String {
    let flag = if value { "true" } else { "false" };
    flag.to_string()
}

impl AdminOperResponse {
    pub fn render(report: &PermissionReport) -> Self {
        let operations = report
            .operations
            .iter()
            .map(|op| OperationElement {
                id: op.id.to_string(),
                name: op.name.clone(),
                isreserved: flag(op.reserved),
            })
            .collect();

        let groups = report
            .groups
            .iter()
            .map(|g| GroupElement {
                id: g.group.id.to_string(),
                name: g.group.name.clone(),
                user_group: flag(g.is_user_group),
                user_profile: g.user_profiles.iter().map(|p| p.to_string()).collect(),
                oper: g
                    .operation_grants
                    .iter()
                    .map(|grant| OperElement {
                        id: grant.operation_id.to_string(),
                        on: flag(grant.granted),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: report.metadata_id.to_string(),
            operations,
            groups,
            ownerid: report.owner_id.to_string(),
            owner: flag(report.is_owner),
            group_owner: report
                .group_owner
                .map(|g| g.to_string())
                .unwrap_or_default(),
        }
    }

    /// `{"response": {...}}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "response": self })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Envelope { response: self })
    }
}

pub struct GetAdminOperHandler<S, A> {
    store: Arc<S>,
    resolver: PermissionResolver<S, A>,
}

impl<S, A> GetAdminOperHandler<S, A>
where
    S: CatalogStore,
    A: AccessProvider,
{
    pub fn new(store: Arc<S>, access: Arc<A>) -> Self {
        let resolver = PermissionResolver::new(Arc::clone(&store), access);
        Self { store, resolver }
    }

    #[instrument(skip(self, requester))]
    pub async fn exec(
        &self,
        params: &AdminOperParams,
        requester: &Requester,
    ) -> HandlerResult<AdminOperResponse> {
        let metadata_id = self.metadata_id(params).await?;
        let report = self.resolver.resolve(metadata_id, requester).await?;
        Ok(AdminOperResponse::render(&report))
    }

    async fn metadata_id(&self, params: &AdminOperParams) -> HandlerResult<MetadataId> {
        if let Some(id) = params.id.as_deref().filter(|s| !s.trim().is_empty()) {
            return id.parse().map_err(|_| {
                HandlerError::Domain(DomainError::InvalidIdentifier {
                    value: id.to_string(),
                })
            });
        }

        let uuid = params
            .uuid
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(HandlerError::MissingParameter { name: "id" })?;

        match self.store.find_metadata_by_uuid(uuid.trim()).await? {
            Some(metadata) => Ok(metadata.id),
            None => {
                debug!(uuid, "no metadata with uuid");
                Err(HandlerError::Domain(DomainError::MetadataNotFound {
                    metadata_id: uuid.to_string(),
                }))
            }
        }
    }
}
