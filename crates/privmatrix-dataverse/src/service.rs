//! Dataverse Web API implementation of the engine's service boundary.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use privmatrix_engine::{
    AccessControlService, BatchOperation, BatchOutcome, EntityFilter, EntityMeta, PageCursor,
    PrivilegeMeta, RecordKind, RecordPage, RecordQuery, RecordRef, ServiceError, ServiceResult,
};

use crate::auth::TokenCache;
use crate::batch::{batch_boundary, render_batch};
use crate::client::{ODataPage, WebApiClient};
use crate::config::{DataverseConfig, DataverseCredentials};
use crate::error::DataverseResult;

/// Entity-definition fields to select.
const ENTITY_SELECT: &str = "LogicalName,DisplayName";
/// Business-unit record columns.
const BUSINESS_UNIT_SELECT: &str = "businessunitid,name";
/// Role record columns.
const ROLE_SELECT: &str = "roleid,name";

/// Wire shape of an entity definition.
#[derive(Debug, Deserialize)]
struct EntityDefinitionRecord {
    #[serde(rename = "LogicalName")]
    logical_name: String,
    #[serde(rename = "DisplayName")]
    display_name: Option<LabelBundle>,
}

#[derive(Debug, Deserialize)]
struct LabelBundle {
    #[serde(rename = "UserLocalizedLabel")]
    user_localized_label: Option<LocalizedLabel>,
}

#[derive(Debug, Deserialize)]
struct LocalizedLabel {
    #[serde(rename = "Label")]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BusinessUnitRecord {
    #[serde(rename = "businessunitid")]
    id: Uuid,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleRecord {
    #[serde(rename = "roleid")]
    id: Uuid,
    name: Option<String>,
}

/// Entity definition projected to its privilege list.
#[derive(Debug, Deserialize)]
struct PrivilegesEnvelope {
    #[serde(rename = "Privileges")]
    privileges: Vec<PrivilegeRecord>,
}

#[derive(Debug, Deserialize)]
struct PrivilegeRecord {
    #[serde(rename = "PrivilegeId")]
    privilege_id: Uuid,
    #[serde(rename = "PrivilegeType")]
    privilege_type: String,
}

/// Dataverse-backed access-control service.
#[derive(Debug)]
pub struct DataverseService {
    client: WebApiClient,
}

impl DataverseService {
    /// Creates a service for one organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        config: DataverseConfig,
        credentials: DataverseCredentials,
    ) -> DataverseResult<Self> {
        let token_cache = Arc::new(TokenCache::new(&config, credentials));
        let client = WebApiClient::new(&config, token_cache)?;
        Ok(Self { client })
    }

    fn entity_definitions_url(&self, filter: &EntityFilter) -> String {
        let mut clauses = Vec::new();
        if filter.customizable_only {
            clauses.push("IsCustomizable/Value eq true".to_string());
        }
        if filter.exclude_activities {
            clauses.push("IsActivity eq false".to_string());
        }
        if filter.exclude_intersects {
            clauses.push("IsIntersect eq false".to_string());
        }

        let mut url = format!(
            "{}/EntityDefinitions?$select={ENTITY_SELECT}",
            self.client.api_base()
        );
        if !clauses.is_empty() {
            url.push_str("&$filter=");
            url.push_str(&clauses.join(" and "));
        }
        url
    }

    fn record_query_url(&self, query: &RecordQuery) -> String {
        match query.kind {
            RecordKind::BusinessUnit => format!(
                "{}/businessunits?$select={BUSINESS_UNIT_SELECT}",
                self.client.api_base()
            ),
            RecordKind::Role => {
                let mut clauses = Vec::new();
                if query.root_only {
                    clauses.push("_parentroleid_value eq null".to_string());
                }
                if let Some(business_unit) = query.business_unit {
                    clauses.push(format!("_businessunitid_value eq {business_unit}"));
                }

                let mut url = format!("{}/roles?$select={ROLE_SELECT}", self.client.api_base());
                if !clauses.is_empty() {
                    url.push_str("&$filter=");
                    url.push_str(&clauses.join(" and "));
                }
                url
            }
        }
    }
}

#[async_trait]
impl AccessControlService for DataverseService {
    #[instrument(skip(self))]
    async fn query_entities(&self, filter: &EntityFilter) -> ServiceResult<Vec<EntityMeta>> {
        let mut metas = Vec::new();
        let mut next = Some(self.entity_definitions_url(filter));

        while let Some(url) = next {
            let page: ODataPage<EntityDefinitionRecord> = self
                .client
                .get(&url, None)
                .await
                .map_err(ServiceError::from)?;

            metas.extend(page.value.into_iter().map(|record| EntityMeta {
                logical_name: record.logical_name,
                display_name: record
                    .display_name
                    .and_then(|labels| labels.user_localized_label)
                    .and_then(|label| label.label),
            }));
            next = page.next_link;
        }

        info!(count = metas.len(), "entity definitions retrieved");
        Ok(metas)
    }

    #[instrument(skip(self, query), fields(kind = ?query.kind))]
    async fn query_records(
        &self,
        query: &RecordQuery,
        cursor: Option<&PageCursor>,
    ) -> ServiceResult<RecordPage> {
        // A continuation cursor is the service-issued absolute nextLink.
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => self.record_query_url(query),
        };

        match query.kind {
            RecordKind::BusinessUnit => {
                let page: ODataPage<BusinessUnitRecord> = self
                    .client
                    .get(&url, Some(query.page_size))
                    .await
                    .map_err(ServiceError::from)?;
                Ok(RecordPage {
                    records: page
                        .value
                        .into_iter()
                        .map(|record| RecordRef {
                            id: record.id,
                            name: record.name,
                        })
                        .collect(),
                    next: page.next_link.map(PageCursor::new),
                })
            }
            RecordKind::Role => {
                let page: ODataPage<RoleRecord> = self
                    .client
                    .get(&url, Some(query.page_size))
                    .await
                    .map_err(ServiceError::from)?;
                Ok(RecordPage {
                    records: page
                        .value
                        .into_iter()
                        .map(|record| RecordRef {
                            id: record.id,
                            name: record.name,
                        })
                        .collect(),
                    next: page.next_link.map(PageCursor::new),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn query_entity_privileges(
        &self,
        logical_name: &str,
    ) -> ServiceResult<Vec<PrivilegeMeta>> {
        let url = format!(
            "{}/EntityDefinitions(LogicalName='{logical_name}')?$select=Privileges",
            self.client.api_base()
        );

        let envelope: PrivilegesEnvelope = self
            .client
            .get(&url, None)
            .await
            .map_err(ServiceError::from)?;

        Ok(envelope
            .privileges
            .into_iter()
            .map(|record| PrivilegeMeta::new(record.privilege_type, record.privilege_id))
            .collect())
    }

    #[instrument(skip(self, operations), fields(operations = operations.len()))]
    async fn execute_batch(
        &self,
        operations: &[BatchOperation],
        continue_on_error: bool,
    ) -> ServiceResult<BatchOutcome> {
        if operations.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let boundary = batch_boundary();
        let body = render_batch(self.client.api_base(), &boundary, operations)
            .map_err(ServiceError::from)?;
        let url = format!("{}/$batch", self.client.api_base());

        self.client
            .post_batch(&url, &boundary, body, continue_on_error)
            .await
            .map_err(ServiceError::from)?;

        info!(operations = operations.len(), "batch submitted");
        Ok(BatchOutcome {
            operations_submitted: operations.len(),
        })
    }
}
