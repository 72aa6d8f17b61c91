//! Scripted in-memory service for engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use privmatrix_engine::{
    AccessControlService, BatchOperation, BatchOutcome, EntityFilter, EntityMeta, PageCursor,
    PrivilegeMeta, RecordKind, RecordPage, RecordQuery, RecordRef, ServiceError, ServiceResult,
};

/// One recorded record-query call.
#[derive(Debug, Clone)]
pub struct RecordQueryLog {
    pub kind: RecordKind,
    pub root_only: bool,
    pub business_unit: Option<Uuid>,
    pub cursor: Option<String>,
}

/// Everything the fake has been asked to do.
#[derive(Debug, Default)]
pub struct CallLog {
    pub entity_queries: usize,
    pub record_queries: Vec<RecordQueryLog>,
    pub privilege_queries: Vec<String>,
    /// Sizes of submitted batches, in call order.
    pub batch_sizes: Vec<usize>,
    /// Operations of every submitted batch, flattened in call order.
    pub submitted_operations: Vec<BatchOperation>,
}

/// Scripted [`AccessControlService`] with call counting.
#[derive(Default)]
pub struct FakeService {
    pub entities: Vec<EntityMeta>,
    /// Pages served for business-unit queries, in order.
    pub business_unit_pages: Vec<Vec<RecordRef>>,
    /// Pages served for role queries, in order.
    pub role_pages: Vec<Vec<RecordRef>>,
    /// Privilege records per entity logical name; absent entities error.
    pub privileges: HashMap<String, Vec<PrivilegeMeta>>,
    /// Fail entity queries with a transport error.
    pub fail_entities: bool,
    /// Fail the Nth batch call (1-based) with a transport error.
    pub fail_batch_at: Option<usize>,
    /// Cancel this token when serving the record page with this index.
    pub cancel_on_page: Option<(usize, CancellationToken)>,
    pub calls: Mutex<CallLog>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(mut self, entities: Vec<EntityMeta>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_business_unit_pages(mut self, pages: Vec<Vec<RecordRef>>) -> Self {
        self.business_unit_pages = pages;
        self
    }

    pub fn with_role_pages(mut self, pages: Vec<Vec<RecordRef>>) -> Self {
        self.role_pages = pages;
        self
    }

    pub fn with_privileges(mut self, logical_name: &str, records: Vec<PrivilegeMeta>) -> Self {
        self.privileges.insert(logical_name.to_string(), records);
        self
    }
}

/// A record with a deterministic id derived from `seed`.
pub fn record(seed: u128, name: &str) -> RecordRef {
    RecordRef {
        id: Uuid::from_u128(seed),
        name: Some(name.to_string()),
    }
}

/// A record carrying no name, for fallback tests.
pub fn record_nameless(seed: u128) -> RecordRef {
    RecordRef {
        id: Uuid::from_u128(seed),
        name: None,
    }
}

/// An entity-metadata record.
pub fn entity_meta(logical_name: &str, display_name: Option<&str>) -> EntityMeta {
    EntityMeta {
        logical_name: logical_name.to_string(),
        display_name: display_name.map(String::from),
    }
}

/// Privilege records covering the given column names.
pub fn privilege_records(names: &[&str], base: u128) -> Vec<PrivilegeMeta> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| PrivilegeMeta::new(*name, Uuid::from_u128(base + i as u128)))
        .collect()
}

#[async_trait]
impl AccessControlService for FakeService {
    async fn query_entities(&self, _filter: &EntityFilter) -> ServiceResult<Vec<EntityMeta>> {
        self.calls.lock().unwrap().entity_queries += 1;
        if self.fail_entities {
            return Err(ServiceError::Transport("entity query refused".into()));
        }
        Ok(self.entities.clone())
    }

    async fn query_records(
        &self,
        query: &RecordQuery,
        cursor: Option<&PageCursor>,
    ) -> ServiceResult<RecordPage> {
        self.calls.lock().unwrap().record_queries.push(RecordQueryLog {
            kind: query.kind,
            root_only: query.root_only,
            business_unit: query.business_unit,
            cursor: cursor.map(|c| c.as_str().to_string()),
        });

        let pages = match query.kind {
            RecordKind::BusinessUnit => &self.business_unit_pages,
            RecordKind::Role => &self.role_pages,
        };
        let index = match cursor {
            None => 0,
            Some(c) => c
                .as_str()
                .parse::<usize>()
                .map_err(|_| ServiceError::InvalidResponse("bad cursor".into()))?,
        };

        if let Some((cancel_at, token)) = &self.cancel_on_page {
            if index == *cancel_at {
                token.cancel();
            }
        }

        let records = pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 < pages.len() {
            Some(PageCursor::new((index + 1).to_string()))
        } else {
            None
        };
        Ok(RecordPage { records, next })
    }

    async fn query_entity_privileges(
        &self,
        logical_name: &str,
    ) -> ServiceResult<Vec<PrivilegeMeta>> {
        self.calls
            .lock()
            .unwrap()
            .privilege_queries
            .push(logical_name.to_string());
        self.privileges
            .get(logical_name)
            .cloned()
            .ok_or_else(|| ServiceError::Api {
                code: "ObjectDoesNotExist".into(),
                message: format!("entity {logical_name} not found"),
            })
    }

    async fn execute_batch(
        &self,
        operations: &[BatchOperation],
        _continue_on_error: bool,
    ) -> ServiceResult<BatchOutcome> {
        let mut calls = self.calls.lock().unwrap();
        calls.batch_sizes.push(operations.len());
        if Some(calls.batch_sizes.len()) == self.fail_batch_at {
            return Err(ServiceError::Transport("batch call refused".into()));
        }
        calls.submitted_operations.extend_from_slice(operations);
        Ok(BatchOutcome {
            operations_submitted: operations.len(),
        })
    }
}
