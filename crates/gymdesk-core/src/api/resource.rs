//! Generic CRUD service for backend resources.
//!
//! Every resource follows the same REST layout:
//!
//! | Operation | Request |
//! |---|---|
//! | list for a gym | `GET /{path}/gym/{gymId}?page=&limit=&search=` |
//! | list everything | `GET /{path}?page=&limit=&search=` |
//! | get | `GET /{path}/{id}` |
//! | create | `POST /{path}` |
//! | update | `PATCH /{path}/{id}` |
//! | delete | `DELETE /{path}/{id}` |

use std::marker::PhantomData;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;
use validator::Validate;

use crate::forms::FormSpec;
use crate::models::Id;
use crate::pagination::{Page, PageQuery, PageResponse};

use super::ApiClient;

/// A backend entity with a standard CRUD endpoint set.
pub trait Resource: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Path segment, e.g. `members`
    const PATH: &'static str;
    /// Singular display name, e.g. `Member`
    const NAME: &'static str;

    /// Create/update payload
    type Draft: Serialize + DeserializeOwned + Validate + Send + Sync + 'static;

    fn id(&self) -> Id;

    /// Field layout of the create/edit form
    fn form() -> FormSpec;
}

/// Service handle for one resource, borrowed from an `ApiClient`.
pub struct ResourceApi<'a, R> {
    api: &'a ApiClient,
    _resource: PhantomData<R>,
}

impl<'a, R: Resource> ResourceApi<'a, R> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    pub(crate) fn client(&self) -> &'a ApiClient {
        self.api
    }

    fn item_path(id: Id) -> String {
        format!("{}/{}", R::PATH, id)
    }

    /// One page of this resource within a gym
    pub async fn list(&self, gym_id: Id, query: &PageQuery) -> Result<Page<R>> {
        let path = format!("{}/gym/{}", R::PATH, gym_id);
        let response: PageResponse<R> = self.api.get_query(&path, &query.to_pairs()).await?;
        Ok(response.into_page(query))
    }

    /// One page of this resource across all gyms
    pub async fn list_all(&self, query: &PageQuery) -> Result<Page<R>> {
        let response: PageResponse<R> = self.api.get_query(R::PATH, &query.to_pairs()).await?;
        Ok(response.into_page(query))
    }

    pub async fn get(&self, id: Id) -> Result<R> {
        self.api.get(&Self::item_path(id)).await
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<R> {
        let created: R = self.api.post(R::PATH, draft).await?;
        info!(resource = R::NAME, id = created.id(), "Created");
        Ok(created)
    }

    /// PATCH a prepared body; edit forms send their draft plus explicit nulls
    pub async fn update<B: Serialize + ?Sized>(&self, id: Id, body: &B) -> Result<R> {
        let updated: R = self.api.patch(&Self::item_path(id), body).await?;
        info!(resource = R::NAME, id = id, "Updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Id) -> Result<()> {
        self.api.delete(&Self::item_path(id)).await?;
        info!(resource = R::NAME, id = id, "Deleted");
        Ok(())
    }
}
