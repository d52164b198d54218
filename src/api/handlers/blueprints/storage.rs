//! Site and client-resource storage.
//!
//! Imports run against a [`ResourceTransaction`]; [`BlueprintStore::transaction`]
//! commits only when the closure succeeds. [`MemoryStore`] stages a copy of the
//! state and swaps it in on success, so a failed import leaves no partial writes.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{
    error::BlueprintError,
    types::{Site, SiteResource, SiteResourceValues},
};

/// Reads and writes performed inside one import.
pub trait ResourceTransaction {
    fn site_by_nice_id(&self, org_id: &str, nice_id: &str) -> Option<Site>;

    fn site_by_id(&self, site_id: i64) -> Option<Site>;

    fn resource_by_nice_id(&self, org_id: &str, nice_id: &str) -> Option<SiteResource>;

    fn insert_resource(
        &mut self,
        org_id: &str,
        nice_id: &str,
        values: SiteResourceValues,
    ) -> SiteResource;

    fn update_resource(
        &mut self,
        site_resource_id: i64,
        values: SiteResourceValues,
    ) -> Option<SiteResource>;
}

pub trait BlueprintStore {
    type Transaction: ResourceTransaction;

    /// Run `f` atomically: its writes are kept only if it returns `Ok`.
    ///
    /// # Errors
    /// Propagates the error returned by `f`.
    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut Self::Transaction) -> Result<T, BlueprintError>,
    ) -> Result<T, BlueprintError>;
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    sites: BTreeMap<i64, Site>,
    resources: BTreeMap<i64, SiteResource>,
    last_site_id: i64,
    last_resource_id: i64,
}

impl StoreState {
    fn insert_site(&mut self, org_id: &str, nice_id: &str, name: Option<String>) -> Site {
        self.last_site_id += 1;
        let site = Site {
            site_id: self.last_site_id,
            org_id: org_id.to_string(),
            nice_id: nice_id.to_string(),
            name,
        };
        self.sites.insert(site.site_id, site.clone());
        site
    }
}

impl ResourceTransaction for StoreState {
    fn site_by_nice_id(&self, org_id: &str, nice_id: &str) -> Option<Site> {
        self.sites
            .values()
            .find(|site| site.org_id == org_id && site.nice_id == nice_id)
            .cloned()
    }

    fn site_by_id(&self, site_id: i64) -> Option<Site> {
        self.sites.get(&site_id).cloned()
    }

    fn resource_by_nice_id(&self, org_id: &str, nice_id: &str) -> Option<SiteResource> {
        self.resources
            .values()
            .find(|resource| resource.org_id == org_id && resource.nice_id == nice_id)
            .cloned()
    }

    fn insert_resource(
        &mut self,
        org_id: &str,
        nice_id: &str,
        values: SiteResourceValues,
    ) -> SiteResource {
        self.last_resource_id += 1;
        let resource = SiteResource {
            site_resource_id: self.last_resource_id,
            org_id: org_id.to_string(),
            site_id: values.site_id,
            nice_id: nice_id.to_string(),
            name: values.name,
            proxy_port: values.proxy_port,
            destination_ip: values.destination_ip,
            destination_port: values.destination_port,
            protocol: values.protocol,
        };
        self.resources
            .insert(resource.site_resource_id, resource.clone());
        resource
    }

    fn update_resource(
        &mut self,
        site_resource_id: i64,
        values: SiteResourceValues,
    ) -> Option<SiteResource> {
        let resource = self.resources.get_mut(&site_resource_id)?;
        resource.name = values.name;
        resource.site_id = values.site_id;
        resource.proxy_port = values.proxy_port;
        resource.destination_ip = values.destination_ip;
        resource.destination_port = values.destination_port;
        resource.protocol = values.protocol;
        Some(resource.clone())
    }
}

/// In-process store for sites and client resources.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic mid-transaction never reaches the committed state, so the data is intact.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a site; nice ids are unique per organization.
    ///
    /// # Errors
    /// Returns [`BlueprintError::DuplicateSite`] if the nice id is taken.
    pub fn create_site(
        &self,
        org_id: &str,
        nice_id: &str,
        name: Option<String>,
    ) -> Result<Site, BlueprintError> {
        let mut state = self.lock();
        if state.site_by_nice_id(org_id, nice_id).is_some() {
            return Err(BlueprintError::DuplicateSite {
                nice_id: nice_id.to_string(),
                org_id: org_id.to_string(),
            });
        }
        Ok(state.insert_site(org_id, nice_id, name))
    }

    #[must_use]
    pub fn list_sites(&self, org_id: &str) -> Vec<Site> {
        self.lock()
            .sites
            .values()
            .filter(|site| site.org_id == org_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn list_resources(&self, org_id: &str) -> Vec<SiteResource> {
        self.lock()
            .resources
            .values()
            .filter(|resource| resource.org_id == org_id)
            .cloned()
            .collect()
    }
}

impl BlueprintStore for MemoryStore {
    type Transaction = StoreState;

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut Self::Transaction) -> Result<T, BlueprintError>,
    ) -> Result<T, BlueprintError> {
        let mut state = self.lock();
        let mut staged = state.clone();
        let value = f(&mut staged)?;
        *state = staged;
        Ok(value)
    }
}
