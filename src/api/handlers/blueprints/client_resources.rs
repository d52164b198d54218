//! Upsert of blueprint `client-resources` entries.
//!
//! Entries are keyed by their nice id within the organization. Each entry is
//! bound to a site, named either by the entry itself or by the default site of
//! the import. A nice id that already lives on a different site than the
//! default one is rejected instead of being silently moved.

use tracing::{error, info};

use super::{
    error::BlueprintError,
    storage::ResourceTransaction,
    types::{BlueprintConfig, ClientResourceResult, Site, SiteResourceValues},
};

/// Apply every `client-resources` entry of `config` to `org_id`.
///
/// Stops at the first failing entry; run it inside a store transaction so the
/// entries applied before the failure are discarded too.
///
/// # Errors
/// Returns [`BlueprintError::TargetSiteRequired`] when an entry names no site
/// and no default site is given, [`BlueprintError::SiteNotFound`] when the site
/// does not exist in the organization, and
/// [`BlueprintError::DuplicateResource`] when the nice id is already used on
/// another site.
pub fn update_client_resources<T>(
    org_id: &str,
    config: &BlueprintConfig,
    trx: &mut T,
    site_id: Option<i64>,
) -> Result<Vec<ClientResourceResult>, BlueprintError>
where
    T: ResourceTransaction + ?Sized,
{
    let mut results = Vec::with_capacity(config.client_resources.len());

    for (nice_id, spec) in &config.client_resources {
        let existing = trx.resource_by_nice_id(org_id, nice_id);
        let site = resolve_site(trx, org_id, spec.site.as_deref(), site_id)?;

        if let (Some(existing), Some(site_id)) = (&existing, site_id) {
            if existing.site_id != site_id {
                return Err(duplicate_resource(
                    trx,
                    nice_id,
                    existing.site_id,
                    site_id,
                ));
            }
        }

        let values = SiteResourceValues {
            name: spec
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| nice_id.clone()),
            site_id: site.site_id,
            proxy_port: spec.proxy_port,
            destination_ip: spec.hostname.clone(),
            destination_port: spec.internal_port,
            protocol: spec.protocol,
        };

        let resource = match existing {
            Some(existing) => trx
                .update_resource(existing.site_resource_id, values)
                .ok_or(BlueprintError::ResourceMissing(existing.site_resource_id))?,
            None => {
                let resource = trx.insert_resource(org_id, nice_id, values);
                info!(
                    "Created new client resource {} ({}) for org {}",
                    resource.name, resource.site_resource_id, org_id
                );
                resource
            }
        };

        results.push(ClientResourceResult { resource });
    }

    Ok(results)
}

fn resolve_site<T>(
    trx: &T,
    org_id: &str,
    site_nice_id: Option<&str>,
    site_id: Option<i64>,
) -> Result<Site, BlueprintError>
where
    T: ResourceTransaction + ?Sized,
{
    let not_found = |site: String| BlueprintError::SiteNotFound {
        site,
        org_id: org_id.to_string(),
    };

    match (site_nice_id.filter(|nice_id| !nice_id.is_empty()), site_id) {
        (Some(nice_id), _) => trx
            .site_by_nice_id(org_id, nice_id)
            .ok_or_else(|| not_found(nice_id.to_string())),
        // A bare site id must still belong to the organization being imported.
        (None, Some(site_id)) => trx
            .site_by_id(site_id)
            .filter(|site| site.org_id == org_id)
            .ok_or_else(|| not_found(site_id.to_string())),
        (None, None) => Err(BlueprintError::TargetSiteRequired),
    }
}

fn duplicate_resource<T>(
    trx: &T,
    nice_id: &str,
    existing_site_id: i64,
    current_site_id: i64,
) -> BlueprintError
where
    T: ResourceTransaction + ?Sized,
{
    let current_site = trx.site_by_id(current_site_id);
    let existing_site = trx.site_by_id(existing_site_id);

    let existing_label = existing_site
        .as_ref()
        .map_or("unknown", Site::label)
        .to_string();
    let current_label = current_site
        .as_ref()
        .map_or("unknown", Site::label)
        .to_string();
    let suggestion = format!(
        "{nice_id}-{}",
        current_site
            .as_ref()
            .map_or("site", |site| site.nice_id.as_str())
    );

    error!(
        "Duplicate client resource name detected: Resource '{nice_id}' (nice ID) already exists on site [{existing_label}], but is being configured again on site [{current_label}]. Each client resource name must be unique across all sites. Please rename the resource to avoid conflicts (e.g., '{suggestion}')."
    );

    BlueprintError::DuplicateResource {
        nice_id: nice_id.to_string(),
        existing_site: existing_label,
        current_site: current_label,
        suggestion,
    }
}
