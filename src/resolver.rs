//! Organization and network name resolution

use crate::error::AutotagError;
use dashboard::{Backend, ProductType};

/// Case-insensitive exact name comparison
fn names_match(candidate: &str, wanted: &str) -> bool {
    candidate.to_lowercase() == wanted.to_lowercase()
}

/// Resolve an organization name and a Systems Manager network name to the
/// network id.
///
/// The first match wins when several organizations or networks share a name.
pub fn resolve_network(
    backend: &dyn Backend,
    org_name: &str,
    network_name: &str,
) -> Result<String, AutotagError> {
    let orgs = backend.list_organizations()?;
    let org = orgs
        .iter()
        .find(|o| names_match(&o.name, org_name))
        .ok_or_else(|| AutotagError::OrganizationNotFound(org_name.to_string()))?;
    log::debug!("Organization '{}' has id {}", org.name, org.id);

    let networks = backend.list_networks(&org.id, ProductType::SystemsManager)?;
    let network = networks
        .iter()
        .find(|n| names_match(&n.name, network_name))
        .ok_or_else(|| AutotagError::NetworkNotFound {
            network: network_name.to_string(),
            organization: org_name.to_string(),
        })?;

    Ok(network.id.clone())
}
