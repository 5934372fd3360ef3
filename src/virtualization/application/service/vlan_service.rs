use crate::core::{
    domain::{
        error::{InventoryError, InventoryResult, ValidationError},
        model::{
            vlan::{Vlan, VlanGroupScope, VlanTranslationRule},
            vm_interface::{InterfaceVlan, VmInterface},
        },
        value_object::{VirtualMachineId, VlanId, VlanTranslationPolicyId, VmInterfaceId},
    },
    infrastructure::EntityStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves the VLANs and translation rules that apply to an interface.
pub struct VlanService {
    store: Arc<dyn EntityStore>,
}

impl VlanService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// The untagged VLAN (if any) followed by every tagged VLAN in relation
    /// order.
    ///
    /// Stored values are surfaced as they are: a VLAN present both as
    /// untagged and tagged is emitted twice, once per flag. Use
    /// [`validate_vlan_assignment`](Self::validate_vlan_assignment) to reject
    /// that configuration at write time.
    ///
    /// Tagged VLANs the store does not return (hidden from the caller) are
    /// left out. A missing untagged VLAN is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn effective_vlans(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<Vec<InterfaceVlan>> {
        let iface = self.require_interface(interface_id).await?;
        let vlans = self.vlans_of(&iface).await?;

        let mut effective = Vec::with_capacity(iface.tagged_vlans.len() + 1);
        if let Some(untagged) = iface.untagged_vlan {
            effective.push(InterfaceVlan {
                vlan: lookup(&vlans, untagged)?,
                tagged: false,
            });
        }
        for tagged in &iface.tagged_vlans {
            match vlans.get(tagged) {
                Some(vlan) => effective.push(InterfaceVlan {
                    vlan: vlan.clone(),
                    tagged: true,
                }),
                None => debug!(vlan = %tagged, "tagged VLAN not visible, skipped"),
            }
        }
        Ok(effective)
    }

    /// Rules of the interface's translation policy ordered by
    /// `(local_vid, remote_vid)`; empty when no policy is set.
    #[instrument(skip(self))]
    pub async fn translation_rules(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<Vec<VlanTranslationRule>> {
        let iface = self.require_interface(interface_id).await?;
        let Some(policy_id) = iface.vlan_translation_policy else {
            return Ok(Vec::new());
        };

        let policy = self
            .store
            .translation_policy(policy_id)
            .await?
            .ok_or_else(|| InventoryError::not_found(VlanTranslationPolicyId::KIND, policy_id))?;
        let mut rules = policy.rules;
        rules.sort_by_key(|rule| (rule.local_vid, rule.remote_vid));
        Ok(rules)
    }

    /// Checks an interface's VLAN assignment for consistency.
    ///
    /// Fails with a validation error when the untagged VLAN is also tagged,
    /// or when an assigned VLAN belongs to a group scoped to a cluster (or
    /// cluster group) other than the one the interface's VM lives in.
    #[instrument(skip(self))]
    pub async fn validate_vlan_assignment(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<()> {
        let iface = self.require_interface(interface_id).await?;

        if let Some(untagged) = iface.untagged_vlan {
            if iface.tagged_vlans.contains(&untagged) {
                return Err(ValidationError::ConstraintViolation(format!(
                    "VLAN {} is assigned to interface {} as both untagged and tagged",
                    untagged, interface_id
                ))
                .into());
            }
        }

        let vm = self
            .store
            .virtual_machine(iface.virtual_machine)
            .await?
            .ok_or_else(|| InventoryError::not_found(VirtualMachineId::KIND, iface.virtual_machine))?;
        let cluster = match vm.cluster {
            Some(id) => self.store.cluster(id).await?,
            None => None,
        };

        let vlans = self.vlans_of(&iface).await?;
        let mut ids: Vec<VlanId> = vlans.keys().copied().collect();
        ids.sort();
        for id in ids {
            let vlan = lookup(&vlans, id)?;
            let Some(group_id) = vlan.group else {
                continue;
            };
            let Some(group) = self.store.vlan_group(group_id).await? else {
                continue;
            };
            let allowed = match group.scope {
                None => true,
                Some(VlanGroupScope::Cluster(scope)) => vm.cluster == Some(scope),
                Some(VlanGroupScope::ClusterGroup(scope)) => {
                    cluster.as_ref().and_then(|c| c.group) == Some(scope)
                }
            };
            if !allowed {
                return Err(ValidationError::Field {
                    field: "vlan".to_string(),
                    message: format!(
                        "VLAN {} ({}) belongs to group '{}' which is not available to virtual machine {}",
                        vlan.vid, vlan.name, group.name, vm.name
                    ),
                }
                .into());
            }
        }

        debug!(%interface_id, "VLAN assignment is consistent");
        Ok(())
    }

    async fn require_interface(&self, id: VmInterfaceId) -> InventoryResult<VmInterface> {
        self.store
            .interface(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(VmInterfaceId::KIND, id))
    }

    async fn vlans_of(&self, iface: &VmInterface) -> InventoryResult<HashMap<VlanId, Vlan>> {
        let ids: Vec<VlanId> = iface
            .untagged_vlan
            .iter()
            .chain(iface.tagged_vlans.iter())
            .copied()
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let vlans = self.store.resolve_vlans(&ids).await?;
        Ok(vlans.into_iter().map(|vlan| (vlan.id, vlan)).collect())
    }
}

fn lookup(vlans: &HashMap<VlanId, Vlan>, id: VlanId) -> InventoryResult<Vlan> {
    vlans
        .get(&id)
        .cloned()
        .ok_or_else(|| InventoryError::not_found(VlanId::KIND, id))
}
