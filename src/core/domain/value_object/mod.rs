mod natural_name;
mod object_id;
mod vcpus;
mod vlan_vid;

pub use natural_name::natural_cmp;
pub use object_id::{
    ClusterGroupId, ClusterId, ClusterTypeId, DeviceId, IpAddressId, VirtualDiskId,
    VirtualMachineId, VlanGroupId, VlanId, VlanTranslationPolicyId, VmInterfaceId,
};
pub use vcpus::Vcpus;
pub use vlan_vid::VlanVid;
