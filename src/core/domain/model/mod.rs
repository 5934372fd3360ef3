pub mod cluster;
pub mod device;
pub mod permission;
pub mod resource_totals;
pub mod virtual_machine;
pub mod vlan;
pub mod vm_interface;
