//! gRPC module for inventory-service.

pub(crate) mod convert;
mod service;

pub use service::InventoryServiceImpl;

/// Generated protobuf code.
pub mod proto {
    tonic::include_proto!("micros.inventory.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("inventory_descriptor");
}
