//! Transfer & Staging: deciding how a buffer enters root aggregation and
//! moving bytes across the audio/GPU boundary once it does.

pub mod distributor;
pub mod processor;
pub mod staging;

pub use distributor::{BufferTokenDistributor, Decision, DistributionDecision};
pub use processor::{TransferDirection, TransferProcessor};
pub use staging::{
    download_device_local, download_host_visible, upload_audio_to_gpu, upload_device_local, upload_host_visible,
    upload_to_gpu,
};
