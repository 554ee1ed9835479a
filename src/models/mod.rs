pub mod approval;
pub mod rpc;
