pub mod calldata;
pub mod cfg;
pub mod debug;
pub mod decode;
pub mod display;
pub mod error;
pub mod finality;
pub mod gallery;
pub mod ledger;
pub mod normalize;
pub mod pipeline;
pub mod rpc;
pub mod session;
pub mod types;
