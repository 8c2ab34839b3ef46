pub mod init;
pub mod network;
pub mod spec;
pub mod topology;

pub use network::Network;
pub use spec::NetworkSpec;
pub use topology::Topology;
