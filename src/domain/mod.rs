// Domain layer: provisioning models and ports (interfaces).

pub mod model;
pub mod ports;
