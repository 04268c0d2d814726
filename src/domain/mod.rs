// Domain layer: models, wire shapes and ports. No I/O here.

pub mod model;
pub mod ports;
pub mod wire;
