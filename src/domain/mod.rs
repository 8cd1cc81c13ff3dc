// Domain layer: wire models and ports. No transport code lives here.

pub mod model;
pub mod ports;
