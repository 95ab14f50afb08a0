// Domain layer: canonical contest model and the ports (interfaces) the pipeline is written against.

pub mod model;
pub mod ports;
