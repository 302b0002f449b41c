// Domain layer: profile schema, pipeline data types and the ports to the model and the sink.

pub mod model;
pub mod ports;
pub mod schema;
