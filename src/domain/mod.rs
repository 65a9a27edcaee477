//! Domain layer - entities and value types shared by every other layer.

pub mod model;
