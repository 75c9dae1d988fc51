pub mod point;
pub mod vector;
pub mod transform;
pub mod curves;
pub mod ellipse;
pub mod bezier;
pub mod composite;
pub mod parallelogram;
pub mod hierarchy;
pub mod intersection;
pub mod region;
pub mod format;
