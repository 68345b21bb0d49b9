//! Space backdrop: the star sphere behind the scene and the environment map's
//! contribution to lighting.

pub mod environment;
pub mod star_sphere;

pub use environment::{EnvironmentLighting, EnvironmentState, average_radiance};
pub use star_sphere::{STAR_SPHERE_SHADER_SOURCE, StarSphere, StarSphereUniform};
