//! Scene state for the planetarium: the orbiting bodies, their headings, the
//! lights, the loading panel, and the glue that turns wheel input and asset
//! results into changes to them.

pub mod assets;
pub mod context;
pub mod headings;
pub mod lights;
pub mod loading;
pub mod orbit;

pub use assets::{AssetRole, SceneAssetUpdate, SceneAssets};
pub use context::{SceneContext, TextureUpload};
pub use headings::{HeadingLayout, HeadingSet};
pub use lights::Lights;
pub use loading::{FADE_OUT_SECONDS, LoadingOverlay};
pub use orbit::{Body, BodyState, OrbitGroup};
