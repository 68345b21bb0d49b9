//! Which assets the scene needs and what each finished load means for it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use planetarium_assets::{
    AssetEvent, AssetId, AssetLoader, AssetRequest, AssetSource, DecodedImage, ImageKind,
    LoadingEvent, LoadingTracker, TextureGroup,
};
use planetarium_config::AssetsConfig;

/// What a loaded asset is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetRole {
    Environment,
    Starfield,
    Body(usize),
}

/// Scene-level consequence of one finished load.
#[derive(Debug)]
pub enum SceneAssetUpdate {
    Environment(DecodedImage),
    EnvironmentFailed,
    Starfield(DecodedImage),
    StarfieldFailed,
    BodyTexture { index: usize, image: DecodedImage },
    BodyFailed { index: usize },
    /// Every body texture resolved. Bodies in `loaded` can now be shown.
    BodiesSettled { loaded: Vec<usize>, failed: Vec<usize> },
    Loading(LoadingEvent),
}

struct Planned {
    role: AssetRole,
    label: String,
    kind: ImageKind,
}

/// Asset bookkeeping for one scene: roles, overall progress and the body
/// texture group.
pub struct SceneAssets {
    root: PathBuf,
    planned: BTreeMap<AssetId, Planned>,
    bodies: TextureGroup,
    tracker: LoadingTracker,
    settled_reported: bool,
}

impl SceneAssets {
    /// Assign an id and a role to every configured asset.
    pub fn plan(config: &AssetsConfig) -> Self {
        let mut planned = BTreeMap::new();
        let mut next_id = 0u32;
        let mut add = |role, label: &str, kind| {
            let id = AssetId(next_id);
            next_id += 1;
            planned.insert(
                id,
                Planned {
                    role,
                    label: label.to_string(),
                    kind,
                },
            );
            id
        };

        add(AssetRole::Environment, &config.environment, ImageKind::Hdr);
        add(AssetRole::Starfield, &config.starfield, ImageKind::Color);
        let body_ids = config
            .bodies
            .iter()
            .enumerate()
            .map(|(i, path)| add(AssetRole::Body(i), path, ImageKind::Color))
            .collect();

        Self {
            root: config.root.clone(),
            planned,
            bodies: TextureGroup::new("body textures", body_ids),
            tracker: LoadingTracker::new(),
            settled_reported: false,
        }
    }

    /// Start every load on `loader`. Sources that cannot be parsed or queued
    /// resolve immediately as failures.
    pub fn begin(&mut self, loader: &AssetLoader) -> Vec<SceneAssetUpdate> {
        let mut updates = Vec::new();
        let mut immediate = Vec::new();

        for (id, planned) in &self.planned {
            updates.extend(
                self.tracker
                    .item_start(&planned.label)
                    .into_iter()
                    .map(SceneAssetUpdate::Loading),
            );

            let queued = AssetSource::parse(&planned.label, &self.root).and_then(|source| {
                loader.request(AssetRequest {
                    id: *id,
                    source,
                    kind: planned.kind,
                })
            });
            if let Err(err) = queued {
                immediate.push(AssetEvent {
                    id: *id,
                    label: planned.label.clone(),
                    result: Err(err),
                });
            }
        }

        for event in immediate {
            updates.extend(self.handle(event));
        }
        updates
    }

    /// Interpret one finished load. Unknown ids are ignored.
    pub fn handle(&mut self, event: AssetEvent) -> Vec<SceneAssetUpdate> {
        let Some(planned) = self.planned.get(&event.id) else {
            tracing::warn!(id = event.id.0, "result for an asset the scene never requested");
            return Vec::new();
        };
        let role = planned.role;
        let label = planned.label.clone();

        let mut updates = Vec::new();
        if let AssetRole::Body(_) = role {
            self.bodies.resolve(event.id, &event.result);
        }

        let loading = match &event.result {
            Ok(_) => self.tracker.item_end(&label),
            Err(err) => {
                tracing::warn!(error = %err, "{label} failed to load");
                self.tracker.item_error(&label)
            }
        };

        updates.push(match (role, event.result) {
            (AssetRole::Environment, Ok(image)) => SceneAssetUpdate::Environment(image),
            (AssetRole::Environment, Err(_)) => SceneAssetUpdate::EnvironmentFailed,
            (AssetRole::Starfield, Ok(image)) => SceneAssetUpdate::Starfield(image),
            (AssetRole::Starfield, Err(_)) => SceneAssetUpdate::StarfieldFailed,
            (AssetRole::Body(index), Ok(image)) => SceneAssetUpdate::BodyTexture { index, image },
            (AssetRole::Body(index), Err(_)) => SceneAssetUpdate::BodyFailed { index },
        });

        if matches!(role, AssetRole::Body(_)) && self.bodies.is_settled() && !self.settled_reported {
            self.settled_reported = true;
            updates.push(self.settled_update());
        }

        updates.extend(loading.into_iter().map(SceneAssetUpdate::Loading));
        updates
    }

    // Group members are body ids in body order, so a member's position is its
    // body index.
    fn settled_update(&self) -> SceneAssetUpdate {
        let mut failed: Vec<usize> = self
            .bodies
            .failed_members()
            .iter()
            .filter_map(|id| self.bodies.index_of(*id))
            .collect();
        failed.sort_unstable();
        let loaded = self
            .planned
            .iter()
            .filter_map(|(id, planned)| match planned.role {
                AssetRole::Body(index) if self.bodies.is_loaded(*id) => Some(index),
                _ => None,
            })
            .collect();
        SceneAssetUpdate::BodiesSettled { loaded, failed }
    }

    pub fn tracker(&self) -> &LoadingTracker {
        &self.tracker
    }

    /// Number of assets the scene loads.
    pub fn len(&self) -> usize {
        self.planned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
    }
}
