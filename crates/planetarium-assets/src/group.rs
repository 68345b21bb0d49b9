//! Fail-fast aggregate over a fixed set of textures.

use std::collections::BTreeSet;

use crate::decode::DecodedImage;
use crate::error::AssetError;
use crate::loader::AssetId;

/// Aggregate state of a [`TextureGroup`].
#[derive(Clone, Debug, PartialEq)]
pub enum GroupStatus {
    /// Some members are still outstanding and none has failed.
    Pending {
        /// Members resolved so far.
        resolved: usize,
        /// Members in the group.
        total: usize,
    },
    /// Every member loaded.
    Complete,
    /// A member failed. Holds the first failure only.
    Failed {
        /// Member that failed first.
        id: AssetId,
        /// Its error message.
        first_error: String,
    },
}

/// Collects results for a fixed list of members.
///
/// Mirrors an all-or-nothing promise: the first rejection flips the group to
/// [`GroupStatus::Failed`] and is reported exactly once. Members that did
/// load are still reported by [`is_loaded`](Self::is_loaded), and later
/// results are still recorded.
#[derive(Debug)]
pub struct TextureGroup {
    name: String,
    members: Vec<AssetId>,
    loaded: BTreeSet<AssetId>,
    failed: Vec<AssetId>,
    status: GroupStatus,
}

impl TextureGroup {
    /// Create a group over `members`, in display order.
    pub fn new(name: impl Into<String>, members: Vec<AssetId>) -> Self {
        let status = if members.is_empty() {
            GroupStatus::Complete
        } else {
            GroupStatus::Pending {
                resolved: 0,
                total: members.len(),
            }
        };
        Self {
            name: name.into(),
            members,
            loaded: BTreeSet::new(),
            failed: Vec::new(),
            status,
        }
    }

    /// Whether `id` belongs to this group.
    pub fn contains(&self, id: AssetId) -> bool {
        self.members.contains(&id)
    }

    /// Position of `id` in the member list.
    pub fn index_of(&self, id: AssetId) -> Option<usize> {
        self.members.iter().position(|m| *m == id)
    }

    /// Record one member's result. Returns the new status when it changed.
    ///
    /// Results for ids outside the group, or for members that already
    /// resolved, are ignored.
    pub fn resolve(
        &mut self,
        id: AssetId,
        result: &Result<DecodedImage, AssetError>,
    ) -> Option<GroupStatus> {
        if !self.contains(id) || self.loaded.contains(&id) || self.failed.contains(&id) {
            return None;
        }
        match result {
            Ok(_) => {
                self.loaded.insert(id);
            }
            Err(err) => {
                self.failed.push(id);
                if !matches!(self.status, GroupStatus::Failed { .. }) {
                    tracing::error!("{} loading failed: {err}", self.name);
                    self.status = GroupStatus::Failed {
                        id,
                        first_error: err.to_string(),
                    };
                    return Some(self.status.clone());
                }
                return None;
            }
        }

        if matches!(self.status, GroupStatus::Failed { .. }) {
            return None;
        }
        let resolved = self.loaded.len();
        self.status = if resolved == self.members.len() {
            GroupStatus::Complete
        } else {
            GroupStatus::Pending {
                resolved,
                total: self.members.len(),
            }
        };
        Some(self.status.clone())
    }

    /// Current aggregate status.
    pub fn status(&self) -> &GroupStatus {
        &self.status
    }

    /// Whether `id` loaded successfully.
    pub fn is_loaded(&self, id: AssetId) -> bool {
        self.loaded.contains(&id)
    }

    /// Members that failed, in failure order.
    pub fn failed_members(&self) -> &[AssetId] {
        &self.failed
    }

    /// All members have either loaded or failed.
    pub fn is_settled(&self) -> bool {
        self.loaded.len() + self.failed.len() == self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PixelData;

    fn ok() -> Result<DecodedImage, AssetError> {
        Ok(DecodedImage {
            width: 1,
            height: 1,
            pixels: PixelData::Rgba8(vec![255; 4]),
        })
    }

    fn http_err() -> Result<DecodedImage, AssetError> {
        Err(AssetError::Http {
            url: "https://example.com/venus/map.jpg".into(),
            message: "404".into(),
        })
    }

    fn group() -> TextureGroup {
        TextureGroup::new("bodies", (0..4).map(AssetId).collect())
    }

    #[test]
    fn test_all_members_complete() {
        let mut g = group();
        for i in 0..3 {
            assert_eq!(
                g.resolve(AssetId(i), &ok()),
                Some(GroupStatus::Pending {
                    resolved: i as usize + 1,
                    total: 4
                })
            );
        }
        assert_eq!(g.resolve(AssetId(3), &ok()), Some(GroupStatus::Complete));
        assert!(g.is_settled());
    }

    #[test]
    fn test_first_failure_reported_once_others_still_load() {
        let mut g = group();
        g.resolve(AssetId(0), &ok());
        let status = g.resolve(AssetId(2), &http_err()).unwrap();
        assert!(matches!(status, GroupStatus::Failed { id: AssetId(2), .. }));

        // A second failure does not re-report.
        assert_eq!(g.resolve(AssetId(1), &http_err()), None);
        assert_eq!(g.resolve(AssetId(3), &ok()), None);

        assert!(g.is_loaded(AssetId(0)));
        assert!(g.is_loaded(AssetId(3)));
        assert!(!g.is_loaded(AssetId(2)));
        assert_eq!(g.failed_members(), &[AssetId(2), AssetId(1)]);
        assert!(g.is_settled());
        match g.status() {
            GroupStatus::Failed { first_error, .. } => assert!(first_error.contains("404")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_foreign_and_duplicate_results_ignored() {
        let mut g = group();
        assert_eq!(g.resolve(AssetId(99), &ok()), None);
        g.resolve(AssetId(1), &ok());
        assert_eq!(g.resolve(AssetId(1), &http_err()), None);
        assert_eq!(g.index_of(AssetId(1)), Some(1));
        assert_eq!(g.index_of(AssetId(99)), None);
    }

    #[test]
    fn test_empty_group_is_complete() {
        let g = TextureGroup::new("none", Vec::new());
        assert_eq!(g.status(), &GroupStatus::Complete);
    }
}
