#![deny(missing_docs)]
#![doc = "gistreedb: a replicated dynamic R-tree spatial index."]

pub use gistree_geometry::Box;
pub use gistree_instance::{Config, ConfigValue, Error, Instance, Metadata, Mode, PeerRef};
pub use gistree_store::{Id, NodeId, Snapshot, UserKey};

/// Returns `true` if the library is properly linked and functioning.
///
/// # Examples
///
/// ```
/// assert_eq!(gistreedb::health_check(), true);
/// ```
pub fn health_check() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_returns_true() {
        assert!(health_check());
    }

    #[tokio::test]
    async fn facade_exposes_a_usable_instance() {
        let instance = Instance::spawn(Config { width: 4, dimensionality: 1, ..Config::default() }, None);
        instance
            .insert(Id::User(UserKey::Integer(1)), Box::new(vec![(0.0, 1.0)]).unwrap())
            .await
            .unwrap();
        let hits = instance.query(Box::new(vec![(0.0, 1.0)]).unwrap()).await;
        assert_eq!(hits.len(), 1);
    }
}
