//! Instance registry: the fixed set of tenant partitions and which one is active.

use super::partition::Partition;
use crate::model::{EntityId, InstanceId};
use crate::store::errors::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Public description of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub name: String,
    pub description: String,
}

/// An instance and its data
#[derive(Debug, Clone)]
pub struct Instance {
    pub info: InstanceInfo,
    pub partition: Partition,
}

impl Instance {
    pub fn new(id: &str, name: &str, description: &str, partition: Partition) -> Self {
        Self {
            info: InstanceInfo {
                id: InstanceId::new(id),
                name: name.to_string(),
                description: description.to_string(),
            },
            partition,
        }
    }
}

/// Registry of instances with exactly one active at a time
#[derive(Debug, Clone)]
pub struct InstanceRegistry {
    instances: BTreeMap<InstanceId, Instance>,
    active: InstanceId,
}

impl InstanceRegistry {
    /// Build a registry. Fails if `active` is not among `instances` or if two
    /// instances share an entity id.
    pub fn new(instances: Vec<Instance>, active: InstanceId) -> StoreResult<Self> {
        let mut seen = HashSet::new();
        for instance in &instances {
            for id in instance.partition.entity_ids() {
                if !seen.insert(id) {
                    return Err(StoreError::InvariantViolation(format!(
                        "entity id {id} is used more than once in seed data"
                    )));
                }
            }
        }

        let instances: BTreeMap<InstanceId, Instance> =
            instances.into_iter().map(|i| (i.info.id.clone(), i)).collect();
        if !instances.contains_key(&active) {
            return Err(StoreError::InstanceNotFound(active));
        }
        Ok(Self { instances, active })
    }

    pub fn active_id(&self) -> &InstanceId {
        &self.active
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    pub fn get(&self, id: &InstanceId) -> StoreResult<&Instance> {
        self.instances.get(id).ok_or_else(|| StoreError::InstanceNotFound(id.clone()))
    }

    pub fn get_mut(&mut self, id: &InstanceId) -> StoreResult<&mut Instance> {
        self.instances.get_mut(id).ok_or_else(|| StoreError::InstanceNotFound(id.clone()))
    }

    pub fn active(&self) -> &Instance {
        // `active` is only ever set to a key that exists.
        &self.instances[&self.active]
    }

    pub fn active_mut(&mut self) -> &mut Instance {
        let active = self.active.clone();
        self.instances
            .get_mut(&active)
            .unwrap_or_else(|| unreachable!("active instance {active} missing from registry"))
    }

    /// Make `id` the active instance; returns the previously active id
    pub fn switch(&mut self, id: &InstanceId) -> StoreResult<InstanceId> {
        if !self.instances.contains_key(id) {
            return Err(StoreError::InstanceNotFound(id.clone()));
        }
        Ok(std::mem::replace(&mut self.active, id.clone()))
    }

    pub fn list(&self) -> Vec<InstanceInfo> {
        self.instances.values().map(|i| i.info.clone()).collect()
    }

    /// Instance whose partition contains a user with this id, if any
    pub fn owner_of_user(&self, user: EntityId) -> Option<&InstanceId> {
        self.instances
            .values()
            .find(|i| i.partition.contains_user(user))
            .map(|i| &i.info.id)
    }

    /// Every entity id used by any instance
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.instances.values().flat_map(|i| i.partition.entity_ids())
    }

    /// Highest entity id across every instance
    pub fn max_entity_id(&self) -> Option<EntityId> {
        self.instances.values().filter_map(|i| i.partition.max_entity_id()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    fn instance(id: &str, user: u64) -> Instance {
        let mut partition = Partition::new();
        partition.insert_user(User::new(EntityId(user), format!("u{user}"), format!("u{user}@x")));
        Instance::new(id, id, "", partition)
    }

    #[test]
    fn test_switch_unknown_instance_fails() {
        let mut registry =
            InstanceRegistry::new(vec![instance("a", 1), instance("b", 2)], InstanceId::new("a")).unwrap();

        let err = registry.switch(&InstanceId::new("zzz")).unwrap_err();
        assert_eq!(err, StoreError::InstanceNotFound(InstanceId::new("zzz")));
        assert_eq!(registry.active_id(), &InstanceId::new("a"));

        let previous = registry.switch(&InstanceId::new("b")).unwrap();
        assert_eq!(previous, InstanceId::new("a"));
        assert_eq!(registry.active().info.id, InstanceId::new("b"));
    }

    #[test]
    fn test_new_rejects_missing_active() {
        let err = InstanceRegistry::new(vec![instance("a", 1)], InstanceId::new("b")).unwrap_err();
        assert!(matches!(err, StoreError::InstanceNotFound(_)));
    }

    #[test]
    fn test_new_rejects_shared_ids() {
        let err = InstanceRegistry::new(vec![instance("a", 1), instance("b", 1)], InstanceId::new("a"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
    }

    #[test]
    fn test_owner_of_user() {
        let registry =
            InstanceRegistry::new(vec![instance("a", 1), instance("b", 2)], InstanceId::new("a")).unwrap();
        assert_eq!(registry.owner_of_user(EntityId(2)), Some(&InstanceId::new("b")));
        assert_eq!(registry.owner_of_user(EntityId(3)), None);
        assert_eq!(registry.max_entity_id(), Some(EntityId(2)));
    }
}
