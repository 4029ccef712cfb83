// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::ids::EntityId;

/// Capability expected of entity objects handed back by a provider.
///
/// Concrete host entity types implement this instead of being downcast from
/// an opaque object: the engine only ever needs the id, a human-readable
/// name, and an opaque string map it carries through to the resolved
/// mention.
pub trait MentionEntity {
    fn id(&self) -> &EntityId;
    fn display_name(&self) -> &str;
    fn metadata(&self) -> &BTreeMap<SmolStr, SmolStr>;
}

/// The entity representation the core passes around in result batches.
///
/// Providers with richer entity types convert via [`EntityRecord::from_entity`];
/// nothing beyond the capability surface survives the conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    id: EntityId,
    display_name: SmolStr,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<SmolStr, SmolStr>,
}

impl EntityRecord {
    pub fn new(id: EntityId, display_name: impl Into<SmolStr>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(
        id: EntityId,
        display_name: impl Into<SmolStr>,
        metadata: BTreeMap<SmolStr, SmolStr>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            metadata,
        }
    }

    pub fn from_entity(entity: &dyn MentionEntity) -> Self {
        Self {
            id: entity.id().clone(),
            display_name: SmolStr::new(entity.display_name()),
            metadata: entity.metadata().clone(),
        }
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(SmolStr::as_str)
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn metadata(&self) -> &BTreeMap<SmolStr, SmolStr> {
        &self.metadata
    }
}

impl MentionEntity for EntityRecord {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn metadata(&self) -> &BTreeMap<SmolStr, SmolStr> {
        &self.metadata
    }
}
