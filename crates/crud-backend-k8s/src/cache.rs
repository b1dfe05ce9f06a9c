// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded, identity-keyed client caches.
//!
//! Each [`ClientCache`] memoizes [`ClientFactory`] output for one
//! [`ApiFamily`]. Entries are keyed by the exact [`Identity`] they were built
//! for and evicted least-recently-used once the cache is full. Failed builds
//! are never stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::control_plane::ControlPlane;
use crate::error::{K8sError, K8sResult};
use crate::factory::{ApiFamily, ClientFactory};
use crate::identity::Identity;

pub const DEFAULT_CAPACITY: usize = 100;

struct CacheEntry {
	client: Arc<dyn ControlPlane>,
	last_used: u64,
}

#[derive(Default)]
struct CacheState {
	entries: HashMap<Identity, CacheEntry>,
	tick: u64,
}

impl CacheState {
	fn next_tick(&mut self) -> u64 {
		self.tick += 1;
		self.tick
	}

	fn evict_lru(&mut self) -> Option<Identity> {
		let oldest = self
			.entries
			.iter()
			.min_by_key(|(_, entry)| entry.last_used)
			.map(|(identity, _)| identity.clone())?;
		self.entries.remove(&oldest);
		Some(oldest)
	}
}

/// Identity-keyed LRU cache of control-plane clients for one API family.
pub struct ClientCache {
	family: ApiFamily,
	capacity: usize,
	factory: Arc<dyn ClientFactory>,
	state: Mutex<CacheState>,
}

impl ClientCache {
	/// Create an empty cache. A capacity of zero is raised to one.
	pub fn new(family: ApiFamily, factory: Arc<dyn ClientFactory>, capacity: usize) -> Self {
		Self {
			family,
			capacity: capacity.max(1),
			factory,
			state: Mutex::new(CacheState::default()),
		}
	}

	/// Return the client for `identity`, building and storing it on a miss.
	///
	/// Two callers missing on the same identity at once may both build; the
	/// first one stored wins and both get that instance.
	pub fn get_client(&self, identity: &Identity) -> K8sResult<Arc<dyn ControlPlane>> {
		if let Some(client) = self.lookup(identity) {
			trace!(family = %self.family, %identity, "client cache hit");
			return Ok(client);
		}

		debug!(family = %self.family, %identity, "client cache miss");
		let built = self.factory.build(self.family, identity)?;
		if built.identity() != identity {
			return Err(K8sError::ClientConstruction {
				identity: identity.to_string(),
				message: format!("factory returned a client bound to '{}'", built.identity()),
			});
		}

		Ok(self.insert(identity, built))
	}

	pub fn family(&self) -> ApiFamily {
		self.family
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().entries.is_empty()
	}

	pub fn contains(&self, identity: &Identity) -> bool {
		self.lock().entries.contains_key(identity)
	}

	/// Drop every cached client.
	pub fn clear(&self) {
		self.lock().entries.clear();
	}

	fn lookup(&self, identity: &Identity) -> Option<Arc<dyn ControlPlane>> {
		let mut state = self.lock();
		let tick = state.next_tick();
		state.entries.get_mut(identity).map(|entry| {
			entry.last_used = tick;
			Arc::clone(&entry.client)
		})
	}

	fn insert(&self, identity: &Identity, client: Arc<dyn ControlPlane>) -> Arc<dyn ControlPlane> {
		let mut state = self.lock();
		let tick = state.next_tick();

		if let Some(existing) = state.entries.get_mut(identity) {
			existing.last_used = tick;
			return Arc::clone(&existing.client);
		}

		// `identity` is absent here, so it can never be the one evicted.
		while state.entries.len() >= self.capacity {
			match state.evict_lru() {
				Some(evicted) => {
					debug!(family = %self.family, identity = %evicted, "evicted client")
				}
				None => break,
			}
		}

		state.entries.insert(
			identity.clone(),
			CacheEntry {
				client: Arc::clone(&client),
				last_used: tick,
			},
		);
		client
	}

	fn lock(&self) -> MutexGuard<'_, CacheState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl std::fmt::Debug for ClientCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientCache")
			.field("family", &self.family)
			.field("capacity", &self.capacity)
			.field("len", &self.len())
			.finish()
	}
}

/// Per-family cache capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheCapacities {
	pub core: usize,
	pub storage: usize,
	pub custom_objects: usize,
}

impl Default for CacheCapacities {
	fn default() -> Self {
		Self {
			core: DEFAULT_CAPACITY,
			storage: DEFAULT_CAPACITY,
			custom_objects: DEFAULT_CAPACITY,
		}
	}
}

/// One independent [`ClientCache`] per API family, sharing a factory.
#[derive(Debug)]
pub struct ClientRegistry {
	core: ClientCache,
	storage: ClientCache,
	custom_objects: ClientCache,
}

impl ClientRegistry {
	pub fn new(factory: Arc<dyn ClientFactory>, capacities: CacheCapacities) -> Self {
		Self {
			core: ClientCache::new(ApiFamily::Core, Arc::clone(&factory), capacities.core),
			storage: ClientCache::new(ApiFamily::Storage, Arc::clone(&factory), capacities.storage),
			custom_objects: ClientCache::new(
				ApiFamily::CustomObjects,
				factory,
				capacities.custom_objects,
			),
		}
	}

	pub fn cache(&self, family: ApiFamily) -> &ClientCache {
		match family {
			ApiFamily::Core => &self.core,
			ApiFamily::Storage => &self.storage,
			ApiFamily::CustomObjects => &self.custom_objects,
		}
	}

	pub fn client(
		&self,
		family: ApiFamily,
		identity: &Identity,
	) -> K8sResult<Arc<dyn ControlPlane>> {
		self.cache(family).get_client(identity)
	}
}
