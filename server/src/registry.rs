//! Player slot registry for the two-player server
//!
//! This module tracks who is playing, including:
//! - Slot assignment on join, in arrival order
//! - Latest paddle action per player
//! - Liveness timestamps and the terminal inactive state
//!
//! A slot moves `Empty -> Active -> Inactive` and never goes back. Slots are
//! not reused within a server lifetime, so at most `MAX_PLAYERS` joins ever
//! succeed.

use log::info;
use shared::{Action, PlayerName, MAX_PLAYERS};
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("all {capacity} player slots are taken")]
    CapacityExceeded { capacity: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Active,
    Inactive,
}

/// One registered player session
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    /// 1-based protocol id, equal to slot index + 1
    pub id: u8,
    /// Where snapshots for this player are sent
    pub addr: SocketAddr,
    /// Server clock reading of the last join or input
    pub last_seen: u64,
    pub active: bool,
    pub last_action: Action,
    pub name: PlayerName,
}

impl PlayerSlot {
    fn new(id: u8, addr: SocketAddr, name: PlayerName, now_ms: u64) -> Self {
        Self {
            id,
            addr,
            last_seen: now_ms,
            active: true,
            last_action: Action::Idle,
            name,
        }
    }

    /// Whether nothing was heard from this player for more than
    /// `timeout_ms` before `now_ms`.
    pub fn is_idle_for(&self, timeout_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_seen) > timeout_ms
    }
}

/// Fixed array of player slots, filled in order
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    slots: [Option<PlayerSlot>; MAX_PLAYERS],
    registered: usize,
}

impl PlayerRegistry {
    /// Creates a registry with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the next unused slot and returns its 1-based player id.
    ///
    /// Fails without touching existing slots once every slot has been
    /// handed out, even if some of them have since gone inactive.
    pub fn register(
        &mut self,
        addr: SocketAddr,
        name: PlayerName,
        now_ms: u64,
    ) -> Result<u8, RegistryError> {
        if self.registered >= MAX_PLAYERS {
            return Err(RegistryError::CapacityExceeded {
                capacity: MAX_PLAYERS,
            });
        }

        let index = self.registered;
        let id = (index + 1) as u8;
        self.slots[index] = Some(PlayerSlot::new(id, addr, name, now_ms));
        self.registered += 1;

        info!("Player {} joined from {} as {:?}", id, addr, name.to_string_lossy());
        Ok(id)
    }

    /// Stores the latest action for an active player.
    ///
    /// Unknown, out-of-range and inactive ids are ignored; returns whether
    /// the input was applied.
    pub fn record_input(&mut self, player_id: u8, action: Action, now_ms: u64) -> bool {
        match self.active_slot_mut(player_id) {
            Some(slot) => {
                slot.last_action = action;
                slot.last_seen = now_ms;
                true
            }
            None => false,
        }
    }

    /// Marks a player inactive. The slot stays taken.
    pub fn deactivate(&mut self, player_id: u8) -> bool {
        match self.active_slot_mut(player_id) {
            Some(slot) => {
                slot.active = false;
                info!("Player {} left ({})", slot.id, slot.name);
                true
            }
            None => false,
        }
    }

    /// Deactivates every active player silent for longer than `timeout_ms`.
    pub fn evict_idle(&mut self, timeout_ms: u64, now_ms: u64) -> Vec<u8> {
        let mut evicted = Vec::new();

        for slot in self.slots.iter_mut().flatten() {
            if slot.active && slot.is_idle_for(timeout_ms, now_ms) {
                slot.active = false;
                info!(
                    "Player {} timed out after {}ms of silence",
                    slot.id,
                    now_ms.saturating_sub(slot.last_seen)
                );
                evicted.push(slot.id);
            }
        }

        evicted
    }

    /// Looks up a slot by its 1-based player id.
    ///
    /// Returns the slot whether it is active or inactive; `None` for id 0,
    /// out-of-range ids and slots never claimed.
    pub fn get(&self, player_id: u8) -> Option<&PlayerSlot> {
        let index = usize::from(player_id).checked_sub(1)?;
        self.slots.get(index)?.as_ref()
    }

    /// Lifecycle state of the slot behind `player_id`.
    ///
    /// Unknown ids report `Empty`.
    pub fn state(&self, player_id: u8) -> SlotState {
        match self.get(player_id) {
            Some(slot) if slot.active => SlotState::Active,
            Some(_) => SlotState::Inactive,
            None => SlotState::Empty,
        }
    }

    /// Active player id matching `addr`, if any
    pub fn find_active_by_addr(&self, addr: SocketAddr) -> Option<u8> {
        self.slots
            .iter()
            .flatten()
            .find(|slot| slot.active && slot.addr == addr)
            .map(|slot| slot.id)
    }

    /// Per-slot paddle actions for the simulation; `None` for empty or
    /// inactive slots.
    pub fn actions(&self) -> [Option<Action>; MAX_PLAYERS] {
        let mut actions = [None; MAX_PLAYERS];
        for (action, slot) in actions.iter_mut().zip(&self.slots) {
            *action = slot
                .as_ref()
                .filter(|slot| slot.active)
                .map(|slot| slot.last_action);
        }
        actions
    }

    /// Ids and addresses of every active player, in slot order
    pub fn active_addrs(&self) -> Vec<(u8, SocketAddr)> {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.active)
            .map(|slot| (slot.id, slot.addr))
            .collect()
    }

    /// Number of joins that have succeeded so far
    pub fn registered(&self) -> usize {
        self.registered
    }

    /// True once every slot has been handed out, active or not
    pub fn is_full(&self) -> bool {
        self.registered == MAX_PLAYERS
    }

    /// Players still receiving snapshots
    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().filter(|slot| slot.active).count()
    }

    fn active_slot_mut(&mut self, player_id: u8) -> Option<&mut PlayerSlot> {
        let index = usize::from(player_id).checked_sub(1)?;
        self.slots
            .get_mut(index)?
            .as_mut()
            .filter(|slot| slot.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:9001".parse().unwrap()
    }

    fn full_registry() -> PlayerRegistry {
        let mut registry = PlayerRegistry::new();
        registry
            .register(test_addr(), PlayerName::new("alice"), 0)
            .unwrap();
        registry
            .register(test_addr2(), PlayerName::new("bob"), 0)
            .unwrap();
        registry
    }

    #[test]
    fn test_registry_creation() {
        let registry = PlayerRegistry::new();
        assert_eq!(registry.registered(), 0);
        assert!(!registry.is_full());
        assert_eq!(registry.state(1), SlotState::Empty);
        assert_eq!(registry.actions(), [None, None]);
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = PlayerRegistry::new();

        let id1 = registry
            .register(test_addr(), PlayerName::new("alice"), 5)
            .unwrap();
        let id2 = registry
            .register(test_addr2(), PlayerName::new("bob"), 6)
            .unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert!(registry.is_full());

        let slot = registry.get(1).unwrap();
        assert_eq!(slot.addr, test_addr());
        assert_eq!(slot.last_seen, 5);
        assert!(slot.active);
        assert_eq!(slot.last_action, Action::Idle);
        assert_eq!(slot.name.to_string_lossy(), "alice");
    }

    #[test]
    fn test_third_registration_fails_without_mutation() {
        let mut registry = full_registry();
        registry.record_input(1, Action::Up, 10);
        let before: Vec<_> = [1, 2]
            .iter()
            .map(|&id| {
                let slot = registry.get(id).unwrap();
                (slot.id, slot.addr, slot.last_seen, slot.active, slot.last_action)
            })
            .collect();

        let intruder: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let result = registry.register(intruder, PlayerName::new("carol"), 99);

        assert_eq!(
            result,
            Err(RegistryError::CapacityExceeded {
                capacity: MAX_PLAYERS
            })
        );
        let after: Vec<_> = [1, 2]
            .iter()
            .map(|&id| {
                let slot = registry.get(id).unwrap();
                (slot.id, slot.addr, slot.last_seen, slot.active, slot.last_action)
            })
            .collect();
        assert_eq!(before, after);
        assert_eq!(registry.registered(), 2);
        assert_eq!(registry.find_active_by_addr(intruder), None);
    }

    #[test]
    fn test_slots_are_not_reused_after_leave() {
        let mut registry = full_registry();
        assert!(registry.deactivate(1));

        let result = registry.register(test_addr(), PlayerName::new("again"), 0);
        assert!(result.is_err());
        assert_eq!(registry.state(1), SlotState::Inactive);
    }

    #[test]
    fn test_record_input() {
        let mut registry = full_registry();

        assert!(registry.record_input(2, Action::Down, 42));
        let slot = registry.get(2).unwrap();
        assert_eq!(slot.last_action, Action::Down);
        assert_eq!(slot.last_seen, 42);
        assert_eq!(registry.actions(), [Some(Action::Idle), Some(Action::Down)]);
    }

    #[test]
    fn test_record_input_ignores_unknown_ids() {
        let mut registry = PlayerRegistry::new();
        registry
            .register(test_addr(), PlayerName::new("alice"), 0)
            .unwrap();

        assert!(!registry.record_input(0, Action::Up, 1));
        assert!(!registry.record_input(2, Action::Up, 1));
        assert!(!registry.record_input(255, Action::Up, 1));
        assert_eq!(registry.get(1).unwrap().last_action, Action::Idle);
    }

    #[test]
    fn test_record_input_ignored_after_leave() {
        let mut registry = full_registry();
        registry.deactivate(1);

        assert!(!registry.record_input(1, Action::Up, 1));
        assert_eq!(registry.actions(), [None, Some(Action::Idle)]);
    }

    #[test]
    fn test_deactivate() {
        let mut registry = full_registry();

        assert!(registry.deactivate(2));
        assert!(!registry.deactivate(2));
        assert!(!registry.deactivate(7));

        assert_eq!(registry.state(2), SlotState::Inactive);
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.active_addrs(), vec![(1, test_addr())]);
        assert!(registry.is_full());
    }

    #[test]
    fn test_evict_idle() {
        let mut registry = full_registry();
        registry.record_input(2, Action::Up, 4_000);

        let evicted = registry.evict_idle(3_000, 5_000);

        assert_eq!(evicted, vec![1]);
        assert_eq!(registry.state(1), SlotState::Inactive);
        assert_eq!(registry.state(2), SlotState::Active);
        assert!(registry.evict_idle(3_000, 5_000).is_empty());
    }

    #[test]
    fn test_find_active_by_addr() {
        let mut registry = full_registry();

        assert_eq!(registry.find_active_by_addr(test_addr2()), Some(2));
        registry.deactivate(2);
        assert_eq!(registry.find_active_by_addr(test_addr2()), None);
    }
}
