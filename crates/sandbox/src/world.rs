//! The sandbox world and its service implementations.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use harvestbot_core::{
    Block, BlockCategory, Body, ChatChannel, ContainerHandle, ContainerService, EventSender,
    Inventory, ItemCategory, ItemStack, MovementConfig, NavigationError, NavigationGoal, Navigator,
    Vec3, Vitals, WorldError, WorldEvent, WorldQuery,
};
use tracing::{debug, info};

type Cell = (i64, i64, i64);

/// Inventory slots available to the avatar.
pub const INVENTORY_SLOTS: usize = 36;

const STACK_LIMIT: u32 = 64;

/// Food lost per this many blocks broken.
const DIGS_PER_HUNGER: u32 = 8;

/// One travel request as the navigator received it.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelRecord {
    pub goal: NavigationGoal,
    pub movements: Option<MovementConfig>,
    /// Whether the caller waited for the outcome (`goto`) or not (`set_goal`)
    pub awaited: bool,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct SandboxState {
    blocks: BTreeMap<Cell, String>,
    position: Vec3,
    vitals: Option<Vitals>,
    items: Vec<ItemStack>,
    held: Option<u32>,
    next_slot: u32,
    players: HashMap<String, Vec3>,
    containers: HashMap<Cell, Vec<ItemStack>>,
    window_open: bool,
    chat_log: Vec<String>,
    travel_log: Vec<TravelRecord>,
    travel_failures: u32,
    unreachable: HashSet<Cell>,
    rejected_deposits: HashSet<String>,
    inventory_unreadable: bool,
    attacks: Vec<u64>,
    digs: Vec<Vec3>,
    digs_since_hunger: u32,
    events: Option<EventSender>,
}

impl SandboxState {
    fn vitals(&self) -> Vitals {
        self.vitals.unwrap_or(Vitals {
            health: 20.0,
            food: 20,
        })
    }

    fn block(&self, cell: Cell) -> Block {
        let name = self
            .blocks
            .get(&cell)
            .cloned()
            .unwrap_or_else(|| "air".into());
        let diggable = name != "air" && name != "bedrock";
        Block {
            name,
            position: Vec3::new(cell.0 as f64, cell.1 as f64, cell.2 as f64),
            diggable,
        }
    }

    fn give(&mut self, name: &str, mut count: u32) {
        for stack in self.items.iter_mut().filter(|s| s.name == name) {
            let room = STACK_LIMIT.saturating_sub(stack.count);
            let moved = room.min(count);
            stack.count += moved;
            count -= moved;
            if count == 0 {
                return;
            }
        }
        while count > 0 && self.items.len() < INVENTORY_SLOTS {
            let moved = count.min(STACK_LIMIT);
            self.items.push(ItemStack {
                slot: self.next_slot,
                name: name.to_string(),
                count: moved,
            });
            self.next_slot += 1;
            count -= moved;
        }
    }

    fn take_one_held(&mut self) -> Option<String> {
        let slot = self.held?;
        let index = self.items.iter().position(|s| s.slot == slot)?;
        let name = self.items[index].name.clone();
        self.items[index].count -= 1;
        if self.items[index].count == 0 {
            self.items.remove(index);
            self.held = None;
        }
        Some(name)
    }
}

/// The block an item turns into when broken.
fn drop_for(block_name: &str) -> &str {
    match block_name {
        "stone" => "cobblestone",
        "grass_block" => "dirt",
        "coal_ore" => "coal",
        "iron_ore" => "raw_iron",
        other => other,
    }
}

/// An in-process world. Cheap to clone through `Arc`; every method takes `&self`.
pub struct SandboxWorld {
    name: String,
    entity_id: u64,
    echo_chat: bool,
    state: Arc<Mutex<SandboxState>>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self {
            name: "sandbox".into(),
            entity_id: 1,
            echo_chat: false,
            state: Arc::new(Mutex::new(SandboxState {
                position: Vec3::new(0.0, 64.0, 0.0),
                ..SandboxState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Builders ────────────────────────────────────────────────────────

    /// Print outbound chat to stdout as well as recording it.
    pub fn with_chat_echo(mut self) -> Self {
        self.echo_chat = true;
        self
    }

    pub fn with_block(self, position: Vec3, name: &str) -> Self {
        self.set_block(position, name);
        self
    }

    pub fn with_item(self, name: &str, count: u32) -> Self {
        self.give(name, count);
        self
    }

    pub fn with_vitals(self, health: f32, food: u32) -> Self {
        self.set_vitals(health, food);
        self
    }

    pub fn with_player(self, name: &str, position: Vec3) -> Self {
        self.state().players.insert(name.to_string(), position);
        self
    }

    pub fn at(self, position: Vec3) -> Self {
        self.state().position = position;
        self
    }

    // ── Runtime controls ────────────────────────────────────────────────

    pub fn set_block(&self, position: Vec3, name: &str) {
        let cell = position.cell();
        let mut state = self.state();
        if BlockCategory::of(name) == BlockCategory::Air {
            state.blocks.remove(&cell);
        } else {
            state.blocks.insert(cell, name.to_string());
        }
    }

    pub fn give(&self, name: &str, count: u32) {
        self.state().give(name, count);
    }

    pub fn set_vitals(&self, health: f32, food: u32) {
        self.state().vitals = Some(Vitals { health, food });
    }

    pub fn move_to(&self, position: Vec3) {
        self.state().position = position;
    }

    /// Make the next `n` travel requests fail.
    pub fn fail_next_travels(&self, n: u32) {
        self.state().travel_failures = n;
    }

    /// Every travel request toward `position` fails.
    pub fn make_unreachable(&self, position: Vec3) {
        self.state().unreachable.insert(position.cell());
    }

    /// Container deposits of `item_name` fail.
    pub fn reject_deposits_of(&self, item_name: &str) {
        self.state().rejected_deposits.insert(item_name.to_string());
    }

    /// Inventory reads fail until called again with `false`.
    pub fn set_inventory_unreadable(&self, unreadable: bool) {
        self.state().inventory_unreadable = unreadable;
    }

    /// Install the sender that receives this world's events.
    pub fn attach_events(&self, sender: EventSender) {
        self.state().events = Some(sender);
    }

    /// Push an event onto the attached queue. Dropped if none is attached
    /// or the queue is full.
    pub fn emit(&self, event: WorldEvent) -> bool {
        let sender = self.state().events.clone();
        match sender {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// A player opens a container window next to the avatar.
    pub fn open_window(&self, window_kind: &str) -> bool {
        self.state().window_open = true;
        self.emit(WorldEvent::container_opened(window_kind))
    }

    /// End the session: emit `Disconnected` and drop the event sender.
    pub fn disconnect(&self, reason: &str) {
        let sender = self.state().events.take();
        if let Some(tx) = sender {
            let _ = tx.try_send(WorldEvent::disconnected(reason));
        }
    }

    // ── Inspection ──────────────────────────────────────────────────────

    pub fn chat_log(&self) -> Vec<String> {
        self.state().chat_log.clone()
    }

    pub fn travel_log(&self) -> Vec<TravelRecord> {
        self.state().travel_log.clone()
    }

    pub fn attacks(&self) -> Vec<u64> {
        self.state().attacks.clone()
    }

    pub fn digs(&self) -> Vec<Vec3> {
        self.state().digs.clone()
    }

    pub fn inventory(&self) -> Vec<ItemStack> {
        self.state().items.clone()
    }

    pub fn held_item(&self) -> Option<String> {
        let state = self.state();
        let slot = state.held?;
        state
            .items
            .iter()
            .find(|s| s.slot == slot)
            .map(|s| s.name.clone())
    }

    pub fn container_contents(&self, position: Vec3) -> Vec<ItemStack> {
        self.state()
            .containers
            .get(&position.cell())
            .cloned()
            .unwrap_or_default()
    }

    pub fn block_name_at(&self, position: Vec3) -> String {
        self.state().block(position.cell()).name
    }

    pub fn current_position(&self) -> Vec3 {
        self.state().position
    }

    pub fn current_vitals(&self) -> Vitals {
        self.state().vitals()
    }

    pub fn window_open(&self) -> bool {
        self.state().window_open
    }

    pub fn block_count(&self) -> usize {
        self.state().blocks.len()
    }

    fn travel(&self, goal: &NavigationGoal, movements: Option<&MovementConfig>, awaited: bool) -> bool {
        let mut state = self.state();
        let succeeded = if state.travel_failures > 0 {
            state.travel_failures -= 1;
            false
        } else {
            !state.unreachable.contains(&goal.target.cell())
        };
        if succeeded {
            state.position = goal.target;
        }
        state.travel_log.push(TravelRecord {
            goal: goal.clone(),
            movements: movements.cloned(),
            awaited,
            succeeded,
        });
        succeeded
    }
}

#[async_trait]
impl WorldQuery for SandboxWorld {
    async fn find_block(
        &self,
        matching: &(dyn for<'b> Fn(&'b Block) -> bool + Send + Sync),
        max_distance: f64,
    ) -> Result<Option<Block>, WorldError> {
        let state = self.state();
        let origin = state.position;
        let nearest = state
            .blocks
            .keys()
            .map(|cell| state.block(*cell))
            .filter(|b| b.position.distance_to(&origin) <= max_distance)
            .filter(|b| matching(b))
            .min_by(|a, b| {
                a.position
                    .distance_to(&origin)
                    .total_cmp(&b.position.distance_to(&origin))
            });
        Ok(nearest)
    }

    async fn block_at(&self, position: Vec3) -> Result<Option<Block>, WorldError> {
        Ok(Some(self.state().block(position.cell())))
    }
}

#[async_trait]
impl Navigator for SandboxWorld {
    async fn goto(
        &self,
        goal: &NavigationGoal,
        movements: &MovementConfig,
    ) -> Result<(), NavigationError> {
        if self.travel(goal, Some(movements), true) {
            Ok(())
        } else {
            Err(NavigationError::Failed(format!(
                "no path to {}",
                goal.target
            )))
        }
    }

    fn set_goal(&self, goal: NavigationGoal) {
        self.travel(&goal, None, false);
    }
}

#[async_trait]
impl Inventory for SandboxWorld {
    async fn items(&self) -> Result<Vec<ItemStack>, WorldError> {
        let state = self.state();
        if state.inventory_unreadable {
            return Err(WorldError::action("list items", "inventory out of sync"));
        }
        Ok(state.items.clone())
    }

    async fn equip(&self, item: &ItemStack) -> Result<(), WorldError> {
        let mut state = self.state();
        let found = state
            .items
            .iter()
            .any(|s| s.slot == item.slot && s.name == item.name);
        if !found {
            return Err(WorldError::action(
                "equip",
                format!("{} is not in slot {}", item.name, item.slot),
            ));
        }
        state.held = Some(item.slot);
        Ok(())
    }

    async fn activate_item(&self) -> Result<(), WorldError> {
        let mut state = self.state();
        let Some(slot) = state.held else {
            return Ok(());
        };
        let edible = state
            .items
            .iter()
            .find(|s| s.slot == slot)
            .is_some_and(|s| ItemCategory::of(&s.name).is_edible());
        if edible && state.take_one_held().is_some() {
            let mut vitals = state.vitals();
            vitals.food = (vitals.food + 6).min(20);
            vitals.health = (vitals.health + 2.0).min(20.0);
            state.vitals = Some(vitals);
        }
        Ok(())
    }

    async fn place_block(&self, reference: Vec3, face: Vec3) -> Result<(), WorldError> {
        let mut state = self.state();
        let target = reference.offset(face.x, face.y, face.z).cell();
        if state.blocks.contains_key(&target) {
            return Err(WorldError::action("place", "target cell is occupied"));
        }
        let Some(name) = state.take_one_held() else {
            return Err(WorldError::action("place", "nothing in hand"));
        };
        state.blocks.insert(target, name);
        Ok(())
    }
}

/// A container window opened by the agent.
struct SandboxContainer {
    cell: Cell,
    state: Arc<Mutex<SandboxState>>,
}

impl SandboxContainer {
    fn state(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContainerHandle for SandboxContainer {
    async fn deposit(&self, item: &ItemStack) -> Result<(), WorldError> {
        let mut state = self.state();
        if state.rejected_deposits.contains(&item.name) {
            return Err(WorldError::action("deposit", "container refused the item"));
        }
        let Some(index) = state
            .items
            .iter()
            .position(|s| s.slot == item.slot && s.name == item.name)
        else {
            return Err(WorldError::action("deposit", format!("{} not carried", item.name)));
        };
        let stack = state.items.remove(index);
        if state.held == Some(stack.slot) {
            state.held = None;
        }
        state.containers.entry(self.cell).or_default().push(stack);
        Ok(())
    }

    async fn close(&self) -> Result<(), WorldError> {
        self.state().window_open = false;
        Ok(())
    }
}

#[async_trait]
impl ContainerService for SandboxWorld {
    async fn open_container(&self, position: Vec3) -> Result<Box<dyn ContainerHandle>, WorldError> {
        let cell = position.cell();
        let mut state = self.state();
        if state.block(cell).category() != BlockCategory::Container {
            return Err(WorldError::action(
                "open container",
                format!("no container at {position}"),
            ));
        }
        state.window_open = true;
        state.containers.entry(cell).or_default();
        Ok(Box::new(SandboxContainer {
            cell,
            state: self.state.clone(),
        }))
    }

    async fn close_window(&self) -> Result<(), WorldError> {
        self.state().window_open = false;
        Ok(())
    }
}

#[async_trait]
impl Body for SandboxWorld {
    fn entity_id(&self) -> u64 {
        self.entity_id
    }

    async fn vitals(&self) -> Result<Vitals, WorldError> {
        Ok(self.state().vitals())
    }

    async fn position(&self) -> Result<Vec3, WorldError> {
        Ok(self.state().position)
    }

    async fn dig(&self, block: &Block) -> Result<(), WorldError> {
        let mut state = self.state();
        let cell = block.position.cell();
        let Some(name) = state.blocks.remove(&cell) else {
            return Err(WorldError::action("dig", format!("nothing at {}", block.position)));
        };
        state.digs.push(block.position);
        state.give(drop_for(&name), 1);

        state.digs_since_hunger += 1;
        if state.digs_since_hunger >= DIGS_PER_HUNGER {
            state.digs_since_hunger = 0;
            let mut vitals = state.vitals();
            vitals.food = vitals.food.saturating_sub(1);
            state.vitals = Some(vitals);
        }
        debug!(block = %name, at = %block.position, "Sandbox block broken");
        Ok(())
    }

    async fn attack(&self, entity_id: u64) -> Result<(), WorldError> {
        self.state().attacks.push(entity_id);
        Ok(())
    }

    async fn player_position(&self, username: &str) -> Result<Option<Vec3>, WorldError> {
        Ok(self.state().players.get(username).copied())
    }
}

#[async_trait]
impl ChatChannel for SandboxWorld {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, text: &str) -> Result<(), WorldError> {
        self.state().chat_log.push(text.to_string());
        if self.echo_chat {
            println!("<bot> {text}");
        } else {
            info!(channel = %self.name, "<bot> {text}");
        }
        Ok(())
    }
}
