//! Arena dimensions, sizes and action timings
//!
//! All distances are in grid units and all durations in seconds unless a
//! name says otherwise.

/// Arena is `GRID_SIZE` x `GRID_SIZE` cells
pub const GRID_SIZE: f32 = 20.0;

/// Pixels per grid cell (rendering scale, also used by knockback and pointer math)
pub const CELL_SIZE: f32 = 80.0;

/// Side of an actor's collision box, in grid units
pub const ACTOR_SIZE: f32 = 0.8;

/// Side of a projectile's collision box, in grid units
pub const PROJECTILE_SIZE: f32 = 0.1;

/// Obstacles are unit cells
pub const OBSTACLE_SIZE: f32 = 1.0;

/// Time every projectile takes to cover its full distance
pub const PROJECTILE_TRAVEL_TIME: f32 = 0.5;

/// Maximum distance between an actor and an item it can collect
pub const PICKUP_RANGE: f32 = 1.5;
pub const PICKUP_COOLDOWN: f32 = 0.5;

pub const DASH_DISTANCE: f32 = 3.0;
pub const DASH_COOLDOWN: f32 = 2.0;

/// Stun applied when a block bar breaks
pub const BLOCK_BREAK_STUN: f32 = 1.0;

/// Block bar refills at `blockValue / BLOCK_REGEN_DIVISOR` per second
pub const BLOCK_REGEN_DIVISOR: f32 = 5.0;

/// Total width of the melee cone (60 degrees)
pub const MELEE_ARC: f32 = std::f32::consts::PI / 3.0;

/// Charges below this are discarded on release
pub const MIN_RELEASE_CHARGE: f32 = 0.1;

/// Extra damage per unit of charge on ranged and thrown attacks
pub const CHARGE_DAMAGE_BONUS: f32 = 0.5;

/// Throw cooldown is the thrown weapon's attack cooldown times this
pub const THROW_COOLDOWN_FACTOR: f32 = 1.5;

/// Click-to-move stops when this close to the target
pub const ARRIVAL_TOLERANCE: f32 = 0.1;

pub const MAX_INVENTORY: usize = 3;
pub const STARTING_ARROWS: u32 = 10;
pub const ARROW_BUNDLE: u32 = 5;

pub const ATTACK_VISUAL_LIFETIME: f32 = 0.2;
/// Floating text lasts as long as the engine spawns it with (1.5 s), not the 1.0 s table default
pub const COMBAT_FEEDBACK_LIFETIME: f32 = 1.5;

/// Upward drift of floating combat text, in pixels per second
pub const FEEDBACK_RISE_SPEED: f32 = 20.0;

pub const DEFAULT_OBSTACLE_COUNT: usize = 15;
pub const OBSTACLE_PLACEMENT_ATTEMPTS: usize = 100;
pub const ACTOR_PLACEMENT_ATTEMPTS: usize = 50;

/// Spawn points for players and bots
pub const SPAWN_POINTS: [(f32, f32); 8] = [
    (2.0, 2.0),
    (18.0, 18.0),
    (2.0, 18.0),
    (18.0, 2.0),
    (10.0, 5.0),
    (5.0, 10.0),
    (15.0, 10.0),
    (10.0, 15.0),
];

/// Dummy position used when random placement fails
pub const DUMMY_FALLBACK_POSITION: (f32, f32) = (GRID_SIZE / 2.0, GRID_SIZE / 2.0 - 2.0);
