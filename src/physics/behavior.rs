//! Body kinds and the gameplay rules attached to them: what spawns them,
//! what they do each tick, and how they react to collisions.

use super::{collision::ColliderShape, Body, BodyKey, PhysicsWorld};
use crate::math as m;

//
// stats
//

/// Side length of a tank chassis. The gun barrel doubles the reach
/// on the facing side.
pub const TANK_SIZE: f64 = 15.0;
/// World units a driving tank covers per tick.
pub const TANK_SPEED: f64 = 1.0;
/// Degrees a turning tank rotates per tick.
pub const TANK_TURN_SPEED: f64 = 5.0;
pub const TANK_MAX_HEALTH: f64 = 10.0;
pub const TANK_MAX_AMMO: u32 = 5;
/// Ticks between shots.
pub const TANK_FIRE_COOLDOWN: u64 = 30;
/// How far ahead of the tank's center a fired bullet appears.
pub const TANK_MUZZLE_OFFSET: f64 = TANK_SIZE * 0.9;

pub const BULLET_SIZE: f64 = 5.0;
pub const BULLET_SPEED: f64 = 1.5;
pub const BULLET_DAMAGE: f64 = 4.0;
/// Bounces a bullet survives before fizzling out.
pub const BULLET_MAX_BOUNCES: u32 = 10;
/// Ticks a bullet lives if it never runs out of bounces.
pub const BULLET_LIFETIME: u64 = 600;

pub const POWERUP_RADIUS: f64 = 5.0;
const REPAIR_AMOUNT: f64 = 5.0;
const AMMO_CACHE_ROUNDS: u32 = 2;

/// A destroyed tank bursts into this many bullets, evenly spread.
const DEATH_RING_COUNT: u32 = 6;

//
// types
//

/// What kind of game object a body is, with the per-kind state attached.
#[derive(Clone, Debug)]
pub enum Behavior {
    Wall,
    Tank(TankState),
    Bullet(BulletState),
    Powerup(PowerupKind),
}

impl Behavior {
    #[inline]
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Wall => BehaviorKind::Wall,
            Behavior::Tank(_) => BehaviorKind::Tank,
            Behavior::Bullet(_) => BehaviorKind::Bullet,
            Behavior::Powerup(_) => BehaviorKind::Powerup,
        }
    }
}

/// [`Behavior`][self::Behavior] without the attached state,
/// for cheap comparisons and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum BehaviorKind {
    Wall,
    Tank,
    Bullet,
    Powerup,
}

#[derive(Clone, Debug)]
pub struct TankState {
    /// Which player drives this tank. Purely informational to the engine.
    pub player: u8,
    pub ammo: u32,
    /// Ticks until the gun can fire again.
    pub fire_cooldown: u64,
}

#[derive(Clone, Debug)]
pub struct BulletState {
    /// The tank that fired this bullet, for ammo refunds on destruction.
    pub owner: BodyKey,
    pub remaining_bounces: u32,
    /// A fresh bullet can't hit its own shooter. The first bounce arms it,
    /// after which it can.
    pub armed: bool,
    /// Tick at which the bullet fizzles out on its own.
    pub expires_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerupKind {
    /// Restores some of a tank's health.
    Repair,
    /// Refills some of a tank's ammo.
    AmmoCache,
}

//
// spawning
//

/// The tank silhouette: a square chassis with the gun barrel merged in,
/// so the whole thing stays one convex loop.
fn tank_hull() -> ColliderShape {
    let half = TANK_SIZE / 2.0;
    let gun_half = half / 2.0;
    ColliderShape::Polygon {
        points: vec![
            m::Vec2::new(-half, -half),
            m::Vec2::new(half, -half),
            m::Vec2::new(TANK_SIZE, -gun_half),
            m::Vec2::new(TANK_SIZE, gun_half),
            m::Vec2::new(half, half),
            m::Vec2::new(-half, half),
        ],
    }
}

/// An immovable wall covering the given full extents.
pub fn wall_body(center: m::Vec2, width: f64, height: f64) -> Body {
    Body::new_static(ColliderShape::new_rect(width, height)).with_position(center)
}

/// A player tank at full health and ammo.
pub fn tank_body(position: m::Vec2, rotation: m::Angle, player: u8) -> Body {
    Body::new_kinematic(tank_hull())
        .with_position(position)
        .with_rotation(rotation)
        .with_health(TANK_MAX_HEALTH)
        .with_behavior(Behavior::Tank(TankState {
            player,
            ammo: TANK_MAX_AMMO,
            fire_cooldown: 0,
        }))
}

/// A bullet traveling along the given heading.
///
/// The fresh bullet ignores its owner; the pairing is undone
/// when the first bounce arms it.
pub fn bullet_body(position: m::Vec2, heading_deg: f64, owner: BodyKey, now: u64) -> Body {
    Body::new_kinematic(ColliderShape::new_square(BULLET_SIZE))
        .with_position(position)
        .with_velocity(m::heading_deg(heading_deg) * BULLET_SPEED)
        .with_behavior(Behavior::Bullet(BulletState {
            owner,
            remaining_bounces: BULLET_MAX_BOUNCES,
            armed: false,
            expires_at: now + BULLET_LIFETIME,
        }))
        .with_ignored(owner)
}

/// A pickup that sits in place until a tank drives into it.
pub fn powerup_body(position: m::Vec2, kind: PowerupKind) -> Body {
    Body::new_static(ColliderShape::new_circle(POWERUP_RADIUS))
        .with_position(position)
        .with_behavior(Behavior::Powerup(kind))
}

//
// actions
//

/// Fire the tank's gun if it's loaded and off cooldown.
/// Returns the key of the spawned bullet.
pub fn fire(world: &mut PhysicsWorld, tank: BodyKey) -> Option<BodyKey> {
    let now = world.tick_count();
    let body = world.get_body_mut(tank)?;
    let rotation = body.rotation_deg();
    let muzzle = body.position() + body.heading() * TANK_MUZZLE_OFFSET;
    let Behavior::Tank(state) = &mut body.behavior else {
        return None;
    };
    if state.fire_cooldown > 0 || state.ammo == 0 {
        return None;
    }
    state.ammo -= 1;
    state.fire_cooldown = TANK_FIRE_COOLDOWN;
    Some(world.insert_body(bullet_body(muzzle, rotation, tank, now)))
}

/// Per-tick upkeep of kind-specific state.
/// Returns false if the body expired and should be destroyed.
pub(super) fn pre_step(body: &mut Body, now: u64) -> bool {
    match &mut body.behavior {
        Behavior::Tank(tank) => {
            if tank.fire_cooldown > 0 {
                tank.fire_cooldown -= 1;
            }
            true
        }
        Behavior::Bullet(bullet) => now < bullet.expires_at,
        _ => true,
    }
}

/// Gameplay reaction of `source` to a resolved collision with `other`.
/// The world calls this for both orientations of every notified pair.
pub(super) fn collision_reaction(world: &mut PhysicsWorld, source: BodyKey, other: BodyKey) {
    let Some(source_kind) = world.get_body(source).map(|b| b.behavior.kind()) else {
        return;
    };
    let other_kind = world.get_body(other).map(|b| b.behavior.kind());
    match source_kind {
        BehaviorKind::Bullet => bullet_reaction(world, source, other, other_kind),
        BehaviorKind::Tank => tank_reaction(world, source, other, other_kind),
        BehaviorKind::Wall | BehaviorKind::Powerup => {}
    }
}

fn bullet_reaction(
    world: &mut PhysicsWorld,
    bullet: BodyKey,
    other: BodyKey,
    other_kind: Option<BehaviorKind>,
) {
    let Some(body) = world.get_body_mut(bullet) else {
        return;
    };
    let Behavior::Bullet(state) = &mut body.behavior else {
        return;
    };
    state.remaining_bounces = state.remaining_bounces.saturating_sub(1);
    let spent = state.remaining_bounces == 0;
    if !state.armed {
        state.armed = true;
        let owner = state.owner;
        body.ignores.retain(|k| *k != owner);
    }
    if spent {
        world.destroy(bullet);
    }
    if other_kind == Some(BehaviorKind::Tank) {
        world.damage(other, BULLET_DAMAGE);
        world.destroy(bullet);
    }
}

fn tank_reaction(
    world: &mut PhysicsWorld,
    tank: BodyKey,
    other: BodyKey,
    other_kind: Option<BehaviorKind>,
) {
    if other_kind != Some(BehaviorKind::Powerup) {
        return;
    }
    let Some(&Behavior::Powerup(kind)) = world.get_body(other).map(|b| &b.behavior) else {
        return;
    };
    let Some(body) = world.get_body_mut(tank) else {
        return;
    };
    match kind {
        PowerupKind::Repair => {
            body.health = (body.health + REPAIR_AMOUNT).min(body.max_health);
        }
        PowerupKind::AmmoCache => {
            if let Behavior::Tank(state) = &mut body.behavior {
                state.ammo = (state.ammo + AMMO_CACHE_ROUNDS).min(TANK_MAX_AMMO);
            }
        }
    }
    log::debug!("picked up a {kind:?} powerup");
    world.destroy(other);
}

/// Side effects of a body's destruction, run right after it is marked dead.
pub(super) fn destruction_effects(
    world: &mut PhysicsWorld,
    key: BodyKey,
    kind: BehaviorKind,
    center: m::Vec2,
    bullet_owner: Option<BodyKey>,
) {
    match kind {
        BehaviorKind::Tank => {
            // the wreck bursts into a ring of bullets
            let now = world.tick_count();
            for i in 0..DEATH_RING_COUNT {
                let angle = f64::from(i) * 360.0 / f64::from(DEATH_RING_COUNT);
                let position = center + m::heading_deg(angle) * TANK_SIZE;
                world.insert_body(bullet_body(position, angle, key, now));
            }
        }
        BehaviorKind::Bullet => {
            // the shot returns to the shooter's magazine
            let Some(owner) = bullet_owner else { return };
            if let Some(owner_body) = world.get_body_mut(owner) {
                if let Behavior::Tank(state) = &mut owner_body.behavior {
                    state.ammo = (state.ammo + 1).min(TANK_MAX_AMMO);
                }
            }
        }
        BehaviorKind::Wall | BehaviorKind::Powerup => {}
    }
}
