//! The world: body storage, the simulation tick,
//! and the collision resolution loop.

use crate::math as m;
use thunderdome as td;

//

pub mod behavior;
pub use behavior::{Behavior, BehaviorKind, BulletState, PowerupKind, TankState};

pub mod body;
pub use body::Body;

pub mod collision;
pub use collision::{Collider, ColliderShape, Collision, Contact, ShapeError};

//

/// Key type to look up a body stored in the world.
/// Generational, so it can safely be held over the body's destruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(td::Index);

/// Tunable parameters of the collision engine.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct Tuning {
    /// Overlaps shallower than this count as separation,
    /// so bodies resting exactly against each other don't collide forever.
    pub epsilon: f64,
    /// How many rounds of correct-and-recheck a moving body gets per tick
    /// before it's left wherever the last round put it.
    pub max_resolve_attempts: usize,
    /// Center distance beyond which a pair is skipped without running
    /// the narrow phase. Both bodies' bounding radii are added on top,
    /// so this only needs to cover slack between bounding circles.
    pub cull_distance: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            epsilon: 1e-3,
            max_resolve_attempts: 5,
            cull_distance: 100.0,
        }
    }
}

/// Events recorded by the world, readable until the next tick clears them.
#[derive(Clone, Copy, Debug)]
pub enum PhysicsEvent {
    Contact(ContactEvent),
    Destroyed(DestroyEvent),
}

/// A resolved collision, recorded once for each orientation of the pair.
#[derive(Clone, Copy, Debug)]
pub struct ContactEvent {
    pub body: BodyKey,
    /// The body that `body` was in contact with.
    pub other: BodyKey,
}

/// A body was destroyed and will be gone from the world
/// at the end of the tick.
#[derive(Clone, Copy, Debug)]
pub struct DestroyEvent {
    pub body: BodyKey,
    pub kind: BehaviorKind,
}

/// The world that owns every body and steps the simulation.
///
/// Time is measured in ticks. Each [`tick`][Self::tick] moves every movable
/// body by its velocity, then resolves any overlaps that produced:
/// moved bodies are pushed back out along the contact normal and their
/// velocity is mirrored against it, which is what makes shots ricochet.
#[derive(Default)]
pub struct PhysicsWorld {
    bodies: td::Arena<Body>,
    pub tuning: Tuning,
    events: Vec<PhysicsEvent>,
    tick_count: u64,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuning(tuning: Tuning) -> Self {
        PhysicsWorld {
            tuning,
            ..Self::default()
        }
    }

    //
    // body management
    //

    pub fn insert_body(&mut self, body: Body) -> BodyKey {
        let key = BodyKey(self.bodies.insert(body));
        // a body must never collide with itself
        if let Some(body) = self.bodies.get_mut(key.0) {
            body.ignores.push(key);
        }
        key
    }

    /// Access a body if it still exists and hasn't been destroyed.
    #[inline]
    pub fn get_body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key.0).filter(|body| !body.dead)
    }

    /// Mutably access a body if it still exists and hasn't been destroyed.
    #[inline]
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key.0).filter(|body| !body.dead)
    }

    #[inline]
    pub fn is_live(&self, key: BodyKey) -> bool {
        self.get_body(key).is_some()
    }

    /// Take a body out of the world immediately, without running
    /// any destruction side effects. Returns the body if it was still there.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        self.bodies.remove(key.0)
    }

    /// Remove every body. The tick counter keeps running.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.events.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyKey, &Body)> + '_ {
        self.bodies
            .iter()
            .filter(|(_, body)| !body.dead)
            .map(|(idx, body)| (BodyKey(idx), body))
    }

    /// Number of live bodies in the world.
    pub fn body_count(&self) -> usize {
        self.iter().count()
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Everything that happened during the latest tick,
    /// plus any destructions triggered from outside since.
    #[inline]
    pub fn events(&self) -> &[PhysicsEvent] {
        &self.events
    }

    /// Declare (or undo declaring) a pair of bodies as non-colliding.
    /// The relation works from either side; a body can't stop ignoring itself.
    pub fn set_ignored(&mut self, key: BodyKey, other: BodyKey, ignored: bool) {
        let Some(body) = self.get_body_mut(key) else { return };
        if ignored {
            if !body.ignores.contains(&other) {
                body.ignores.push(other);
            }
        } else if other != key {
            body.ignores.retain(|k| *k != other);
        }
    }

    //
    // damage and destruction
    //

    /// Deal damage to a destructible body, destroying it if its health
    /// runs out. Non-positive amounts are rejected.
    pub fn damage(&mut self, key: BodyKey, amount: f64) {
        if amount <= 0.0 {
            log::warn!("ignoring a damage call with non-positive amount {amount}");
            return;
        }
        let Some(body) = self.get_body_mut(key) else { return };
        if !body.destructible {
            return;
        }
        body.health -= amount;
        if body.health <= 0.0 {
            self.destroy(key);
        }
    }

    /// Destroy a body: it vanishes from queries right away and is removed
    /// from the world at the end of the tick. Idempotent.
    pub fn destroy(&mut self, key: BodyKey) {
        let Some(body) = self.bodies.get_mut(key.0) else { return };
        if body.dead {
            return;
        }
        body.dead = true;
        let kind = body.behavior.kind();
        let center = body.position();
        let bullet_owner = match &body.behavior {
            Behavior::Bullet(bullet) => Some(bullet.owner),
            _ => None,
        };
        self.events
            .push(PhysicsEvent::Destroyed(DestroyEvent { body: key, kind }));
        behavior::destruction_effects(self, key, kind, center, bullet_owner);
    }

    //
    // queries
    //

    /// Every body currently overlapping the given one, in storage order.
    ///
    /// Ignored pairs and destroyed bodies are skipped. Pairs whose bounding
    /// circles sit further apart than the culling distance are skipped
    /// without running the narrow phase.
    pub fn collisions_for(&self, key: BodyKey) -> Vec<Collision> {
        let mut collisions = Vec::new();
        let Some(body) = self.get_body(key) else {
            return collisions;
        };
        for (other_idx, other) in self.bodies.iter() {
            let other_key = BodyKey(other_idx);
            if other.dead {
                continue;
            }
            // the ignore relation counts from either side
            if body.ignores.contains(&other_key) || other.ignores.contains(&key) {
                continue;
            }
            let max_dist = self.tuning.cull_distance
                + body.collider().bounding_radius()
                + other.collider().bounding_radius();
            if (other.position() - body.position()).mag_sq() > max_dist * max_dist {
                continue;
            }
            if let Some(contact) = collision::intersection_check(
                body.position(),
                body.collider(),
                other.position(),
                other.collider(),
                self.tuning.epsilon,
            ) {
                collisions.push(Collision {
                    other: other_key,
                    contact,
                });
            }
        }
        collisions
    }

    //
    // stepping
    //

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) {
        self.events.clear();
        self.tick_count += 1;
        let now = self.tick_count;
        log::trace!("tick {now} with {} bodies", self.bodies.len());

        // snapshot the keys so bodies spawned by callbacks during this tick
        // don't start moving until the next one
        let keys: Vec<BodyKey> = self.bodies.iter().map(|(idx, _)| BodyKey(idx)).collect();

        for key in keys {
            let Some(body) = self.get_body_mut(key) else {
                // destroyed by an earlier body's callbacks
                continue;
            };
            let movable = body.movable;
            if !behavior::pre_step(body, now) {
                self.destroy(key);
                continue;
            }
            if movable {
                self.resolve_body(key);
            }
        }

        // drop everything destroyed during this tick for real
        self.bodies.retain(|_, body| !body.dead);
    }

    /// Move one body by its velocity, then get it out of whatever
    /// it ended up overlapping.
    ///
    /// Corrections are tried one contact at a time: push out along that
    /// contact's normal, mirror the velocity against it, and see if the
    /// body is now in the clear. If not, the correction is undone and the
    /// next contact gets a try. If even the last one leaves overlaps,
    /// its correction is kept and the new overlap set is attacked on the
    /// next attempt, up to [`Tuning::max_resolve_attempts`].
    /// Collision callbacks run when a correction resolves the body, when
    /// the last contact of an attempt is adopted, and for pass-through
    /// pairs, which get no correction at all.
    fn resolve_body(&mut self, key: BodyKey) {
        {
            let Some(body) = self.get_body_mut(key) else { return };
            let velocity = body.velocity();
            body.translate(velocity);
        }

        let mut collisions = self.collisions_for(key);
        if collisions.is_empty() {
            return;
        }

        let max_attempts = self.tuning.max_resolve_attempts;
        let mut attempts = 0;
        // pass-through pairs already notified during this resolution;
        // they keep overlapping, so later attempts see them again
        let mut passed_through: Vec<BodyKey> = Vec::new();
        'attempts: while attempts < max_attempts {
            let Some(body) = self.get_body(key) else { return };
            let unstoppable = body.unstoppable;
            let prev_pos = body.position();
            let prev_vel = body.velocity();

            if unstoppable {
                // pass-through pairs get their callbacks once and are dropped:
                // they don't produce a correction, so the loop below
                // should only see pairs it can act on
                let mut corrective = Vec::with_capacity(collisions.len());
                for collision in collisions {
                    let destructible = match self.get_body(collision.other) {
                        Some(other) => other.destructible,
                        None => continue,
                    };
                    if destructible {
                        if !passed_through.contains(&collision.other) {
                            passed_through.push(collision.other);
                            self.notify_collision(key, collision.other);
                            if !self.is_live(key) {
                                return;
                            }
                        }
                    } else {
                        corrective.push(collision);
                    }
                }
                collisions = corrective;
                if collisions.is_empty() {
                    break 'attempts;
                }
            }

            let pair_count = collisions.len();
            for i in 0..pair_count {
                let collision = collisions[i];
                if !self.is_live(collision.other) {
                    // destroyed by an earlier callback; the contact is stale
                    continue;
                }

                {
                    let Some(body) = self.get_body_mut(key) else { return };
                    body.translate(*collision.contact.normal * collision.contact.depth);
                    let reflected = m::reflect(body.velocity(), collision.contact.normal);
                    body.set_velocity(reflected);
                }

                let requery = self.collisions_for(key);
                if requery.is_empty() {
                    // this correction resolved everything at once
                    self.notify_collision(key, collision.other);
                    break 'attempts;
                } else if i + 1 < pair_count {
                    // didn't work out; undo it and try the next contact instead
                    let Some(body) = self.get_body_mut(key) else { return };
                    body.set_position(prev_pos);
                    body.set_velocity(prev_vel);
                } else {
                    // still overlapping something even after the last contact:
                    // keep this correction and spend another attempt
                    // on the new overlap set
                    self.notify_collision(key, collision.other);
                    if !self.is_live(key) {
                        return;
                    }
                    collisions = requery;
                    attempts += 1;
                    continue 'attempts;
                }
            }

            // every remaining contact was stale; look again
            collisions = self.collisions_for(key);
            if collisions.is_empty() {
                break;
            }
            attempts += 1;
        }

        if attempts >= max_attempts {
            // not fatal: the body stays put with some visible overlap
            // and gets another try next tick
            log::debug!("left a body overlapping after {attempts} resolution attempts");
        } else if attempts > 1 {
            log::debug!("resolved a body after {attempts} attempts");
        }
    }

    /// Record a resolved pair and run both bodies' gameplay reactions.
    fn notify_collision(&mut self, a: BodyKey, b: BodyKey) {
        self.events
            .push(PhysicsEvent::Contact(ContactEvent { body: a, other: b }));
        self.events
            .push(PhysicsEvent::Contact(ContactEvent { body: b, other: a }));
        behavior::collision_reaction(self, a, b);
        behavior::collision_reaction(self, b, a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn static_square(world: &mut PhysicsWorld, pos: m::Vec2, side: f64) -> BodyKey {
        world.insert_body(Body::new_static(ColliderShape::new_square(side)).with_position(pos))
    }

    fn kinematic_square(world: &mut PhysicsWorld, pos: m::Vec2, side: f64) -> BodyKey {
        world.insert_body(Body::new_kinematic(ColliderShape::new_square(side)).with_position(pos))
    }

    fn assert_pos(world: &PhysicsWorld, key: BodyKey, expected: m::Vec2) {
        let pos = world.get_body(key).expect("body should be alive").position();
        assert!(
            (pos - expected).mag() < 1e-9,
            "expected position {expected:?}, got {pos:?}"
        );
    }

    #[test]
    fn bodies_never_collide_with_themselves() {
        let mut world = PhysicsWorld::new();
        let key = kinematic_square(&mut world, m::Vec2::zero(), 10.0);
        assert!(world.get_body(key).unwrap().ignored().contains(&key));
        assert!(world.collisions_for(key).is_empty());
    }

    #[test]
    fn ignore_pairs_work_from_either_side() {
        let mut world = PhysicsWorld::new();
        let a = static_square(&mut world, m::Vec2::zero(), 10.0);
        let b = static_square(&mut world, m::Vec2::new(5.0, 0.0), 10.0);

        assert_eq!(world.collisions_for(a).len(), 1);
        assert_eq!(world.collisions_for(b).len(), 1);

        world.set_ignored(a, b, true);
        assert!(world.collisions_for(a).is_empty());
        assert!(world.collisions_for(b).is_empty());

        world.set_ignored(a, b, false);
        assert_eq!(world.collisions_for(a).len(), 1);

        // now declared from the other side
        world.set_ignored(b, a, true);
        assert!(world.collisions_for(a).is_empty());
        assert!(world.collisions_for(b).is_empty());
    }

    #[test]
    fn long_walls_are_not_distance_culled() {
        let mut world = PhysicsWorld::new();
        // an arena-spanning wall whose center is far from the other body
        let wall = world.insert_body(
            Body::new_static(ColliderShape::new_rect(900.0, 2.0))
                .with_position(m::Vec2::new(450.0, 0.0)),
        );
        let body = kinematic_square(&mut world, m::Vec2::new(10.0, 0.0), 10.0);

        let hits = world.collisions_for(body);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].other, wall);
    }

    #[test]
    fn query_reports_contact_depth_and_direction() {
        let mut world = PhysicsWorld::new();
        let body = kinematic_square(&mut world, m::Vec2::zero(), 10.0);
        static_square(&mut world, m::Vec2::new(5.0, 0.0), 10.0);

        let hits = world.collisions_for(body);
        assert_eq!(hits.len(), 1);
        let contact = hits[0].contact;
        assert!((contact.depth - 5.0).abs() < 1e-9);
        assert!((contact.normal.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn queries_list_overlaps_in_insertion_order() {
        let mut world = PhysicsWorld::new();
        let probe = kinematic_square(&mut world, m::Vec2::zero(), 10.0);
        let right = static_square(&mut world, m::Vec2::new(4.0, 0.0), 10.0);
        let left = static_square(&mut world, m::Vec2::new(-4.0, 0.0), 10.0);
        let above = static_square(&mut world, m::Vec2::new(0.0, 4.0), 10.0);

        itertools::assert_equal(
            world.collisions_for(probe).iter().map(|coll| coll.other),
            [right, left, above],
        );
    }

    #[test]
    fn resolution_pushes_out_and_reflects_velocity() {
        let mut world = PhysicsWorld::new();
        let body = world.insert_body(
            Body::new_kinematic(ColliderShape::new_square(10.0))
                .with_velocity(m::Vec2::new(2.0, 1.0)),
        );
        static_square(&mut world, m::Vec2::new(7.0, 0.0), 10.0);

        world.tick();

        // moved to (2, 1), pushed back out 5 along -x
        assert_pos(&world, body, m::Vec2::new(-3.0, 1.0));
        // the normal component flipped, the tangential one survived
        let vel = world.get_body(body).unwrap().velocity();
        assert!((vel - m::Vec2::new(-2.0, 1.0)).mag() < 1e-9);
        // both orientations of the pair were reported
        let contacts = world
            .events()
            .iter()
            .filter(|ev| matches!(ev, PhysicsEvent::Contact(_)))
            .count();
        assert_eq!(contacts, 2);
    }

    #[test]
    fn events_are_cleared_by_the_next_tick() {
        let mut world = PhysicsWorld::new();
        let body = world.insert_body(
            Body::new_kinematic(ColliderShape::new_square(10.0))
                .with_velocity(m::Vec2::new(2.0, 0.0)),
        );
        static_square(&mut world, m::Vec2::new(7.0, 0.0), 10.0);

        world.tick();
        assert!(!world.events().is_empty());

        // flying away freely now; nothing new to report
        world.tick();
        assert!(world.events().is_empty());
        let vel = world.get_body(body).unwrap().velocity();
        assert!((vel - m::Vec2::new(-2.0, 0.0)).mag() < 1e-9);
    }

    #[test]
    fn corner_squeeze_resolves_against_both_walls() {
        let mut world = PhysicsWorld::new();
        let body = kinematic_square(&mut world, m::Vec2::zero(), 10.0);
        static_square(&mut world, m::Vec2::new(7.0, 0.0), 10.0);
        static_square(&mut world, m::Vec2::new(0.0, 7.0), 10.0);

        world.tick();

        // single-contact corrections can't fix this; the second attempt
        // works from the partially corrected position
        assert_pos(&world, body, m::Vec2::new(-3.0, -3.0));
    }

    #[test]
    fn overtight_squeezes_terminate_and_leave_the_body_live() {
        init_logs();
        let mut world = PhysicsWorld::new();
        let body = kinematic_square(&mut world, m::Vec2::zero(), 10.0);
        for wall_pos in [
            m::Vec2::new(6.0, 0.0),
            m::Vec2::new(-6.0, 0.0),
            m::Vec2::new(0.0, 6.0),
            m::Vec2::new(0.0, -6.0),
        ] {
            static_square(&mut world, wall_pos, 10.0);
        }

        // no way out of this box; the attempt budget has to save us
        world.tick();
        assert!(world.is_live(body));
    }

    #[test]
    fn immovable_bodies_do_not_integrate_velocity() {
        let mut world = PhysicsWorld::new();
        let wall = world.insert_body(
            Body::new_static(ColliderShape::new_square(10.0))
                .with_velocity(m::Vec2::new(5.0, 0.0)),
        );
        world.tick();
        assert_pos(&world, wall, m::Vec2::zero());
    }

    #[test]
    fn unstoppable_bodies_pass_through_destructible_ones() {
        let mut world = PhysicsWorld::new();
        let mut rammer = Body::new_kinematic(ColliderShape::new_square(10.0))
            .with_velocity(m::Vec2::new(1.0, 0.0));
        rammer.unstoppable = true;
        let rammer = world.insert_body(rammer);
        let target = world.insert_body(
            Body::new_static(ColliderShape::new_square(10.0))
                .with_position(m::Vec2::new(3.0, 0.0))
                .with_health(100.0),
        );

        world.tick();

        // moved by velocity alone: no pushback, no reflection
        assert_pos(&world, rammer, m::Vec2::new(1.0, 0.0));
        let vel = world.get_body(rammer).unwrap().velocity();
        assert!((vel - m::Vec2::new(1.0, 0.0)).mag() < 1e-9);
        // the target stayed put but both sides got their callbacks
        assert_pos(&world, target, m::Vec2::new(3.0, 0.0));
        let contacts = world
            .events()
            .iter()
            .filter(|ev| matches!(ev, PhysicsEvent::Contact(_)))
            .count();
        assert_eq!(contacts, 2);
    }

    #[test]
    fn unstoppable_bodies_still_bounce_off_indestructible_ones() {
        let mut world = PhysicsWorld::new();
        let mut rammer = Body::new_kinematic(ColliderShape::new_square(10.0));
        rammer.unstoppable = true;
        let rammer = world.insert_body(rammer.with_position(m::Vec2::new(2.0, 0.0)));
        static_square(&mut world, m::Vec2::new(7.0, 0.0), 10.0);

        world.tick();

        // a plain wall is not destructible, so it still blocks
        assert_pos(&world, rammer, m::Vec2::new(-3.0, 0.0));
    }

    #[test]
    fn destroyed_bodies_vanish_before_the_next_query() {
        let mut world = PhysicsWorld::new();
        let fragile = world.insert_body(
            Body::new_static(ColliderShape::new_square(10.0)).with_health(10.0),
        );
        let prober = kinematic_square(&mut world, m::Vec2::new(5.0, 0.0), 10.0);

        assert_eq!(world.collisions_for(prober).len(), 1);

        // overkill damage destroys in one call
        world.damage(fragile, 15.0);
        assert!(world.get_body(fragile).is_none());
        assert!(world.collisions_for(prober).is_empty());
        assert!(world
            .events()
            .iter()
            .any(|ev| matches!(ev, PhysicsEvent::Destroyed(_))));

        // the sweep at end of tick makes the removal physical
        world.tick();
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn non_positive_damage_is_rejected() {
        init_logs();
        let mut world = PhysicsWorld::new();
        let body = world.insert_body(
            Body::new_static(ColliderShape::new_square(10.0)).with_health(10.0),
        );
        world.damage(body, 0.0);
        world.damage(body, -4.0);
        assert_eq!(world.get_body(body).map(|b| b.health()), Some(10.0));
    }

    #[test]
    fn indestructible_bodies_shrug_off_damage() {
        let mut world = PhysicsWorld::new();
        let wall = static_square(&mut world, m::Vec2::zero(), 10.0);
        world.damage(wall, 1000.0);
        assert!(world.is_live(wall));
    }

    #[test]
    fn clearing_the_world_keeps_time_running() {
        let mut world = PhysicsWorld::new();
        static_square(&mut world, m::Vec2::zero(), 10.0);
        world.tick();
        world.tick();
        world.clear();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.tick_count(), 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn params() -> impl Strategy<Value = (f64, f64, f64, f64, usize)> {
            (
                -8.0..8.0_f64,
                -8.0..8.0_f64,
                -2.0..2.0_f64,
                -2.0..2.0_f64,
                1usize..6,
            )
        }

        proptest! {
            // a moving body boxed in by walls, wherever it starts and
            // however small its attempt budget, must come out of every
            // tick live, at a finite position and without gaining speed
            #[test]
            fn resolution_terminates_for_any_overlap_and_budget(
                (x, y, vx, vy, budget) in params(),
            ) {
                let mut world = PhysicsWorld::with_tuning(Tuning {
                    max_resolve_attempts: budget,
                    ..Tuning::default()
                });
                let key = world.insert_body(
                    Body::new_kinematic(ColliderShape::new_square(10.0))
                        .with_position(m::Vec2::new(x, y))
                        .with_velocity(m::Vec2::new(vx, vy)),
                );
                for wall_pos in [
                    m::Vec2::new(9.0, 0.0),
                    m::Vec2::new(-9.0, 0.0),
                    m::Vec2::new(0.0, 9.0),
                    m::Vec2::new(0.0, -9.0),
                ] {
                    static_square(&mut world, wall_pos, 10.0);
                }

                for _ in 0..4 {
                    world.tick();
                }

                let body = world.get_body(key).expect("nothing here can destroy a body");
                prop_assert!(body.position().x.is_finite());
                prop_assert!(body.position().y.is_finite());
                // reflections only redirect velocity, never add to it
                let speed_cap = m::Vec2::new(2.0, 2.0).mag();
                prop_assert!(body.velocity().mag() <= speed_cap + 1e-9);
            }
        }
    }
}
