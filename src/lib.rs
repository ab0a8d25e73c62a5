pub mod game;
pub use game::{Level, LevelParams, MazeParams, Session, TankInput, WallRect};

pub mod math;
pub use math::{uv, Angle, Unit, Vec2};

pub mod physics;
pub use physics::{
    behavior::{self, Behavior, BehaviorKind, BulletState, PowerupKind, TankState},
    collision::{self, Collider, ColliderShape, Collision, Contact, ShapeError},
    Body, BodyKey, ContactEvent, DestroyEvent, PhysicsEvent, PhysicsWorld, Tuning,
};
