//! The per-frame component systems run against a live scene.

use std::any::Any;

use ucs_core::component::{collision, movement, sprite, walk};
use ucs_core::{
    Action, Actor, ActorCore, ActorId, Collider, ComponentRegistries, Contact, GridWorld, Mover,
    Offset, Position, Rect, RenderContext, RenderStage, Result, Scene, Spawned, Sprite, TeamBits,
    Tile, TickContext, WalkDirection, Walker,
};

struct Dummy;

impl Actor for Dummy {
    fn tick(&mut self, _cx: &mut TickContext<'_>) -> Result<Option<Box<dyn Action>>> {
        Ok(None)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn place(
    scene: &mut Scene,
    at: Position,
    team: TeamBits,
    attach: impl FnOnce(ActorId, &mut ComponentRegistries),
) -> ActorId {
    scene
        .spawn(|id, components| {
            attach(id, components);
            Ok(Spawned::new(ActorCore::new(at, team), Dummy))
        })
        .unwrap()
}

fn grid() -> GridWorld {
    GridWorld::new(8, 8, 16, 16).unwrap()
}

// ── Collision ─────────────────────────────────────────────────────────────

fn contacts(scene: &Scene) -> Vec<Option<Contact>> {
    scene
        .components()
        .colliders
        .iter()
        .map(|(_, c)| c.contact)
        .collect()
}

fn run_collision(scene: &mut Scene) {
    let (components, cores) = scene.split_mut();
    collision::update(&mut components.colliders, &cores);
}

#[test]
fn overlapping_colliders_see_each_other() {
    let mut scene = Scene::new();
    let collider = |id: ActorId, c: &mut ComponentRegistries| {
        c.colliders.attach(id, Collider::new(16));
    };
    let player = place(&mut scene, Position::new(0, 0), TeamBits::PLAYER, collider);
    let friend = place(&mut scene, Position::new(8, 8), TeamBits::FRIEND, collider);
    place(&mut scene, Position::new(64, 64), TeamBits::ENEMY, collider);

    run_collision(&mut scene);
    assert_eq!(
        contacts(&scene),
        vec![
            Some(Contact {
                actor: friend,
                team: TeamBits::FRIEND
            }),
            Some(Contact {
                actor: player,
                team: TeamBits::PLAYER
            }),
            None,
        ]
    );
}

#[test]
fn last_overlapping_pair_wins() {
    let mut scene = Scene::new();
    let collider = |id: ActorId, c: &mut ComponentRegistries| {
        c.colliders.attach(id, Collider::new(16));
    };
    place(&mut scene, Position::new(0, 0), TeamBits::PLAYER, collider);
    place(&mut scene, Position::new(8, 0), TeamBits::FRIEND, collider);
    let enemy = place(&mut scene, Position::new(-12, 0), TeamBits::ENEMY, collider);

    run_collision(&mut scene);
    assert_eq!(contacts(&scene)[0].map(|c| c.actor), Some(enemy));
}

#[test]
fn touching_edges_and_inactive_owners_do_not_collide() {
    let mut scene = Scene::new();
    let collider = |id: ActorId, c: &mut ComponentRegistries| {
        c.colliders.attach(id, Collider::new(16));
    };
    place(&mut scene, Position::new(0, 0), TeamBits::PLAYER, collider);
    place(&mut scene, Position::new(16, 0), TeamBits::FRIEND, collider);
    let ghost = place(&mut scene, Position::new(4, 4), TeamBits::ENEMY, collider);
    scene.deactivate(ghost);

    run_collision(&mut scene);
    assert_eq!(contacts(&scene), vec![None, None, None]);
}

#[test]
fn contacts_are_reset_each_frame() {
    let mut scene = Scene::new();
    let collider = |id: ActorId, c: &mut ComponentRegistries| {
        c.colliders.attach(id, Collider::new(16));
    };
    let a = place(&mut scene, Position::new(0, 0), TeamBits::PLAYER, collider);
    place(&mut scene, Position::new(8, 0), TeamBits::FRIEND, collider);
    run_collision(&mut scene);
    assert!(contacts(&scene)[0].is_some());

    scene.core_mut(a).unwrap().position = Position::new(100, 100);
    run_collision(&mut scene);
    assert!(contacts(&scene)[0].is_none());
}

// ── Walk ──────────────────────────────────────────────────────────────────

fn walker_at(scene: &mut Scene, tile: Tile, speed: i32) -> ActorId {
    place(
        scene,
        Position::new(tile.col * 16, tile.row * 16),
        TeamBits::PLAYER,
        move |id, c| {
            c.walkers.attach(id, Walker::new(speed));
        },
    )
}

fn set_direction(scene: &mut Scene, direction: WalkDirection) {
    for (_, walker) in scene.components_mut().walkers.iter_mut() {
        walker.direction = direction;
    }
}

fn run_walk(scene: &mut Scene, world: &GridWorld, frames: usize) {
    for _ in 0..frames {
        let (components, mut cores) = scene.split_mut();
        walk::update(&mut components.walkers, &mut cores, world);
    }
}

#[test]
fn walker_steps_one_tile_and_stops_when_released() {
    let world = grid();
    let mut scene = Scene::new();
    let id = walker_at(&mut scene, Tile::new(1, 1), 4);

    set_direction(&mut scene, WalkDirection::East);
    run_walk(&mut scene, &world, 3);
    assert_eq!(scene.core(id).unwrap().position, Position::new(28, 16));

    set_direction(&mut scene, WalkDirection::Stop);
    run_walk(&mut scene, &world, 3);
    assert_eq!(scene.core(id).unwrap().position, Position::new(32, 16));
    let (_, walker) = scene.components().walkers.iter().next().unwrap();
    assert!(!walker.is_walking());
}

#[test]
fn held_direction_chains_with_leftover_energy() {
    let world = grid();
    let mut scene = Scene::new();
    let id = walker_at(&mut scene, Tile::new(1, 1), 5);

    set_direction(&mut scene, WalkDirection::East);
    run_walk(&mut scene, &world, 4);
    assert_eq!(scene.core(id).unwrap().position, Position::new(36, 16));
    let (_, walker) = scene.components().walkers.iter().next().unwrap();
    assert_eq!(walker.dst, Some(Tile::new(3, 1)));
}

#[test]
fn walker_never_enters_blocked_or_outside_tiles() {
    let mut world = grid();
    world.set_obstacle(Tile::new(2, 1), true);
    let mut scene = Scene::new();
    let blocked = walker_at(&mut scene, Tile::new(1, 1), 4);
    let edge = walker_at(&mut scene, Tile::new(0, 5), 4);

    for (owner, walker) in scene.components_mut().walkers.iter_mut() {
        walker.direction = if owner == blocked {
            WalkDirection::East
        } else {
            WalkDirection::West
        };
    }
    run_walk(&mut scene, &world, 10);
    assert_eq!(scene.core(blocked).unwrap().position, Position::new(16, 16));
    assert_eq!(scene.core(edge).unwrap().position, Position::new(0, 80));
}

// ── Movement ──────────────────────────────────────────────────────────────

fn mover_at(scene: &mut Scene, at: Position, vel: (i32, i32)) -> ActorId {
    place(scene, at, TeamBits::ENEMY, move |id, c| {
        let mut mover = Mover::new(Rect::new(0, 0, 15, 15));
        mover.vel_x = vel.0;
        mover.vel_y = vel.1;
        c.movers.attach(id, mover);
    })
}

fn run_movement(scene: &mut Scene, world: &GridWorld) {
    let (components, mut cores) = scene.split_mut();
    movement::update(&components.movers, &mut cores, world);
}

#[test]
fn mover_moves_when_all_corners_are_walkable() {
    let world = grid();
    let mut scene = Scene::new();
    let id = mover_at(&mut scene, Position::new(16, 16), (2, -1));

    run_movement(&mut scene, &world);
    assert_eq!(scene.core(id).unwrap().position, Position::new(18, 15));
}

#[test]
fn mover_is_stopped_by_any_blocked_corner() {
    let mut world = grid();
    world.set_obstacle(Tile::new(2, 1), true);
    let mut scene = Scene::new();
    let id = mover_at(&mut scene, Position::new(16, 16), (2, 0));

    run_movement(&mut scene, &world);
    assert_eq!(scene.core(id).unwrap().position, Position::new(16, 16));
}

// ── Sprite ────────────────────────────────────────────────────────────────

#[test]
fn sprites_of_inactive_or_frameless_owners_are_skipped() {
    let mut scene = Scene::new();
    let visible = |id: ActorId, c: &mut ComponentRegistries| {
        c.sprites.attach(
            id,
            Sprite::new(Some(Rect::new(17, 86, 16, 16)), Offset::new(-8, -8)),
        );
    };
    place(&mut scene, Position::new(40, 40), TeamBits::FRIEND, visible);
    let hidden = place(&mut scene, Position::new(0, 0), TeamBits::FRIEND, visible);
    place(&mut scene, Position::new(0, 0), TeamBits::FRIEND, |id, c| {
        c.sprites.attach(id, Sprite::default());
    });
    scene.deactivate(hidden);

    let mut ctx = RenderContext::new();
    let (components, cores) = scene.split_mut();
    sprite::update(&components.sprites, &cores, &mut ctx);

    assert_eq!(ctx.len(), 1);
    let cmd = &ctx.commands()[0];
    assert_eq!(cmd.stage, RenderStage::Masked);
    assert_eq!(cmd.order, sprite::SPRITE_ORDER);
    assert_eq!(cmd.position, Position::new(32, 32));
    assert_eq!(cmd.frame, Rect::new(17, 86, 16, 16));
}
