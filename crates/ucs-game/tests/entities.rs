#![forbid(unsafe_code)]

//! Player, NPC and pickup behaviour against a real driver.

use std::cell::Cell;
use std::rc::Rc;

use ucs_core::{
    Action, ActionContext, ActorId, Contact, Driver, FuncAction, KeyboardState, LabClock,
    MessageUi, Position, Scene, ShowMessageAction, SimError, TickContext,
};
use ucs_game::tutorial::{CAVE_BABE, CAVE_DUDE, tutorial_world};
use ucs_game::{
    Controls, GameError, Hand, Item, Npc, NpcBehavior, Pickup, Player, SimConfig,
    WieldItemAction,
};
use ucs_reactive::ReactiveList;

// ── Helpers ─────────────────────────────────────────────────────────────

const ENTRY: Position = Position::new(704, 624);

fn driver() -> Driver {
    let world = tutorial_world(16).unwrap();
    Driver::new(world, KeyboardState::new(), MessageUi::new())
}

fn controls() -> Controls {
    SimConfig::default().controls(0).unwrap()
}

fn spawn_player(driver: &mut Driver, at: Position) -> ActorId {
    driver
        .scene_mut()
        .spawn(Player::spawn(at, controls(), CAVE_DUDE))
        .unwrap()
}

fn held(driver: &Driver, player: ActorId, hand: Hand) -> Option<Item> {
    driver
        .scene()
        .actor::<Player>(player)
        .and_then(|p| p.humanoid.held(hand))
}

#[derive(Default)]
struct Counts {
    sightings: Cell<u32>,
    idles: Cell<u32>,
}

/// Greets every new actor with a message and counts its callbacks.
struct Greeter(Rc<Counts>);

impl NpcBehavior for Greeter {
    fn on_sight(&mut self, _cx: &mut TickContext<'_>, _seen: Contact) -> Option<Box<dyn Action>> {
        self.0.sightings.set(self.0.sightings.get() + 1);
        Some(Box::new(ShowMessageAction::new("hello")))
    }

    fn on_idle(&mut self, _cx: &mut TickContext<'_>) -> Option<Box<dyn Action>> {
        self.0.idles.set(self.0.idles.get() + 1);
        None
    }
}

/// Answers the first sighting with an action that fails when invoked.
struct Faulty(Rc<Counts>);

impl NpcBehavior for Faulty {
    fn on_sight(&mut self, _cx: &mut TickContext<'_>, _seen: Contact) -> Option<Box<dyn Action>> {
        self.0.sightings.set(self.0.sightings.get() + 1);
        Some(Box::new(FuncAction::new(|_: &mut ActionContext<'_>| {
            Err(SimError::action("greeting lost"))
        })))
    }

    fn on_idle(&mut self, _cx: &mut TickContext<'_>) -> Option<Box<dyn Action>> {
        self.0.idles.set(self.0.idles.get() + 1);
        None
    }
}

// ── Player ──────────────────────────────────────────────────────────────

#[test]
fn player_walks_while_key_held_and_stops_on_a_tile() {
    let mut driver = driver();
    let player = spawn_player(&mut driver, ENTRY);

    driver.input_mut().press(controls().right);
    for _ in 0..3 {
        driver.step().unwrap();
    }
    assert_eq!(driver.scene().core(player).unwrap().position, Position::new(707, 624));

    driver.input_mut().release_all();
    for _ in 0..20 {
        driver.step().unwrap();
    }
    assert_eq!(driver.scene().core(player).unwrap().position, Position::new(720, 624));
}

#[test]
fn player_stops_at_the_wall() {
    let mut driver = driver();
    let player = spawn_player(&mut driver, Position::new(16, 624));

    driver.input_mut().press(controls().left);
    for _ in 0..40 {
        driver.step().unwrap();
    }
    assert_eq!(driver.scene().core(player).unwrap().position, Position::new(16, 624));
}

#[test]
fn destroying_the_player_releases_its_components() {
    let mut driver = driver();
    let player = spawn_player(&mut driver, ENTRY);
    assert_eq!(driver.scene().components().sprites.owned_by(player), 1);

    assert!(driver.scene_mut().deactivate(player));
    let report = driver.step().unwrap();
    assert_eq!(report.destroyed, vec![player]);
    assert_eq!(driver.scene().components().sprites.owned_by(player), 0);
    assert_eq!(driver.scene().components().colliders.owned_by(player), 0);
}

// ── Pickup ──────────────────────────────────────────────────────────────

#[test]
fn pickup_is_wielded_and_recorded_on_player_contact() {
    let mut driver = driver();
    let pickups: ReactiveList<String> = ReactiveList::new("pickups");
    let player = spawn_player(&mut driver, ENTRY);
    let pickup = driver
        .scene_mut()
        .spawn(Pickup::spawn(
            ENTRY + ucs_core::Offset::new(8, 0),
            Item::Shield,
            pickups.clone(),
        ))
        .unwrap();

    // Contacts are computed after the first pass and read on the second.
    let first = driver.step().unwrap();
    assert!(first.destroyed.is_empty());
    let second = driver.step().unwrap();

    assert_eq!(second.destroyed, vec![pickup]);
    assert_eq!(second.actions_finished, 1);
    assert_eq!(held(&driver, player, Hand::Left), Some(Item::Shield));
    assert_eq!(pickups.get(), vec!["shield".to_string()]);
    assert_eq!(driver.scene().len(), 1);
}

#[test]
fn pickup_ignores_non_player_actors() {
    let mut driver = driver();
    let pickups: ReactiveList<String> = ReactiveList::new("pickups");
    let counts = Rc::new(Counts::default());
    driver
        .scene_mut()
        .spawn(Npc::spawn(ENTRY, CAVE_BABE, Greeter(Rc::clone(&counts))))
        .unwrap();
    driver
        .scene_mut()
        .spawn(Pickup::spawn(ENTRY, Item::Sword, pickups.clone()))
        .unwrap();

    for _ in 0..3 {
        driver.step().unwrap();
        driver.ui_mut().dismiss();
    }
    assert_eq!(driver.scene().len(), 2);
    assert!(pickups.is_empty());
}

// ── NPC ─────────────────────────────────────────────────────────────────

#[test]
fn npc_greets_each_actor_once_and_waits_for_its_action() {
    let mut driver = driver();
    let counts = Rc::new(Counts::default());
    let npc = driver
        .scene_mut()
        .spawn(Npc::spawn(ENTRY, CAVE_BABE, Greeter(Rc::clone(&counts))))
        .unwrap();
    let player = spawn_player(&mut driver, ENTRY);

    driver.step().unwrap();
    assert_eq!(counts.sightings.get(), 0);

    driver.step().unwrap();
    assert_eq!(counts.sightings.get(), 1);
    assert_eq!(driver.ui().current(), Some("hello"));
    let state = driver.scene().actor::<Npc>(npc).unwrap();
    assert!(state.is_busy());
    assert_eq!(state.seen(), &[player]);

    // Frozen, then the prompt closes and the pending action finishes.
    assert!(driver.step().unwrap().prompt_active);
    driver.ui_mut().dismiss();
    driver.step().unwrap();
    assert!(!driver.scene().actor::<Npc>(npc).unwrap().is_busy());

    let idles = counts.idles.get();
    driver.step().unwrap();
    assert_eq!(counts.sightings.get(), 1);
    assert_eq!(counts.idles.get(), idles + 1);
}

#[test]
fn npc_is_free_again_once_its_action_is_cancelled() {
    let mut driver = driver();
    let counts = Rc::new(Counts::default());
    let npc = driver
        .scene_mut()
        .spawn(Npc::spawn(ENTRY, CAVE_BABE, Greeter(Rc::clone(&counts))))
        .unwrap();
    spawn_player(&mut driver, ENTRY);

    driver.step().unwrap();
    driver.step().unwrap();
    assert!(driver.scene().actor::<Npc>(npc).unwrap().is_busy());

    let cancelled = driver.queue().take_all();
    assert_eq!(cancelled.len(), 1);
    drop(cancelled);
    assert!(!driver.scene().actor::<Npc>(npc).unwrap().is_busy());

    driver.ui_mut().dismiss();
    let idles = counts.idles.get();
    for _ in 0..3 {
        driver.step().unwrap();
    }
    assert_eq!(counts.idles.get(), idles + 3);
    assert_eq!(counts.sightings.get(), 1);
}

#[test]
fn npc_is_free_again_once_its_action_fails() {
    let mut driver = driver();
    let counts = Rc::new(Counts::default());
    let npc = driver
        .scene_mut()
        .spawn(Npc::spawn(ENTRY, CAVE_BABE, Faulty(Rc::clone(&counts))))
        .unwrap();
    spawn_player(&mut driver, ENTRY);

    driver.step().unwrap();
    let err = driver.step().unwrap_err();
    assert!(matches!(err, SimError::Action { .. }));
    assert_eq!(counts.sightings.get(), 1);
    assert!(!driver.scene().actor::<Npc>(npc).unwrap().is_busy());
    assert!(driver.queue().is_empty());

    let idles = counts.idles.get();
    driver.step().unwrap();
    assert_eq!(counts.idles.get(), idles + 1);
}

// ── WieldItemAction ─────────────────────────────────────────────────────

#[test]
fn wield_fills_both_hands_then_only_records() {
    let mut scene = Scene::new();
    let player = scene.spawn(Player::spawn(ENTRY, controls(), CAVE_DUDE)).unwrap();
    let pickups: ReactiveList<String> = ReactiveList::new("pickups");
    let mut ui = MessageUi::new();
    let clock = LabClock::new();
    let queue = ucs_core::ActionQueue::new();

    for item in [Item::Sword, Item::Shield, Item::Sword] {
        let mut cx = ActionContext::new(&mut scene, &mut ui, &clock, &queue);
        let mut action = WieldItemAction::new(player, item, pickups.clone());
        assert!(action.invoke(&mut cx).unwrap());
    }

    let hero = scene.actor::<Player>(player).unwrap();
    assert_eq!(hero.humanoid.held(Hand::Left), Some(Item::Sword));
    assert_eq!(hero.humanoid.held(Hand::Right), Some(Item::Shield));
    assert!(hero.humanoid.has_weapon());
    assert_eq!(pickups.len(), 3);
    // Body plus two hands.
    assert_eq!(scene.components().sprites.owned_by(player), 3);
}

#[test]
fn wield_for_a_missing_player_fails() {
    let mut scene = Scene::new();
    let player = scene.spawn(Player::spawn(ENTRY, controls(), CAVE_DUDE)).unwrap();
    scene.deactivate(player);
    scene
        .tick(&ucs_core::TickEnv {
            input: &KeyboardState::new(),
            world: &tutorial_world(16).unwrap(),
            dt: ucs_core::TIME_STEP,
        })
        .unwrap();

    let pickups: ReactiveList<String> = ReactiveList::new("pickups");
    let mut ui = MessageUi::new();
    let clock = LabClock::new();
    let queue = ucs_core::ActionQueue::new();
    let mut cx = ActionContext::new(&mut scene, &mut ui, &clock, &queue);
    let err = WieldItemAction::new(player, Item::Sword, pickups.clone())
        .invoke(&mut cx)
        .unwrap_err();
    assert!(matches!(err, SimError::UnknownActor(id) if id == player));
    assert!(pickups.is_empty());
    assert_eq!(GameError::from(err).exit_code(), 1);
}
