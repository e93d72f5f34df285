//! End-to-end leaf scenarios on an in-memory world: placement, pairing,
//! propagation, persistence and the client mesh-swap pipeline.

use std::sync::Arc;

use glam::Vec3;
use slidingwindows_assets::{registry_from_str, BehaviorClasses, BehaviorKind, BlockRegistry};
use slidingwindows_core::{BlockFacing, BlockPos, Side};
use slidingwindows_render::ShapeLibrary;
use slidingwindows_world::pairing::resolve_partner;
use slidingwindows_world::{
    interaction, multiblock, run_frame, Api, BlockAccessor, BlockSelection, ClientApi, GameMode, Hand,
    MemoryWorld, PlacementError, Player, VisualFlags, WorldSnapshot,
};

const BLOCKS: &str = r#"[
    { "code": "test:door", "behavior": "GlassDoor", "shape": "test:shapes/door",
      "attributes": { "height": 2, "glass": "plain" } },
    { "code": "test:window", "behavior": "SlidingWindow", "shape": "test:shapes/window",
      "attributes": { "pairable": true, "openedShape": "test:shapes/window-open" } },
    { "code": "test:tallwindow", "behavior": "SlidingWindow",
      "attributes": { "height": 2, "pairable": false } },
    { "code": "test:sash", "behavior": "SlidingWindow",
      "attributes": { "height": 2, "pairable": false, "openSound": "sounds/block/sash" },
      "collisionBoxes": [
        { "x1": 0, "y1": 0, "z1": 0.4, "x2": 1, "y2": 2, "z2": 0.6 },
        { "x1": 0, "y1": 0, "z1": 0.45, "x2": 1, "y2": 1, "z2": 0.55 },
        { "x1": 0, "y1": 1, "z1": 0.45, "x2": 1, "y2": 2, "z2": 0.55 }
      ] },
    { "code": "test:widewindow", "behavior": "SlidingWindow",
      "attributes": { "width": 2, "pairable": true } },
    { "code": "test:widedoor", "behavior": "GlassDoor",
      "attributes": { "width": 2, "height": 1 } },
    { "code": "test:stone", "material": "stone" }
]"#;

fn registry() -> Arc<BlockRegistry> {
    let mut classes = BehaviorClasses::new();
    classes.register_block_behavior_class("GlassDoor", BehaviorKind::GlassDoor);
    classes.register_block_behavior_class("SlidingWindow", BehaviorKind::SlidingWindow);
    Arc::new(registry_from_str(BLOCKS, &classes).expect("test registry"))
}

fn shapes() -> ShapeLibrary {
    ShapeLibrary::from_json_str(
        r#"[
            { "code": "test:shapes/door",
              "elements": [{ "x1": 0, "y1": 0, "z1": 0, "x2": 1, "y2": 2, "z2": 0.2 }],
              "animations": ["opened"] },
            { "code": "test:shapes/window",
              "elements": [{ "x1": 0, "y1": 0, "z1": 0.4, "x2": 1, "y2": 1, "z2": 0.6 }],
              "animations": ["opening", "closing"] },
            { "code": "test:shapes/window-open",
              "elements": [{ "x1": 0, "y1": 0.5, "z1": 0.4, "x2": 1, "y2": 1.5, "z2": 0.6 }],
              "animations": ["opening", "closing"] }
        ]"#,
    )
    .expect("test shapes")
}

/// Stands south of the origin so every leaf faces north.
fn player() -> Player {
    Player::new(Vec3::new(0.5, 0.0, 4.5), GameMode::Survival)
}

fn place(world: &mut MemoryWorld, code: &str, pos: BlockPos) -> Result<BlockPos, PlacementError> {
    let id = world.registry().id_by_code(code).expect("known code");
    let selection = BlockSelection::at(pos, BlockFacing::Up, Vec3::splat(0.5));
    multiblock::try_place_block(&mut Api::server(world), &player(), &selection, id)
}

/// Places wide leaves from far enough south that every click faces north.
fn place_from_afar(world: &mut MemoryWorld, code: &str, x: i32) -> BlockPos {
    let id = world.registry().id_by_code(code).expect("known code");
    let selection = BlockSelection::at(BlockPos::new(x, 0, 0), BlockFacing::Up, Vec3::splat(0.5));
    let player = Player::new(Vec3::new(0.5, 0.0, 40.5), GameMode::Survival);
    multiblock::try_place_block(&mut Api::server(world), &player, &selection, id).unwrap()
}

fn span_x(world: &MemoryWorld, pos: BlockPos) -> Vec<i32> {
    let mut xs: Vec<i32> = multiblock::leaf_footprint(world, pos).iter().map(|c| c.x).collect();
    xs.sort_unstable();
    xs.dedup();
    xs
}

fn is_open(world: &MemoryWorld, pos: BlockPos) -> bool {
    world.leaf(pos).is_some_and(|leaf| leaf.is_open())
}

fn door_pair() -> (MemoryWorld, BlockPos, BlockPos) {
    let mut w = MemoryWorld::server(registry());
    let a = place(&mut w, "test:door", BlockPos::new(0, 0, 0)).unwrap();
    let b = place(&mut w, "test:door", BlockPos::new(1, 0, 0)).unwrap();
    (w, a, b)
}

#[test]
fn second_door_pairs_and_inverts_its_neighbour() {
    let (w, a, b) = door_pair();

    assert_eq!(w.leaf(a).unwrap().facing_when_closed(), BlockFacing::North);
    assert!(w.leaf(a).unwrap().invert());
    assert!(!w.leaf(b).unwrap().invert());
    assert_eq!(resolve_partner(&w, b, Hand::Right), Some(a));
    assert_eq!(resolve_partner(&w, a, Hand::Left), Some(b));
    assert_eq!(resolve_partner(&w, a, Hand::Right), None);
}

#[test]
fn toggling_either_leaf_moves_the_pair_once() {
    let (mut w, a, b) = door_pair();
    w.take_sounds();

    interaction::interact(&mut Api::server(&mut w), &player(), a).unwrap();
    assert!(is_open(&w, a));
    assert!(is_open(&w, b));
    assert_eq!(w.take_sounds().len(), 1);

    // From the other side, through the upper filler.
    interaction::interact(&mut Api::server(&mut w), &player(), b.add_xyz(0, 1, 0)).unwrap();
    assert!(!is_open(&w, a));
    assert!(!is_open(&w, b));
    assert_eq!(w.take_sounds().len(), 1);
}

#[test]
fn door_fillers_cover_the_footprint_and_go_with_the_leaf() {
    let (mut w, a, _) = door_pair();
    let upper = a.add_xyz(0, 1, 0);
    assert!(w.block(upper).is_filler());
    assert_eq!(multiblock::resolve_leaf(&w, upper, None), Some(a));

    multiblock::remove_block(&mut Api::server(&mut w), upper);
    assert!(w.block(a).is_air());
    assert!(w.block(upper).is_air());
    assert!(w.leaf(a).is_none());
}

#[test]
fn occupied_footprint_refuses_placement() {
    let mut w = MemoryWorld::server(registry());
    let stone = w.registry().id_by_code("test:stone").unwrap();
    w.set_block(stone, BlockPos::new(0, 1, 0));

    let err = place(&mut w, "test:door", BlockPos::new(0, 0, 0)).unwrap_err();
    assert_eq!(err, PlacementError::NotEnoughSpace(BlockPos::new(0, 1, 0)));
    assert_eq!(err.code(), "notenoughspace");
    assert!(w.leaf(BlockPos::new(0, 0, 0)).is_none());
}

#[test]
fn tall_unpairable_windows_stay_independent() {
    let mut w = MemoryWorld::server(registry());
    let first = place(&mut w, "test:tallwindow", BlockPos::new(0, 0, 0)).unwrap();
    let second = place(&mut w, "test:tallwindow", BlockPos::new(1, 0, 0)).unwrap();

    for pos in [first, second] {
        let leaf = w.leaf(pos).unwrap();
        assert!(!leaf.invert());
        assert!(!leaf.pairing().unwrap().has_partner());
        assert!(w.block(pos.add_xyz(0, 1, 0)).is_filler());
    }

    interaction::interact(&mut Api::server(&mut w), &player(), first.add_xyz(0, 1, 0)).unwrap();
    assert!(is_open(&w, first));
    assert!(!is_open(&w, second));
}

#[test]
fn unpaired_sash_window_opens_with_one_sound_and_new_boxes() {
    let mut w = MemoryWorld::server(registry());
    let pos = place(&mut w, "test:sash", BlockPos::new(0, 0, 0)).unwrap();
    assert_eq!(w.leaf(pos).unwrap().facing_when_closed(), BlockFacing::North);
    let closed = w.leaf(pos).unwrap().col_sel_boxes().to_vec();
    w.take_sounds();

    interaction::interact(&mut Api::server(&mut w), &player(), pos).unwrap();
    assert!(is_open(&w, pos));
    let sounds = w.take_sounds();
    assert_eq!(sounds.len(), 1);
    assert!(sounds[0].location.to_string().ends_with("sounds/block/sash"));
    assert_ne!(w.leaf(pos).unwrap().col_sel_boxes(), closed.as_slice());
}

#[test]
fn wide_window_placed_to_the_left_takes_the_next_cells() {
    let mut w = MemoryWorld::server(registry());
    let a = place_from_afar(&mut w, "test:widewindow", 0);
    assert_eq!(span_x(&w, a), vec![0, 1]);

    // Clicking two cells west still lands flush against the neighbour.
    let b = place_from_afar(&mut w, "test:widewindow", -2);
    assert_eq!(b, BlockPos::new(-1, 0, 0));
    assert!(w.leaf(b).unwrap().invert());
    assert!(!w.leaf(a).unwrap().invert());
    assert_eq!(span_x(&w, b), vec![-2, -1]);
    assert_eq!(multiblock::resolve_leaf(&w, BlockPos::new(-2, 0, 0), None), Some(b));

    assert_eq!(resolve_partner(&w, b, Hand::Left), Some(a));
    assert_eq!(resolve_partner(&w, a, Hand::Right), Some(b));

    w.take_sounds();
    interaction::interact(&mut Api::server(&mut w), &player(), BlockPos::new(-2, 0, 0)).unwrap();
    assert!(is_open(&w, a) && is_open(&w, b));
    assert_eq!(w.take_sounds().len(), 1);
}

#[test]
fn wide_window_placed_to_the_right_flips_its_neighbour_in_place() {
    let mut w = MemoryWorld::server(registry());
    place_from_afar(&mut w, "test:widewindow", 0);

    let b = place_from_afar(&mut w, "test:widewindow", 3);
    let a = BlockPos::new(1, 0, 0);
    assert_eq!(b, BlockPos::new(2, 0, 0));
    assert_eq!(span_x(&w, b), vec![2, 3]);
    assert!(!w.leaf(b).unwrap().invert());

    // The first leaf keeps its cells but now hinges from the other end.
    assert!(w.leaf(BlockPos::new(0, 0, 0)).is_none());
    assert!(w.block(BlockPos::new(0, 0, 0)).is_filler());
    assert!(w.leaf(a).unwrap().invert());
    assert_eq!(span_x(&w, a), vec![0, 1]);

    assert_eq!(resolve_partner(&w, b, Hand::Right), Some(a));
    assert_eq!(resolve_partner(&w, a, Hand::Left), Some(b));

    interaction::interact(&mut Api::server(&mut w), &player(), b).unwrap();
    assert!(is_open(&w, a) && is_open(&w, b));
    interaction::interact(&mut Api::server(&mut w), &player(), BlockPos::new(0, 0, 0)).unwrap();
    assert!(!is_open(&w, a) && !is_open(&w, b));
}

#[test]
fn inverted_wide_leaf_flips_back_for_a_left_partner() {
    let mut w = MemoryWorld::server(registry());
    place_from_afar(&mut w, "test:widewindow", 0);
    let stale = place_from_afar(&mut w, "test:widewindow", 3);
    multiblock::remove_block(&mut Api::server(&mut w), stale);
    let lone = BlockPos::new(1, 0, 0);
    assert!(w.leaf(lone).unwrap().invert());

    let b = place_from_afar(&mut w, "test:widewindow", -1);
    let a = BlockPos::new(0, 0, 0);
    assert_eq!(b, BlockPos::new(-1, 0, 0));
    assert_eq!(span_x(&w, b), vec![-2, -1]);
    assert!(w.leaf(b).unwrap().invert());
    assert!(w.leaf(lone).is_none());
    assert!(!w.leaf(a).unwrap().invert());
    assert_eq!(span_x(&w, a), vec![0, 1]);
    assert_eq!(resolve_partner(&w, a, Hand::Right), Some(b));
    assert_eq!(resolve_partner(&w, b, Hand::Left), Some(a));
}

#[test]
fn wide_doors_pair_flush_with_their_depth() {
    let mut w = MemoryWorld::server(registry());
    place_from_afar(&mut w, "test:widedoor", 0);
    let b = place_from_afar(&mut w, "test:widedoor", 2);
    let a = BlockPos::new(1, 0, 0);

    assert_eq!(span_x(&w, a), vec![0, 1]);
    assert_eq!(span_x(&w, b), vec![2, 3]);
    for cell in [BlockPos::new(0, 0, -1), BlockPos::new(0, 0, 0), BlockPos::new(1, 0, -1)] {
        assert_eq!(multiblock::resolve_leaf(&w, cell, None), Some(a));
    }
    assert_eq!(resolve_partner(&w, a, Hand::Left), Some(b));
    assert_eq!(resolve_partner(&w, b, Hand::Right), Some(a));

    interaction::interact(&mut Api::server(&mut w), &player(), a).unwrap();
    assert!(is_open(&w, a) && is_open(&w, b));
}

#[test]
fn pairs_survive_a_save_and_load() {
    let (mut w, a, b) = door_pair();
    interaction::interact(&mut Api::server(&mut w), &player(), a).unwrap();

    let json = w.snapshot().unwrap().to_json().unwrap();
    let snapshot = WorldSnapshot::from_json(&json).unwrap();
    let mut loaded = MemoryWorld::restore(Side::Server, registry(), &snapshot).unwrap();
    for pos in loaded.leaf_positions() {
        interaction::initialize(&mut Api::server(&mut loaded), pos);
    }

    assert!(is_open(&loaded, a));
    assert!(is_open(&loaded, b));
    assert!(loaded.leaf(a).unwrap().invert());
    assert_eq!(resolve_partner(&loaded, a, Hand::Left), Some(b));
    assert_eq!(resolve_partner(&loaded, b, Hand::Right), Some(a));
    assert!(loaded.block(a.add_xyz(0, 1, 0)).is_filler());
    assert_eq!(
        loaded.leaf(a).unwrap().col_sel_boxes(),
        w.leaf(a).unwrap().col_sel_boxes()
    );
}

#[test]
fn removed_partner_heals_the_link_and_toggles_alone() {
    let (mut w, a, b) = door_pair();
    multiblock::remove_block(&mut Api::server(&mut w), b);

    interaction::interact(&mut Api::server(&mut w), &player(), a).unwrap();
    assert!(is_open(&w, a));
    assert_eq!(w.leaf(a).unwrap().partner_offset(Hand::Left), None);
}

#[test]
fn window_animation_runs_through_the_frame_pipeline() {
    let mut w = MemoryWorld::client(registry());
    let mut client = ClientApi::headless(shapes());
    let pos = BlockPos::new(0, 0, 0);
    let id = w.registry().id_by_code("test:window").unwrap();
    w.set_block(id, pos);
    interaction::initialize(&mut Api::client(&mut w, &mut client), pos);
    run_frame(&mut w, &mut client, 16);
    assert!(client.scheduler.is_empty());

    interaction::toggle(&mut Api::client(&mut w, &mut client), pos, true, false);
    assert!(client.animator(pos).unwrap().is_active("opening"));
    let flags = |w: &MemoryWorld| w.leaf(pos).unwrap().state().visuals.flags;
    assert!(flags(&w).contains(VisualFlags::RENDER_ANIMATION));

    // The resting mesh is baked once more, then hidden.
    let first = run_frame(&mut w, &mut client, 20);
    assert_eq!(first.tessellated.len(), 1);
    run_frame(&mut w, &mut client, 20);
    let hidden = run_frame(&mut w, &mut client, 20);
    assert!(hidden.tessellated.is_empty());
    assert!(!flags(&w).contains(VisualFlags::TESSELLATE_STATIC));

    for _ in 0..60 {
        run_frame(&mut w, &mut client, 20);
    }
    assert!(client.scheduler.is_empty());
    assert!(flags(&w).contains(VisualFlags::TESSELLATE_STATIC));
    assert!(!flags(&w).contains(VisualFlags::RENDER_ANIMATION));
    assert!(!client.animator(pos).unwrap().is_active("opening"));
    assert!(w.leaf(pos).unwrap().state().visuals.callbacks.is_empty());
}

#[test]
fn removing_a_leaf_mid_animation_drains_its_tasks() {
    let mut w = MemoryWorld::client(registry());
    let mut client = ClientApi::headless(shapes());
    let pos = BlockPos::new(0, 0, 0);
    let id = w.registry().id_by_code("test:window").unwrap();
    w.set_block(id, pos);
    interaction::initialize(&mut Api::client(&mut w, &mut client), pos);

    interaction::toggle(&mut Api::client(&mut w, &mut client), pos, true, false);
    run_frame(&mut w, &mut client, 20);
    assert!(!client.scheduler.is_empty());

    multiblock::remove_block(&mut Api::client(&mut w, &mut client), pos);
    assert!(client.scheduler.is_empty());
    assert!(!client.has_animator(pos));
    let report = run_frame(&mut w, &mut client, 1000);
    assert_eq!(report.tasks_run, 0);
}

#[test]
fn doors_without_an_opened_shape_use_the_single_clip() {
    let mut w = MemoryWorld::client(registry());
    let mut client = ClientApi::headless(shapes());
    let pos = BlockPos::new(0, 0, 0);
    let id = w.registry().id_by_code("test:door").unwrap();
    w.set_block(id, pos);
    interaction::initialize(&mut Api::client(&mut w, &mut client), pos);

    interaction::toggle(&mut Api::client(&mut w, &mut client), pos, true, false);
    assert!(client.animator(pos).unwrap().is_active("opened"));
    assert!(client.scheduler.is_empty());

    interaction::toggle(&mut Api::client(&mut w, &mut client), pos, false, false);
    assert!(!client.animator(pos).unwrap().is_active("opened"));
}
