//! Counterbalance Demo
//!
//! Loads the built-in level pair, plays a scripted solution through the
//! same command surface a real input collaborator would use, then proves
//! the undo log by restarting back to the freshly loaded state.

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use counterbalance::{
    Direction, LevelSet, MoveLatch, MoveOutcome, Topic, World, WorldEvent, VERSION,
};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Counterbalance v{}", VERSION);

    let mut world = World::new(LevelSet::builtin());

    // Both side views would subscribe here; the demo logs instead.
    for topic in [
        Topic::PlayerMoved,
        Topic::BoxMoved,
        Topic::BoxReassignedSide,
        Topic::WeightChanged,
        Topic::TargetCountChanged,
        Topic::GameWon,
    ] {
        world.bus().subscribe(topic, |event| match event {
            WorldEvent::PlayerMoved { x, y, side } => {
                info!("player -> ({}, {}) on {:?}", x, y, side);
            }
            WorldEvent::BoxMoved { box_id, x, y, side } => {
                info!("box {} -> ({}, {}) on {:?}", box_id, x, y, side);
            }
            WorldEvent::BoxReassignedSide { box_id, from_side, to_side } => {
                info!("box {} crossed {:?} -> {:?}", box_id, from_side, to_side);
            }
            WorldEvent::WeightChanged { left, right } => {
                info!("weights: left={} right={}", left, right);
            }
            WorldEvent::TargetCountChanged { current, total } => {
                info!("targets: {}/{}", current, total);
            }
            WorldEvent::GameWon { is_special } => {
                info!("level complete (special: {})", is_special);
            }
        });
    }

    world.load_level(0).context("Failed to load built-in level")?;
    let loaded_hash = world.world_hash();
    info!("Loaded State Hash: {}", hex::encode(loaded_hash));

    // Scripted solution, fed through the same latch a keyboard collaborator
    // would drive: press, drain one step, release.
    let script = [
        Direction::Left,
        Direction::Left,
        Direction::Right,
        Direction::Right,
        Direction::Right,
        Direction::Right,
        Direction::Up,
        Direction::Right,
        Direction::Right,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    let mut latch = MoveLatch::new();
    let mut committed = 0usize;
    for direction in script {
        latch.press(direction);
        while let Some(step) = latch.take_step() {
            match world.attempt_move(step) {
                MoveOutcome::Committed { boxes_pushed, player_crossed } => {
                    committed += 1;
                    if player_crossed {
                        info!("crossed the shared edge");
                    }
                    if boxes_pushed > 0 {
                        info!("pushed {} box(es)", boxes_pushed);
                    }
                }
                MoveOutcome::Rejected(reason) => {
                    info!("move rejected: {:?}", reason);
                }
            }
        }
        latch.release(direction);
    }

    info!("=== Results ===");
    info!("Moves committed: {}", committed);
    info!(
        "Targets: {}/{}",
        world.targets().current_targets(),
        world.targets().total_targets()
    );
    info!("Won: {}", world.has_won());
    world.check_invariants().context("State invariant violated")?;

    // Prove the undo log: rewind everything and compare fingerprints.
    info!("=== Verifying Restart ===");
    world.restart();
    let restart_hash = world.world_hash();
    info!("Restart State Hash: {}", hex::encode(restart_hash));

    if restart_hash == loaded_hash {
        info!("RESTART VERIFIED: hashes match");
    } else {
        anyhow::bail!("restart hash differs from loaded hash");
    }

    Ok(())
}
