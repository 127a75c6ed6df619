//! End-to-end distance-vector scenarios, driving the
//! engine together with the real timer machinery instead of calling
//! `on_neighbor_death` directly, as the unit tests in `engine.rs` do.

use std::net::Ipv4Addr;

use rover_core::{DistanceVectorEngine, NeighborEvent, NeighborTimers, RoutingTable};
use rover_proto::{AdvertisementFrame, Command, PrivateAddress, PublicAddress, RouteRecord, DEAD_INTERVAL, INFINITY};
use tokio::sync::mpsc;

#[path = "../src/test_env.rs"]
mod test_env;
use test_env::ManualEnv;

fn public(last: u8) -> PublicAddress {
    PublicAddress::new(Ipv4Addr::new(10, 0, 0, last))
}

struct Rover {
    engine: DistanceVectorEngine,
    timers: NeighborTimers<ManualEnv>,
    deaths: mpsc::Receiver<NeighborEvent>,
}

fn spawn_rover(id: u8) -> Rover {
    let table = RoutingTable::new(PrivateAddress::for_rover(id), public(id));
    let engine = DistanceVectorEngine::new(id, public(id), table);
    let (tx, rx) = mpsc::channel(8);
    let timers = NeighborTimers::new(ManualEnv::new(), tx);
    Rover { engine, timers, deaths: rx }
}

/// Deliver an advertisement to `rover` and arm/refresh its heartbeat timer
/// for the source, mimicking what `rover-net`'s control-plane loop does
/// around every call to `on_advertisement`.
fn deliver(rover: &Rover, source: PublicAddress, frame: &AdvertisementFrame) {
    if let Some((neighbor, _actions)) = rover.engine.on_advertisement(source, frame) {
        rover.timers.touch(neighbor, source);
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_one_two_rovers_direct_visibility() {
    let rover_1 = spawn_rover(1);
    let rover_2 = spawn_rover(2);

    let advertisement_1 = rover_1.engine.build_advertisement(Command::Update);
    let advertisement_2 = rover_2.engine.build_advertisement(Command::Update);

    deliver(&rover_2, public(1), &advertisement_1);
    deliver(&rover_1, public(2), &advertisement_2);

    assert_eq!(rover_1.engine.table().metric(PrivateAddress::for_rover(1)), Some(1));
    assert_eq!(rover_1.engine.table().metric(PrivateAddress::for_rover(2)), Some(1));
    assert_eq!(rover_1.engine.table().next_hop(PrivateAddress::for_rover(2)), Some(public(2)));

    assert_eq!(rover_2.engine.table().metric(PrivateAddress::for_rover(1)), Some(1));
    assert_eq!(rover_2.engine.table().metric(PrivateAddress::for_rover(2)), Some(1));
}

#[tokio::test(start_paused = true)]
async fn scenario_two_three_rover_chain_converges_after_two_intervals() {
    let rover_1 = spawn_rover(1);
    let rover_2 = spawn_rover(2);
    let rover_3 = spawn_rover(3);

    // Interval 1: everyone exchanges self-only tables. 1 and 3 never hear
    // each other directly (not neighbors on the multicast group).
    let advertisement_1 = rover_1.engine.build_advertisement(Command::Update);
    let advertisement_2 = rover_2.engine.build_advertisement(Command::Update);
    let advertisement_3 = rover_3.engine.build_advertisement(Command::Update);

    deliver(&rover_2, public(1), &advertisement_1);
    deliver(&rover_2, public(3), &advertisement_3);
    deliver(&rover_1, public(2), &advertisement_2);
    deliver(&rover_3, public(2), &advertisement_2);

    // Interval 2: rover 2 now advertises a table that includes rovers 1 and 3.
    let advertisement_2_round_2 = rover_2.engine.build_advertisement(Command::Update);
    deliver(&rover_1, public(2), &advertisement_2_round_2);
    deliver(&rover_3, public(2), &advertisement_2_round_2);

    let via_2_from_1 = rover_1.engine.table().get(PrivateAddress::for_rover(3)).unwrap();
    assert_eq!(via_2_from_1.metric, 2);
    assert_eq!(via_2_from_1.next_hop, public(2));

    let via_2_from_3 = rover_3.engine.table().get(PrivateAddress::for_rover(1)).unwrap();
    assert_eq!(via_2_from_3.metric, 2);
    assert_eq!(via_2_from_3.next_hop, public(2));
}

#[tokio::test(start_paused = true)]
async fn scenario_three_neighbor_death_within_dead_interval() {
    let rover_1 = spawn_rover(1);
    let rover_2 = spawn_rover(2);
    let rover_3 = spawn_rover(3);

    let advertisement_1 = rover_1.engine.build_advertisement(Command::Update);
    let advertisement_3 = rover_3.engine.build_advertisement(Command::Update);
    deliver(&rover_2, public(1), &advertisement_1);
    deliver(&rover_2, public(3), &advertisement_3);

    let advertisement_2 = rover_2.engine.build_advertisement(Command::Update);
    deliver(&rover_1, public(2), &advertisement_2);
    deliver(&rover_3, public(2), &advertisement_2);

    assert_eq!(rover_1.engine.table().metric(PrivateAddress::for_rover(3)), Some(2));
    assert_eq!(rover_3.engine.table().metric(PrivateAddress::for_rover(1)), Some(2));

    // Rover 2 goes silent: no further heartbeats arrive at 1 or 3. Advance
    // past the dead interval and let their timers fire.
    tokio::time::advance(DEAD_INTERVAL + std::time::Duration::from_millis(1)).await;

    let mut deaths_1 = rover_1.deaths;
    let event = deaths_1.recv().await.expect("rover 1's timer for rover 2 should have fired");
    let NeighborEvent::Dead { private, public: dead_public } = event;
    assert_eq!(private, PrivateAddress::for_rover(2));
    let actions = rover_1.engine.on_neighbor_death(private, dead_public);
    assert_eq!(actions.len(), 1);

    assert_eq!(rover_1.engine.table().metric(PrivateAddress::for_rover(2)), Some(INFINITY));
    assert_eq!(rover_1.engine.table().metric(PrivateAddress::for_rover(3)), Some(INFINITY));

    let mut deaths_3 = rover_3.deaths;
    let event = deaths_3.recv().await.expect("rover 3's timer for rover 2 should have fired");
    let NeighborEvent::Dead { private, public: dead_public } = event;
    let _ = rover_3.engine.on_neighbor_death(private, dead_public);
    assert_eq!(rover_3.engine.table().metric(PrivateAddress::for_rover(1)), Some(INFINITY));
}

#[tokio::test(start_paused = true)]
async fn heartbeats_before_dead_interval_keep_neighbor_alive() {
    let rover_1 = spawn_rover(1);
    let rover_2 = spawn_rover(2);

    let advertisement_2 = rover_2.engine.build_advertisement(Command::Update);
    deliver(&rover_1, public(2), &advertisement_2);

    // Re-heartbeat every 5s (the advertisement cadence), well inside the 7s
    // dead interval, for three rounds.
    for _ in 0..3 {
        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        deliver(&rover_1, public(2), &advertisement_2);
    }

    let mut deaths = rover_1.deaths;
    assert!(deaths.try_recv().is_err(), "neighbor kept alive by heartbeats must not be marked dead");
    assert_eq!(rover_1.engine.table().metric(PrivateAddress::for_rover(2)), Some(1));
}
