//! End-to-end sender/receiver transfer over real loopback sockets between two
//! directly-connected (metric 1) rovers. Multi-hop relaying through a third
//! rover is covered by `rover-harness`'s simulation tests instead, since it
//! needs more than two fixed ports on one host.

use std::net::Ipv4Addr;

use rover_core::RoutingTable;
use rover_net::DataPlaneIO;
use rover_proto::{PrivateAddress, PublicAddress};
use tokio::fs::File;

#[derive(Clone)]
struct RealTime;

impl rover_core::Environment for RealTime {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: std::time::Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn transfer_completes_between_direct_neighbors() {
    // OUTPUT_FILE is a fixed relative path; run in a scratch directory so this
    // test doesn't clobber anything else in the crate's working directory.
    let scratch = tempfile::tempdir().unwrap();
    let original_dir = std::env::current_dir().unwrap();
    std::env::set_current_dir(scratch.path()).unwrap();

    let sender_private = PrivateAddress::for_rover(1);
    let sender_addr = Ipv4Addr::new(127, 0, 0, 1);
    let sender_public = PublicAddress::new(sender_addr);
    let receiver_private = PrivateAddress::for_rover(2);
    let receiver_addr = Ipv4Addr::new(127, 0, 0, 2);
    let receiver_public = PublicAddress::new(receiver_addr);

    let sender_table = RoutingTable::new(sender_private, sender_public);
    sender_table.put(rover_proto::RouteRecord::new(receiver_private, 24, receiver_public, 1));

    let receiver_table = RoutingTable::new(receiver_private, receiver_public);
    receiver_table.put(rover_proto::RouteRecord::new(sender_private, 24, sender_public, 1));

    let payload = vec![7u8; 12_500];
    let source_path = scratch.path().join("input.bin");
    tokio::fs::write(&source_path, &payload).await.unwrap();

    let sender_io = DataPlaneIO::bind(sender_addr, sender_private, sender_table).unwrap();
    let receiver_io = DataPlaneIO::bind(receiver_addr, receiver_private, receiver_table).unwrap();

    let env = RealTime;
    let file = File::open(&source_path).await.unwrap();

    let receiver_task = tokio::spawn(async move { receiver_io.run_receiver_forwarder().await });

    let sender_result =
        sender_io.run_sender(&env, receiver_private, file, payload.len() as u32).await.unwrap();
    assert_eq!(sender_result, rover_net::SenderOutcome::Done);

    let receiver_result = receiver_task.await.unwrap().unwrap();
    assert_eq!(receiver_result, rover_net::ReceiverOutcome::Complete);

    let written = tokio::fs::read(rover_proto::OUTPUT_FILE).await.unwrap();
    assert_eq!(written, payload);

    std::env::set_current_dir(original_dir).unwrap();
}
