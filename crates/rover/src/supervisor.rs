//! Wires the routing engine and both I/O planes together and runs them to
//! completion or fatal error.

use std::{net::Ipv4Addr, path::PathBuf, sync::Arc};

use rover_core::{DistanceVectorEngine, Environment, NeighborEvent, NeighborTimers, RoutingTable, RoverAction};
use rover_net::{ControlPlaneIO, DataPlaneIO, ReceiverOutcome, SenderOutcome};
use rover_proto::{AdvertisementFrame, Command, PrivateAddress, PublicAddress, ADVERTISEMENT_INTERVAL};
use tokio::sync::mpsc;

use crate::{error::RoverError, system_env::SystemEnv};

/// Everything needed to bring one rover process up.
pub struct SupervisorConfig {
    /// This rover's id (determines its synthetic private address).
    pub id: u8,
    /// Control-plane multicast group address.
    pub group: Ipv4Addr,
    /// Control-plane multicast port.
    pub port: u16,
    /// File to send, if this rover is a sender in this run.
    pub send_file: Option<PathBuf>,
    /// Destination rover id for `send_file`.
    pub dest: Option<u8>,
}

/// Run a rover process until a transfer completes or a fatal error occurs.
///
/// The control plane alone (no `send_file`/`dest` configured) never exits on
/// its own — it keeps advertising and forwarding until the process is killed.
pub async fn run(config: SupervisorConfig) -> Result<(), RoverError> {
    let env = SystemEnv::new();
    let my_private = PrivateAddress::for_rover(config.id);
    let interface = crate::discover::discover_public_address().await?;
    let my_public = PublicAddress::new(interface);
    tracing::info!(id = config.id, %my_public, "discovered public address");

    let table = RoutingTable::new(my_private, my_public);
    let control_plane = Arc::new(ControlPlaneIO::bind(config.group, config.port, interface).await?);
    let data_plane = Arc::new(DataPlaneIO::bind(interface, my_private, table.clone())?);

    let (control_tx, control_rx) = mpsc::channel(64);
    let (death_tx, death_rx) = mpsc::channel(64);

    let control_recv_task = {
        let control_plane = Arc::clone(&control_plane);
        tokio::spawn(async move {
            loop {
                let (source, frame) = control_plane.recv_one().await?;
                if control_tx.send((source, frame)).await.is_err() {
                    break;
                }
            }
            Ok::<(), RoverError>(())
        })
    };

    let periodic_task = {
        let control_plane = Arc::clone(&control_plane);
        let table = table.clone();
        tokio::spawn(async move {
            loop {
                env.sleep(ADVERTISEMENT_INTERVAL).await;
                let frame = AdvertisementFrame::new(Command::Update, config.id, table.snapshot_for_advertisement());
                control_plane.emit(&frame).await?;
            }
            #[allow(unreachable_code)]
            Ok::<(), RoverError>(())
        })
    };

    let engine_task = {
        let control_plane = Arc::clone(&control_plane);
        tokio::spawn(run_engine(config.id, my_public, table, control_plane, env, control_rx, death_rx, death_tx))
    };

    let receiver_task = {
        let data_plane = Arc::clone(&data_plane);
        tokio::spawn(async move { data_plane.run_receiver_forwarder().await })
    };

    let sender_task = match (config.send_file, config.dest) {
        (Some(path), Some(dest_id)) => {
            let data_plane = Arc::clone(&data_plane);
            let destination = PrivateAddress::for_rover(dest_id);
            let file = tokio::fs::File::open(&path).await?;
            let total_size = file.metadata().await?.len() as u32;
            Some(tokio::spawn(async move { data_plane.run_sender(&env, destination, file, total_size).await }))
        },
        (None, None) => None,
        _ => {
            return Err(RoverError::Config("--send-file and --dest must be given together".into()));
        },
    };

    tokio::select! {
        result = control_recv_task => { result.map_err(join_error)??; },
        result = periodic_task => { result.map_err(join_error)??; },
        result = engine_task => { result.map_err(join_error)??; },
        result = receiver_task => {
            let outcome: ReceiverOutcome = result.map_err(join_error)??;
            tracing::info!(?outcome, "receiver/forwarder task ended");
        },
    }

    if let Some(sender_task) = sender_task {
        let outcome: SenderOutcome = sender_task.await.map_err(join_error)??;
        tracing::info!(?outcome, "sender task ended");
    }

    Ok(())
}

/// Single task draining both the control-plane receive channel and the
/// neighbor-death channel, so every routing-table mutation is serialized
/// without needing a lock held across an `.await`.
#[allow(clippy::too_many_arguments)]
async fn run_engine<E: Environment>(
    my_id: u8,
    my_public: PublicAddress,
    table: RoutingTable,
    control_plane: Arc<ControlPlaneIO>,
    env: E,
    mut control_rx: mpsc::Receiver<(PublicAddress, AdvertisementFrame)>,
    mut death_rx: mpsc::Receiver<NeighborEvent>,
    death_tx: mpsc::Sender<NeighborEvent>,
) -> Result<(), RoverError> {
    let engine = DistanceVectorEngine::new(my_id, my_public, table);
    let timers = NeighborTimers::new(env, death_tx);

    loop {
        let actions = tokio::select! {
            Some((source, frame)) = control_rx.recv() => {
                match engine.on_advertisement(source, &frame) {
                    Some((neighbor, actions)) => {
                        timers.touch(neighbor, source);
                        actions
                    },
                    None => continue,
                }
            },
            Some(NeighborEvent::Dead { private, public }) = death_rx.recv() => {
                engine.on_neighbor_death(private, public)
            },
            else => break,
        };

        for action in actions {
            match action {
                RoverAction::EmitAdvertisement(frame) => control_plane.emit(&frame).await?,
            }
        }
    }

    Ok(())
}

fn join_error(err: tokio::task::JoinError) -> RoverError {
    RoverError::Config(format!("task panicked: {err}"))
}
