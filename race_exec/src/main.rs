//! Race executable entry point.
//!
//! # Architecture
//!
//! The executable drives the trajectory controller around a generated track
//! using a simple vehicle model standing in for the race simulator:
//!
//!     - Initialise the session, logging and TrajCtrl
//!     - Main loop:
//!         - Advance the next waypoint once the car is close enough to it
//!         - Trajectory control processing
//!         - Vehicle model integration
//!         - Archive the tick
//!
//! # Usage
//!
//! `race_exec [TELEMETRY_ADDRESS]`
//!
//! If an address (e.g. `127.0.0.1:5005`) is given each tick is also sent
//! there as a JSON datagram.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use nalgebra::Vector2;
use std::env;

// Internal
use race_lib::{
    loc::Pose,
    telemetry::{TelemetryFrame, UdpSink},
    track::Track,
    traj_ctrl::{InitData, Params, TickInput, TrajCtrl, TrajCtrlError},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period of one simulation tick.
const CYCLE_PERIOD_S: f64 = 1.0 / 60.0;

/// Number of ticks to simulate.
const NUM_TICKS: u64 = 60 * 120;

/// Acceleration applied at full throttle or full brake.
///
/// Units: meters/second^2
const ACCELERATION_MSS: f64 = 100.0;

/// Track shape
const TRACK_SEMI_X_M: f64 = 3000.0;
const TRACK_SEMI_Y_M: f64 = 1500.0;
const TRACK_NUM_WAYPOINTS: usize = 40;
const TRACK_WIDTH_M: f64 = 200.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Unicycle model of the car.
#[derive(Debug, Default)]
struct Vehicle {
    pose: Pose,
    speed_ms: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("race_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Race Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    let track = Track::ellipse(
        Vector2::zeros(),
        TRACK_SEMI_X_M,
        TRACK_SEMI_Y_M,
        TRACK_NUM_WAYPOINTS,
        TRACK_WIDTH_M,
    )
    .wrap_err("Failed to build the track")?;

    let init_data = InitData {
        params_path: "traj_ctrl.toml".into(),
        track: track.clone(),
    };

    let mut traj_ctrl = match TrajCtrl::init(init_data, &session) {
        Ok(t) => t,
        Err(TrajCtrlError::ParamLoadError(e)) => {
            warn!("Could not load TrajCtrl parameters ({}), using defaults", e);
            let t = TrajCtrl::new(track.clone(), Params::default())
                .wrap_err("Failed to initialise TrajCtrl")?;
            session.save("traj_ctrl/sampled_path.json", t.geometry().path().clone());
            session.save("traj_ctrl/speed_profile.json", t.geometry().profile().clone());
            t
        }
        Err(e) => return Err(e).wrap_err("Failed to initialise TrajCtrl"),
    };

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    if let Some(address) = args.get(1) {
        let sink = UdpSink::new(address.as_str())
            .wrap_err_with(|| format!("Failed to open telemetry to {}", address))?;
        info!("Sending telemetry to {}", address);
        traj_ctrl = traj_ctrl.with_telemetry(Box::new(sink));
    }

    let mut archiver = Archiver::from_path(&session, "traj_ctrl/telemetry.csv")
        .wrap_err("Failed to open the telemetry archive")?;

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    // Start on the first waypoint, pointing at the second
    let start_m = track.waypoint(0);
    let to_next = track.waypoint(1) - start_m;
    let mut vehicle = Vehicle {
        pose: Pose::new(start_m, to_next[1].atan2(to_next[0])),
        speed_ms: 0.0,
    };
    let mut next_waypoint = 1;
    let mut laps = 0;

    for tick in 0..NUM_TICKS {
        if (track.waypoint(next_waypoint) - vehicle.pose.position_m).norm() < track.width_m() {
            next_waypoint = (next_waypoint + 1) % track.num_waypoints();
            if next_waypoint == 1 {
                laps += 1;
                info!("Lap {} complete at {:.1} s", laps, tick as f64 * CYCLE_PERIOD_S);
            }
        }

        let input = TickInput {
            next_waypoint,
            pose: vehicle.pose,
            velocity_ms: vehicle.pose.forward() * vehicle.speed_ms,
        };

        let (cmd, report) = traj_ctrl
            .proc(&input)
            .wrap_err_with(|| format!("TrajCtrl processing failed on tick {}", tick))?;

        vehicle.step(cmd.throttle, cmd.steering, CYCLE_PERIOD_S);

        archiver
            .serialise(&TelemetryFrame::new(tick, &input, &cmd, &report))
            .wrap_err("Failed to archive the tick")?;
    }

    info!(
        "Simulation finished: {} laps, final speed {:.1} m/s",
        laps, vehicle.speed_ms
    );

    session.exit();

    Ok(())
}

impl Vehicle {
    /// Integrate the unicycle model over one tick.
    fn step(&mut self, throttle: f64, ang_vel_rads: f64, dt_s: f64) {
        self.speed_ms = (self.speed_ms + throttle * ACCELERATION_MSS * dt_s).max(0.0);
        self.pose.heading_rad += ang_vel_rads * dt_s;
        self.pose.position_m += self.pose.forward() * self.speed_ms * dt_s;
    }
}
