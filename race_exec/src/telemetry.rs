//! # Telemetry
//!
//! An optional side channel broadcasting per-tick controller values for
//! external plotting. Telemetry never affects control, failures to publish are
//! logged and otherwise ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use log::warn;
use serde::Serialize;

use crate::traj_ctrl::{Command, StatusReport, TickInput};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A destination for telemetry frames.
pub trait TelemetrySink: Send {
    fn publish(&mut self, frame: &TelemetryFrame);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A flat summary of one controller tick.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TelemetryFrame {
    pub tick: u64,
    pub next_waypoint: usize,
    pub pos_x_m: f64,
    pub pos_y_m: f64,
    pub heading_rad: f64,
    pub speed_ms: f64,
    pub speed_ceiling_ms: f64,
    pub curvature_m: f64,
    pub throttle: f64,
    pub steering: f64,
    pub nearest_index: usize,
    pub lookahead_index: usize,
    pub corner_index: Option<usize>,
}

/// Discards all frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

/// Sends each frame as a JSON datagram.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Could not open the telemetry socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("The telemetry address did not resolve to any socket address")]
    NoAddress,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TelemetryFrame {
    pub fn new(
        tick: u64,
        input: &TickInput,
        command: &Command,
        report: &StatusReport,
    ) -> Self {
        Self {
            tick,
            next_waypoint: input.next_waypoint,
            pos_x_m: input.pose.position_m[0],
            pos_y_m: input.pose.position_m[1],
            heading_rad: input.pose.heading_rad,
            speed_ms: report.speed_ms,
            speed_ceiling_ms: report.speed_ceiling_ms,
            curvature_m: report.curvature_m,
            throttle: command.throttle,
            steering: command.steering,
            nearest_index: report.nearest_index,
            lookahead_index: report.lookahead_index,
            corner_index: report.corner_index,
        }
    }
}

impl TelemetrySink for NullSink {
    fn publish(&mut self, _frame: &TelemetryFrame) {}
}

impl UdpSink {
    /// Open a socket on an ephemeral local port sending to `target`.
    pub fn new<A: ToSocketAddrs>(target: A) -> Result<Self, TelemetryError> {
        let target = target
            .to_socket_addrs()?
            .next()
            .ok_or(TelemetryError::NoAddress)?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0u8, 0, 0, 0], 0).into()
        }
        else {
            ([0u16; 8], 0).into()
        };

        Ok(Self {
            socket: UdpSocket::bind(bind_addr)?,
            target,
        })
    }
}

impl TelemetrySink for UdpSink {
    fn publish(&mut self, frame: &TelemetryFrame) {
        let data = match serde_json::to_vec(frame) {
            Ok(d) => d,
            Err(e) => {
                warn!("Could not serialise telemetry frame {}: {}", frame.tick, e);
                return;
            }
        };

        if let Err(e) = self.socket.send_to(&data, self.target) {
            warn!("Could not send telemetry to {}: {}", self.target, e);
        }
    }
}
