//! Actuator seam: where executable commands leave the pipeline
//!
//! The pipeline forwards `{action, parameters}` only after the gate passes.
//! What happens next (and whether it worked) is the actuator's business.

use anyhow::Result;
use async_trait::async_trait;
use command_parser::{Parameters, ParsedIntent};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

/// What the actuator receives for an approved intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneCommand {
    pub intent_id: Uuid,
    pub action: String,
    pub parameters: Parameters,
}

impl DroneCommand {
    fn number(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).and_then(|v| v.as_f64())
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(|v| v.as_str())
    }
}

impl From<&ParsedIntent> for DroneCommand {
    fn from(intent: &ParsedIntent) -> Self {
        Self {
            intent_id: intent.id(),
            action: intent.action.clone(),
            parameters: intent.parameters.clone(),
        }
    }
}

/// Outcome reported back to the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub intent_id: Uuid,
    pub action: String,
    pub success: bool,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
}

impl ExecutionReport {
    fn new(command: &DroneCommand, success: bool, message: impl Into<String>) -> Self {
        Self {
            intent_id: command.intent_id,
            action: command.action.clone(),
            success,
            message: message.into(),
            executed_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Executes approved commands on a drone (or a stand-in)
#[async_trait]
pub trait DroneActuator: Send + Sync {
    /// Execute one command. A refused maneuver is a report with
    /// `success == false`; `Err` is reserved for transport failures.
    async fn execute(&self, command: &DroneCommand) -> Result<ExecutionReport>;

    fn name(&self) -> &str;
}

/// In-memory flight state of the simulator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedState {
    pub connected: bool,
    pub airborne: bool,
    /// Centimeters, relative to the takeoff point
    pub x: f64,
    pub y: f64,
    pub altitude: f64,
    /// Degrees clockwise from the initial heading, in [0, 360)
    pub heading: f64,
    pub photos: u32,
    pub detecting: bool,
    pub tracking: bool,
}

/// Takeoff height when none is given, in centimeters
const DEFAULT_TAKEOFF_HEIGHT: f64 = 100.0;

/// Drone simulator; connected and on the ground at start
pub struct SimulatedDrone {
    state: Mutex<SimulatedState>,
}

impl SimulatedDrone {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                connected: true,
                ..SimulatedState::default()
            }),
        }
    }

    pub async fn state(&self) -> SimulatedState {
        self.state.lock().await.clone()
    }
}

impl Default for SimulatedDrone {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DroneActuator for SimulatedDrone {
    async fn execute(&self, command: &DroneCommand) -> Result<ExecutionReport> {
        let mut state = self.state.lock().await;
        let outcome = apply(&mut state, command);

        let report = match outcome {
            Ok(message) => ExecutionReport::new(command, true, message),
            Err(message) => ExecutionReport::new(command, false, message),
        };
        tracing::info!(
            id = %command.intent_id,
            action = %command.action,
            success = report.success,
            "{}",
            report.message
        );
        Ok(report)
    }

    fn name(&self) -> &str {
        "simulator"
    }
}

/// Apply a command to the simulated state; `Err` carries the refusal message
fn apply(
    state: &mut SimulatedState,
    command: &DroneCommand,
) -> std::result::Result<String, String> {
    let action = command.action.as_str();

    if action == "connect" {
        state.connected = true;
        return Ok("接続しました".to_string());
    }
    if !state.connected {
        return Err("ドローンに接続されていません".to_string());
    }

    match action {
        "disconnect" => {
            if state.airborne {
                return Err("飛行中は切断できません".to_string());
            }
            state.connected = false;
            Ok("切断しました".to_string())
        }
        "emergency_stop" => {
            state.airborne = false;
            state.altitude = 0.0;
            state.tracking = false;
            Ok("緊急停止しました".to_string())
        }
        "takeoff" => {
            if state.airborne {
                return Err("既に飛行中です".to_string());
            }
            state.airborne = true;
            state.altitude = command.number("height").unwrap_or(DEFAULT_TAKEOFF_HEIGHT);
            Ok(format!("離陸しました（高度 {}cm）", state.altitude))
        }
        "land" => {
            require_airborne(state)?;
            state.airborne = false;
            state.altitude = 0.0;
            Ok("着陸しました".to_string())
        }
        "move" => {
            require_airborne(state)?;
            let distance = command.number("distance").ok_or("距離が指定されていません")?;
            match command.text("direction") {
                Some("forward") => state.y += distance,
                Some("back") => state.y -= distance,
                Some("right") => state.x += distance,
                Some("left") => state.x -= distance,
                Some("up") => state.altitude += distance,
                Some("down") => state.altitude = (state.altitude - distance).max(0.0),
                other => return Err(format!("移動できない方向です: {:?}", other)),
            }
            Ok(format!("{}cm 移動しました", distance))
        }
        "rotate" => {
            require_airborne(state)?;
            let angle = command.number("angle").ok_or("角度が指定されていません")?;
            let signed = match command.text("direction") {
                Some("clockwise") | Some("right") => angle,
                Some("counterclockwise") | Some("left") => -angle,
                other => return Err(format!("回転できない方向です: {:?}", other)),
            };
            state.heading = (state.heading + signed).rem_euclid(360.0);
            Ok(format!("{}度 回転しました（方位 {}度）", angle, state.heading))
        }
        "altitude" => {
            require_airborne(state)?;
            let height = command.number("height").ok_or("高さが指定されていません")?;
            state.altitude = match command.text("direction") {
                Some("up") => state.altitude + height,
                Some("down") => (state.altitude - height).max(0.0),
                _ => height,
            };
            Ok(format!("高度を {}cm にしました", state.altitude))
        }
        "photo" => {
            state.photos += 1;
            let name = command
                .text("filename")
                .map(str::to_string)
                .unwrap_or_else(|| format!("photo_{:04}.jpg", state.photos));
            let quality = command.text("quality").unwrap_or("medium");
            Ok(format!("写真を撮影しました: {} ({})", name, quality))
        }
        "detection" => {
            state.detecting = true;
            Ok("物体検出を開始しました".to_string())
        }
        "tracking" => {
            require_airborne(state)?;
            state.tracking = true;
            Ok("追跡を開始しました".to_string())
        }
        "status" => Ok(format!(
            "{} / 位置 ({}, {}) / 高度 {}cm / 方位 {}度 / 写真 {}枚",
            if state.airborne { "飛行中" } else { "着陸中" },
            state.x,
            state.y,
            state.altitude,
            state.heading,
            state.photos
        )),
        other => Err(format!("未対応のアクションです: {}", other)),
    }
}

fn require_airborne(state: &SimulatedState) -> std::result::Result<(), String> {
    if state.airborne {
        Ok(())
    } else {
        Err("離陸していません".to_string())
    }
}
