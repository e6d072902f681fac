//! Machine controller and execution sessions
//!
//! [`MachineController`] owns the device link and serializes everything sent
//! to it: immediate jog/control commands, the safety stop, and at most one
//! streaming [`ExecutionSession`] at a time.

use crate::link::DeviceLink;
use engravekit_core::{
    Axis, ControlCommand, DeviceError, JogDirection, MotionCommand, MotionProgram, Result,
    SessionError, ValidationError,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Machine-level constants used by control and safety operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Tool speed for the `start` control command
    pub control_spindle_speed: u32,
    /// Z height the safety stop retracts to
    pub safe_height: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            control_spindle_speed: 1000,
            safe_height: 20.0,
        }
    }
}

impl MachineSettings {
    /// Validate settings
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.safe_height.is_finite() || self.safe_height < 0.0 {
            return Err(ValidationError::config(
                "safe_height",
                "must be a finite, non-negative height",
            ));
        }
        Ok(())
    }

    /// Stop the tool, switch to absolute positioning, retract to the origin at
    /// safe height
    pub fn stop_sequence(&self) -> [MotionCommand; 3] {
        [
            MotionCommand::SpindleOff,
            MotionCommand::AbsolutePositioning,
            MotionCommand::Rapid {
                x: Some(0.0),
                y: Some(0.0),
                z: Some(self.safe_height),
                feed: None,
            },
        ]
    }
}

/// Lifecycle of an execution session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Program commands are being sent
    Streaming,
    /// Every command was sent
    Completed,
    /// Stopped by a cancellation request; the stop sequence was issued
    Cancelled,
    /// A link error ended the session
    Failed,
}

impl SessionStatus {
    /// True for `Completed`, `Cancelled` and `Failed`
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Streaming
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Streaming => write!(f, "streaming"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    error: Option<DeviceError>,
}

/// Held for as long as something owns the right to drive the link.
///
/// Dropping it (including during unwinding) releases admission, then publishes
/// the session outcome. A session that never recorded an outcome is failed.
struct Admission {
    busy: Arc<AtomicBool>,
    state: Option<Arc<RwLock<SessionState>>>,
    outcome: Option<(SessionStatus, Option<DeviceError>)>,
}

impl Admission {
    fn acquire(busy: &Arc<AtomicBool>) -> std::result::Result<Self, SessionError> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SessionError::Busy)?;
        Ok(Self {
            busy: Arc::clone(busy),
            state: None,
            outcome: None,
        })
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        // A session reported finished must already admit the next one.
        self.busy.store(false, Ordering::SeqCst);
        if let Some(state) = &self.state {
            let (status, error) = self.outcome.take().unwrap_or_else(|| {
                tracing::error!("Streaming worker ended without a terminal status");
                (SessionStatus::Failed, None)
            });
            let mut state = state.write();
            state.status = status;
            state.error = error;
        }
    }
}

/// Owns the device link and mediates all access to it
#[derive(Debug, Clone)]
pub struct MachineController {
    link: Arc<Mutex<DeviceLink>>,
    cancel: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    settings: MachineSettings,
}

impl MachineController {
    /// Take ownership of an open link
    pub fn new(link: DeviceLink, settings: MachineSettings) -> Self {
        Self {
            link: Arc::new(Mutex::new(link)),
            cancel: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            settings,
        }
    }

    /// Machine settings in use
    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    /// True while a session or an immediate command holds the link
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// True once a safety stop or cancel has been requested and not yet cleared
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Close the link
    pub fn disconnect(&self) {
        self.link.lock().disconnect();
    }

    fn send(&self, command: &MotionCommand) -> std::result::Result<String, DeviceError> {
        transact(&self.link, command)
    }

    /// Begin streaming `program` on a blocking worker and return immediately.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`SessionError::Busy`] while another session or command holds the link.
    pub fn start_execution(
        &self,
        program: MotionProgram,
    ) -> std::result::Result<ExecutionSession, SessionError> {
        let mut admission = Admission::acquire(&self.busy)?;

        self.cancel.store(false, Ordering::SeqCst);

        let id = Uuid::new_v4();
        let total = program.len();
        let sent = Arc::new(AtomicUsize::new(0));
        let state = Arc::new(RwLock::new(SessionState {
            status: SessionStatus::Streaming,
            error: None,
        }));
        admission.state = Some(Arc::clone(&state));

        tracing::info!("Session {} streaming {} commands", id, total);

        let worker = StreamWorker {
            id,
            link: Arc::clone(&self.link),
            cancel: Arc::clone(&self.cancel),
            settings: self.settings.clone(),
            sent: Arc::clone(&sent),
        };
        let handle = tokio::task::spawn_blocking(move || {
            let mut admission = admission;
            let (status, error) = worker.run(&program);
            admission.outcome = Some((status, error));
            status
        });

        Ok(ExecutionSession {
            id,
            total,
            sent,
            state,
            cancel: Arc::clone(&self.cancel),
            handle: Some(handle),
        })
    }

    /// Relative single-axis rapid move: `G91` then `G0 <axis><dir><increment>`.
    ///
    /// Returns the device's reply to the move.
    pub fn jog_move(
        &self,
        axis: Axis,
        increment: f64,
        direction: JogDirection,
    ) -> Result<String> {
        if !increment.is_finite() || increment <= 0.0 {
            return Err(ValidationError::InvalidIncrement { increment }.into());
        }
        let _admission = Admission::acquire(&self.busy)?;

        tracing::debug!("Jog {}{}{}", axis, direction, increment);
        self.send(&MotionCommand::RelativePositioning)?;
        let reply = self.send(&MotionCommand::Jog {
            axis,
            direction,
            distance: increment,
        })?;
        Ok(reply)
    }

    /// [`jog_move`](Self::jog_move) from caller strings, validated before any I/O
    pub fn jog_move_str(&self, axis: &str, increment: f64, direction: &str) -> Result<String> {
        let axis: Axis = axis.parse()?;
        let direction: JogDirection = direction.parse()?;
        self.jog_move(axis, increment, direction)
    }

    /// Immediate tool or origin control
    pub fn control(&self, command: ControlCommand) -> Result<String> {
        let _admission = Admission::acquire(&self.busy)?;

        let motion = match command {
            ControlCommand::Start => MotionCommand::SpindleOn {
                speed: self.settings.control_spindle_speed,
            },
            ControlCommand::Stop => MotionCommand::SpindleOff,
            ControlCommand::SetOrigin => MotionCommand::SetOrigin,
        };
        tracing::debug!("Control {} -> {}", command, motion);
        Ok(self.send(&motion)?)
    }

    /// [`control`](Self::control) from a caller string
    pub fn control_str(&self, command: &str) -> Result<String> {
        self.control(command.parse()?)
    }

    /// Request cancellation of any streaming session, then stop the tool and
    /// retract to safe height.
    ///
    /// Never rejected, whether or not a session is streaming. A streaming
    /// worker stops at its next between-command check, so the command already
    /// in flight completes first. All three stop commands are attempted; the
    /// first failure is returned.
    pub fn safety_stop(&self) -> std::result::Result<(), DeviceError> {
        self.cancel.store(true, Ordering::SeqCst);
        tracing::warn!("Safety stop requested");
        run_stop_sequence(&mut self.link.lock(), &self.settings)
    }
}

fn transact(
    link: &Mutex<DeviceLink>,
    command: &MotionCommand,
) -> std::result::Result<String, DeviceError> {
    link.lock().transact(&command.to_string())
}

/// Caller holds the link lock for the whole sequence so it is never interleaved
fn run_stop_sequence(
    link: &mut DeviceLink,
    settings: &MachineSettings,
) -> std::result::Result<(), DeviceError> {
    let mut first_error = None;
    for command in settings.stop_sequence() {
        if let Err(e) = link.transact(&command.to_string()) {
            tracing::error!("Stop command '{}' failed: {}", command, e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

struct StreamWorker {
    id: Uuid,
    link: Arc<Mutex<DeviceLink>>,
    cancel: Arc<AtomicBool>,
    settings: MachineSettings,
    sent: Arc<AtomicUsize>,
}

impl StreamWorker {
    fn run(&self, program: &MotionProgram) -> (SessionStatus, Option<DeviceError>) {
        let (status, error) = self.stream(program);
        if let Some(e) = &error {
            tracing::error!("Session {} failed: {}", self.id, e);
        } else {
            tracing::info!(
                "Session {} {} after {} of {} commands",
                self.id,
                status,
                self.sent.load(Ordering::SeqCst),
                program.len()
            );
        }
        (status, error)
    }

    fn stream(&self, program: &MotionProgram) -> (SessionStatus, Option<DeviceError>) {
        for (index, line) in program.lines().iter().enumerate() {
            // The flag is checked under the lock, so no program command can
            // follow a safety stop that got the link first.
            let mut link = self.link.lock();
            if self.cancel.load(Ordering::SeqCst) {
                tracing::warn!("Session {} cancelled before command {}", self.id, index + 1);
                if let Err(e) = run_stop_sequence(&mut link, &self.settings) {
                    tracing::error!("Stop sequence after cancel failed: {}", e);
                }
                return (SessionStatus::Cancelled, None);
            }

            match link.transact(line) {
                Ok(reply) => {
                    if reply.is_empty() {
                        tracing::debug!("'{}' unacknowledged", line);
                    }
                    self.sent.store(index + 1, Ordering::SeqCst);
                }
                Err(e) => return (SessionStatus::Failed, Some(e)),
            }
        }
        (SessionStatus::Completed, None)
    }
}

/// Handle to one streaming run of a motion program
#[derive(Debug)]
pub struct ExecutionSession {
    id: Uuid,
    total: usize,
    sent: Arc<AtomicUsize>,
    state: Arc<RwLock<SessionState>>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<SessionStatus>>,
}

impl ExecutionSession {
    /// Session identifier used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        self.state.read().status
    }

    /// `(sent, total)` command counts
    pub fn progress(&self) -> (usize, usize) {
        (self.sent.load(Ordering::SeqCst), self.total)
    }

    /// True once a terminal status is reached
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Link error that failed the session, if any
    pub fn error(&self) -> Option<DeviceError> {
        self.state.read().error.clone()
    }

    /// Ask the worker to stop at its next check; it then issues the stop
    /// sequence itself
    pub fn cancel(&self) {
        tracing::info!("Cancel requested for session {}", self.id);
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Wait for the worker to finish and return the terminal status.
    ///
    /// Cancel-safe: dropping the future before it completes keeps the session
    /// joinable, so it can be used as a `tokio::select!` branch.
    pub async fn wait(&mut self) -> SessionStatus {
        if let Some(handle) = self.handle.as_mut() {
            let joined = handle.await;
            self.handle = None;
            if let Err(e) = joined {
                tracing::error!("Session {} worker aborted: {}", self.id, e);
                let mut state = self.state.write();
                if !state.status.is_terminal() {
                    state.status = SessionStatus::Failed;
                }
            }
        }
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = MachineSettings::default();
        assert_eq!(settings.control_spindle_speed, 1000);
        assert_eq!(settings.safe_height, 20.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_stop_sequence_text() {
        let lines: Vec<String> = MachineSettings::default()
            .stop_sequence()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(lines, vec!["M5", "G90", "G0 X0 Y0 Z20"]);
    }

    #[test]
    fn test_admission_is_exclusive_and_released() {
        let busy = Arc::new(AtomicBool::new(false));
        let first = Admission::acquire(&busy).unwrap();
        assert_eq!(Admission::acquire(&busy).err(), Some(SessionError::Busy));
        drop(first);
        assert!(Admission::acquire(&busy).is_ok());
    }

    #[test]
    fn test_admission_drop_fails_unfinished_session() {
        let busy = Arc::new(AtomicBool::new(false));
        let state = Arc::new(RwLock::new(SessionState {
            status: SessionStatus::Streaming,
            error: None,
        }));
        let mut admission = Admission::acquire(&busy).unwrap();
        admission.state = Some(Arc::clone(&state));
        drop(admission);
        assert_eq!(state.read().status, SessionStatus::Failed);
        assert!(!busy.load(Ordering::SeqCst));
    }

    #[test]
    fn test_admission_drop_publishes_recorded_outcome() {
        let busy = Arc::new(AtomicBool::new(false));
        let state = Arc::new(RwLock::new(SessionState {
            status: SessionStatus::Streaming,
            error: None,
        }));
        let mut admission = Admission::acquire(&busy).unwrap();
        admission.state = Some(Arc::clone(&state));
        admission.outcome = Some((SessionStatus::Failed, Some(DeviceError::NotConnected)));
        drop(admission);
        assert_eq!(state.read().status, SessionStatus::Failed);
        assert!(matches!(state.read().error, Some(DeviceError::NotConnected)));
        assert!(!busy.load(Ordering::SeqCst));
    }
}
