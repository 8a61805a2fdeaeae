//! Voice commands forwarded to the host's session control.

/// A lifecycle command spoken by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionCommand {
    Pause,
    Resume,
    Stop,
    Mute,
    Unmute,
}

impl SessionCommand {
    pub fn label(self) -> &'static str {
        match self {
            SessionCommand::Pause => "pause",
            SessionCommand::Resume => "resume",
            SessionCommand::Stop => "stop",
            SessionCommand::Mute => "mute",
            SessionCommand::Unmute => "unmute",
        }
    }
}

/// The host's activity recorder / session manager.
///
/// Receives every voice command. The coach applies the command to itself as
/// well, so the host's echo through the lifecycle hooks is harmless.
pub trait SessionControl: Send + Sync {
    fn apply(&self, command: SessionCommand);
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SessionControl>) {}
};

/// Session control that only logs; for hosts without a recorder to drive.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingControl;

impl SessionControl for LoggingControl {
    fn apply(&self, command: SessionCommand) {
        log::info!("control: runner asked to {}", command.label());
    }
}

// ---------------------------------------------------------------------------
// RecordingControl (test only)
// ---------------------------------------------------------------------------

#[cfg(test)]
#[derive(Default)]
pub struct RecordingControl {
    commands: std::sync::Mutex<Vec<SessionCommand>>,
}

#[cfg(test)]
impl RecordingControl {
    pub fn commands(&self) -> Vec<SessionCommand> {
        self.commands.lock().expect("control lock").clone()
    }
}

#[cfg(test)]
impl SessionControl for RecordingControl {
    fn apply(&self, command: SessionCommand) {
        self.commands.lock().expect("control lock").push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_control_keeps_order() {
        let control = RecordingControl::default();
        control.apply(SessionCommand::Pause);
        control.apply(SessionCommand::Resume);
        assert_eq!(control.commands(), [SessionCommand::Pause, SessionCommand::Resume]);
    }

    #[test]
    fn labels() {
        assert_eq!(SessionCommand::Unmute.label(), "unmute");
        LoggingControl.apply(SessionCommand::Stop);
    }
}
