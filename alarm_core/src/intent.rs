//! Side-effect intents produced by the state machine.
//!
//! The machine never touches hardware or the network; it returns a list of
//! intents that `Node` executes in order.

/// What caused an arm/disarm transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Schedule,
    RemotePoll,
    PinCommand,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Schedule => "schedule",
            Source::RemotePoll => "remote-poll",
            Source::PinCommand => "pin-command",
        }
    }
}

/// User-facing alert pushed to `alerts/last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    Connected,
    AutoArmed,
    AutoDisarmed,
    RemoteArmed,
    RemoteDisarmed,
    PinArmed,
    PinDisarmed,
    IncorrectPin,
    MotionDetected,
}

impl Alert {
    pub fn message(self) -> &'static str {
        match self {
            Alert::Connected => "Smart Alarm system connected and ready!",
            Alert::AutoArmed => "Alarm AUTO-ARMED - scheduled period activated",
            Alert::AutoDisarmed => "Alarm AUTO-DISARMED - scheduled period ended",
            Alert::RemoteArmed => "Alarm ARMED - system active",
            Alert::RemoteDisarmed | Alert::PinDisarmed => "Alarm DISARMED - system inactive",
            Alert::PinArmed => "Alarm ARMED - system ready!",
            Alert::IncorrectPin => "Incorrect PIN code!",
            Alert::MotionDetected => "ALARM TRIGGERED - Motion detected!",
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Buzzer request for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Start the arm confirmation chirp.
    Chirp,
    /// Siren for this tick; `elapsed_ms` since the episode began selects the phase.
    Siren { elapsed_ms: u64 },
    /// Stop any tone, cancelling a chirp in progress.
    Silence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Sound(SoundCue),
    Led(bool),
    SetRemoteArmed(bool),
    SetRemoteTriggered(bool),
    Alert(Alert),
    /// Append to `motionLogs/<unix seconds>` and update `lastMotion`.
    LogMotion { at_ms: u64 },
    /// Remove the consumed `commands` node.
    DeleteCommand,
}
