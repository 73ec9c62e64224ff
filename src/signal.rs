/// Fatal signals the runner knows how to name. Raw numbers follow the Linux
/// convention reported by `ExitStatus::signal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    IllegalInstruction,
    Abort,
    BusError,
    FloatingPointException,
    Kill,
    SegFault,
    Terminated,
}

impl TerminationSignal {
    pub fn from_raw(signum: i32) -> Option<Self> {
        match signum {
            2 => Some(TerminationSignal::Interrupt),
            4 => Some(TerminationSignal::IllegalInstruction),
            6 => Some(TerminationSignal::Abort),
            7 => Some(TerminationSignal::BusError),
            8 => Some(TerminationSignal::FloatingPointException),
            9 => Some(TerminationSignal::Kill),
            11 => Some(TerminationSignal::SegFault),
            15 => Some(TerminationSignal::Terminated),
            _ => None,
        }
    }

    pub fn number(self) -> i32 {
        match self {
            TerminationSignal::Interrupt => 2,
            TerminationSignal::IllegalInstruction => 4,
            TerminationSignal::Abort => 6,
            TerminationSignal::BusError => 7,
            TerminationSignal::FloatingPointException => 8,
            TerminationSignal::Kill => 9,
            TerminationSignal::SegFault => 11,
            TerminationSignal::Terminated => 15,
        }
    }
}
