use std::fmt;

/// Lifecycle stage of a [`LegacyRequest`](crate::LegacyRequest).
///
/// Values match the numeric constants pages compare `readyState` against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ReadyState {
    #[default]
    Unsent = 0,
    Opened = 1,
    Sent = 2,
    HeadersParsed = 3,
    Done = 4,
}

impl ReadyState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ReadyState> for u8 {
    fn from(state: ReadyState) -> Self {
        state.as_u8()
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Unsent => "UNSENT",
            ReadyState::Opened => "OPENED",
            ReadyState::Sent => "SENT",
            ReadyState::HeadersParsed => "HEADERS_PARSED",
            ReadyState::Done => "DONE",
        };
        f.write_str(name)
    }
}
