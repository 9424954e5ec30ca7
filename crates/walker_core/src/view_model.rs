#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerView {
    pub running: bool,
    pub start_enabled: bool,
    pub export_enabled: bool,
    pub reset_enabled: bool,
    pub clear_enabled: bool,
    pub record_count: usize,
    pub status: StatusLine,
    pub dirty: bool,
}
