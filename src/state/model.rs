/// Long-running editor operations that hold the busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    RandomTemplate,
    Export,
}

impl Operation {
    pub const fn busy_message(self) -> &'static str {
        match self {
            Self::Upload => "Loading uploaded image…",
            Self::RandomTemplate => "Fetching random template…",
            Self::Export => "Exporting PNG…",
        }
    }

    pub const fn failure_prefix(self) -> &'static str {
        match self {
            Self::Upload => "Upload failed",
            Self::RandomTemplate => "Random template failed",
            Self::Export => "Export failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Idle,
    Busy(Operation),
}

impl AppState {
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Busy(_))
    }
}
