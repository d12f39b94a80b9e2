use chrono::Timelike;
use colored::Color;

/// Time-of-day bucket driving the header theme. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    /// Morning 06-12, afternoon 12-18, evening 18-21, night otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            18..=20 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }

    pub fn of(time: &impl Timelike) -> Self {
        Self::from_hour(time.hour())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
            DayPeriod::Night => "night",
        }
    }

    /// Header colour.
    pub fn color(&self) -> Color {
        match self {
            DayPeriod::Morning => Color::BrightYellow,
            DayPeriod::Afternoon => Color::BrightCyan,
            DayPeriod::Evening => Color::BrightMagenta,
            DayPeriod::Night => Color::BrightBlue,
        }
    }
}

impl std::fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
