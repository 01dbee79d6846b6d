use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

const LOOKAHEAD_DAYS: i64 = 30;
const MAX_EVENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn for_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Occasion {
    Christmas,
    ValentinesDay,
    MothersDay,
    FathersDay,
}

impl Occasion {
    const ALL: [Occasion; 4] = [
        Occasion::Christmas,
        Occasion::ValentinesDay,
        Occasion::MothersDay,
        Occasion::FathersDay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Occasion::Christmas => "Christmas",
            Occasion::ValentinesDay => "Valentine's Day",
            Occasion::MothersDay => "Mother's Day",
            Occasion::FathersDay => "Father's Day",
        }
    }

    // Mother's and Father's Day move around; a week-long window approximates them.
    fn falls_on(&self, date: NaiveDate) -> bool {
        match self {
            Occasion::Christmas => date.month() == 12 && date.day() == 25,
            Occasion::ValentinesDay => date.month() == 2 && date.day() == 14,
            Occasion::MothersDay => date.month() == 3 && (15..=21).contains(&date.day()),
            Occasion::FathersDay => date.month() == 6 && (15..=21).contains(&date.day()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingEvent {
    pub occasion: Occasion,
    pub days_ahead: i64,
}

impl std::fmt::Display for UpcomingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} days)", self.occasion.label(), self.days_ahead)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonalContext {
    pub season: Season,
    pub month: String,
    pub year: i32,
    pub upcoming_events: Vec<UpcomingEvent>,
}

impl SeasonalContext {
    pub fn for_date(today: NaiveDate) -> Self {
        let mut upcoming_events: Vec<UpcomingEvent> = Vec::new();
        for days_ahead in 0..LOOKAHEAD_DAYS {
            let date = today + Duration::days(days_ahead);
            for occasion in Occasion::ALL {
                let already = upcoming_events.iter().any(|e| e.occasion == occasion);
                if !already && occasion.falls_on(date) {
                    upcoming_events.push(UpcomingEvent { occasion, days_ahead });
                }
            }
        }
        upcoming_events.truncate(MAX_EVENTS);

        Self {
            season: Season::for_month(today.month()),
            month: today.format("%B").to_string(),
            year: today.year(),
            upcoming_events,
        }
    }

    pub fn next_event(&self) -> Option<&UpcomingEvent> {
        self.upcoming_events.first()
    }

    /// "Christmas (12 days), Valentine's Day (40 days)" or "None".
    pub fn events_label(&self) -> String {
        if self.upcoming_events.is_empty() {
            return "None".to_string();
        }
        self.upcoming_events
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn keywords(&self) -> Vec<String> {
        let year = self.year;
        let mut keywords: Vec<String> = match self.season {
            Season::Winter => vec![
                format!("christmas gifts {}", year),
                format!("winter gift ideas {}", year),
                format!("holiday presents {}", year),
            ],
            Season::Spring => vec![
                format!("mothers day gifts {}", year),
                format!("spring gift ideas {}", year),
                format!("easter presents {}", year),
            ],
            Season::Summer => vec![
                format!("fathers day gifts {}", year),
                format!("graduation gifts {}", year),
                format!("summer birthday ideas {}", year),
            ],
            Season::Autumn => vec![
                format!("birthday gifts {}", year),
                format!("autumn gift ideas {}", year),
                format!("back to school gifts {}", year),
            ],
        };

        for event in &self.upcoming_events {
            match event.occasion {
                Occasion::Christmas => keywords.push(format!("unique christmas gifts {}", year)),
                Occasion::ValentinesDay => keywords.push(format!("valentines day gifts {}", year)),
                _ => {}
            }
        }
        keywords
    }
}
