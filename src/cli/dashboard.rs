use std::{
    fmt::Display,
    io::{IsTerminal, Write},
};

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{DateTime, TimeZone};

use crate::{
    core::{
        calc::{active_remaining_ms, birth_instant, LifeProjection},
        format::{format_date_time, format_duration_hms, format_remaining, Unit},
        profile::{NoteScope, Profile, TimeOfDay},
    },
    notes::period::label,
    utils::percentage::{fraction_percentage, Percentage},
};

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveHours {
    pub remaining: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Everything shown on one frame of the dashboard, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub remaining: String,
    pub projected_end: String,
    pub progress: Percentage,
    pub active: Option<ActiveHours>,
    pub note: Option<(NoteScope, String)>,
}

impl Dashboard {
    pub fn compute<Tz: TimeZone>(
        now: &DateTime<Tz>,
        profile: &Profile,
        unit: Unit,
        show_active: bool,
    ) -> Self
    where
        Tz::Offset: Display,
    {
        let tz = now.timezone();
        let birth = birth_instant(&tz, profile.birth_date);
        let projection = LifeProjection::compute(
            now.timestamp_millis(),
            birth.timestamp_millis(),
            profile.life_expectancy_years,
        );

        let projected_end = projection
            .projected_end(&tz)
            .map(|v| format_date_time(&v))
            .unwrap_or_else(|| "out of range".into());

        let active = show_active.then(|| ActiveHours {
            remaining: format_duration_hms(active_remaining_ms(
                now,
                profile.active_window_start,
                profile.active_window_end,
            )),
            start: profile.active_window_start,
            end: profile.active_window_end,
        });

        Self {
            remaining: format_remaining(projection.remaining_ms, unit),
            projected_end,
            progress: fraction_percentage(projection.fraction_elapsed),
            active,
            note: None,
        }
    }

    pub fn with_note(self, scope: NoteScope, text: impl Into<String>) -> Self {
        Self {
            note: Some((scope, text.into())),
            ..self
        }
    }

    pub fn render(&self, styled: bool) -> String {
        let paint = |style: Style, text: &str| {
            if styled {
                style.paint(text).to_string()
            } else {
                text.to_string()
            }
        };
        let heading = Style::new().bold();
        let dim = Style::new().dimmed();

        let mut lines = vec![
            format!(
                "{} {}",
                paint(heading, "Remaining (estimate)"),
                paint(Colour::Cyan.bold(), &self.remaining)
            ),
            paint(dim, &format!("Projected end: {}", self.projected_end)),
            format!("{} {}", life_bar(*self.progress / 100.), self.progress),
        ];

        if let Some(active) = &self.active {
            lines.push(String::new());
            lines.push(format!(
                "{} {}",
                paint(heading, "Active hours left today"),
                paint(Colour::Green.bold(), &active.remaining)
            ));
            lines.push(paint(
                dim,
                &format!("Active window: {}-{}", active.start, active.end),
            ));
        }

        if let Some((scope, text)) = &self.note {
            lines.push(String::new());
            lines.push(paint(heading, label(*scope)));
            if text.is_empty() {
                lines.push(paint(dim, "(empty)"));
            } else {
                lines.push(text.clone());
            }
        }

        lines.push(String::new());
        lines.push(paint(
            dim,
            "Statistical estimate only. This is not a prediction of your lifespan.",
        ));
        lines.join("\n")
    }
}

fn life_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0., 1.) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Destination of rendered frames.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink {
    fn show(&mut self, frame: &Dashboard) -> Result<()>;
}

/// Redraws the whole terminal on every frame.
pub struct TerminalSink {
    styled: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            styled: std::io::stdout().is_terminal(),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for TerminalSink {
    fn show(&mut self, frame: &Dashboard) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        if self.styled {
            // Clear the screen and move the cursor home.
            write!(stdout, "\x1b[2J\x1b[H")?;
        }
        writeln!(stdout, "{}", frame.render(self.styled))?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn profile() -> Profile {
        Profile {
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            life_expectancy_years: 80.,
            ..Profile::default()
        }
    }

    #[test]
    fn test_dashboard_at_birth() {
        let now = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
            .and_utc();
        let dashboard = Dashboard::compute(&now, &profile(), Unit::Days, true);

        // 80 average years are 29219.4 days.
        assert_eq!(dashboard.remaining, "29,219 days");
        assert_eq!(dashboard.projected_end, "2079-12-31 09:36:00");
        assert_eq!(dashboard.progress.to_string(), "0.00%");
        assert_eq!(
            dashboard.active,
            Some(ActiveHours {
                remaining: "16h 0m 0s".into(),
                start: TimeOfDay::new_opt(7, 0).unwrap(),
                end: TimeOfDay::new_opt(23, 0).unwrap(),
            })
        );
    }

    #[test]
    fn test_dashboard_without_active_hours() {
        let now = Utc::now();
        let dashboard = Dashboard::compute(&now, &profile(), Unit::Days, false);
        assert_eq!(dashboard.active, None);
        assert!(!dashboard.render(false).contains("Active hours"));
    }

    #[test]
    fn test_render_plain() {
        let now = NaiveDate::from_ymd_opt(2040, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
            .and_utc();
        let rendered = Dashboard::compute(&now, &profile(), Unit::Digits, true)
            .with_note(NoteScope::Week, "")
            .render(false);

        assert!(rendered.contains("Active hours left today 1h 0m 0s"));
        assert!(rendered.contains("Active window: 07:00-23:00"));
        assert!(rendered.contains("This week's note\n(empty)"));
        assert!(rendered.contains("[###############---------------] 50.00%"));
        assert!(!rendered.contains('\x1b'));
    }

    #[test]
    fn test_life_bar_bounds() {
        assert_eq!(life_bar(-1.), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(life_bar(2.), format!("[{}]", "#".repeat(BAR_WIDTH)));
    }
}
