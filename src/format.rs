//! Text helpers shared by the CLI reports and the board.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, Utc};

/// Wall-clock time in the local timezone. Due dates and "today" are judged against this.
pub fn local_now(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&Local).naive_local()
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday".."sunday" (and "mon".."sun") for this week's occurrence, "next friday" for next week's
/// - "end of week" / "eow" (the coming Sunday)
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let to_sunday = 6 - today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(to_sunday));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d') {
            if let Ok(days) = n.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(n) = rest.strip_suffix('w') {
            if let Ok(weeks) = n.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    let (next_week, day) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix("this ").unwrap_or(s.as_str())),
    };
    if let Some(target) = weekday_index(day) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target + 7 - current) % 7;
        let ahead = if next_week { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn weekday_index(name: &str) -> Option<i64> {
    let idx = match name {
        "monday" | "mon" => 0,
        "tuesday" | "tue" => 1,
        "wednesday" | "wed" => 2,
        "thursday" | "thu" => 3,
        "friday" | "fri" => 4,
        "saturday" | "sat" => 5,
        "sunday" | "sun" => 6,
        _ => return None,
    };
    Some(idx)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {}d", delta)
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Text progress bar, e.g. `[#####-----]` for 50% at width 10.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent.min(100) as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Word-wrap `text` to `width` columns, keeping at most `max_lines` lines.
pub fn wrap_words(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            if lines.len() >= max_lines {
                return lines;
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_due_input() {
        // 2024-03-13 is a Wednesday.
        let today = date(2024, 3, 13);
        assert_eq!(parse_due_input("today", today), Some(today));
        assert_eq!(parse_due_input(" Tomorrow ", today), Some(date(2024, 3, 14)));
        assert_eq!(parse_due_input("in 3d", today), Some(date(2024, 3, 16)));
        assert_eq!(parse_due_input("in 2w", today), Some(date(2024, 3, 27)));
        assert_eq!(parse_due_input("friday", today), Some(date(2024, 3, 15)));
        assert_eq!(parse_due_input("wed", today), Some(today));
        assert_eq!(parse_due_input("next monday", today), Some(date(2024, 3, 25)));
        assert_eq!(parse_due_input("eow", today), Some(date(2024, 3, 17)));
        assert_eq!(parse_due_input("2024-04-01", today), Some(date(2024, 4, 1)));
        assert_eq!(parse_due_input("someday", today), None);
    }

    #[test]
    fn test_format_due_relative() {
        let today = date(2024, 3, 13);
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(format_due_relative(Some(date(2024, 3, 14)), today), "tomorrow");
        assert_eq!(format_due_relative(Some(date(2024, 3, 20)), today), "in 7d");
        assert_eq!(format_due_relative(Some(date(2024, 3, 11)), today), "2d late");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(50, 10), "[#####-----]");
        assert_eq!(progress_bar(100, 4), "[####]");
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("one two three four", 9, 2), vec!["one two", "three"]);
        assert_eq!(wrap_words("one", 9, 2), vec!["one"]);
        assert!(wrap_words("", 9, 2).is_empty());
    }
}
