//! Read-only projections over the store.
//!
//! Every function here is pure: it takes slices borrowed from the store plus
//! whatever "now" it needs, and returns a freshly computed view. Nothing is
//! cached, so a view is always consistent with the store it was computed from.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::activity::Activity;
use crate::fields::{Status, WeekStart};
use crate::project::{Project, ProjectId};
use crate::task::Task;
use crate::user::{User, UserId};

/// Length of the timeline window in days.
pub const TIMELINE_DAYS: i64 = 14;
/// Days shown before a task's due date on the timeline.
pub const TIMELINE_LEAD_IN: i64 = 3;

/// Tasks partitioned into the four board columns.
#[derive(Debug, Clone, Default)]
pub struct StatusBuckets<'a> {
    buckets: [Vec<&'a Task>; 4],
}

impl<'a> StatusBuckets<'a> {
    /// Tasks in one column, in collection order.
    pub fn get(&self, status: Status) -> &[&'a Task] {
        &self.buckets[status.column()]
    }

    /// Columns in board order.
    pub fn iter(&self) -> impl Iterator<Item = (Status, &[&'a Task])> + '_ {
        Status::ALL.iter().map(move |&s| (s, self.get(s)))
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Partition tasks by status, keeping their relative order within each bucket.
pub fn group_by_status<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> StatusBuckets<'a> {
    let mut out = StatusBuckets::default();
    for t in tasks {
        out.buckets[t.status.column()].push(t);
    }
    out
}

/// Tasks owned by a project, in collection order.
pub fn tasks_for_project(tasks: &[Task], project: ProjectId) -> Vec<&Task> {
    tasks.iter().filter(|t| t.project_id == project).collect()
}

/// Share of done tasks as a whole percentage, rounded half up. Zero tasks is 0%.
pub fn progress_percent<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> u8 {
    let (mut total, mut done) = (0u64, 0u64);
    for t in tasks {
        total += 1;
        if t.status == Status::Done {
            done += 1;
        }
    }
    if total == 0 {
        return 0;
    }
    ((done * 200 + total) / (total * 2)) as u8
}

/// Progress of one project.
pub fn project_progress(tasks: &[Task], project: ProjectId) -> u8 {
    progress_percent(tasks.iter().filter(|t| t.project_id == project))
}

/// A task is overdue when it is not done and `now` is past the start of its due day.
pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    task.status != Status::Done && task.due_date.is_some_and(|d| d.and_time(NaiveTime::MIN) < now)
}

pub fn overdue_count(tasks: &[Task], now: NaiveDateTime) -> usize {
    tasks.iter().filter(|t| is_overdue(t, now)).count()
}

/// Number of tasks per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Todo => self.todo,
            Status::InProgress => self.in_progress,
            Status::Review => self.review,
            Status::Done => self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.todo + self.in_progress + self.review + self.done
    }
}

pub fn status_counts<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> StatusCounts {
    let mut c = StatusCounts::default();
    for t in tasks {
        match t.status {
            Status::Todo => c.todo += 1,
            Status::InProgress => c.in_progress += 1,
            Status::Review => c.review += 1,
            Status::Done => c.done += 1,
        }
    }
    c
}

/// Figures shown on the dashboard stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub counts: StatusCounts,
    pub overdue: usize,
}

pub fn dashboard_summary(tasks: &[Task], now: NaiveDateTime) -> DashboardSummary {
    DashboardSummary {
        counts: status_counts(tasks),
        overdue: overdue_count(tasks, now),
    }
}

/// One row of the project progress panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary<'a> {
    pub project: &'a Project,
    pub task_count: usize,
    pub done_count: usize,
    pub progress: u8,
}

pub fn project_summaries<'a>(projects: &'a [Project], tasks: &'a [Task]) -> Vec<ProjectSummary<'a>> {
    projects
        .iter()
        .map(|p| {
            let owned = tasks_for_project(tasks, p.id);
            ProjectSummary {
                project: p,
                task_count: owned.len(),
                done_count: owned.iter().filter(|t| t.status == Status::Done).count(),
                progress: progress_percent(owned.iter().copied()),
            }
        })
        .collect()
}

/// Resolve a project's member ids to users, in member-list order. Unknown ids are skipped.
pub fn project_members<'a>(project: &Project, users: &'a [User]) -> Vec<&'a User> {
    project
        .member_ids
        .iter()
        .filter_map(|id| users.iter().find(|u| u.id == *id))
        .collect()
}

/// Projects a user owns or belongs to.
pub fn projects_for_user(projects: &[Project], user: UserId) -> Vec<&Project> {
    projects.iter().filter(|p| p.involves(user)).collect()
}

/// Newest activity first, at most `limit` entries.
pub fn recent_activity(activity: &[Activity], limit: usize) -> Vec<&Activity> {
    let mut out: Vec<&Activity> = activity.iter().collect();
    // Stable sort keeps recording order for equal timestamps; reverse to put later records first.
    out.sort_by_key(|a| a.created_at);
    out.reverse();
    out.truncate(limit);
    out
}

/// Case-insensitive substring match on title or description. Blank filters match everything.
pub fn matches_filter(task: &Task, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

/// The fourteen days shown on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineWindow {
    pub start: NaiveDate,
}

impl TimelineWindow {
    /// Window starting on the first day of the week containing `today`.
    pub fn containing(today: NaiveDate, week_start: WeekStart) -> Self {
        let offset = match week_start {
            WeekStart::Sunday => today.weekday().num_days_from_sunday(),
            WeekStart::Monday => today.weekday().num_days_from_monday(),
        };
        TimelineWindow { start: today - Duration::days(offset as i64) }
    }

    /// Last day inside the window.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(TIMELINE_DAYS - 1)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..TIMELINE_DAYS).map(move |i| self.start + Duration::days(i))
    }

    /// Day offset of `date` from the window start; may be negative or past the end.
    pub fn offset_of(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }
}

/// A task bar on the timeline, as inclusive day offsets into the window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry<'a> {
    pub task: &'a Task,
    pub start_day: u32,
    pub end_day: u32,
}

/// Lay out dated tasks on the window.
///
/// A bar ends on the due date and starts three days earlier, clamped to the
/// window start. Only tasks due inside the window are included. Bars are sorted
/// by start day; ties keep collection order.
pub fn timeline<'a>(tasks: impl IntoIterator<Item = &'a Task>, window: &TimelineWindow) -> Vec<TimelineEntry<'a>> {
    let mut out: Vec<TimelineEntry<'a>> = tasks
        .into_iter()
        .filter_map(|task| {
            let end = window.offset_of(task.due_date?);
            if !(0..TIMELINE_DAYS).contains(&end) {
                return None;
            }
            let start = (end - TIMELINE_LEAD_IN).max(0);
            Some(TimelineEntry {
                task,
                start_day: start as u32,
                end_day: end as u32,
            })
        })
        .collect();
    out.sort_by_key(|e| e.start_day);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::task::TaskId;
    use chrono::{TimeZone, Utc};

    fn task(id: u64, project: u64, status: Status, due: Option<NaiveDate>) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        Task {
            id: TaskId(id),
            title: format!("Task {id}"),
            description: None,
            status,
            priority: Priority::Medium,
            assignee_id: None,
            due_date: due,
            project_id: ProjectId(project),
            comments: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_group_by_status_preserves_order() {
        let tasks = vec![
            task(1, 1, Status::Review, None),
            task(2, 1, Status::Todo, None),
            task(3, 1, Status::Review, None),
            task(4, 1, Status::Done, None),
        ];
        let buckets = group_by_status(&tasks);
        let review: Vec<u64> = buckets.get(Status::Review).iter().map(|t| t.id.0).collect();
        assert_eq!(review, vec![1, 3]);
        assert!(buckets.get(Status::InProgress).is_empty());
        assert_eq!(buckets.total(), 4);
        let order: Vec<Status> = buckets.iter().map(|(s, _)| s).collect();
        assert_eq!(order, Status::ALL.to_vec());
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(project_progress(&[], ProjectId(1)), 0);
        let tasks = vec![
            task(1, 1, Status::Done, None),
            task(2, 1, Status::Todo, None),
            task(3, 1, Status::Review, None),
            task(4, 2, Status::Done, None),
            task(5, 2, Status::Done, None),
            task(6, 2, Status::Todo, None),
        ];
        assert_eq!(project_progress(&tasks, ProjectId(1)), 33);
        assert_eq!(project_progress(&tasks, ProjectId(2)), 67);
        assert_eq!(project_progress(&tasks, ProjectId(3)), 0);
    }

    #[test]
    fn test_progress_rounds_half_up() {
        let mut tasks: Vec<Task> = (1..=8).map(|i| task(i, 1, Status::Todo, None)).collect();
        tasks[0].status = Status::Done;
        assert_eq!(project_progress(&tasks, ProjectId(1)), 13);
    }

    fn at(d: NaiveDate, h: u32) -> NaiveDateTime {
        d.and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_overdue() {
        let today = date(2024, 3, 10);
        let now = at(today, 9);
        let past = Some(date(2024, 3, 8));
        assert!(is_overdue(&task(1, 1, Status::Review, past), now));
        assert!(!is_overdue(&task(2, 1, Status::Done, past), now));
        assert!(is_overdue(&task(3, 1, Status::Todo, Some(today)), now));
        assert!(!is_overdue(&task(4, 1, Status::Todo, None), now));
        assert!(!is_overdue(&task(5, 1, Status::Todo, Some(today + Duration::days(1))), now));
    }

    #[test]
    fn test_due_today_is_overdue_once_the_day_starts() {
        let today = date(2024, 3, 13);
        let review = task(1, 1, Status::Review, Some(today));
        assert!(is_overdue(&review, at(today, 15)));
        assert!(!is_overdue(&review, today.and_time(NaiveTime::MIN)));
        assert!(!is_overdue(&task(2, 1, Status::Done, Some(today)), at(today, 15)));
    }

    #[test]
    fn test_dashboard_summary() {
        let today = date(2024, 3, 10);
        let tasks = vec![
            task(1, 1, Status::Todo, Some(date(2024, 3, 1))),
            task(2, 1, Status::InProgress, None),
            task(3, 1, Status::Done, Some(date(2024, 3, 1))),
        ];
        let s = dashboard_summary(&tasks, at(today, 9));
        assert_eq!(s.counts.todo, 1);
        assert_eq!(s.counts.in_progress, 1);
        assert_eq!(s.counts.review, 0);
        assert_eq!(s.counts.total(), 3);
        assert_eq!(s.overdue, 1);
    }

    #[test]
    fn test_window_start() {
        // 2024-03-13 is a Wednesday.
        let wed = date(2024, 3, 13);
        assert_eq!(TimelineWindow::containing(wed, WeekStart::Sunday).start, date(2024, 3, 10));
        assert_eq!(TimelineWindow::containing(wed, WeekStart::Monday).start, date(2024, 3, 11));
        let w = TimelineWindow::containing(wed, WeekStart::Sunday);
        assert_eq!(w.end(), date(2024, 3, 23));
        assert_eq!(w.days().count(), 14);
    }

    #[test]
    fn test_timeline_bounds() {
        let w = TimelineWindow { start: date(2024, 3, 10) };
        let tasks = vec![
            task(1, 1, Status::Todo, Some(w.end())),
            task(2, 1, Status::Todo, Some(w.end() + Duration::days(1))),
            task(3, 1, Status::Todo, Some(w.start + Duration::days(1))),
            task(4, 1, Status::Todo, Some(w.start - Duration::days(1))),
            task(5, 1, Status::Todo, None),
        ];
        let entries = timeline(&tasks, &w);
        let ids: Vec<u64> = entries.iter().map(|e| e.task.id.0).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!((entries[0].start_day, entries[0].end_day), (0, 1));
        assert_eq!((entries[1].start_day, entries[1].end_day), (10, 13));
    }

    #[test]
    fn test_recent_activity_newest_first() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let log: Vec<Activity> = (0..4)
            .map(|i| Activity {
                id: i,
                action: format!("a{i}"),
                user_id: None,
                task_id: None,
                created_at: base + Duration::hours(i as i64),
            })
            .collect();
        let recent: Vec<u64> = recent_activity(&log, 2).iter().map(|a| a.id).collect();
        assert_eq!(recent, vec![3, 2]);
    }

    #[test]
    fn test_project_lookups() {
        use crate::seed::Seed;

        let now = Utc.with_ymd_and_hms(2024, 3, 13, 9, 0, 0).unwrap();
        let seed = Seed::builtin(now);

        let summaries = project_summaries(&seed.projects, &seed.tasks);
        let counts: Vec<(usize, usize, u8)> = summaries.iter().map(|s| (s.task_count, s.done_count, s.progress)).collect();
        assert_eq!(counts, vec![(4, 1, 25), (4, 0, 0), (2, 1, 50)]);
        assert_eq!(tasks_for_project(&seed.tasks, ProjectId(3)).len(), 2);

        let members: Vec<&str> = project_members(&seed.projects[2], &seed.users)
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(members, vec!["Sarah Chen", "Taylor Kim"]);

        let taylor: Vec<ProjectId> = projects_for_user(&seed.projects, UserId(4)).iter().map(|p| p.id).collect();
        assert_eq!(taylor, vec![ProjectId(2), ProjectId(3)]);
        assert!(projects_for_user(&seed.projects, UserId(9)).is_empty());

        let counts = status_counts(&seed.tasks);
        assert_eq!((counts.todo, counts.in_progress, counts.review, counts.done), (4, 2, 2, 2));
        assert_eq!(counts.get(Status::Review), 2);
    }

    #[test]
    fn test_matches_filter() {
        let mut t = task(1, 1, Status::Todo, None);
        t.title = "Build Login".into();
        t.description = Some("OAuth provider".into());
        assert!(matches_filter(&t, "login"));
        assert!(matches_filter(&t, "oauth"));
        assert!(matches_filter(&t, "  "));
        assert!(!matches_filter(&t, "payment"));
    }
}
