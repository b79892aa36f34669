// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Duration, Utc};
use common::{Comment, Priority, Task, TaskStatus, User};

/// Number of tasks in the onboarding board.
pub const ONBOARDING_TASK_COUNT: usize = 6;

/// Board shown when no stored tasks can be loaded: four tasks to do, one in
/// progress and one done, all created by and assigned to `user`.
///
/// The result only depends on its arguments.
pub fn onboarding_tasks(user: &User, project_id: i64, now: DateTime<Utc>) -> Vec<Task> {
    let today = now.date_naive();
    let task = |id: i64,
                title: &str,
                description: &str,
                status: TaskStatus,
                priority: Priority,
                due_in_days: Option<i64>| Task {
        id,
        title: title.to_string(),
        description: Some(description.to_string()),
        status,
        priority,
        project_id,
        assignee_id: Some(user.id),
        due_date: due_in_days.map(|days| today + Duration::days(days)),
        created_by: user.id,
        created_at: now,
        updated_at: now,
        assignee: Some(user.clone()),
        comments: Vec::new(),
        attachments: Vec::new(),
    };
    let comment = |id: i64, task_id: i64, content: &str, at: DateTime<Utc>| Comment {
        id,
        content: content.to_string(),
        task_id,
        author_id: Some(user.id),
        created_at: at,
        author: Some(user.clone()),
    };

    let mut learn = task(
        5,
        "Learn Application Features",
        "Read the help guide to learn drag and drop, task editing, comments and attachments.",
        TaskStatus::InProgress,
        Priority::Medium,
        Some(4),
    );
    learn.comments.push(comment(
        1,
        5,
        "Started reading the user guide. Dragging cards between columns is easy!",
        now - Duration::hours(2),
    ));

    let mut welcome = task(
        6,
        "Welcome to your board",
        "Your account is ready. Use this board to keep track of everything you are working on.",
        TaskStatus::Done,
        Priority::Low,
        None,
    );
    welcome.created_at = now - Duration::days(1);
    welcome.comments.push(comment(
        2,
        6,
        "Welcome to your personal workspace!",
        now - Duration::days(1),
    ));

    vec![
        task(
            1,
            "Complete Profile Verification",
            "Add a profile picture, phone number, location and bio to finish setting up your profile.",
            TaskStatus::Todo,
            Priority::High,
            Some(3),
        ),
        task(
            2,
            "Configure Data Backup Settings",
            "Choose how your tasks are backed up so your work is always safe.",
            TaskStatus::Todo,
            Priority::High,
            Some(2),
        ),
        task(
            3,
            "Set Up Notification Preferences",
            "Decide which deadlines, comments and project updates you want to hear about.",
            TaskStatus::Todo,
            Priority::Medium,
            Some(5),
        ),
        task(
            4,
            "Create Your First Personal Project",
            "Organize your work by creating a first project for goals, work or hobbies.",
            TaskStatus::Todo,
            Priority::Medium,
            Some(7),
        ),
        learn,
        welcome,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserRole;

    fn user() -> User {
        User {
            id: 99,
            name: "Casey".to_string(),
            email: "casey@example.com".to_string(),
            avatar_url: None,
            role: UserRole::Member,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_onboarding_distribution() {
        let tasks = onboarding_tasks(&user(), 1, Utc::now());
        assert_eq!(tasks.len(), ONBOARDING_TASK_COUNT);

        let count = |status| tasks.iter().filter(|t| t.status == status).count();
        assert_eq!(count(TaskStatus::Todo), 4);
        assert_eq!(count(TaskStatus::InProgress), 1);
        assert_eq!(count(TaskStatus::Done), 1);
    }

    #[test]
    fn test_onboarding_is_attributed_to_user() {
        let owner = user();
        for task in onboarding_tasks(&owner, 3, Utc::now()) {
            assert_eq!(task.created_by, owner.id);
            assert_eq!(task.assignee_id, Some(owner.id));
            assert_eq!(task.assignee.as_ref(), Some(&owner));
            assert_eq!(task.project_id, 3);
            assert!(task.comments.iter().all(|c| c.author_id == Some(owner.id)));
        }
    }

    #[test]
    fn test_onboarding_is_deterministic() {
        let owner = user();
        let now = Utc::now();
        assert_eq!(onboarding_tasks(&owner, 1, now), onboarding_tasks(&owner, 1, now));
    }

    #[test]
    fn test_due_dates_are_relative_to_now() {
        let now = Utc::now();
        let tasks = onboarding_tasks(&user(), 1, now);
        assert_eq!(tasks[1].due_date, Some(now.date_naive() + Duration::days(2)));
        assert_eq!(tasks[5].due_date, None);
    }
}
