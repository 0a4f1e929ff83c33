// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Notification rendering.
//!
//! Pure functions from a task snapshot to a [`NotificationPayload`]. No I/O
//! and no clock access: due-date formatting uses the value embedded in the
//! snapshot, so rendering the same inputs twice produces byte-identical
//! output.

use minijinja::{Environment, context};

use crate::error::RenderError;
use crate::types::{Assignee, NotificationPayload, ProjectRef, TaskSnapshot};

/// Which of the two notification families to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Sent immediately after an assignment event.
    Assignment,
    /// Sent at the due date if the task is still incomplete.
    Reminder,
}

/// Rendered in place of an absent task description. Kept stable so downstream
/// consumers and tests never see an empty slot.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided.";

/// Greeting used when the assignee has no display name.
pub const GENERIC_GREETING: &str = "Hi there,";

/// Due-date format used in subjects and bodies, e.g. "Tue, 11 Aug 2026 17:00 UTC".
const DUE_FORMAT: &str = "%a, %d %b %Y %H:%M UTC";

// Template names carry the .html suffix so minijinja auto-escapes
// user-supplied titles and names.
const ASSIGNMENT_TEMPLATE: &str = "assignment.html";
const REMINDER_TEMPLATE: &str = "reminder.html";

const ASSIGNMENT_BODY: &str = "\
<p>{{ greeting }}</p>
<p>You have been assigned a new task in <strong>{{ project }}</strong>:</p>
<h2>{{ title }}</h2>
<p>{{ description }}</p>
{% if due %}<p>Due: <strong>{{ due }}</strong></p>
{% endif %}{% if link %}<p><a href=\"{{ link }}\">Open the task</a></p>
{% endif %}";

const REMINDER_BODY: &str = "\
<p>{{ greeting }}</p>
<p>This is a reminder that the task <strong>{{ title }}</strong> in
<strong>{{ project }}</strong>{% if due %} is due {{ due }}{% else %} is still open{% endif %}.</p>
<p>{{ description }}</p>
{% if link %}<p><a href=\"{{ link }}\">Open the task</a></p>
{% endif %}";

/// Render a notification for a task snapshot.
///
/// The caller passes the already-resolved assignee and project (the engine
/// has established they are present before rendering). `origin`, when given,
/// becomes a deep link to the task.
pub fn render(
    kind: NotificationKind,
    task: &TaskSnapshot,
    assignee: &Assignee,
    project: &ProjectRef,
    origin: Option<&str>,
) -> Result<NotificationPayload, RenderError> {
    let (template_name, source) = match kind {
        NotificationKind::Assignment => (ASSIGNMENT_TEMPLATE, ASSIGNMENT_BODY),
        NotificationKind::Reminder => (REMINDER_TEMPLATE, REMINDER_BODY),
    };

    let greeting = match assignee.name.as_deref() {
        Some(name) => format!("Hi {},", name),
        None => GENERIC_GREETING.to_string(),
    };
    let description = task
        .description
        .as_deref()
        .unwrap_or(DESCRIPTION_PLACEHOLDER);
    let due = task.due_at.map(|at| at.format(DUE_FORMAT).to_string());
    let link = origin.map(|o| format!("{}/tasks/{}", o.trim_end_matches('/'), task.id));

    let subject = match kind {
        NotificationKind::Assignment => format!("New task assigned: {}", task.title),
        NotificationKind::Reminder => match &due {
            Some(due) => format!("Reminder: \"{}\" in {} is due {}", task.title, project.name, due),
            None => format!("Reminder: \"{}\" in {}", task.title, project.name),
        },
    };

    let mut env = Environment::new();
    env.add_template(template_name, source)
        .map_err(|e| RenderError::new(template_name, e))?;
    let template = env
        .get_template(template_name)
        .map_err(|e| RenderError::new(template_name, e))?;

    let body = template
        .render(context! {
            greeting => greeting,
            title => task.title,
            description => description,
            project => project.name,
            due => due,
            link => link,
        })
        .map_err(|e| RenderError::new(template_name, e))?;

    Ok(NotificationPayload {
        to: assignee.email.clone(),
        subject,
        body,
    })
}
