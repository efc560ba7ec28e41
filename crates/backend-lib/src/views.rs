// ============================
// crates/backend-lib/src/views.rs
// ============================
//! Server-rendered HTML pages.
use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;
use taskboard_common::TaskRecord;

use crate::error::AppError;

const TEMPLATES: [(&str, &str); 5] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("task.html", include_str!("../templates/task.html")),
    ("edit.html", include_str!("../templates/edit.html")),
    ("login.html", include_str!("../templates/login.html")),
];

/// The signed-in user as shown in the sidebar
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    /// `None` renders as "Unknown user"
    pub name: Option<String>,
}

/// A task as the templates see it. Blank names are `None` and render as
/// "No Name".
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub done: bool,
    pub created_at: String,
}

impl From<&TaskRecord> for TaskView {
    fn from(task: &TaskRecord) -> Self {
        Self {
            id: task.id.clone(),
            name: task.display_name().map(str::to_string),
            notes: task.notes.clone(),
            done: task.done,
            created_at: task.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderLink {
    pub name: String,
    pub label: String,
}

/// Sidebar content shared by every page
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub user: Option<UserView>,
    pub tasks: Vec<TaskView>,
    pub query: String,
}

impl Chrome {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(name: Option<String>, tasks: &[TaskRecord], query: Option<&str>) -> Self {
        Self {
            user: Some(UserView { name }),
            tasks: tasks.iter().map(TaskView::from).collect(),
            query: query.unwrap_or_default().to_string(),
        }
    }
}

/// Compiled template set
#[derive(Clone)]
pub struct Views {
    env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new() -> Result<Self, AppError> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    pub fn index(&self, chrome: &Chrome) -> Result<Html<String>, AppError> {
        self.render("index.html", chrome, NoPage {})
    }

    pub fn task(&self, chrome: &Chrome, task: &TaskRecord) -> Result<Html<String>, AppError> {
        self.render("task.html", chrome, TaskPage { task: task.into() })
    }

    pub fn edit(&self, chrome: &Chrome, task: &TaskRecord) -> Result<Html<String>, AppError> {
        self.render("edit.html", chrome, TaskPage { task: task.into() })
    }

    /// `return_to` must already be URL-encoded
    pub fn login(
        &self,
        chrome: &Chrome,
        providers: &[ProviderLink],
        return_to: Option<&str>,
    ) -> Result<Html<String>, AppError> {
        self.render(
            "login.html",
            chrome,
            LoginPage {
                providers,
                return_to,
            },
        )
    }

    fn render<T: Serialize>(
        &self,
        name: &str,
        chrome: &Chrome,
        page: T,
    ) -> Result<Html<String>, AppError> {
        let template = self.env.get_template(name)?;
        let html = template.render(Page {
            user: chrome.user.as_ref(),
            tasks: &chrome.tasks,
            q: &chrome.query,
            page,
        })?;
        Ok(Html(html))
    }
}

/// Template context: sidebar values plus the page's own values
#[derive(Serialize)]
struct Page<'a, T> {
    user: Option<&'a UserView>,
    tasks: &'a [TaskView],
    q: &'a str,
    #[serde(flatten)]
    page: T,
}

#[derive(Serialize)]
struct NoPage {}

#[derive(Serialize)]
struct TaskPage {
    task: TaskView,
}

#[derive(Serialize)]
struct LoginPage<'a> {
    providers: &'a [ProviderLink],
    return_to: Option<&'a str>,
}
