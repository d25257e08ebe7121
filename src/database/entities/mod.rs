pub mod categories;
pub mod content_history;
pub mod contents;
pub mod project_categories;
pub mod project_history;
pub mod projects;
pub mod users;
