pub mod categories;
pub mod content_history;
pub mod content_service;
pub mod history;
pub mod project_categories;
pub mod project_history;
pub mod project_service;
pub mod snapshot;
pub mod taxonomy;
