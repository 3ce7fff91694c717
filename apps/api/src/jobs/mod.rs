// Job store: crawling Jobinja into SQLite and reading it back.

pub mod crawler;
pub mod handlers;
pub mod store;
