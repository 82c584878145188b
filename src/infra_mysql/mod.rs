mod user_repo_mysql;

pub use user_repo_mysql::*;
